//! Feature lifecycle for DocsFocus.
//!
//! The page mutators (text collapse, reading mask, ...) live outside this
//! crate. They are driven through [`FeatureModule`], and [`FeatureSet`] keeps
//! them in a fixed order: activation front to back, teardown back to front.

use tracing::{debug, info};

use crate::types::settings::Settings;

/// Module names in activation order, with the toggle each one honours.
pub const FEATURE_ORDER: [(&str, Option<&str>); 8] = [
    ("text-collapse", None),
    ("code-preview", Some("previewTlDr")),
    ("keyword-highlighting", None),
    ("reading-mask", Some("readingMask")),
    ("collapsible-sections", Some("collapsibleSections")),
    ("layout-trim", Some("trimChrome")),
    ("navigation-aids", Some("sectionTracker")),
    ("dyslexia-mode", Some("dyslexiaMode")),
];

/// One page feature. Receives finalized settings only.
pub trait FeatureModule: Send {
    fn name(&self) -> &str;
    fn activate(&mut self, settings: &Settings);
    fn update(&mut self, settings: &Settings);
    fn deactivate(&mut self);
}

/// Ordered composite of feature modules.
pub struct FeatureSet {
    modules: Vec<Box<dyn FeatureModule>>,
}

impl FeatureSet {
    pub fn new(modules: Vec<Box<dyn FeatureModule>>) -> Self {
        Self { modules }
    }

    /// The eight standard modules as traced stand-ins.
    pub fn standard() -> Self {
        Self::new(
            FEATURE_ORDER
                .iter()
                .map(|(name, toggle)| Box::new(TracedFeature::new(*name, *toggle)) as Box<dyn FeatureModule>)
                .collect(),
        )
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

impl FeatureModule for FeatureSet {
    fn name(&self) -> &str {
        "features"
    }

    fn activate(&mut self, settings: &Settings) {
        for module in self.modules.iter_mut() {
            module.activate(settings);
        }
    }

    fn update(&mut self, settings: &Settings) {
        for module in self.modules.iter_mut() {
            module.update(settings);
        }
    }

    fn deactivate(&mut self) {
        for module in self.modules.iter_mut().rev() {
            module.deactivate();
        }
    }
}

/// Stand-in for a page feature outside the browser: tracks whether it would
/// be applying anything and logs each transition.
#[derive(Debug, Clone)]
pub struct TracedFeature {
    name: &'static str,
    toggle: Option<&'static str>,
    applied: bool,
}

impl TracedFeature {
    pub fn new(name: &'static str, toggle: Option<&'static str>) -> Self {
        Self {
            name,
            toggle,
            applied: false,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    fn wanted(&self, settings: &Settings) -> bool {
        match self.toggle {
            Some(field) => settings.toggle(field).unwrap_or(false),
            None => true,
        }
    }
}

impl FeatureModule for TracedFeature {
    fn name(&self) -> &str {
        self.name
    }

    fn activate(&mut self, settings: &Settings) {
        self.applied = self.wanted(settings);
        info!(feature = self.name, applied = self.applied, "feature activated");
    }

    fn update(&mut self, settings: &Settings) {
        let wanted = self.wanted(settings);
        if wanted != self.applied {
            debug!(feature = self.name, applied = wanted, "feature toggled by settings");
        }
        self.applied = wanted;
    }

    fn deactivate(&mut self) {
        self.applied = false;
        info!(feature = self.name, "feature deactivated");
    }
}
