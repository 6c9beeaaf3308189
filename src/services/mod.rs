// DocsFocus services
// Services provide core functionality: settings resolution, detection, presets and persisted settings.

pub mod docs_detector;
pub mod html_snapshot;
pub mod preset_store;
pub mod settings_resolver;
pub mod settings_store;
