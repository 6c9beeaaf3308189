// DocsFocus state managers
// Managers handle stateful operations: per-tab activation, page features, manual overrides, site status.

pub mod feature_manager;
pub mod override_manager;
pub mod site_status;
pub mod tab_controller;
