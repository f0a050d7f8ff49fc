//! Target identification handed to the engine.

use serde::{Deserialize, Serialize};

/// Default executable name of the target game
pub const DEFAULT_PROCESS_NAME: &str = "HillClimbRacing.exe";
/// Default module holding the boost pointer
pub const DEFAULT_MODULE_NAME: &str = "cocos2d-win10.dll";
/// Fuel level held by the freeze when nothing else is configured
pub const DEFAULT_FUEL_VALUE: f32 = 100.0;

/// Immutable description of the process the engine attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Executable name, matched case-insensitively
    pub process_name: String,
    /// Module whose base anchors the boost pointer
    pub module_name: Option<String>,
}

impl TrainerConfig {
    pub fn new(process_name: impl Into<String>, module_name: Option<String>) -> Self {
        Self {
            process_name: process_name.into(),
            module_name: module_name.filter(|m| !m.trim().is_empty()),
        }
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_NAME, Some(DEFAULT_MODULE_NAME.to_string()))
    }
}
