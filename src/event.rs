//! Task descriptor and result mappings.
//!
//! The handler is driven by one open-ended JSON mapping. Recognized keys
//! are typed below; anything else is kept in `extra` so fetched scripts can
//! read their own parameters from the same descriptor.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskEvent {
    /// Name of a script to fetch and run instead of the built-in task.
    pub script_name: Option<String>,
    /// Fetch the script from the configured object-store bucket.
    pub use_s3: bool,
    /// Only an explicit `false` starts a virtual display; an absent key
    /// still means a headless browser.
    pub headless_mode: Option<bool>,
    /// The browser task will save files to disk.
    pub needs_download_file: bool,
    /// Let the browser be located automatically instead of using the
    /// binary shipped in the container image.
    pub clean_init: bool,
    pub download_folder: Option<PathBuf>,
    pub user_agent: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskEvent {
    /// The script to run, if one was named. Empty strings count as absent.
    pub fn script(&self) -> Option<&str> {
        self.script_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn headless(&self) -> bool {
        self.headless_mode.unwrap_or(true)
    }
}

/// The failure mapping: every error leaves the handler in this shape,
/// with no distinction between failure kinds.
pub fn error_result(message: impl std::fmt::Display) -> Value {
    json!({
        "status": "error",
        "message": message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_descriptor_uses_defaults() {
        let event: TaskEvent = serde_json::from_str("{}").unwrap();
        assert!(event.script().is_none());
        assert!(event.headless());
        assert!(!event.needs_download_file);
        assert!(!event.clean_init);
        assert!(!event.use_s3);
    }

    #[test]
    fn empty_script_name_counts_as_absent() {
        let event: TaskEvent = serde_json::from_str(r#"{"script_name": ""}"#).unwrap();
        assert!(event.script().is_none());
    }

    #[test]
    fn explicit_headless_false_is_visible() {
        let event: TaskEvent = serde_json::from_str(r#"{"headless_mode": false}"#).unwrap();
        assert_eq!(event.headless_mode, Some(false));
        assert!(!event.headless());
    }

    #[test]
    fn unrecognized_keys_are_kept() {
        let event: TaskEvent =
            serde_json::from_str(r#"{"case_number": "2023-411", "headless_mode": true}"#).unwrap();
        assert_eq!(event.extra["case_number"], "2023-411");
        assert!(event.headless());
    }

    #[test]
    fn error_result_always_has_status() {
        let result = error_result("boom");
        assert_eq!(result["status"], "error");
        assert_eq!(result["message"], "boom");
    }
}
