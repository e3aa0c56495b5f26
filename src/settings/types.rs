use serde::{Deserialize, Serialize};

/**
 * Everything the desktop app persists between runs. Panel toggles and
 * strengths are not part of this, they reset on every start.
 *
 * Stored as pretty printed JSON with kebab-case keys ("selected-device"),
 * which is also what older releases of the app wrote.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub selected_device: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            selected_device: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_kebab_case_keys() {
        let settings = Settings {
            selected_device: Some("/dev/ttyUSB0".to_string()),
        };

        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"selected-device":"/dev/ttyUSB0"}"#);
    }

    #[test]
    fn missing_keys_fall_back_to_default() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
