//! Which parameters a fitting run should hold fixed.

use serde::{Deserialize, Serialize};

/// Per-parameter hold flags for a Baum-Welch fitting run, read from a JSON
/// settings file. Any field missing from the file defaults to `false`
/// (the parameter is fit, not held).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitSettings {
    #[serde(default)]
    pub hold_p_edman_failure: bool,
    #[serde(default)]
    pub hold_p_detach: bool,
    #[serde(default)]
    pub hold_p_initial_detach: bool,
    #[serde(default)]
    pub hold_p_initial_detach_decay: bool,
    #[serde(default)]
    pub hold_p_initial_block: bool,
    #[serde(default)]
    pub hold_p_cyclic_block: bool,
    /// Indexed by channel; missing or short entries default to `false`.
    #[serde(default)]
    pub hold_p_bleach: Vec<bool>,
    #[serde(default)]
    pub hold_p_dud: Vec<bool>,
}

impl FitSettings {
    #[must_use]
    pub fn hold_bleach(&self, channel: usize) -> bool {
        self.hold_p_bleach.get(channel).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn hold_dud(&self, channel: usize) -> bool {
        self.hold_p_dud.get(channel).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_false() {
        let settings: FitSettings = serde_json::from_str("{}").unwrap();
        assert!(!settings.hold_p_edman_failure);
        assert!(!settings.hold_bleach(0));
    }

    #[test]
    fn explicit_fields_round_trip() {
        let settings: FitSettings =
            serde_json::from_str(r#"{"hold_p_detach": true, "hold_p_bleach": [true, false]}"#)
                .unwrap();
        assert!(settings.hold_p_detach);
        assert!(settings.hold_bleach(0));
        assert!(!settings.hold_bleach(1));
        assert!(!settings.hold_bleach(5));
    }
}
