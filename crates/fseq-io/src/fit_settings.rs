//! Reader for the fit-settings JSON file (spec §6).

use anyhow::{Context, Result};
use fseq_model::FitSettings;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn read_fit_settings<P: AsRef<Path>>(path: P) -> Result<FitSettings> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = BufReader::new(f);
    serde_json::from_reader(reader).with_context(|| "deserialize fit settings JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("fseq_io_fit_settings_missing_test.json");
        fs::remove_file(&path).ok();
        assert!(read_fit_settings(&path).is_err());
    }

    #[test]
    fn reads_partial_settings() {
        let path = std::env::temp_dir().join("fseq_io_fit_settings_test.json");
        fs::write(&path, r#"{"hold_p_detach": true}"#).unwrap();
        let settings = read_fit_settings(&path).unwrap();
        assert!(settings.hold_p_detach);
        assert!(!settings.hold_p_edman_failure);
        fs::remove_file(&path).ok();
    }
}
