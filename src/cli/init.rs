//! Init command - write a starter config file

use crate::config::Config;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Handle the init command
pub fn handle_init(config_path: &Path) -> Result<()> {
    Config::generate(config_path)?;
    info!(path = %config_path.display(), "Config generated");
    println!("{} was generated", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_sample() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        handle_init(&path).unwrap();

        let written: Config = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, Config::sample());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();

        let err = handle_init(&path).unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }
}
