mod config;

pub use config::{
    BoxBreathingConfig, Config, CuesConfig, CustomPatternConfig, EngineConfig, SessionDefaults,
};

use std::path::PathBuf;

/// Returns the settings directory.
///
/// `BREATHE_CONFIG_DIR` wins when set. Otherwise `~/.config/breathe[-dev]/`,
/// with `BREATHE_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("BREATHE_CONFIG_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("BREATHE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("breathe-dev")
            } else {
                base_dir.join("breathe")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
