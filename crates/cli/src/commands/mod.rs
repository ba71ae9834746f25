pub mod ask;
pub mod config_cmd;
pub mod doctor;
pub mod notes;
pub mod serve;

use teamkb_config::AppConfig;

/// Load configuration, turning the error into a CLI-friendly message.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}
