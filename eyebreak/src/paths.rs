/// Canonical file paths for EyeBreak data files.
///
/// Everything lives under the per-user config directory:
///   - config.toml   Read once at startup.
///   - eyebreak.log  Appended to by the logger.
///
/// `EYEBREAK_CONFIG` overrides the config file location.
use std::path::PathBuf;

const APP_DIR_NAME: &str = "EyeBreak";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "eyebreak.log";
pub const CONFIG_ENV_VAR: &str = "EYEBREAK_CONFIG";

/// Returns the EyeBreak application data directory, e.g. `~/.config/EyeBreak`.
///
/// Falls back to the working directory when the platform has no config dir.
pub fn app_data_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR_NAME),
        None => PathBuf::from("."),
    }
}

/// Returns the config file path, honouring [`CONFIG_ENV_VAR`].
pub fn config_file_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => app_data_dir().join(CONFIG_FILE_NAME),
    }
}

/// Returns the full path to the log file.
pub fn log_file_path() -> PathBuf {
    app_data_dir().join(LOG_FILE_NAME)
}
