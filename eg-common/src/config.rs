//! Configuration file resolution
//!
//! Locates the storefront TOML configuration following the priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`echogifts/config.toml`)
//!
//! Returning `None` means no file was found anywhere and the compiled
//! defaults apply.

use std::path::PathBuf;

/// Resolve the configuration file path, if any exists
pub fn resolve_config_file(cli_arg: Option<&str>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    platform_config_file().filter(|p| p.exists())
}

/// Default configuration file path for the platform
fn platform_config_file() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/echogifts/config.toml first, then /etc/echogifts/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("echogifts").join("config.toml")) {
            if path.exists() {
                return Some(path);
            }
        }
        let system_config = PathBuf::from("/etc/echogifts/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
        None
    } else {
        dirs::config_dir().map(|d| d.join("echogifts").join("config.toml"))
    }
}
