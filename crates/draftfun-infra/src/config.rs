//! Configuration loader for Draftfun.
//!
//! Reads `config.toml` from the data directory (`~/.draftfun/` in
//! production) and deserializes it into [`GenerationConfig`]. Falls
//! back to the shipped defaults when the file is missing or malformed.
//! The OpenRouter API key is never stored in the file; it comes from
//! the environment and stays wrapped in a [`SecretString`].

use std::path::Path;

use secrecy::SecretString;

use draftfun_types::config::GenerationConfig;

/// Environment variable holding the OpenRouter API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Load generation configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GenerationConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns
///   the default.
/// - Otherwise returns the parsed config.
pub async fn load_generation_config(data_dir: &Path) -> GenerationConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return GenerationConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return GenerationConfig::default();
        }
    };

    match toml::from_str::<GenerationConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GenerationConfig::default()
        }
    }
}

/// Read the OpenRouter API key from the environment.
///
/// The key goes straight into a [`SecretString`] so it never appears
/// in Debug output or logs.
pub fn api_key_from_env() -> Option<SecretString> {
    std::env::var(API_KEY_ENV).ok().map(SecretString::from)
}

/// Returns the default database URL based on `DRAFTFUN_DATA_DIR`,
/// falling back to `~/.draftfun/draftfun.db`.
pub fn default_database_url() -> String {
    let data_dir = default_data_dir();
    format!("sqlite://{data_dir}/draftfun.db")
}

/// Returns the data directory path from `DRAFTFUN_DATA_DIR`, falling
/// back to `~/.draftfun`.
pub fn default_data_dir() -> String {
    std::env::var("DRAFTFUN_DATA_DIR").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{home}/.draftfun")
    })
}
