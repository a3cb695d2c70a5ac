//! Bot token discovery: environment variable first, bot.toml fallback.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs};

const TOKEN_ENV: &str = "DISCORD_TOKEN";
const CONFIG_FILE: &str = "bot.toml";

#[derive(Debug, Deserialize)]
struct FileConfig {
    auth: Auth,
}

#[derive(Debug, Deserialize)]
struct Auth {
    token: String,
}

pub fn discord_token() -> Result<String> {
    if let Ok(token) = env::var(TOKEN_ENV) {
        if !token.is_empty() {
            return Ok(token);
        }
    }
    let raw = fs::read_to_string(CONFIG_FILE)
        .with_context(|| format!("{TOKEN_ENV} is unset and {CONFIG_FILE} could not be read"))?;
    let config: FileConfig = toml::from_str(&raw).context("malformed bot.toml")?;
    Ok(config.auth.token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_config_file_format() {
        let config: FileConfig = toml::from_str("[auth]\ntoken = \"abc123\"\n").unwrap();
        assert_eq!(config.auth.token, "abc123");
    }

    #[test]
    fn rejects_a_config_without_a_token() {
        assert!(toml::from_str::<FileConfig>("[auth]\n").is_err());
    }
}
