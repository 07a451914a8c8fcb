use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    pub gateway_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub registry_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let gateway_url = lookup("STARREF_GATEWAY_URL")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("STARREF_GATEWAY_URL environment variable is required".to_string())
            })?;
        if !gateway_url.starts_with("http://") && !gateway_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "STARREF_GATEWAY_URL must be an http(s) url, got {gateway_url}"
            )));
        }

        let api_token = lookup("STARREF_API_TOKEN").and_then(non_empty);

        let request_timeout = match lookup("STARREF_REQUEST_TIMEOUT_MS") {
            Some(raw) => {
                let ms = raw.trim().parse::<u64>().map_err(|_| {
                    Error::Config(format!("STARREF_REQUEST_TIMEOUT_MS is not a number: {raw}"))
                })?;
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(10_000),
        };

        let registry_file = lookup("STARREF_REGISTRY_FILE")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("starref-registry.json"));

        Ok(Self {
            gateway_url,
            api_token,
            request_timeout,
            registry_file,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        return &s[1..s.len() - 1];
    }
    s
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}
