use std::path::Path;

use dropbox::{auth::OAuth2, path::Root, upload::UploadOptions, Client, Config};
use serde::{Deserialize, Serialize};

use crate::{config::parse_opt, errors::CliError, CliResult, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES};

/// CLI settings, read from an optional TOML file:
///
/// ```toml
/// access_token = "sl.AbX9..."
/// root = "sandbox"
/// chunk_size = 8388608
/// ```
///
/// and overridden by `DROPBOX_*` environment variables, which in turn are
/// overridden by command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub root: Root,

    #[serde(default)]
    pub locale: Option<String>,

    /// Send all requests here instead of to Dropbox.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_token: None,
            root: Root::default(),
            locale: None,
            base_url: None,
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
        }
    }
}

impl Settings {
    /// Read settings from a TOML file.
    pub fn from_file(path: &Path) -> CliResult<Self> {
        let s = std::fs::read_to_string(path)?;

        toml::from_str(&s).map_err(|source| CliError::Settings {
            path: path.to_owned(),
            source,
        })
    }

    /// Apply `DROPBOX_*` overrides from the environment and `.env`.
    pub fn with_env(self) -> CliResult<Self> {
        self.with_vars(|key| dotenv::var(key).ok())
    }

    /// Apply `DROPBOX_*` overrides looked up with `var`.
    pub fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> CliResult<Self> {
        let get = |key: &str| var(key).filter(|v| !v.is_empty());

        if let Some(token) = get("DROPBOX_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }

        if let Some(root) = parse_opt("DROPBOX_ROOT", get("DROPBOX_ROOT"))? {
            self.root = root;
        }

        if let Some(locale) = get("DROPBOX_LOCALE") {
            self.locale = Some(locale);
        }

        if let Some(base_url) = get("DROPBOX_BASE_URL") {
            self.base_url = Some(base_url);
        }

        if let Some(chunk_size) = parse_opt("DROPBOX_CHUNK_SIZE", get("DROPBOX_CHUNK_SIZE"))? {
            self.chunk_size = chunk_size;
        }

        if let Some(max_retries) = parse_opt("DROPBOX_MAX_RETRIES", get("DROPBOX_MAX_RETRIES"))? {
            self.max_retries = max_retries;
        }

        Ok(self)
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions::new(self.chunk_size, self.max_retries)
    }

    pub fn client_config(&self) -> CliResult<Config> {
        let config = match self.base_url {
            Some(ref base) => Config::with_base_url(base)?,
            None => Config::default(),
        };

        let config = config.root(self.root);

        Ok(match self.locale {
            Some(ref locale) => config.locale(locale),
            None => config,
        })
    }

    pub fn to_client(&self) -> CliResult<Client<OAuth2>> {
        let token = self.access_token.as_ref().ok_or(CliError::MissingToken)?;

        Ok(Client::new(OAuth2::new(token), self.client_config()?))
    }
}
