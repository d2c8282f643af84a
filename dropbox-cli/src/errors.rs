use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Dropbox(#[from] dropbox::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse `{path}`: {source}")]
    Settings {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{key}` was defined but could not be parsed: {message}")]
    Env { key: String, message: String },

    #[error("no access token, set `DROPBOX_ACCESS_TOKEN` or pass `--token`")]
    MissingToken,
}

impl CliError {
    /// Process exit code for the error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Dropbox(e) if e.code() == Some(404) => 3,
            CliError::Dropbox(_) => 1,
            _ => 2,
        }
    }
}
