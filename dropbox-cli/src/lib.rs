pub mod commands;
pub mod config;
pub mod errors;
pub mod settings;

pub type CliResult<T> = Result<T, errors::CliError>;

/// Default chunk size for chunked uploads (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 << 20;

/// Default number of attempts per chunk.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
