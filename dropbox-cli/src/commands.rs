use std::path::PathBuf;

use clap::Subcommand;
use dropbox::{
    auth::{authorize_url, TokenStore},
    Client, CopySource, MetadataOptions, SearchOptions, WriteOptions,
};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::{settings::Settings, CliResult};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show information about the account
    Account,

    /// Show the metadata of a file, or list a folder
    Ls {
        #[arg(default_value = "/")]
        path: String,

        /// Include deleted entries
        #[arg(long)]
        deleted: bool,

        /// Only succeed if the listing changed since this hash
        #[arg(long)]
        hash: Option<String>,

        /// Look at a specific revision
        #[arg(long)]
        rev: Option<String>,
    },

    /// Download a file
    Get {
        path: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        rev: Option<String>,
    },

    /// Upload a file in a single request (150 MB max)
    Put {
        local: PathBuf,
        path: String,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Upload a file of any size in chunks
    Upload {
        local: PathBuf,
        path: String,

        /// Bytes per chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Attempts per chunk
        #[arg(long)]
        max_retries: Option<u32>,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// List changes since a cursor
    Delta { cursor: Option<String> },

    /// Search for files and folders by name
    Search {
        query: String,

        #[arg(default_value = "/")]
        path: String,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        deleted: bool,
    },

    /// Create a shared link
    Share {
        path: String,

        /// Shorten the link
        #[arg(long)]
        short: bool,
    },

    /// Create a folder
    Mkdir { path: String },

    /// Delete a file or folder
    Rm { path: String },

    /// Move or rename a file or folder
    Mv { from: String, to: String },

    /// Copy a file or folder
    Cp {
        from: String,
        to: String,

        /// Treat `from` as a copy reference
        #[arg(long)]
        copy_ref: bool,
    },

    /// List previous revisions of a file
    Revisions {
        path: String,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Restore a file to a previous revision
    Restore { path: String, rev: String },

    /// Print the URL that grants an app access to an account
    AuthorizeUrl {
        app_key: String,
        redirect_uri: String,
    },
}

#[derive(Debug, clap::Args)]
pub struct WriteArgs {
    /// Rename instead of replacing an existing file
    #[arg(long)]
    no_overwrite: bool,

    /// Revision the upload is based on
    #[arg(long)]
    parent_rev: Option<String>,
}

impl From<WriteArgs> for WriteOptions {
    fn from(args: WriteArgs) -> Self {
        Self {
            overwrite: !args.no_overwrite,
            parent_rev: args.parent_rev,
        }
    }
}

fn authorize(app_key: &str, redirect_uri: &str) -> Value {
    json!({ "url": authorize_url(app_key, redirect_uri).as_str() })
}

/// Run a command that doesn't need a client.
pub fn run_offline(command: &Command) -> Option<Value> {
    match command {
        Command::AuthorizeUrl {
            app_key,
            redirect_uri,
        } => Some(authorize(app_key, redirect_uri)),
        _ => None,
    }
}

/// Run a command and return what to print.
pub async fn run<S: TokenStore>(
    client: &Client<S>,
    settings: &Settings,
    command: Command,
) -> CliResult<Value> {
    let value = match command {
        Command::Account => serde_json::to_value(client.account_info().await?)?,
        Command::Ls {
            path,
            deleted,
            hash,
            rev,
        } => {
            let options = MetadataOptions {
                include_deleted: deleted,
                hash,
                rev,
                ..MetadataOptions::default()
            };

            serde_json::to_value(client.metadata(&path, &options).await?)?
        }
        Command::Get { path, output, rev } => {
            let file = client.get_file(&path, rev.as_deref()).await?;

            match output {
                Some(output) => {
                    tokio::fs::write(&output, &file.data).await?;
                    info!("wrote {} bytes to {}", file.data.len(), output.display());
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&file.data).await?;
                    stdout.flush().await?;

                    return Ok(Value::Null);
                }
            }

            serde_json::to_value(file.metadata)?
        }
        Command::Put { local, path, write } => {
            let data = tokio::fs::read(&local).await?;

            serde_json::to_value(client.put_file(&path, data, &write.into()).await?)?
        }
        Command::Upload {
            local,
            path,
            chunk_size,
            max_retries,
            write,
        } => {
            let mut options = settings.upload_options().commit(write.into());

            if let Some(chunk_size) = chunk_size {
                options.chunk_size = chunk_size;
            }

            if let Some(max_retries) = max_retries {
                options.max_retries = max_retries;
            }

            serde_json::to_value(client.upload_file(&local, &path, &options).await?)?
        }
        Command::Delta { cursor } => serde_json::to_value(client.delta(cursor.as_deref()).await?)?,
        Command::Search {
            query,
            path,
            limit,
            deleted,
        } => {
            let mut options = SearchOptions {
                include_deleted: deleted,
                ..SearchOptions::default()
            };

            if let Some(limit) = limit {
                options.file_limit = limit;
            }

            serde_json::to_value(client.search(&path, &query, &options).await?)?
        }
        Command::Share { path, short } => serde_json::to_value(client.shares(&path, short).await?)?,
        Command::Mkdir { path } => serde_json::to_value(client.create_folder(&path).await?)?,
        Command::Rm { path } => serde_json::to_value(client.delete(&path).await?)?,
        Command::Mv { from, to } => serde_json::to_value(client.move_to(&from, &to).await?)?,
        Command::Cp { from, to, copy_ref } => {
            let source = if copy_ref {
                CopySource::Ref(&from)
            } else {
                CopySource::Path(&from)
            };

            serde_json::to_value(client.copy(source, &to).await?)?
        }
        Command::Revisions { path, limit } => {
            serde_json::to_value(client.revisions(&path, limit).await?)?
        }
        Command::Restore { path, rev } => serde_json::to_value(client.restore(&path, &rev).await?)?,
        Command::AuthorizeUrl {
            app_key,
            redirect_uri,
        } => authorize(&app_key, &redirect_uri),
    };

    Ok(value)
}
