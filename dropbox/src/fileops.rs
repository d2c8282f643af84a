//! Copying, moving, deleting and creating folders.
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use crate::{api::read_json, auth::TokenStore, metadata::Metadata, path::require, Client};

/// What to copy.
#[derive(Debug, Clone, Copy)]
pub enum CopySource<'a> {
    /// A path in the client's root.
    Path(&'a str),
    /// A copy reference created by [`Client::copy_ref`], possibly by
    /// another user.
    Ref(&'a str),
}

#[derive(Debug, Serialize)]
struct FileOp<'a> {
    root: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_copy_ref: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<&'a str>,
}

impl<S: TokenStore> Client<S> {
    fn file_op(&self) -> FileOp<'_> {
        FileOp {
            root: self.config().root.as_ref(),
            path: None,
            from_path: None,
            from_copy_ref: None,
            to_path: None,
            locale: self.config().locale.as_deref(),
        }
    }

    async fn send_file_op(&self, op: &str, params: &FileOp<'_>) -> crate::Result<Metadata> {
        let res = self
            .api_req(Method::POST, &format!("fileops/{op}"))
            .await?
            .query(params)
            .send()
            .await?;

        read_json(res).await
    }

    /// Copy a file or folder.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such source
    /// - something already exists at `to_path`
    #[instrument(skip(self))]
    pub async fn copy(&self, from: CopySource<'_>, to_path: &str) -> crate::Result<Metadata> {
        require(to_path, "to_path is required")?;

        let mut params = FileOp {
            to_path: Some(to_path),
            ..self.file_op()
        };

        match from {
            CopySource::Path(path) => {
                require(path, "from_path is required")?;
                params.from_path = Some(path);
            }
            CopySource::Ref(copy_ref) => {
                require(copy_ref, "from_copy_ref is required")?;
                params.from_copy_ref = Some(copy_ref);
            }
        }

        self.send_file_op("copy", &params).await
    }

    /// Create a folder.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - something already exists at `path`
    #[instrument(skip(self))]
    pub async fn create_folder(&self, path: &str) -> crate::Result<Metadata> {
        require(path, "path is required")?;

        let params = FileOp {
            path: Some(path),
            ..self.file_op()
        };

        self.send_file_op("create_folder", &params).await
    }

    /// Delete a file or folder. The returned metadata describes the
    /// deleted entry.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file or folder
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> crate::Result<Metadata> {
        require(path, "path is required")?;

        let params = FileOp {
            path: Some(path),
            ..self.file_op()
        };

        self.send_file_op("delete", &params).await
    }

    /// Move or rename a file or folder.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such source
    /// - something already exists at `to_path`
    #[instrument(skip(self))]
    pub async fn move_to(&self, from_path: &str, to_path: &str) -> crate::Result<Metadata> {
        require(from_path, "from_path is required")?;
        require(to_path, "to_path is required")?;

        let params = FileOp {
            from_path: Some(from_path),
            to_path: Some(to_path),
            ..self.file_op()
        };

        self.send_file_op("move", &params).await
    }
}
