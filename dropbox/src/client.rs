//! A low-level Dropbox client. Every method maps to exactly one request.
use bytes::Bytes;
use futures::{Stream, TryStreamExt};

use once_cell::sync::Lazy;

use reqwest::{Body, Client as HttpClient, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::{
    api::{check_status, read_json},
    auth::TokenStore,
    metadata::{
        AccountInfo, CopyRef, DeltaPage, FileEntry, Metadata, SharedLink, ThumbnailFormat,
        ThumbnailSize,
    },
    path::{root_path_url, Root},
    Error,
};

/// `User-Agent` used in all requests to Dropbox.
pub static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

static API_BASE: Lazy<Url> = Lazy::new(|| Url::parse("https://api.dropbox.com/1/").unwrap());

static CONTENT_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("https://api-content.dropbox.com/1/").unwrap());

/// Header carrying the metadata of a downloaded file.
const METADATA_HEADER: &str = "x-dropbox-metadata";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base of the metadata API, `https://api.dropbox.com/1/` by default.
    pub api_url: Url,
    /// Base of the content API (downloads and uploads),
    /// `https://api-content.dropbox.com/1/` by default.
    pub content_url: Url,
    /// Root that all paths are resolved against.
    pub root: Root,
    /// Locale hint for translated error messages and human-readable sizes.
    pub locale: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: API_BASE.clone(),
            content_url: CONTENT_BASE.clone(),
            root: Root::default(),
            locale: None,
        }
    }
}

impl Config {
    /// Send both API and content requests to `base`, e.g. a proxy or a
    /// mock server. A trailing `/1/` is **not** appended.
    ///
    /// # Errors
    ///
    /// Errors if `base` isn't a valid url.
    pub fn with_base_url(base: &str) -> crate::Result<Self> {
        let mut url = Url::parse(base)?;

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            api_url: url.clone(),
            content_url: url,
            ..Self::default()
        })
    }

    /// Set the root.
    #[must_use]
    pub fn root(mut self, root: Root) -> Self {
        self.root = root;
        self
    }

    /// Set the locale.
    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Options for [`Client::metadata`].
#[derive(Debug, Clone, Serialize)]
pub struct MetadataOptions {
    /// Maximum number of folder entries to return. Dropbox fails with
    /// `406` if there are more.
    pub file_limit: u32,
    /// Hash of a previous listing. Dropbox answers `304` if nothing changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// List folder contents.
    pub list: bool,
    /// Include deleted entries.
    pub include_deleted: bool,
    /// Get the metadata of a specific revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            file_limit: 10_000,
            hash: None,
            list: true,
            include_deleted: false,
            rev: None,
        }
    }
}

/// Options for [`Client::search`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchOptions {
    /// Maximum number of results.
    pub file_limit: u32,
    /// Include deleted entries.
    pub include_deleted: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            file_limit: 1000,
            include_deleted: false,
        }
    }
}

/// Conflict handling when writing a file.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOptions {
    /// Replace an existing file. If `false`, a conflicting upload is
    /// renamed, e.g. `test (1).txt`.
    pub overwrite: bool,
    /// Revision the upload is based on. If it isn't the latest revision,
    /// the upload is saved as a conflicted copy instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_rev: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            parent_rev: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Locale<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) locale: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WithLocale<'a, T> {
    #[serde(flatten)]
    params: T,
    #[serde(flatten)]
    locale: Locale<'a>,
}

/// A Dropbox client.
#[derive(Debug)]
pub struct Client<S: TokenStore> {
    client: HttpClient,
    token_store: S,
    config: Config,
}

impl<S: TokenStore> Client<S> {
    /// Create a new client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client fails to initialize.
    #[must_use]
    pub fn new(token_store: S, config: Config) -> Self {
        let client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to initialize http client");

        Self::with_http_client(client, token_store, config)
    }

    /// Create a new client using an existing HTTP client, e.g. one with
    /// custom timeouts.
    #[must_use]
    pub fn with_http_client(client: HttpClient, token_store: S, config: Config) -> Self {
        Self {
            client,
            token_store,
            config,
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn locale(&self) -> Locale<'_> {
        Locale {
            locale: self.config.locale.as_deref(),
        }
    }

    fn with_locale<T: Serialize>(&self, params: T) -> WithLocale<'_, T> {
        WithLocale {
            params,
            locale: self.locale(),
        }
    }

    /// Sign a request with the current access token.
    pub(crate) async fn authed_req(&self, method: Method, url: Url) -> crate::Result<RequestBuilder> {
        let access_token = self.token_store.get_access_token(&self.client).await?;

        trace!(%method, %url, "signing request");

        Ok(self.client.request(method, url).bearer_auth(access_token))
    }

    pub(crate) async fn api_req(&self, method: Method, endpoint: &str) -> crate::Result<RequestBuilder> {
        let url = self.config.api_url.join(endpoint)?;

        self.authed_req(method, url).await
    }

    async fn api_path_req(
        &self,
        method: Method,
        endpoint: &str,
        path: &str,
    ) -> crate::Result<RequestBuilder> {
        let url = root_path_url(&self.config.api_url, endpoint, self.config.root, path)?;

        self.authed_req(method, url).await
    }

    pub(crate) async fn content_req(
        &self,
        method: Method,
        endpoint: &str,
    ) -> crate::Result<RequestBuilder> {
        let url = self.config.content_url.join(endpoint)?;

        self.authed_req(method, url).await
    }

    pub(crate) async fn content_path_req(
        &self,
        method: Method,
        endpoint: &str,
        path: &str,
    ) -> crate::Result<RequestBuilder> {
        let url = root_path_url(&self.config.content_url, endpoint, self.config.root, path)?;

        self.authed_req(method, url).await
    }

    /// Get information about the authenticated user.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - authentication errors (invalid token)
    #[instrument(skip(self))]
    pub async fn account_info(&self) -> crate::Result<AccountInfo> {
        let res = self
            .api_req(Method::GET, "account/info")
            .await?
            .query(&self.locale())
            .send()
            .await?;

        read_json(res).await
    }

    /// Get the metadata of a file or folder, including folder contents
    /// unless told otherwise.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file or folder
    /// - unchanged folder (`304`) when `options.hash` is set
    /// - too many entries (`406`)
    #[instrument(skip(self, options))]
    pub async fn metadata(&self, path: &str, options: &MetadataOptions) -> crate::Result<Metadata> {
        let res = self
            .api_path_req(Method::GET, "metadata", path)
            .await?
            .query(&self.with_locale(options))
            .send()
            .await?;

        read_json(res).await
    }

    async fn file_bin(&self, path: &str, rev: Option<&str>) -> crate::Result<Response> {
        #[derive(Serialize)]
        struct Params<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            rev: Option<&'a str>,
        }

        debug!("requesting file");

        let res = self
            .content_path_req(Method::GET, "files", path)
            .await?
            .query(&Params { rev })
            .send()
            .await?;

        check_status(res).await
    }

    /// Download a file, optionally at a specific revision.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file
    /// - missing or malformed metadata header
    #[instrument(skip(self))]
    pub async fn get_file(&self, path: &str, rev: Option<&str>) -> crate::Result<FileEntry> {
        let res = self.file_bin(path, rev).await?;

        file_entry(res).await
    }

    /// Open a stream to a file.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file
    #[instrument(skip(self))]
    pub async fn get_file_stream(
        &self,
        path: &str,
        rev: Option<&str>,
    ) -> crate::Result<impl Stream<Item = crate::Result<Bytes>>> {
        let res = self.file_bin(path, rev).await?;

        Ok(res.bytes_stream().map_err(Into::into))
    }

    /// Get a thumbnail of an image.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file, or the file isn't an image
    #[instrument(skip(self))]
    pub async fn thumbnail(
        &self,
        path: &str,
        format: ThumbnailFormat,
        size: ThumbnailSize,
    ) -> crate::Result<FileEntry> {
        let res = self
            .content_path_req(Method::GET, "thumbnails", path)
            .await?
            .query(&[("format", format.as_ref()), ("size", size.as_ref())])
            .send()
            .await?;

        file_entry(check_status(res).await?).await
    }

    /// Upload a file in a single request. Dropbox caps these at 150 MB;
    /// use [`Client::upload_stream`] for anything larger.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - over quota
    #[instrument(skip(self, body, options))]
    pub async fn put_file(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: &WriteOptions,
    ) -> crate::Result<Metadata> {
        let res = self
            .content_path_req(Method::PUT, "files_put", path)
            .await?
            .query(&self.with_locale(options))
            .body(body)
            .send()
            .await?;

        read_json(res).await
    }

    /// Get changes since `cursor`, or everything if there is no cursor.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - invalid cursor
    #[instrument(skip(self))]
    pub async fn delta(&self, cursor: Option<&str>) -> crate::Result<DeltaPage> {
        #[derive(Serialize)]
        struct Params<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            cursor: Option<&'a str>,
        }

        let res = self
            .api_req(Method::POST, "delta")
            .await?
            .query(&self.with_locale(Params { cursor }))
            .send()
            .await?;

        read_json(res).await
    }

    /// List previous revisions of a file, newest first.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file
    #[instrument(skip(self))]
    pub async fn revisions(&self, path: &str, rev_limit: u32) -> crate::Result<Vec<Metadata>> {
        #[derive(Serialize)]
        struct Params {
            rev_limit: u32,
        }

        let res = self
            .api_path_req(Method::GET, "revisions", path)
            .await?
            .query(&self.with_locale(Params { rev_limit }))
            .send()
            .await?;

        read_json(res).await
    }

    /// Restore a file to a previous revision.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file or revision
    #[instrument(skip(self))]
    pub async fn restore(&self, path: &str, rev: &str) -> crate::Result<Metadata> {
        #[derive(Serialize)]
        struct Params<'a> {
            rev: &'a str,
        }

        if rev.is_empty() {
            return Err(Error::InvalidArgument("rev is required"));
        }

        let res = self
            .api_path_req(Method::POST, "restore", path)
            .await?
            .query(&self.with_locale(Params { rev }))
            .send()
            .await?;

        read_json(res).await
    }

    /// Search for files and folders below `path` whose names contain
    /// `query`.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - query too short
    #[instrument(skip(self, options))]
    pub async fn search(
        &self,
        path: &str,
        query: &str,
        options: &SearchOptions,
    ) -> crate::Result<Vec<Metadata>> {
        #[derive(Serialize)]
        struct Params<'a> {
            query: &'a str,
            #[serde(flatten)]
            options: &'a SearchOptions,
        }

        if query.is_empty() {
            return Err(Error::InvalidArgument("query is required"));
        }

        let res = self
            .api_path_req(Method::POST, "search", path)
            .await?
            .query(&self.with_locale(Params { query, options }))
            .send()
            .await?;

        read_json(res).await
    }

    /// Create a shared link to a file or folder.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file or folder
    #[instrument(skip(self))]
    pub async fn shares(&self, path: &str, short_url: bool) -> crate::Result<SharedLink> {
        #[derive(Serialize)]
        struct Params {
            short_url: bool,
        }

        let res = self
            .api_path_req(Method::POST, "shares", path)
            .await?
            .query(&self.with_locale(Params { short_url }))
            .send()
            .await?;

        read_json(res).await
    }

    /// Get a short-lived direct link for streaming a file.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file
    #[instrument(skip(self))]
    pub async fn media(&self, path: &str) -> crate::Result<SharedLink> {
        let res = self
            .api_path_req(Method::POST, "media", path)
            .await?
            .query(&self.locale())
            .send()
            .await?;

        read_json(res).await
    }

    /// Create a copy reference, see [`CopySource::Ref`](crate::CopySource::Ref).
    ///
    /// # Errors
    ///
    /// - network errors
    /// - no such file
    #[instrument(skip(self))]
    pub async fn copy_ref(&self, path: &str) -> crate::Result<CopyRef> {
        let res = self
            .api_path_req(Method::GET, "copy_ref", path)
            .await?
            .send()
            .await?;

        read_json(res).await
    }
}

async fn file_entry(res: Response) -> crate::Result<FileEntry> {
    let metadata = res
        .headers()
        .get(METADATA_HEADER)
        .ok_or(Error::MissingMetadata)?;
    let metadata: Metadata = serde_json::from_slice(metadata.as_bytes())?;

    let data = res.bytes().await?;

    Ok(FileEntry { metadata, data })
}
