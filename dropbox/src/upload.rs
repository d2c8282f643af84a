//! Chunked uploads.
//!
//! A file of any size is uploaded as a sequence of chunks. The first chunk
//! opens an upload session on the server, every chunk after that is appended
//! to it, and a final commit turns the session into a file:
//!
//! 1. `PUT chunked_upload?offset=0` → `{upload_id, offset}`
//! 2. `PUT chunked_upload?upload_id=..&offset=..` (repeated)
//! 3. `POST commit_chunked_upload/<root>/<path>?upload_id=..`
//!
//! Each chunk is retried on failure, immediately and up to a fixed number
//! of attempts. Chunks are sent strictly one after another.
//!
//! If an upload fails halfway, the session is left as is on the server.
//! Dropbox expires abandoned sessions on its own.
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Method};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use time::OffsetDateTime;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument, trace, warn};

use crate::{
    api::read_json, auth::TokenStore, metadata::Metadata, path::require, serde::OptRfc2822,
    Client, Error, WriteOptions,
};

/// Server-side state of an upload in progress.
///
/// A fresh session has no id; Dropbox hands one out along with the new
/// offset after the first chunk. The offset returned by the server is the
/// only source of truth for where the next chunk goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSession {
    upload_id: Option<String>,
    offset: u64,
}

impl UploadSession {
    /// A session that hasn't been started yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a session started elsewhere.
    #[must_use]
    pub fn resume(upload_id: impl Into<String>, offset: u64) -> Self {
        Self {
            upload_id: Some(upload_id.into()),
            offset,
        }
    }

    /// Upload id, if the server has issued one.
    #[must_use]
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Number of bytes acknowledged by the server.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Response to a chunk upload.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkedUploadRes {
    /// Upload id to pass along with the next chunk and the commit.
    pub upload_id: String,
    /// Total number of bytes received so far.
    pub offset: u64,
    /// When the session is discarded unless committed.
    #[serde_as(as = "OptRfc2822")]
    #[serde(default)]
    pub expires: Option<OffsetDateTime>,
}

impl From<ChunkedUploadRes> for UploadSession {
    fn from(res: ChunkedUploadRes) -> Self {
        Self {
            upload_id: Some(res.upload_id),
            offset: res.offset,
        }
    }
}

/// A slice of the source, tagged with the position it was read from.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position of the first byte in the source.
    pub position: u64,
    /// The bytes.
    pub data: Bytes,
}

impl Chunk {
    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Options for [`upload_stream`].
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Bytes per chunk. Must be positive.
    pub chunk_size: usize,
    /// Attempts per chunk, including the first one. Must be positive.
    pub max_retries: u32,
    /// How to commit the upload.
    pub commit: WriteOptions,
}

impl UploadOptions {
    /// Options with the default commit behavior (overwrite, no parent
    /// revision).
    #[must_use]
    pub fn new(chunk_size: usize, max_retries: u32) -> Self {
        Self {
            chunk_size,
            max_retries,
            commit: WriteOptions::default(),
        }
    }

    /// Set the commit options.
    #[must_use]
    pub fn commit(mut self, commit: WriteOptions) -> Self {
        self.commit = commit;
        self
    }
}

/// The two requests a chunked upload consists of.
#[async_trait]
pub trait ChunkedUpload: Send + Sync {
    /// Append one chunk to `session`, or start a new session if it has no
    /// upload id yet. A single attempt.
    async fn upload_chunk(&self, chunk: &Chunk, session: &UploadSession)
        -> crate::Result<UploadSession>;

    /// Turn a session into a file at `path`. A session without an upload
    /// id is committed with an empty id.
    async fn commit(
        &self,
        path: &str,
        session: &UploadSession,
        options: &WriteOptions,
    ) -> crate::Result<Metadata>;
}

#[async_trait]
impl<S: TokenStore> ChunkedUpload for Client<S> {
    async fn upload_chunk(
        &self,
        chunk: &Chunk,
        session: &UploadSession,
    ) -> crate::Result<UploadSession> {
        #[derive(Serialize)]
        struct Params<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            upload_id: Option<&'a str>,
            offset: u64,
        }

        let res = self
            .content_req(Method::PUT, "chunked_upload")
            .await?
            .query(&Params {
                upload_id: session.upload_id(),
                offset: session.offset(),
            })
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(chunk.data.clone())
            .send()
            .await?;

        let res: ChunkedUploadRes = read_json(res).await?;

        trace!(offset = res.offset, expires = ?res.expires, "chunk accepted");

        Ok(res.into())
    }

    async fn commit(
        &self,
        path: &str,
        session: &UploadSession,
        options: &WriteOptions,
    ) -> crate::Result<Metadata> {
        #[derive(Serialize)]
        struct Params<'a> {
            upload_id: &'a str,
            #[serde(flatten)]
            options: &'a WriteOptions,
            #[serde(skip_serializing_if = "Option::is_none")]
            locale: Option<&'a str>,
        }

        let res = self
            .content_path_req(Method::POST, "commit_chunked_upload", path)
            .await?
            .query(&Params {
                upload_id: session.upload_id().unwrap_or_default(),
                options,
                locale: self.config().locale.as_deref(),
            })
            .send()
            .await?;

        read_json(res).await
    }
}

/// Upload one chunk, retrying up to `max_retries` attempts in total.
///
/// Returns the session reported by the first successful attempt. If every
/// attempt fails, the error of the last one is returned wrapped in
/// [`Error::RetriesExhausted`].
///
/// # Errors
///
/// - `max_retries` is zero or the chunk is empty
/// - every attempt failed
#[instrument(level = "debug", skip(api, chunk, session), fields(position = chunk.position, len = chunk.len()))]
pub async fn upload_chunk_with_retry<U: ChunkedUpload + ?Sized>(
    api: &U,
    chunk: &Chunk,
    session: &UploadSession,
    max_retries: u32,
) -> crate::Result<UploadSession> {
    if max_retries == 0 {
        return Err(Error::InvalidArgument("max_retries must be positive"));
    }

    if chunk.is_empty() {
        return Err(Error::InvalidArgument("refusing to upload an empty chunk"));
    }

    let mut attempt = 1;

    loop {
        match api.upload_chunk(chunk, session).await {
            Ok(next) => return Ok(next),
            Err(e) if attempt < max_retries => {
                warn!("attempt {attempt}/{max_retries} failed: {e}");
                attempt += 1;
            }
            Err(e) => {
                warn!("attempt {attempt}/{max_retries} failed, giving up: {e}");

                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
        }
    }
}

/// Read until `buf` is full or the source ends. Returns the number of
/// bytes read.
async fn fill<R: AsyncRead + Unpin>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;

        if n == 0 {
            break;
        }

        filled += n;
    }

    Ok(filled)
}

/// Upload everything `source` yields to `path`, in chunks of
/// `options.chunk_size` bytes, and commit it.
///
/// The source is consumed and dropped before this function returns,
/// whether it succeeds or not. An empty source results in a single commit
/// with an empty upload id.
///
/// # Errors
///
/// Stops at the first error:
///
/// - invalid options or an empty path
/// - [`Error::StreamRead`] if the source fails
/// - [`Error::RetriesExhausted`] if a chunk fails too many times
/// - [`Error::Commit`] if the final commit fails
#[instrument(skip(api, source, options), fields(chunk_size = options.chunk_size))]
pub async fn upload_stream<U, R>(
    api: &U,
    mut source: R,
    path: &str,
    options: &UploadOptions,
) -> crate::Result<Metadata>
where
    U: ChunkedUpload + ?Sized,
    R: AsyncRead + Unpin,
{
    require(path, "path is required")?;

    if options.chunk_size == 0 {
        return Err(Error::InvalidArgument("chunk_size must be positive"));
    }

    if options.max_retries == 0 {
        return Err(Error::InvalidArgument("max_retries must be positive"));
    }

    let mut session = UploadSession::new();
    let mut position = 0;
    let mut chunks = 0;

    loop {
        let mut buf = vec![0; options.chunk_size];
        let n = fill(&mut source, &mut buf)
            .await
            .map_err(Error::StreamRead)?;

        if n == 0 {
            break;
        }

        buf.truncate(n);

        let chunk = Chunk {
            position,
            data: Bytes::from(buf),
        };

        session = upload_chunk_with_retry(api, &chunk, &session, options.max_retries).await?;
        position += chunk.len() as u64;
        chunks += 1;

        if session.offset() != position {
            warn!(
                server = session.offset(),
                local = position,
                "server offset differs from bytes read, trusting the server"
            );
        }

        if n < options.chunk_size {
            break;
        }
    }

    drop(source);

    debug!("uploaded {position} bytes in {chunks} chunks, committing");

    api.commit(path, &session, &options.commit)
        .await
        .map_err(|e| Error::Commit(Box::new(e)))
}

impl<S: TokenStore> Client<S> {
    /// Upload a stream in chunks. See [`upload_stream`].
    ///
    /// # Errors
    ///
    /// See [`upload_stream`].
    pub async fn upload_stream<R: AsyncRead + Unpin>(
        &self,
        source: R,
        path: &str,
        options: &UploadOptions,
    ) -> crate::Result<Metadata> {
        upload_stream(self, source, path, options).await
    }

    /// Upload a local file in chunks. See [`upload_stream`].
    ///
    /// # Errors
    ///
    /// - the local file cannot be opened
    /// - see [`upload_stream`]
    pub async fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        path: &str,
        options: &UploadOptions,
    ) -> crate::Result<Metadata> {
        let file = tokio::fs::File::open(local_path).await?;

        upload_stream(self, file, path, options).await
    }

    /// Upload a single chunk. One attempt, no retries.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - unknown or expired upload id, or wrong offset
    pub async fn chunked_upload(
        &self,
        chunk: &Chunk,
        session: &UploadSession,
    ) -> crate::Result<UploadSession> {
        ChunkedUpload::upload_chunk(self, chunk, session).await
    }

    /// Commit an upload session to `path`.
    ///
    /// # Errors
    ///
    /// - network errors
    /// - unknown or expired upload id
    pub async fn commit_chunked_upload(
        &self,
        path: &str,
        session: &UploadSession,
        options: &WriteOptions,
    ) -> crate::Result<Metadata> {
        ChunkedUpload::commit(self, path, session, options).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        io,
        pin::Pin,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        task::{Context, Poll},
    };

    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

    use super::{
        upload_chunk_with_retry, upload_stream, Chunk, ChunkedUpload, UploadOptions, UploadSession,
    };
    use crate::{api::ApiError, metadata::Metadata, Error, WriteOptions};

    /// In-memory stand-in for the chunk and commit endpoints.
    #[derive(Debug, Default)]
    struct FakeApi {
        /// Outcome of each upcoming chunk attempt; `true` fails. Attempts
        /// beyond the script succeed.
        script: Mutex<VecDeque<bool>>,
        /// Added to every offset the fake server reports.
        skew: u64,
        fail_commit: bool,
        calls: Mutex<Vec<(usize, UploadSession)>>,
        commits: Mutex<Vec<(String, UploadSession, bool)>>,
    }

    impl FakeApi {
        fn scripted(script: impl IntoIterator<Item = bool>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(usize, UploadSession)> {
            self.calls.lock().unwrap().clone()
        }

        fn commits(&self) -> Vec<(String, UploadSession, bool)> {
            self.commits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChunkedUpload for FakeApi {
        async fn upload_chunk(
            &self,
            chunk: &Chunk,
            session: &UploadSession,
        ) -> crate::Result<UploadSession> {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((chunk.len(), session.clone()));
                calls.len()
            };

            if self.script.lock().unwrap().pop_front().unwrap_or(false) {
                return Err(ApiError {
                    status: 500,
                    message: format!("attempt {n} failed"),
                }
                .into());
            }

            Ok(UploadSession::resume(
                format!("session-{n}"),
                session.offset() + chunk.len() as u64 + self.skew,
            ))
        }

        async fn commit(
            &self,
            path: &str,
            session: &UploadSession,
            options: &WriteOptions,
        ) -> crate::Result<Metadata> {
            self.commits
                .lock()
                .unwrap()
                .push((path.to_owned(), session.clone(), options.overwrite));

            if self.fail_commit {
                return Err(ApiError {
                    status: 404,
                    message: "no such upload".into(),
                }
                .into());
            }

            Ok(serde_json::from_value(serde_json::json!({
                "path": path,
                "bytes": session.offset(),
            }))
            .unwrap())
        }
    }

    /// Counts how many times the wrapped reader is dropped.
    struct Tracked<R> {
        inner: R,
        drops: Arc<AtomicUsize>,
    }

    impl<R> Tracked<R> {
        fn new(inner: R) -> (Self, Arc<AtomicUsize>) {
            let drops = Arc::new(AtomicUsize::new(0));

            (
                Self {
                    inner,
                    drops: drops.clone(),
                },
                drops,
            )
        }
    }

    impl<R> Drop for Tracked<R> {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl<R: AsyncRead + Unpin> AsyncRead for Tracked<R> {
        fn poll_read(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
        }
    }

    /// A reader that always fails.
    struct Broken;

    impl AsyncRead for Broken {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")))
        }
    }

    /// Yields at most `step` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl AsyncRead for Trickle<'_> {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let n = this.step.min(this.data.len()).min(buf.remaining());
            buf.put_slice(&this.data[..n]);
            this.data = &this.data[n..];
            Poll::Ready(Ok(()))
        }
    }

    fn chunk(len: usize) -> Chunk {
        Chunk {
            position: 0,
            data: Bytes::from(vec![7; len]),
        }
    }

    #[tokio::test]
    async fn chunk_count_is_ceil_of_length_over_chunk_size() {
        for chunk_size in [1, 3, 7, 64, 100] {
            for len in [0, 1, 6, 7, 8, 99, 100, 101, 250] {
                let api = FakeApi::default();
                let data = vec![1; len];

                upload_stream(&api, &data[..], "/f", &UploadOptions::new(chunk_size, 1))
                    .await
                    .unwrap();

                assert_eq!(
                    api.calls().len(),
                    (len + chunk_size - 1) / chunk_size,
                    "len {len}, chunk size {chunk_size}"
                );
                assert_eq!(api.commits().len(), 1);
            }
        }
    }

    #[tokio::test]
    async fn succeeds_on_last_attempt() {
        for k in 1..=5 {
            let api = FakeApi::scripted((1..k).map(|_| true));

            let session = upload_chunk_with_retry(&api, &chunk(10), &UploadSession::new(), k)
                .await
                .unwrap();

            assert_eq!(api.calls().len(), k as usize);
            assert_eq!(session.offset(), 10);
            assert_eq!(session.upload_id(), Some(format!("session-{k}").as_str()));
        }
    }

    #[tokio::test]
    async fn stops_retrying_after_success() {
        let api = FakeApi::scripted([true, false, true]);

        upload_chunk_with_retry(&api, &chunk(4), &UploadSession::new(), 5)
            .await
            .unwrap();

        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_keep_last_error() {
        let api = FakeApi::scripted([true; 3]);

        let err = upload_chunk_with_retry(&api, &chunk(4), &UploadSession::new(), 3)
            .await
            .unwrap_err();

        assert_eq!(api.calls().len(), 3);

        match err {
            Error::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.to_string(), "dropbox error: attempt 3 failed (status 500)");
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn rejects_bad_arguments() {
        let api = FakeApi::default();

        assert!(matches!(
            upload_chunk_with_retry(&api, &chunk(0), &UploadSession::new(), 1).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            upload_chunk_with_retry(&api, &chunk(1), &UploadSession::new(), 0).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            upload_stream(&api, &b"abc"[..], "/f", &UploadOptions::new(0, 1)).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            upload_stream(&api, &b"abc"[..], "", &UploadOptions::new(1, 1)).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(api.calls().is_empty());
        assert!(api.commits().is_empty());
    }

    #[tokio::test]
    async fn failed_chunk_aborts_upload() {
        // first chunk fine, second chunk fails both attempts
        let api = FakeApi::scripted([false, true, true]);
        let data = vec![0; 30];

        let err = upload_stream(&api, &data[..], "/f", &UploadOptions::new(10, 2))
            .await
            .unwrap_err();

        assert!(err.is_retries_exhausted());
        assert_eq!(err.code(), Some(500));
        assert_eq!(api.calls().len(), 3);
        assert!(api.commits().is_empty());
    }

    #[tokio::test]
    async fn session_is_threaded_from_the_server() {
        let api = FakeApi {
            skew: 1000,
            ..FakeApi::default()
        };
        let data = vec![0; 25];

        upload_stream(&api, &data[..], "/f", &UploadOptions::new(10, 1))
            .await
            .unwrap();

        let calls = api.calls();
        assert_eq!(calls[0].1, UploadSession::new());
        assert_eq!(calls[1].1, UploadSession::resume("session-1", 1010));
        assert_eq!(calls[2].1, UploadSession::resume("session-2", 2020));

        let commits = api.commits();
        assert_eq!(commits[0].1, UploadSession::resume("session-3", 3025));
    }

    #[tokio::test]
    async fn retried_chunk_reuses_previous_session() {
        let api = FakeApi::scripted([false, true, false]);
        let data = vec![0; 20];

        upload_stream(&api, &data[..], "/f", &UploadOptions::new(10, 2))
            .await
            .unwrap();

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].1, calls[2].1);
        assert_eq!(api.commits()[0].1, UploadSession::resume("session-3", 20));
    }

    #[tokio::test]
    async fn end_to_end_three_chunks() {
        let api = FakeApi::default();
        let data = vec![42; 25_000];

        let meta = upload_stream(&api, &data[..], "/big.bin", &UploadOptions::new(10_240, 2))
            .await
            .unwrap();

        let sizes: Vec<_> = api.calls().iter().map(|(len, _)| *len).collect();
        assert_eq!(sizes, vec![10_240, 10_240, 4520]);

        let commits = api.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].0, "/big.bin");
        assert_eq!(commits[0].1.upload_id(), Some("session-3"));
        assert!(commits[0].2);
        assert_eq!(meta.bytes, 25_000);
    }

    #[tokio::test]
    async fn empty_source_commits_without_upload_id() {
        let api = FakeApi::default();

        upload_stream(&api, tokio::io::empty(), "/empty", &UploadOptions::new(1024, 2))
            .await
            .unwrap();

        assert!(api.calls().is_empty());

        let commits = api.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].1.upload_id(), None);
        assert_eq!(commits[0].1.offset(), 0);
    }

    #[tokio::test]
    async fn short_reads_still_fill_chunks() {
        let api = FakeApi::default();
        let data = vec![1; 25];

        upload_stream(
            &api,
            Trickle {
                data: &data,
                step: 3,
            },
            "/f",
            &UploadOptions::new(10, 1),
        )
        .await
        .unwrap();

        let sizes: Vec<_> = api.calls().iter().map(|(len, _)| *len).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn read_error_after_some_chunks() {
        let api = FakeApi::default();
        let data = vec![0; 20];
        let (source, drops) = Tracked::new((&data[..]).chain(Broken));

        let err = upload_stream(&api, source, "/f", &UploadOptions::new(10, 3))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StreamRead(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(api.calls().len(), 2);
        assert!(api.commits().is_empty());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn commit_failure_is_wrapped() {
        let api = FakeApi {
            fail_commit: true,
            ..FakeApi::default()
        };
        let (source, drops) = Tracked::new(&b"hello"[..]);

        let err = upload_stream(&api, source, "/f", &UploadOptions::new(10, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Commit(_)));
        assert_eq!(err.code(), Some(404));
        assert_eq!(api.calls().len(), 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn source_is_released_once_on_every_path() {
        let data = vec![0; 15];

        // success
        let api = FakeApi::default();
        let (source, drops) = Tracked::new(&data[..]);
        upload_stream(&api, source, "/f", &UploadOptions::new(10, 1))
            .await
            .unwrap();
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        // chunk failure
        let api = FakeApi::scripted([true]);
        let (source, drops) = Tracked::new(&data[..]);
        upload_stream(&api, source, "/f", &UploadOptions::new(10, 1))
            .await
            .unwrap_err();
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        // rejected before reading
        let api = FakeApi::default();
        let (source, drops) = Tracked::new(&data[..]);
        upload_stream(&api, source, "/f", &UploadOptions::new(0, 1))
            .await
            .unwrap_err();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn commit_options_are_passed_through() {
        let api = FakeApi::default();
        let options = UploadOptions::new(4, 1).commit(WriteOptions {
            overwrite: false,
            parent_rev: Some("abc".into()),
        });

        upload_stream(&api, &b"12345678"[..], "/f", &options)
            .await
            .unwrap();

        let commits = api.commits();
        assert!(!commits[0].2);
        assert_eq!(commits[0].1.upload_id(), Some("session-2"));
        assert_eq!(api.calls().len(), 2);
    }
}
