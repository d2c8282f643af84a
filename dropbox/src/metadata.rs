//! Response types.
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use strum::{AsRefStr, Display, EnumString};
use time::OffsetDateTime;

use crate::serde::OptRfc2822;

/// Storage quota, in bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaInfo {
    /// Bytes used by shared folders.
    pub shared: u64,
    /// Total quota.
    pub quota: u64,
    /// Bytes used by the user's own files.
    pub normal: u64,
}

/// Information about the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Referral link.
    pub referral_link: String,
    /// Name of the user.
    pub display_name: String,
    /// User id.
    pub uid: u64,
    /// Two-letter country code, if known.
    #[serde(default)]
    pub country: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Quota information.
    pub quota_info: QuotaInfo,
}

/// Metadata of a file or folder.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Human-readable size, e.g. `225.4KB`.
    #[serde(default)]
    pub size: String,
    /// Size in bytes.
    #[serde(default)]
    pub bytes: u64,
    /// Path, with the casing the user last used.
    pub path: String,
    /// Whether this is a folder.
    #[serde(default)]
    pub is_dir: bool,
    /// Whether the entry has been deleted. Only reported when deleted
    /// entries were asked for.
    #[serde(default)]
    pub is_deleted: bool,
    /// Unique revision identifier, used as `parent_rev` or `rev`.
    #[serde(default)]
    pub rev: Option<String>,
    /// Legacy numeric revision.
    #[serde(default)]
    pub revision: Option<u64>,
    /// Folder hash, only for folders. Pass it back to
    /// [`metadata`](crate::Client::metadata) to avoid refetching
    /// unchanged listings.
    #[serde(default)]
    pub hash: Option<String>,
    /// Whether a thumbnail can be generated.
    #[serde(default)]
    pub thumb_exists: bool,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// Root the path is relative to.
    #[serde(default)]
    pub root: Option<String>,
    /// MIME type, only for files.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Last modification on Dropbox.
    #[serde_as(as = "OptRfc2822")]
    #[serde(default)]
    pub modified: Option<OffsetDateTime>,
    /// Modification time set by the uploading client.
    #[serde_as(as = "OptRfc2822")]
    #[serde(default)]
    pub client_mtime: Option<OffsetDateTime>,
    /// Folder contents, if listed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Metadata>,
}

/// A downloaded file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Metadata, taken from the `x-dropbox-metadata` header.
    pub metadata: Metadata,
    /// File contents.
    pub data: Bytes,
}

/// One change in a [`DeltaPage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "(String, Option<Metadata>)", into = "(String, Option<Metadata>)")]
pub struct DeltaEntry {
    /// Lowercased path of the entry.
    pub path: String,
    /// New metadata, or `None` if the entry was deleted.
    pub metadata: Option<Metadata>,
}

impl From<(String, Option<Metadata>)> for DeltaEntry {
    fn from((path, metadata): (String, Option<Metadata>)) -> Self {
        Self { path, metadata }
    }
}

impl From<DeltaEntry> for (String, Option<Metadata>) {
    fn from(entry: DeltaEntry) -> Self {
        (entry.path, entry.metadata)
    }
}

/// A page of changes returned by [`delta`](crate::Client::delta).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaPage {
    /// Changes, in order.
    pub entries: Vec<DeltaEntry>,
    /// Whether local state must be cleared before applying `entries`.
    pub reset: bool,
    /// Cursor to pass to the next call.
    pub cursor: String,
    /// Whether more entries are available right away.
    pub has_more: bool,
}

/// A link to a file or folder.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedLink {
    /// The link.
    pub url: String,
    /// When the link stops working.
    #[serde_as(as = "OptRfc2822")]
    #[serde(default)]
    pub expires: Option<OffsetDateTime>,
}

/// A reference that lets another user copy a file into their Dropbox.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyRef {
    /// The reference.
    pub copy_ref: String,
    /// Expiration date.
    #[serde_as(as = "OptRfc2822")]
    #[serde(default)]
    pub expires: Option<OffsetDateTime>,
}

/// Thumbnail image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[allow(missing_docs)]
pub enum ThumbnailFormat {
    #[default]
    Jpeg,
    Png,
}

/// Thumbnail bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ThumbnailSize {
    /// 32x32
    Xs,
    /// 64x64
    #[default]
    S,
    /// 128x128
    M,
    /// 640x480
    L,
    /// 1024x768
    Xl,
}
