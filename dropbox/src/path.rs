//! Roots and paths.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::Error;

/// The namespace paths are resolved against.
///
/// ```
/// use dropbox::path::Root;
/// use std::str::FromStr;
///
/// assert_eq!(Root::from_str("sandbox").unwrap(), Root::Sandbox);
/// assert_eq!(Root::Dropbox.to_string(), "dropbox");
/// assert!(Root::from_str("home").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Root {
    /// The app folder of an app with app folder access.
    Sandbox,
    /// The whole Dropbox of an app with full access.
    Dropbox,
    /// Let Dropbox pick based on the app's access type.
    #[default]
    Auto,
}

/// Reject empty paths.
pub(crate) fn require(path: &str, what: &'static str) -> crate::Result<()> {
    if path.is_empty() {
        Err(Error::InvalidArgument(what))
    } else {
        Ok(())
    }
}

/// Build `<base>/<endpoint>/<root>/<path>`, escaping each path segment.
///
/// ```txt
/// https://api.dropbox.com/1/ + metadata + sandbox + /photos/cat 1.jpg
///   = https://api.dropbox.com/1/metadata/sandbox/photos/cat%201.jpg
/// ```
pub(crate) fn root_path_url(
    base: &Url,
    endpoint: &str,
    root: Root,
    path: &str,
) -> crate::Result<Url> {
    require(path, "path is required")?;

    let mut url = base.join(endpoint)?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| Error::InvalidArgument("base url cannot be a base"))?;

        segments.pop_if_empty().push(root.as_ref());

        let mut parts = path.split('/').filter(|s| !s.is_empty()).peekable();

        if parts.peek().is_none() {
            // the root folder itself: `<endpoint>/<root>/`
            segments.push("");
        } else {
            segments.extend(parts);
        }
    }

    Ok(url)
}
