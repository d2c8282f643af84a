//! Authentication and authorization.
//!
//! Every request is signed with an OAuth 2 bearer token obtained from a
//! [`TokenStore`]. Obtaining the token in the first place is up to the
//! caller; [`authorize_url`] builds the page to send users to.
use std::fmt::Debug;

use async_trait::async_trait;
use derive_more::Display;
use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use tracing::trace;

static AUTHORIZE_URL: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://www.dropbox.com/1/oauth2/authorize").expect("valid authorize url")
});

/// A [`TokenStore`] manages authentication tokens.
#[async_trait]
pub trait TokenStore: Debug + Send + Sync {
    /// Get the cached access token or renew it if it needs to be renewed.
    async fn get_access_token(&self, client: &Client) -> crate::Result<AccessToken>;
}

#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    async fn get_access_token(&self, client: &Client) -> crate::Result<AccessToken> {
        (**self).get_access_token(client).await
    }
}

/// An access token used to authenticate with all Dropbox services.
#[derive(Clone, Display, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Construct a new access token.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Credentials obtained through the OAuth 2 token flow.
#[derive(Debug, Clone)]
pub struct OAuth2 {
    access_token: AccessToken,
    /// Token type, always `bearer` for Dropbox.
    pub token_type: String,
    /// Dropbox user id the token belongs to, if known.
    pub uid: Option<String>,
}

impl OAuth2 {
    /// Wrap an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken::new(access_token),
            token_type: "bearer".into(),
            uid: None,
        }
    }

    /// Set the user id.
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }
}

#[async_trait]
impl TokenStore for OAuth2 {
    async fn get_access_token(&self, _client: &Client) -> crate::Result<AccessToken> {
        trace!("using static access token");

        Ok(self.access_token.clone())
    }
}

/// Build the URL users visit to grant the app access. After approval,
/// Dropbox redirects to `redirect_uri` with the access token in the
/// fragment.
///
/// ```
/// let url = dropbox::auth::authorize_url("my-app", "https://example.com/cb");
///
/// assert_eq!(
///     url.as_str(),
///     "https://www.dropbox.com/1/oauth2/authorize?response_type=token&client_id=my-app&redirect_uri=https%3A%2F%2Fexample.com%2Fcb"
/// );
/// ```
#[must_use]
pub fn authorize_url(app_key: &str, redirect_uri: &str) -> Url {
    let mut url = AUTHORIZE_URL.clone();

    url.query_pairs_mut()
        .append_pair("response_type", "token")
        .append_pair("client_id", app_key)
        .append_pair("redirect_uri", redirect_uri);

    url
}

#[cfg(test)]
mod tests {
    use reqwest::Client;

    use super::{OAuth2, TokenStore};

    #[tokio::test]
    async fn static_token() {
        let store: Box<dyn TokenStore> = Box::new(OAuth2::new("abc").with_uid("12345"));
        let token = store.get_access_token(&Client::new()).await.unwrap();

        assert_eq!(token.to_string(), "abc");
        assert_eq!(format!("{token:?}"), "AccessToken(..)");
    }
}
