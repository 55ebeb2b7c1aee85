//! Farm API client implementation.
//!
//! [`FarmClient`] is the only component that performs network I/O against the
//! backend. It builds URLs, attaches the session credential, serializes
//! bodies, and classifies failures. A 401 clears the session before the error
//! is returned; navigating to the login screen is left to the caller's error
//! boundary.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::error::{detail_message, ApiError, Result};
use super::types::{unwrap_list, LoginRequest, LoginResponse, RequestOptions, User};
use crate::session::SessionStore;

/// How the client treats a failed server-side logout.
///
/// The local session is always cleared; the server call is a courtesy
/// notification whose failure is reported but never raised.
#[derive(Debug)]
pub enum LogoutOutcome {
    /// The server acknowledged the logout.
    Confirmed,
    /// The server call failed; only the local session was cleared.
    LocalOnly(ApiError),
}

impl LogoutOutcome {
    /// Whether the server acknowledged the logout.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, LogoutOutcome::Confirmed)
    }
}

/// The farm API client.
///
/// Cheap to clone: clones share the HTTP connection pool and the session.
#[derive(Debug, Clone)]
pub struct FarmClient {
    /// The HTTP client.
    client: Client,
    /// Base URL including the API prefix, without a trailing slash.
    base_url: String,
    /// Where the credential comes from and goes to.
    session: SessionStore,
}

impl FarmClient {
    /// Create a client for the given API base URL.
    ///
    /// No timeout is configured; the transport default applies.
    pub fn new(base_url: &str, session: SessionStore) -> Result<Self> {
        let client = Client::builder().build().map_err(ApiError::Network)?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            session,
        })
    }

    /// The session this client reads its credential from.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and decode the JSON response as `T`.
    ///
    /// A 204 response decodes `T` from an empty JSON object without reading
    /// the body. Errors carry the server's `detail` message.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let headers = self.build_headers(&options)?;

        let mut builder = self
            .client
            .request(options.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &options.body {
            builder = builder.body(serde_json::to_vec(body).map_err(ApiError::Serialize)?);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", endpoint, e);
            ApiError::Network(e)
        })?;

        self.handle_response(response).await
    }

    /// GET a collection endpoint and normalize it to a plain sequence.
    pub async fn list<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let value: Value = self.request(endpoint, RequestOptions::get()).await?;
        let items = unwrap_list(value)?;
        debug!("Fetched {} records from {}", items.len(), endpoint);
        Ok(items)
    }

    /// GET a single resource.
    pub(crate) async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(endpoint, RequestOptions::get()).await
    }

    /// POST a JSON body.
    pub(crate) async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.request(endpoint, RequestOptions::post().json(body)?).await
    }

    /// POST with no body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(endpoint, RequestOptions::post()).await
    }

    /// PATCH a JSON body.
    pub(crate) async fn patch<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.request(endpoint, RequestOptions::patch().json(body)?).await
    }

    /// Log in with a phone number and password.
    ///
    /// The returned token is stored in the session before this returns, so
    /// the caller can fetch the profile right away and then finish the
    /// handshake with [`SessionStore::set_auth`].
    #[instrument(skip(self, secret))]
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<LoginResponse> {
        info!("Logging in");
        let response: LoginResponse = self
            .post(
                "/auth/login/",
                &LoginRequest {
                    username: identifier,
                    password: secret,
                },
            )
            .await?;
        self.session.set_credential(Some(&response.token));
        Ok(response)
    }

    /// Run the full login handshake.
    ///
    /// Stores the token, fetches the profile with that token attached, then
    /// records both in the session. If the profile cannot be fetched the
    /// token is dropped again so no half-finished session is left behind.
    #[instrument(skip(self, secret))]
    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<User> {
        let response = self.login(identifier, secret).await?;
        let user = match self.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!("Profile fetch after login failed: {}", e);
                self.session.clear_auth();
                return Err(e);
            }
        };
        self.session.set_auth(user.clone(), &response.token);
        Ok(user)
    }

    /// Log out, clearing the local session whatever the server says.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> LogoutOutcome {
        let result = self.post_empty::<Value>("/auth/logout/").await;
        self.session.clear_auth();
        match result {
            Ok(_) => LogoutOutcome::Confirmed,
            Err(e) => {
                debug!("Server logout failed, cleared local session only: {}", e);
                LogoutOutcome::LocalOnly(e)
            }
        }
    }

    /// Get the authenticated user's profile.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User> {
        self.get("/auth/me/").await
    }

    fn build_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if let Some(token) = self.session.credential() {
            let mut value = HeaderValue::from_str(&format!("Token {}", token))
                .map_err(|_| ApiError::InvalidHeader("credential".to_string()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// Handle the HTTP response, checking for errors and parsing JSON.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Object(Default::default()))
                .map_err(|e| ApiError::InvalidResponse(format!("empty response: {}", e)));
        }

        if status.is_success() {
            let bytes = response.bytes().await?;
            return serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Error response body: {}", body);
        let message = detail_message(&body);

        if status == StatusCode::UNAUTHORIZED {
            warn!("Credential rejected by server, clearing session");
            self.session.clear_auth();
        }

        Err(ApiError::from_status(status, message))
    }
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Warn if not HTTPS (but don't enforce for localhost/testing)
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_removes_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://farm.example.com/api/v1/"),
            "https://farm.example.com/api/v1"
        );
    }

    #[test]
    fn test_normalize_base_url_handles_multiple_slashes() {
        assert_eq!(
            normalize_base_url("http://localhost:8021/api/v1///"),
            "http://localhost:8021/api/v1"
        );
    }

    #[test]
    fn test_authorization_header_attached_when_logged_in() {
        let session = SessionStore::in_memory();
        session.set_credential(Some("abc123"));
        let client = FarmClient::new("http://localhost:8021/api/v1", session).unwrap();

        let headers = client.build_headers(&RequestOptions::get()).unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Token abc123");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_no_authorization_header_when_logged_out() {
        let client =
            FarmClient::new("http://localhost:8021/api/v1", SessionStore::in_memory()).unwrap();
        let headers = client.build_headers(&RequestOptions::get()).unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_caller_headers_override_defaults() {
        let client =
            FarmClient::new("http://localhost:8021/api/v1", SessionStore::in_memory()).unwrap();
        let options = RequestOptions::get()
            .header("Content-Type", "text/plain")
            .header("X-Device-Id", "tablet-1");
        let headers = client.build_headers(&options).unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers["x-device-id"], "tablet-1");
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let client =
            FarmClient::new("http://localhost:8021/api/v1", SessionStore::in_memory()).unwrap();
        let options = RequestOptions::get().header("bad header", "x");
        assert!(matches!(
            client.build_headers(&options),
            Err(ApiError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_logout_outcome() {
        assert!(LogoutOutcome::Confirmed.is_confirmed());
        assert!(!LogoutOutcome::LocalOnly(ApiError::InvalidResponse(String::new())).is_confirmed());
    }
}
