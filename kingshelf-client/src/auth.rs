use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Client for the external credential-check service behind the login screen.
///
/// There is no token or refresh lifecycle: a successful login returns the
/// service's user payload verbatim, and that payload is only ever persisted
/// opaquely in the session store.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(base_url: Url) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, base_url }
    }

    /// Check a username/password pair against the auth service.
    ///
    /// A rejected credential maps to [`ApiError::InvalidCredentials`]; the
    /// caller deliberately cannot tell an unknown user from a wrong password.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let url = format!(
            "{}/login",
            self.base_url.as_str().trim_end_matches('/')
        );
        tracing::debug!(%url, username, "attempting login");

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN => {
                tracing::warn!(username, %status, "login rejected");
                Err(ApiError::InvalidCredentials)
            }
            status if !status.is_success() => Err(ApiError::Status { status }),
            _ => {
                let body = response.text().await?;
                serde_json::from_str(&body).map_err(ApiError::Parse)
            }
        }
    }
}
