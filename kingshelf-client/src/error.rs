use reqwest::StatusCode;
use thiserror::Error;

/// Failure taxonomy for remote calls.
///
/// Callers treat `Network` and `Status` alike (a round trip that never
/// produced a usable body), `Parse` as a shape mismatch after a successful
/// read, and `InvalidCredentials` as the one auth-specific rejection the
/// login screen surfaces to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed")]
    Network(#[from] reqwest::Error),
    #[error("server returned {status}")]
    Status { status: StatusCode },
    #[error("unexpected response shape")]
    Parse(#[source] serde_json::Error),
    #[error("invalid username or password")]
    InvalidCredentials,
}
