//! Remote access and local persistence for the Kingshelf catalog browser.
//!
//! Everything that touches the network or the filesystem lives here: the
//! catalog client, the auth client, the DTO layer that absorbs the remote
//! API's response-shape drift, and the session store read at startup.

pub mod auth;
pub mod catalog;
mod dto;
pub mod error;
pub mod session;

pub use auth::AuthClient;
pub use catalog::CatalogClient;
pub use error::ApiError;
pub use session::{Session, SessionStore};
