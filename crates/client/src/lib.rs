//! HTTP client for the rental API.
//!
//! [`Client`] wraps the JSON endpoints with typed calls; [`Session`] keeps the
//! bearer token across restarts.

pub use client::Client;
pub use dates::normalize_dates;
pub use error::{ClientError, Result};
pub use session::{Session, SessionClaims};

mod client;
mod dates;
mod error;
mod session;
