//! reqkit - an options-struct convenience layer over reqwest
//!
//! One [`Client`] wraps a reqwest connection pool and, optionally, a cookie
//! jar shared with the transport. Each call takes a [`RequestOptions`] value
//! describing URL, query parameters, body and headers; jar contents can be
//! read and written natively or moved in and out as JSON.

pub mod client;
pub mod cookies;
pub mod encode;
pub mod error;
pub mod options;
pub mod response;

pub use client::{Client, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use cookies::CookieRecord;
pub use error::{Error, Result};
pub use options::{Headers, Params, RequestOptions};
pub use response::Response;

/// Re-export of the native cookie type handled by the jar bridge.
pub use cookie::Cookie;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
