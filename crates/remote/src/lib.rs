//! # remote
//!
//! Authenticated calls to remote platforms with classified failures.
//!
//! Two backends implement [`RemoteClient`]:
//! - [`GhCli`]: GitHub through the `gh` CLI (argument vector + JSON stdin)
//! - [`HttpClient`]: bearer-token JSON APIs with a v4 response envelope
//!
//! ## Quick Start
//!
//! ```no_run
//! use remote::{GhCli, RemoteClient, Request};
//!
//! let gh = GhCli::new();
//! let hooks = gh.call(&Request::get("repos/octocat/hello-world/hooks"))?;
//! # Ok::<(), remote::Error>(())
//! ```
//!
//! Every failure is an [`Error`] whose [`Error::category`] tells a conflict
//! (already applied) apart from a rejection, so callers never match on raw
//! message text.

pub mod client;
pub mod error;
pub mod gh;
pub mod http;

pub use client::{Method, RemoteClient, Request, parse_body};
pub use error::{Error, ErrorCategory, Result, is_idempotency_marker};
pub use gh::GhCli;
pub use http::HttpClient;
