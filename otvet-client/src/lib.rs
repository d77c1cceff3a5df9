// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # otvet Client
//!
//! Async client for the otvet.mail.ru Q&A service.
//!
//! The service has no documented API; this crate speaks the wire protocol
//! of the site itself. It provides:
//!
//! ## Client
//!
//! - [`OtvetClient`] - Sessions, listings, search and mutations
//! - [`OtvetClientBuilder`] - Base URLs, timeout, retry and renewal knobs
//! - [`AuthSnapshot`] - Exported session for password-less restarts
//!
//! ## Listings
//!
//! - [`Pages`] - Lazy forward-only pager over a listing
//! - [`PageRequest`] - One window of a listing, for single-page calls
//! - [`LiveFeed`] / [`LiveOptions`] - Polling feed of newly asked questions
//!
//! ## Errors
//!
//! - [`OtvetError`] - Argument, authentication, API and transport failures
//! - [`RetryPolicy`] - Budget and backoff for connection-level retries
//!
//! ## Example
//!
//! ```ignore
//! use otvet_client::{OtvetClient, QuestionFilter};
//!
//! let client = OtvetClient::new()?;
//! let mut pages = client.questions(QuestionFilter::default(), 20);
//! while let Some(page) = pages.try_next().await? {
//!     for question in page {
//!         println!("{} {}", question.question.id, question.question.title);
//!     }
//! }
//! ```

// Core modules
pub mod client;
pub mod error;
pub mod live;
pub mod paging;
pub mod retry;
pub mod session;

// Internal plumbing
mod call;
mod cookies;
mod wire;

// Re-export key types at crate root

// Client
pub use client::{
    AskOptions, DEFAULT_AUTH_URL, DEFAULT_BASE_URL, OtvetClient, OtvetClientBuilder,
    QuestionFilter, SearchOptions,
};
pub use session::AuthSnapshot;

// Listings
pub use live::{LiveFeed, LiveOptions};
pub use paging::{PageRequest, Pages};

// Errors and retries
pub use error::OtvetError;
pub use retry::RetryPolicy;
