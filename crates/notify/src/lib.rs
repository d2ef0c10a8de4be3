//! Build-lifecycle chat notifications.
//!
//! This crate turns a CI build outcome into a chat message and posts it to
//! the messaging service's `chat.postMessage` endpoint. The host build server
//! decides when to notify and supplies the build data and configuration.
//!
//! # Usage
//!
//! ```no_run
//! use build_notify::{BuildOutcome, Commit, Delivery, NotificationConfig, Notifier, Severity};
//!
//! # async fn run() -> Result<(), build_notify::NotifyError> {
//! let config = NotificationConfig::new("#builds")
//!     .with_token("xoxb-...")
//!     .with_bot_name("Build Bot");
//!
//! let outcome = BuildOutcome::new("SUCCESS", "agent-1", Severity::Good)
//!     .with_description("My Project :: Build #42")
//!     .with_commits(vec![Commit::new(Some("abcdef1234567"), "alice", "fix bug")]);
//!
//! let notifier = Notifier::new(config)?;
//! match notifier.send(Some(&outcome)).await {
//!     Delivery::Sent(response) => println!("status {}", response.status),
//!     Delivery::Skipped(reason) => println!("skipped: {reason:?}"),
//!     Delivery::Failed(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`payload`] builds the attachment from a [`BuildOutcome`]
//! - [`Notifier`] assembles the request and hands it to a [`Transport`]
//! - [`ReqwestTransport`] performs the single POST, optionally via a proxy

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod outcome;
pub mod payload;
pub mod sender;
pub mod transport;

pub use config::{NotificationConfig, ProxyConfig, QueryParam};
pub use error::NotifyError;
pub use outcome::{BuildOutcome, Commit, Severity};
pub use payload::{build_attachment, Attachment, Field};
pub use sender::{Delivery, Notifier, SkipReason};
pub use transport::{OutboundRequest, RequestBody, ReqwestTransport, Response, Transport};
