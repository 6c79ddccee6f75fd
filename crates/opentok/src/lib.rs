//! Server-side OpenTok client library.
//!
//! This library lets an application server act as the trusted party between
//! its own users and the OpenTok video platform:
//!
//! - Mint signed session-access tokens locally (no network round trip)
//! - Create sessions on the OpenTok backend
//! - Drive the archive (recording) lifecycle: start, get, list, stop, delete
//!
//! # Modules
//!
//! - `config` - Immutable client configuration (API key, secret, base URL)
//! - `errors` - Domain error taxonomy and HTTP status mapping
//! - `token` - Claim encoding, HMAC signing and token generation
//! - `transport` - HTTP transport seam (reqwest implementation + mock)
//! - `models` - Archive records returned by the backend
//! - `services` - Session and archive REST clients
//! - `client` - `OpenTok` facade bundling everything behind one handle
//!
//! # Example
//!
//! ```rust,ignore
//! use opentok::services::archive_client::StartArchiveOptions;
//! use opentok::{OpenTok, token::{Role, TokenOptions}};
//!
//! let opentok = OpenTok::new("12345", "secret")?;
//! let token = opentok.generate_token(
//!     &TokenOptions::new(session_id).with_role(Role::Moderator),
//! )?;
//! let archive = opentok
//!     .start_archive(&session_id, &StartArchiveOptions::with_name("Demo"))
//!     .await?;
//! archive.stop(opentok.archives()).await?;
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod token;
pub mod transport;

pub use client::OpenTok;
pub use config::OpenTokConfig;
pub use errors::{OpenTokError, TransportError};
pub use models::{Archive, ArchiveList, ArchiveStatus};
