//! # OpenTok Test Utilities
//!
//! Shared test utilities for the `opentok` crate.
//!
//! This crate provides:
//! - Fixed credentials and recorded backend payloads (fixtures)
//! - Session id builders for arbitrary partner ids
//! - A wiremock-backed fake OpenTok backend (TestBackend)
//! - Custom assertions (TokenAssertions trait)
//! - Test tracing setup
//! - `MockTransport` for tests that need no HTTP server at all
//!
//! ## Usage
//!
//! ```rust,ignore
//! use opentok_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let backend = TestBackend::start().await;
//!     backend.mock_get_archive(AVAILABLE_ARCHIVE_ID, 200, AVAILABLE_ARCHIVE_JSON).await;
//!
//!     let archive = backend.opentok().get_archive(AVAILABLE_ARCHIVE_ID).await?;
//!     assert_eq!(archive.status, "available");
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod server_harness;
pub mod session_ids;
pub mod tracing_setup;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use server_harness::*;
pub use session_ids::*;
pub use tracing_setup::*;

pub use opentok::transport::mock::MockTransport;
