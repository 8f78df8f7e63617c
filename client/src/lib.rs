//! Data synchronization layer for the Matsya marine data dashboard.
//!
//! The crate is organised around the consumers it serves:
//!
//! - [`api::MatsyaClient`] exposes the data access functions (species, eDNA
//!   samples, OBIS sync, analyses, image classification). Each call tries the
//!   optional managed backend first when it is enabled, then the HTTP API.
//! - [`live::LiveChannel`] subscribes to server push events over a WebSocket.
//! - [`reconcile`] turns those events into refreshes of cached data.
//! - [`credentials`] keeps the HTTP bearer token in step with the managed
//!   backend's session.
//!
//! Configuration comes from `MATSYA_*` environment variables, see
//! [`config::ClientConfig`].

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod credentials;
pub mod edna;
pub mod error;
pub mod fallback;
pub mod live;
pub mod obis;
pub mod reconcile;
pub mod transport;

pub use api::MatsyaClient;
pub use auth::AuthContext;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ValidationError};
pub use matsya_common as common;
