//! Shared data model for the Matsya ocean-insights data layer.
//!
//! Everything in this crate is plain data: records exchanged with the local
//! REST API and the managed backend, the query types used to request them,
//! and the events pushed over the live update channel. There is no I/O here;
//! transports live in `matsya-client`.

pub mod events;
pub mod model;
pub mod requests;
