//! Adapters connecting the archive service to the outside world:
//! HTTP on the inbound side, object stores on the outbound side.

pub mod inbound;
pub mod outbound;
