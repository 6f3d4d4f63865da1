//! Domain ports
//!
//! Trait contracts between the query core and the outside world.

pub mod outbound;

pub use outbound::{HubConnector, HubTransport, PageSource, TokenProvider};
