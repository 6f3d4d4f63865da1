pub mod identity;
pub mod models;
pub mod ports;
pub mod query;

// Re-export commonly used types
pub use identity::Identified;
pub use models::{Room, Student, ROOMS_RESOURCE, STUDENTS_RESOURCE};
pub use ports::{HubConnector, HubTransport, PageSource, TokenProvider};
pub use query::{QueryKey, QueryOptions};
