//! Pipeline entry points for insight collection.
//!
//! - [`PersistenceGateway`]: bounded reconnect-and-retry in front of the sink
//! - [`Pipeline`]: per-run orchestration over the query set

pub mod persist;
pub mod run;

pub use persist::PersistenceGateway;
pub use run::Pipeline;
