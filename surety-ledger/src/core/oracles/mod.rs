//! Oracle consensus: registration with index assignment, status requests and
//! index-gated response counting.

pub mod indexes;
pub mod pool;
pub mod registry;

pub use indexes::{draw_triple, HashIndexSource, IndexSource, RngIndexSource, SequenceIndexSource};
pub use pool::{FlightRecord, FlightStatusRequest, RequestPool, ResponseOutcome};
pub use registry::{Oracle, OracleRegistry};
