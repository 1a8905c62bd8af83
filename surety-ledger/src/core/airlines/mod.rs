//! Airline membership: funding-gated activity plus multi-party registration.

pub mod ballot;
pub mod evaluator;
pub mod model;
pub mod registry;

pub use ballot::Ballot;
pub use evaluator::MultiPartyQuorum;
pub use model::Airline;
pub use registry::{AirlineRegistry, FundingReceipt, RegistrationStatus};
