//! Shared types for the FlightSurety workspace.
//!
//! Identities, amounts, flight keys and status codes, the error taxonomy,
//! the engine events and the runtime configuration live here so that the
//! ledger and the node agree on a single vocabulary.

pub mod config;
pub mod error;
pub mod events;
pub mod types;
pub mod utils;

pub use config::SuretyConfig;
pub use error::{ErrorKind, Result, SuretyError};
pub use events::SuretyEvent;
pub use types::{
    units, Amount, FlightKey, FlightState, Identity, OracleIndex, PolicyStatus, Ratio,
    RegistrationState, RequestKey, StatusCode, UNIT,
};
