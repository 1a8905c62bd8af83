use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Amount, FlightKey, Identity, OracleIndex, RequestKey};

pub type Result<T> = std::result::Result<T, SuretyError>;

/// Coarse failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller lacks the required role or active status.
    Unauthorized,
    /// The operational gate is closed.
    OperationsSuspended,
    /// The target entity is in the wrong lifecycle state.
    InvalidState,
    /// An amount is over a cap or does not fit.
    CapacityExceeded,
    NothingToWithdraw,
    /// Configuration or I/O failure on the host side.
    Internal,
}

/// Every failure the engine can report. A failed operation leaves the state untouched.
#[derive(Debug, Error)]
pub enum SuretyError {
    #[error("Caller '{0}' is not authorized for this operation")]
    Unauthorized(Identity),

    #[error("Operations are suspended")]
    OperationsSuspended,

    /// Sponsor or voter is not a registered, funded airline.
    #[error("Airline '{0}' is not active")]
    SponsorNotActive(Identity),

    #[error("Airline '{0}' is not registered")]
    UnknownAirline(Identity),

    #[error("No registration ballot is open for '{0}'")]
    NoSuchBallot(Identity),

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Amount {amount} exceeds the per-policy cap of {cap}")]
    AmountExceedsCap { amount: Amount, cap: Amount },

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Passenger '{passenger}' already holds an active policy for {flight}")]
    DuplicatePolicy { passenger: Identity, flight: FlightKey },

    #[error("Flight {0} has already been resolved")]
    FlightAlreadyResolved(FlightKey),

    #[error("Nothing to withdraw for '{0}'")]
    NothingToWithdraw(Identity),

    #[error("Escrow holds {held}, cannot release {requested}")]
    InsufficientEscrow { held: Amount, requested: Amount },

    #[error("Registration fee of {required} required, got {paid}")]
    InsufficientFee { required: Amount, paid: Amount },

    #[error("Oracle '{0}' is already registered")]
    OracleAlreadyRegistered(Identity),

    #[error("Oracle '{0}' is not registered")]
    OracleNotRegistered(Identity),

    /// The index is not among the responding oracle's assigned indexes.
    #[error("Index {index} is not assigned to oracle '{oracle}'")]
    IndexMismatch { oracle: Identity, index: OracleIndex },

    #[error("No open status request for {0}")]
    NoSuchRequest(RequestKey),

    #[error("Unknown flight status code {0}")]
    UnknownStatusCode(u8),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SuretyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SuretyError::Unauthorized(_)
            | SuretyError::SponsorNotActive(_)
            | SuretyError::OracleNotRegistered(_) => ErrorKind::Unauthorized,
            SuretyError::OperationsSuspended => ErrorKind::OperationsSuspended,
            SuretyError::UnknownAirline(_)
            | SuretyError::NoSuchBallot(_)
            | SuretyError::ZeroAmount
            | SuretyError::DuplicatePolicy { .. }
            | SuretyError::FlightAlreadyResolved(_)
            | SuretyError::InsufficientFee { .. }
            | SuretyError::OracleAlreadyRegistered(_)
            | SuretyError::IndexMismatch { .. }
            | SuretyError::NoSuchRequest(_)
            | SuretyError::UnknownStatusCode(_) => ErrorKind::InvalidState,
            SuretyError::AmountExceedsCap { .. }
            | SuretyError::AmountOverflow
            | SuretyError::InsufficientEscrow { .. } => ErrorKind::CapacityExceeded,
            SuretyError::NothingToWithdraw(_) => ErrorKind::NothingToWithdraw,
            SuretyError::Config(_) | SuretyError::Io(_) => ErrorKind::Internal,
        }
    }
}
