use serde::{Deserialize, Serialize};

use crate::types::{Amount, FlightKey, Identity, OracleIndex, StatusCode};

/// Notifications published by the engine after an operation commits.
///
/// `OracleRequest` is what oracle processes listen for; `FlightStatusInfo`
/// is what front-ends listen for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SuretyEvent {
    OperationalChanged {
        operational: bool,
        by: Identity,
    },
    AirlineRegistered {
        airline: Identity,
        name: String,
        registered_count: u32,
    },
    AirlineVoted {
        candidate: Identity,
        voter: Identity,
        votes: u32,
        required: u32,
    },
    AirlineFunded {
        airline: Identity,
        amount: Amount,
        funded: Amount,
        active: bool,
    },
    InsurancePurchased {
        passenger: Identity,
        flight: FlightKey,
        amount: Amount,
    },
    InsureesCredited {
        flight: FlightKey,
        policies: u32,
        total: Amount,
    },
    Withdrawn {
        passenger: Identity,
        amount: Amount,
    },
    OracleRegistered {
        oracle: Identity,
        indexes: [OracleIndex; 3],
    },
    OracleRequest {
        index: OracleIndex,
        flight: FlightKey,
    },
    OracleReport {
        oracle: Identity,
        index: OracleIndex,
        flight: FlightKey,
        status: StatusCode,
    },
    FlightStatusInfo {
        flight: FlightKey,
        status: StatusCode,
    },
}

impl SuretyEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SuretyEvent::OperationalChanged { .. } => "OperationalChanged",
            SuretyEvent::AirlineRegistered { .. } => "AirlineRegistered",
            SuretyEvent::AirlineVoted { .. } => "AirlineVoted",
            SuretyEvent::AirlineFunded { .. } => "AirlineFunded",
            SuretyEvent::InsurancePurchased { .. } => "InsurancePurchased",
            SuretyEvent::InsureesCredited { .. } => "InsureesCredited",
            SuretyEvent::Withdrawn { .. } => "Withdrawn",
            SuretyEvent::OracleRegistered { .. } => "OracleRegistered",
            SuretyEvent::OracleRequest { .. } => "OracleRequest",
            SuretyEvent::OracleReport { .. } => "OracleReport",
            SuretyEvent::FlightStatusInfo { .. } => "FlightStatusInfo",
        }
    }
}
