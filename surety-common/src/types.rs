use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SuretyError;

/// Value amounts in base units (`UNIT` base units make one native-currency unit).
pub type Amount = u128;

/// One native-currency unit expressed in base units.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// Index drawn from the bounded oracle index space.
pub type OracleIndex = u8;

/// Converts whole native-currency units into base units.
pub const fn units(n: u128) -> Amount {
    n * UNIT
}

/// Authenticated identity of a caller (airline, passenger, oracle or administrator).
///
/// The host environment is trusted to have authenticated the identity before
/// it reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Identity(s)
    }
}

/// Identifies one departure: (airline, flight code, departure timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: Identity,
    pub flight: String,
    pub timestamp: u64,
}

impl FlightKey {
    pub fn new(airline: impl Into<Identity>, flight: impl Into<String>, timestamp: u64) -> Self {
        Self {
            airline: airline.into(),
            flight: flight.into(),
            timestamp,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.airline, self.flight, self.timestamp)
    }
}

/// Identifies one oracle status request: the flight plus the index the
/// responding oracles must hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: OracleIndex,
    pub flight: FlightKey,
}

impl RequestKey {
    pub fn new(index: OracleIndex, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.flight)
    }
}

/// Flight status codes reported by oracles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StatusCode {
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl StatusCode {
    pub const ALL: [StatusCode; 6] = [
        StatusCode::Unknown,
        StatusCode::OnTime,
        StatusCode::LateAirline,
        StatusCode::LateWeather,
        StatusCode::LateTechnical,
        StatusCode::LateOther,
    ];

    pub fn code(self) -> u8 {
        match self {
            StatusCode::Unknown => 0,
            StatusCode::OnTime => 10,
            StatusCode::LateAirline => 20,
            StatusCode::LateWeather => 30,
            StatusCode::LateTechnical => 40,
            StatusCode::LateOther => 50,
        }
    }

    /// Only a delay caused by the airline pays out insurance.
    pub fn is_airline_fault(self) -> bool {
        matches!(self, StatusCode::LateAirline)
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = SuretyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        StatusCode::ALL
            .into_iter()
            .find(|s| s.code() == value)
            .ok_or(SuretyError::UnknownStatusCode(value))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusCode::Unknown => "unknown",
            StatusCode::OnTime => "on-time",
            StatusCode::LateAirline => "late-airline",
            StatusCode::LateWeather => "late-weather",
            StatusCode::LateTechnical => "late-technical",
            StatusCode::LateOther => "late-other",
        };
        write!(f, "{} ({})", s, self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    Unregistered,
    Registered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    Credited,
}

/// Lifecycle of a flight in the oracle consensus engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightState {
    NoRequest,
    Requested,
    Finalized,
}

/// Integer multiplier, e.g. `3/2` for a 1.5x payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub numerator: u128,
    pub denominator: u128,
}

impl Ratio {
    pub const fn new(numerator: u128, denominator: u128) -> Self {
        Self { numerator, denominator }
    }

    /// Applies the ratio, rounding down. `None` on overflow or a zero denominator.
    pub fn apply(&self, amount: Amount) -> Option<Amount> {
        amount
            .checked_mul(self.numerator)?
            .checked_div(self.denominator)
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_roundtrip_and_rejection() {
        for status in StatusCode::ALL {
            assert_eq!(StatusCode::try_from(status.code()).unwrap(), status);
        }
        assert!(matches!(
            StatusCode::try_from(25),
            Err(SuretyError::UnknownStatusCode(25))
        ));
    }

    #[test]
    fn test_only_late_airline_is_fault() {
        let faults: Vec<_> = StatusCode::ALL.into_iter().filter(|s| s.is_airline_fault()).collect();
        assert_eq!(faults, vec![StatusCode::LateAirline]);
    }

    #[test]
    fn test_status_code_serializes_as_number() {
        let json = serde_json::to_string(&StatusCode::LateAirline).unwrap();
        assert_eq!(json, "20");
        let parsed: StatusCode = serde_json::from_str("30").unwrap();
        assert_eq!(parsed, StatusCode::LateWeather);
        assert!(serde_json::from_str::<StatusCode>("31").is_err());
    }

    #[test]
    fn test_payout_ratio() {
        let payout = Ratio::default();
        assert_eq!(payout.apply(units(1)), Some(UNIT + UNIT / 2));
        assert_eq!(payout.apply(3), Some(4)); // rounds down
        assert_eq!(Ratio::new(1, 0).apply(10), None);
        assert_eq!(payout.apply(u128::MAX), None);
    }

    #[test]
    fn test_identity_is_transparent_in_json() {
        let id = Identity::from("airline-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"airline-1\"");
        assert_eq!(id.to_string(), "airline-1");
    }
}
