use serde::Serialize;
use surety_common::{Amount, FlightKey, Identity, PolicyStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsurancePolicy {
    pub passenger: Identity,
    pub flight: FlightKey,
    /// Premium paid, at most the per-policy cap.
    pub amount: Amount,
    pub status: PolicyStatus,
    /// Amount added to the passenger's credit; zero until credited.
    pub payout: Amount,
}

impl InsurancePolicy {
    pub fn new(passenger: Identity, flight: FlightKey, amount: Amount) -> Self {
        Self {
            passenger,
            flight,
            amount,
            status: PolicyStatus::Active,
            payout: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }
}
