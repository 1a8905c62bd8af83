use serde::Serialize;
use surety_common::{Amount, Identity, RegistrationState};

use super::ballot::Ballot;

/// An airline known to the registry, either registered or pending a ballot.
#[derive(Debug, Clone, Serialize)]
pub struct Airline {
    pub id: Identity,
    pub name: String,
    pub state: RegistrationState,
    /// Total funding committed. Never decreases.
    pub funded: Amount,
    /// `funded >= activation threshold`, recomputed on every funding.
    pub active: bool,
    /// Endorsements collected while pending; cleared on registration.
    pub ballot: Ballot,
}

impl Airline {
    pub fn registered(id: Identity, name: String) -> Self {
        Self {
            id,
            name,
            state: RegistrationState::Registered,
            funded: 0,
            active: false,
            ballot: Ballot::new(),
        }
    }

    pub fn candidate(id: Identity, name: String) -> Self {
        Self {
            state: RegistrationState::Unregistered,
            ..Self::registered(id, name)
        }
    }

    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Registered
    }

    /// Registered and funded: may sponsor, vote and sell policies.
    pub fn can_participate(&self) -> bool {
        self.is_registered() && self.active
    }
}
