use std::collections::HashMap;

use serde::Serialize;
use surety_common::{
    error::{Result, SuretyError},
    Amount, Identity, RegistrationState,
};

use super::{ballot::Ballot, evaluator::MultiPartyQuorum, model::Airline};

/// Result of a registration or vote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub state: RegistrationState,
    /// Votes on the candidate's ballot (0 when admitted without one).
    pub votes: u32,
    /// Votes the ballot needed at the time of the call.
    pub required: u32,
    /// Whether this call changed anything.
    pub changed: bool,
}

/// Result of a funding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FundingReceipt {
    pub funded: Amount,
    pub active: bool,
    pub became_active: bool,
}

/// Airline membership: registrations, ballots and funding.
#[derive(Debug, Clone)]
pub struct AirlineRegistry {
    airlines: HashMap<Identity, Airline>,
    registered_count: u32,
    activation_threshold: Amount,
    quorum: MultiPartyQuorum,
}

impl AirlineRegistry {
    /// Creates the registry with `founder` already registered.
    pub fn new(
        founder: Identity,
        founder_name: String,
        activation_threshold: Amount,
        quorum: MultiPartyQuorum,
    ) -> Self {
        let mut airlines = HashMap::new();
        airlines.insert(founder.clone(), Airline::registered(founder, founder_name));
        Self {
            airlines,
            registered_count: 1,
            activation_threshold,
            quorum,
        }
    }

    /// `sponsor` proposes `candidate`. Admits immediately during bootstrap,
    /// otherwise opens or joins the candidate's ballot.
    pub fn register(
        &mut self,
        sponsor: &Identity,
        candidate: &Identity,
        name: &str,
    ) -> Result<RegistrationStatus> {
        self.require_active(sponsor)?;

        if let Some(status) = self.already_registered(candidate) {
            return Ok(status);
        }

        if !self.quorum.requires_ballot(self.registered_count) {
            self.admit(candidate, name.to_string());
            return Ok(RegistrationStatus {
                state: RegistrationState::Registered,
                votes: 0,
                required: 0,
                changed: true,
            });
        }

        self.airlines
            .entry(candidate.clone())
            .or_insert_with(|| Airline::candidate(candidate.clone(), name.to_string()));
        self.cast_vote(sponsor, candidate)
    }

    /// `voter` endorses a candidate whose ballot is already open.
    pub fn vote(&mut self, voter: &Identity, candidate: &Identity) -> Result<RegistrationStatus> {
        self.require_active(voter)?;

        if let Some(status) = self.already_registered(candidate) {
            return Ok(status);
        }
        if !self.airlines.contains_key(candidate) {
            return Err(SuretyError::NoSuchBallot(candidate.clone()));
        }
        self.cast_vote(voter, candidate)
    }

    /// Adds funding to a registered airline and recomputes `active`.
    pub fn fund(&mut self, airline: &Identity, amount: Amount) -> Result<FundingReceipt> {
        if amount == 0 {
            return Err(SuretyError::ZeroAmount);
        }
        let threshold = self.activation_threshold;
        let record = self
            .airlines
            .get_mut(airline)
            .filter(|a| a.is_registered())
            .ok_or_else(|| SuretyError::UnknownAirline(airline.clone()))?;

        let was_active = record.active;
        record.funded = record
            .funded
            .checked_add(amount)
            .ok_or(SuretyError::AmountOverflow)?;
        record.active = record.funded >= threshold;

        Ok(FundingReceipt {
            funded: record.funded,
            active: record.active,
            became_active: record.active && !was_active,
        })
    }

    pub fn is_active(&self, airline: &Identity) -> bool {
        self.airlines
            .get(airline)
            .map(Airline::can_participate)
            .unwrap_or(false)
    }

    pub fn is_registered(&self, airline: &Identity) -> bool {
        self.airlines
            .get(airline)
            .map(Airline::is_registered)
            .unwrap_or(false)
    }

    pub fn registered_count(&self) -> u32 {
        self.registered_count
    }

    pub fn get(&self, airline: &Identity) -> Option<&Airline> {
        self.airlines.get(airline)
    }

    /// Registered airlines, sorted by identity.
    pub fn registered(&self) -> Vec<&Airline> {
        let mut list: Vec<&Airline> = self
            .airlines
            .values()
            .filter(|a| a.is_registered())
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Open ballot of a pending candidate.
    pub fn ballot(&self, candidate: &Identity) -> Option<&Ballot> {
        self.airlines
            .get(candidate)
            .filter(|a| !a.is_registered())
            .map(|a| &a.ballot)
    }

    pub fn required_votes(&self) -> u32 {
        self.quorum.required_votes(self.registered_count)
    }

    fn require_active(&self, airline: &Identity) -> Result<()> {
        if !self.is_active(airline) {
            return Err(SuretyError::SponsorNotActive(airline.clone()));
        }
        Ok(())
    }

    fn already_registered(&self, candidate: &Identity) -> Option<RegistrationStatus> {
        self.airlines
            .get(candidate)
            .filter(|a| a.is_registered())
            .map(|_| RegistrationStatus {
                state: RegistrationState::Registered,
                votes: 0,
                required: 0,
                changed: false,
            })
    }

    fn cast_vote(&mut self, voter: &Identity, candidate: &Identity) -> Result<RegistrationStatus> {
        let required = self.quorum.required_votes(self.registered_count);
        let registered = self.registered_count;
        let quorum = self.quorum;

        let pending = self
            .airlines
            .get_mut(candidate)
            .ok_or_else(|| SuretyError::NoSuchBallot(candidate.clone()))?;
        let counted = pending.ballot.record(voter);
        let votes = pending.ballot.votes();

        if quorum.is_reached(votes, registered) {
            let name = pending.name.clone();
            self.admit(candidate, name);
            return Ok(RegistrationStatus {
                state: RegistrationState::Registered,
                votes,
                required,
                changed: true,
            });
        }

        Ok(RegistrationStatus {
            state: RegistrationState::Unregistered,
            votes,
            required,
            changed: counted,
        })
    }

    fn admit(&mut self, candidate: &Identity, name: String) {
        let record = self
            .airlines
            .entry(candidate.clone())
            .or_insert_with(|| Airline::candidate(candidate.clone(), name.clone()));
        record.name = name;
        record.state = RegistrationState::Registered;
        record.ballot = Ballot::new();
        self.registered_count += 1;
    }
}
