use surety_common::{
    error::Result, Amount, Identity, RegistrationState, SuretyEvent,
};

use crate::{
    core::escrow::DepositSource, Airline, Ballot, FundingReceipt, RegistrationStatus, Surety,
};

impl Surety {
    /// `sponsor` proposes `candidate`. Below the bootstrap size the candidate
    /// is admitted at once; afterwards the sponsor's call counts as a vote.
    pub async fn register_airline(
        &self,
        sponsor: &Identity,
        candidate: &Identity,
        name: &str,
    ) -> Result<RegistrationStatus> {
        self.mutate(|tx| {
            let status = tx.state.airlines.register(sponsor, candidate, name)?;
            publish_registration(tx, sponsor, candidate, status);
            Ok(status)
        })
        .await
    }

    /// `voter` endorses a candidate whose ballot is already open.
    pub async fn add_vote_to_airline(
        &self,
        voter: &Identity,
        candidate: &Identity,
    ) -> Result<RegistrationStatus> {
        self.mutate(|tx| {
            let status = tx.state.airlines.vote(voter, candidate)?;
            publish_registration(tx, voter, candidate, status);
            Ok(status)
        })
        .await
    }

    /// Commits funds to a registered airline. The value is held by the escrow.
    pub async fn add_funding(&self, airline: &Identity, amount: Amount) -> Result<FundingReceipt> {
        self.mutate(|tx| {
            tx.state.escrow.check_deposit(DepositSource::AirlineFunding, amount)?;
            let receipt = tx.state.airlines.fund(airline, amount)?;
            tx.state.escrow.deposit(DepositSource::AirlineFunding, amount)?;

            if receipt.became_active {
                tracing::info!("✅ Airline {} is now active ({} funded)", airline, receipt.funded);
            } else {
                tracing::info!("💵 Airline {} funded {} (total {})", airline, amount, receipt.funded);
            }
            tx.emit(SuretyEvent::AirlineFunded {
                airline: airline.clone(),
                amount,
                funded: receipt.funded,
                active: receipt.active,
            });
            Ok(receipt)
        })
        .await
    }

    pub async fn is_airline_active(&self, airline: &Identity) -> bool {
        self.read(|state| state.airlines.is_active(airline)).await
    }

    pub async fn is_airline_registered(&self, airline: &Identity) -> bool {
        self.read(|state| state.airlines.is_registered(airline)).await
    }

    pub async fn registered_count(&self) -> u32 {
        self.read(|state| state.airlines.registered_count()).await
    }

    pub async fn airline(&self, airline: &Identity) -> Option<Airline> {
        self.read(|state| state.airlines.get(airline).cloned()).await
    }

    pub async fn registered_airlines(&self) -> Vec<Airline> {
        self.read(|state| state.airlines.registered().into_iter().cloned().collect())
            .await
    }

    pub async fn ballot(&self, candidate: &Identity) -> Option<Ballot> {
        self.read(|state| state.airlines.ballot(candidate).cloned()).await
    }
}

fn publish_registration(
    tx: &mut crate::core::state::Transaction<'_>,
    voter: &Identity,
    candidate: &Identity,
    status: RegistrationStatus,
) {
    if !status.changed {
        tracing::debug!("🗳️ {} -> {}: nothing changed", voter, candidate);
        return;
    }

    if status.votes > 0 {
        tracing::info!(
            "🗳️ {} voted for {} ({}/{})",
            voter, candidate, status.votes, status.required
        );
        tx.emit(SuretyEvent::AirlineVoted {
            candidate: candidate.clone(),
            voter: voter.clone(),
            votes: status.votes,
            required: status.required,
        });
    }

    if status.state == RegistrationState::Registered {
        let name = tx
            .state
            .airlines
            .get(candidate)
            .map(|a| a.name.clone())
            .unwrap_or_default();
        let registered_count = tx.state.airlines.registered_count();
        tracing::info!(
            "🛫 Airline {} ({}) registered, {} airlines total",
            candidate, name, registered_count
        );
        tx.emit(SuretyEvent::AirlineRegistered {
            airline: candidate.clone(),
            name,
            registered_count,
        });
    }
}
