use surety_common::{
    error::{Result, SuretyError},
    Amount, FlightKey, Identity, SuretyEvent,
};

use crate::{InsurancePolicy, Surety, Vault};

impl Surety {
    /// Buys a policy for `passenger` on `flight`, paying `amount` into escrow.
    pub async fn purchase_policy(
        &self,
        passenger: &Identity,
        flight: &FlightKey,
        amount: Amount,
    ) -> Result<()> {
        self.mutate(|tx| {
            if !tx.state.airlines.is_registered(&flight.airline) {
                return Err(SuretyError::UnknownAirline(flight.airline.clone()));
            }
            if tx.state.requests.flight_status(flight).is_some() {
                return Err(SuretyError::FlightAlreadyResolved(flight.clone()));
            }
            tx.state.escrow.purchase(passenger, flight, amount)?;

            tracing::info!("🎟️ {} insured {} for {}", passenger, flight, amount);
            tx.emit(SuretyEvent::InsurancePurchased {
                passenger: passenger.clone(),
                flight: flight.clone(),
                amount,
            });
            Ok(())
        })
        .await
    }

    /// Credits every active policy on `flight`. Requires the administrator or
    /// an authorized caller; consensus finalization credits without this check.
    /// Returns the number of policies credited by this call.
    pub async fn credit_insurees(&self, caller: &Identity, flight: &FlightKey) -> Result<u32> {
        self.mutate(|tx| {
            tx.state.gate.require_authorized(caller)?;
            let report = tx.credit_insurees(flight)?;
            Ok(report.credited)
        })
        .await
    }

    /// Pays out the passenger's whole credit.
    pub async fn withdraw(&self, passenger: &Identity) -> Result<Amount> {
        self.mutate(|tx| {
            let amount = tx.state.escrow.withdraw(passenger)?;
            tracing::info!("💸 {} withdrew {}", passenger, amount);
            tx.emit(SuretyEvent::Withdrawn {
                passenger: passenger.clone(),
                amount,
            });
            Ok(amount)
        })
        .await
    }

    pub async fn credit_of(&self, passenger: &Identity) -> Amount {
        self.read(|state| state.escrow.credit_of(passenger)).await
    }

    pub async fn policy(&self, passenger: &Identity, flight: &FlightKey) -> Option<InsurancePolicy> {
        self.read(|state| state.escrow.policy(passenger, flight).cloned())
            .await
    }

    pub async fn policies_for(&self, flight: &FlightKey) -> Vec<InsurancePolicy> {
        self.read(|state| state.escrow.policies_for(flight).into_iter().cloned().collect())
            .await
    }

    pub async fn vault(&self) -> Vault {
        self.read(|state| state.escrow.vault().clone()).await
    }
}
