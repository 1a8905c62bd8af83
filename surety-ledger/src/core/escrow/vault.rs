use serde::Serialize;
use surety_common::{
    error::{Result, SuretyError},
    Amount,
};

/// Where a deposit into the escrow came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositSource {
    AirlineFunding,
    Premium,
    OracleFee,
}

/// Value held by the escrow on behalf of the system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vault {
    pub held: Amount,
    pub airline_funding: Amount,
    pub premiums: Amount,
    pub oracle_fees: Amount,
    pub paid_out: Amount,
}

impl Vault {
    pub fn check_deposit(&self, source: DepositSource, amount: Amount) -> Result<()> {
        self.held.checked_add(amount).ok_or(SuretyError::AmountOverflow)?;
        self.bucket(source)
            .checked_add(amount)
            .ok_or(SuretyError::AmountOverflow)?;
        Ok(())
    }

    pub fn deposit(&mut self, source: DepositSource, amount: Amount) -> Result<()> {
        self.check_deposit(source, amount)?;
        self.held += amount;
        *self.bucket_mut(source) += amount;
        Ok(())
    }

    pub fn check_release(&self, amount: Amount) -> Result<()> {
        if amount > self.held {
            return Err(SuretyError::InsufficientEscrow {
                held: self.held,
                requested: amount,
            });
        }
        Ok(())
    }

    pub fn release(&mut self, amount: Amount) -> Result<()> {
        self.check_release(amount)?;
        self.held -= amount;
        self.paid_out += amount;
        Ok(())
    }

    fn bucket(&self, source: DepositSource) -> Amount {
        match source {
            DepositSource::AirlineFunding => self.airline_funding,
            DepositSource::Premium => self.premiums,
            DepositSource::OracleFee => self.oracle_fees,
        }
    }

    fn bucket_mut(&mut self, source: DepositSource) -> &mut Amount {
        match source {
            DepositSource::AirlineFunding => &mut self.airline_funding,
            DepositSource::Premium => &mut self.premiums,
            DepositSource::OracleFee => &mut self.oracle_fees,
        }
    }
}
