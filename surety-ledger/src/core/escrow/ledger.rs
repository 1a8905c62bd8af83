use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use surety_common::{
    error::{Result, SuretyError},
    Amount, FlightKey, Identity, PolicyStatus, Ratio,
};

use super::{
    policy::InsurancePolicy,
    vault::{DepositSource, Vault},
};

/// Outcome of crediting the policies of one flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreditReport {
    pub credited: u32,
    pub total: Amount,
}

/// Payouts computed by `InsuranceEscrow::plan_credit`, one per active policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditPlan {
    payouts: Vec<(Identity, Amount)>,
    total: Amount,
}

/// Policy book, passenger credits and the vault backing them.
#[derive(Debug, Clone)]
pub struct InsuranceEscrow {
    policies: HashMap<FlightKey, BTreeMap<Identity, InsurancePolicy>>,
    credits: HashMap<Identity, Amount>,
    vault: Vault,
    policy_cap: Amount,
    payout: Ratio,
}

impl InsuranceEscrow {
    pub fn new(policy_cap: Amount, payout: Ratio) -> Self {
        Self {
            policies: HashMap::new(),
            credits: HashMap::new(),
            vault: Vault::default(),
            policy_cap,
            payout,
        }
    }

    /// Records an `Active` policy and takes the premium into the vault.
    ///
    /// Airline registration and flight resolution are checked by the caller.
    pub fn purchase(&mut self, passenger: &Identity, flight: &FlightKey, amount: Amount) -> Result<()> {
        self.check_premium(amount)?;
        // Credited policies stay on the book; the tuple can never be insured twice.
        if self.policy(passenger, flight).is_some() {
            return Err(SuretyError::DuplicatePolicy {
                passenger: passenger.clone(),
                flight: flight.clone(),
            });
        }

        self.vault.deposit(DepositSource::Premium, amount)?;
        self.policies
            .entry(flight.clone())
            .or_default()
            .insert(
                passenger.clone(),
                InsurancePolicy::new(passenger.clone(), flight.clone(), amount),
            );
        Ok(())
    }

    pub fn check_premium(&self, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(SuretyError::ZeroAmount);
        }
        if amount > self.policy_cap {
            return Err(SuretyError::AmountExceedsCap {
                amount,
                cap: self.policy_cap,
            });
        }
        Ok(())
    }

    /// Credits every `Active` policy of the flight. Already credited policies
    /// are skipped, so a second call credits nothing.
    pub fn credit(&mut self, flight: &FlightKey) -> Result<CreditReport> {
        let plan = self.plan_credit(flight)?;
        Ok(self.apply_credit(flight, plan))
    }

    /// Computes the payouts of a `credit` call without touching any state.
    /// Fails on overflow, in which case nothing may be applied.
    pub fn plan_credit(&self, flight: &FlightKey) -> Result<CreditPlan> {
        let mut plan = CreditPlan::default();
        let Some(book) = self.policies.get(flight) else {
            return Ok(plan);
        };

        let mut balances: HashMap<&Identity, Amount> = HashMap::new();
        for policy in book.values().filter(|p| p.is_active()) {
            let payout = self.payout.apply(policy.amount).ok_or(SuretyError::AmountOverflow)?;
            let balance = balances
                .entry(&policy.passenger)
                .or_insert_with(|| self.credit_of(&policy.passenger));
            *balance = balance.checked_add(payout).ok_or(SuretyError::AmountOverflow)?;

            plan.total = plan.total.checked_add(payout).ok_or(SuretyError::AmountOverflow)?;
            plan.payouts.push((policy.passenger.clone(), payout));
        }
        Ok(plan)
    }

    /// Applies a plan from `plan_credit` taken against the current state.
    pub fn apply_credit(&mut self, flight: &FlightKey, plan: CreditPlan) -> CreditReport {
        let mut report = CreditReport {
            credited: 0,
            total: plan.total,
        };
        let Some(book) = self.policies.get_mut(flight) else {
            return CreditReport::default();
        };
        for (passenger, payout) in plan.payouts {
            if let Some(policy) = book.get_mut(&passenger) {
                policy.status = PolicyStatus::Credited;
                policy.payout = payout;
            }
            let credit = self.credits.entry(passenger).or_insert(0);
            *credit = credit.saturating_add(payout);
            report.credited += 1;
        }
        report
    }

    /// Zeroes the passenger's credit, then releases it from the vault.
    pub fn withdraw(&mut self, passenger: &Identity) -> Result<Amount> {
        let amount = self.credit_of(passenger);
        if amount == 0 {
            return Err(SuretyError::NothingToWithdraw(passenger.clone()));
        }
        self.vault.check_release(amount)?;

        self.credits.insert(passenger.clone(), 0);
        self.vault.release(amount)?;
        Ok(amount)
    }

    /// Fails if `deposit` would overflow the vault.
    pub fn check_deposit(&self, source: DepositSource, amount: Amount) -> Result<()> {
        self.vault.check_deposit(source, amount)
    }

    pub fn deposit(&mut self, source: DepositSource, amount: Amount) -> Result<()> {
        self.vault.deposit(source, amount)
    }

    pub fn credit_of(&self, passenger: &Identity) -> Amount {
        self.credits.get(passenger).copied().unwrap_or(0)
    }

    pub fn policy(&self, passenger: &Identity, flight: &FlightKey) -> Option<&InsurancePolicy> {
        self.policies.get(flight).and_then(|book| book.get(passenger))
    }

    pub fn policies_for(&self, flight: &FlightKey) -> Vec<&InsurancePolicy> {
        self.policies
            .get(flight)
            .map(|book| book.values().collect())
            .unwrap_or_default()
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surety_common::{units, UNIT};

    fn escrow() -> InsuranceEscrow {
        let mut escrow = InsuranceEscrow::new(units(1), Ratio::new(3, 2));
        escrow.deposit(DepositSource::AirlineFunding, units(10)).unwrap();
        escrow
    }

    fn flight() -> FlightKey {
        FlightKey::new("air", "TEST", 1_700_000_000)
    }

    #[test]
    fn test_premium_bounds() {
        let mut escrow = escrow();
        let passenger = Identity::from("p1");

        assert!(matches!(
            escrow.purchase(&passenger, &flight(), units(1) + 1),
            Err(SuretyError::AmountExceedsCap { .. })
        ));
        assert!(matches!(
            escrow.purchase(&passenger, &flight(), 0),
            Err(SuretyError::ZeroAmount)
        ));
        // The cap itself is allowed.
        escrow.purchase(&passenger, &flight(), units(1)).unwrap();
        assert_eq!(escrow.vault().premiums, units(1));
    }

    #[test]
    fn test_duplicate_policy() {
        let mut escrow = escrow();
        let passenger = Identity::from("p1");
        escrow.purchase(&passenger, &flight(), UNIT / 2).unwrap();

        assert!(matches!(
            escrow.purchase(&passenger, &flight(), UNIT / 2),
            Err(SuretyError::DuplicatePolicy { .. })
        ));
        // Another flight is fine.
        escrow
            .purchase(&passenger, &FlightKey::new("air", "TEST", 1_700_000_001), UNIT / 2)
            .unwrap();
    }

    #[test]
    fn test_credit_is_idempotent() {
        let mut escrow = escrow();
        escrow.purchase(&"p1".into(), &flight(), units(1)).unwrap();
        escrow.purchase(&"p2".into(), &flight(), UNIT / 2).unwrap();

        let report = escrow.credit(&flight()).unwrap();
        assert_eq!(report.credited, 2);
        assert_eq!(report.total, UNIT * 3 / 2 + UNIT * 3 / 4);
        assert_eq!(escrow.credit_of(&"p1".into()), UNIT * 3 / 2);

        let report = escrow.credit(&flight()).unwrap();
        assert_eq!(report, CreditReport::default());
        assert_eq!(escrow.credit_of(&"p1".into()), UNIT * 3 / 2);

        let policy = escrow.policy(&"p2".into(), &flight()).unwrap();
        assert_eq!(policy.status, PolicyStatus::Credited);
        assert_eq!(policy.payout, UNIT * 3 / 4);
    }

    #[test]
    fn test_credit_unknown_flight_is_empty() {
        let mut escrow = escrow();
        assert_eq!(escrow.credit(&flight()).unwrap().credited, 0);
    }

    #[test]
    fn test_withdraw_zeroes_before_release() {
        let mut escrow = escrow();
        let passenger = Identity::from("p1");
        escrow.purchase(&passenger, &flight(), units(1)).unwrap();
        escrow.credit(&flight()).unwrap();

        assert_eq!(escrow.withdraw(&passenger).unwrap(), UNIT * 3 / 2);
        assert_eq!(escrow.credit_of(&passenger), 0);
        assert_eq!(escrow.vault().paid_out, UNIT * 3 / 2);
        assert!(matches!(
            escrow.withdraw(&passenger),
            Err(SuretyError::NothingToWithdraw(_))
        ));
    }

    #[test]
    fn test_withdraw_beyond_vault_fails() {
        // No airline funding backing the payout.
        let mut escrow = InsuranceEscrow::new(units(1), Ratio::new(3, 2));
        escrow.purchase(&"p1".into(), &flight(), units(1)).unwrap();
        escrow.credit(&flight()).unwrap();

        assert!(matches!(
            escrow.withdraw(&"p1".into()),
            Err(SuretyError::InsufficientEscrow { .. })
        ));
        // The credit survives the failed withdrawal.
        assert_eq!(escrow.credit_of(&"p1".into()), UNIT * 3 / 2);
        assert_eq!(escrow.vault().paid_out, 0);
    }

    #[test]
    fn test_credited_policy_cannot_be_bought_again() {
        let mut escrow = escrow();
        let passenger = Identity::from("p1");
        escrow.purchase(&passenger, &flight(), units(1)).unwrap();
        escrow.credit(&flight()).unwrap();

        assert!(matches!(
            escrow.purchase(&passenger, &flight(), UNIT / 2),
            Err(SuretyError::DuplicatePolicy { .. })
        ));
        let policy = escrow.policy(&passenger, &flight()).unwrap();
        assert_eq!(policy.status, PolicyStatus::Credited);
        assert_eq!(policy.amount, units(1));
        assert_eq!(policy.payout, UNIT * 3 / 2);

        assert_eq!(escrow.credit(&flight()).unwrap().credited, 0);
        assert_eq!(escrow.credit_of(&passenger), UNIT * 3 / 2);
        assert_eq!(escrow.vault().premiums, units(1));
    }

    #[test]
    fn test_credit_overflow_applies_nothing() {
        let third = u128::MAX / 3;
        let mut escrow = InsuranceEscrow::new(u128::MAX, Ratio::new(2, 1));
        let early = FlightKey::new("air", "EARLY", 1);
        escrow.purchase(&"p1".into(), &early, third).unwrap();
        escrow.credit(&early).unwrap();

        // "a-pax" sorts first and is fine; "p1" then overflows.
        escrow.purchase(&"a-pax".into(), &flight(), 1).unwrap();
        escrow.purchase(&"p1".into(), &flight(), third).unwrap();

        assert!(matches!(escrow.credit(&flight()), Err(SuretyError::AmountOverflow)));
        assert_eq!(escrow.credit_of(&"a-pax".into()), 0);
        assert_eq!(
            escrow.policy(&"a-pax".into(), &flight()).unwrap().status,
            PolicyStatus::Active
        );
        assert_eq!(escrow.credit_of(&"p1".into()), third * 2);
    }
}
