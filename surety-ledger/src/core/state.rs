use surety_common::{error::Result, FlightKey, SuretyConfig, SuretyEvent};

use super::{
    airlines::{AirlineRegistry, MultiPartyQuorum},
    escrow::{CreditPlan, CreditReport, InsuranceEscrow},
    gate::OperationalGate,
    oracles::{IndexSource, OracleRegistry, RequestPool},
};

/// The single process-wide state store. Every entity is owned by exactly one
/// of these collections.
#[derive(Debug)]
pub struct SuretyState {
    pub gate: OperationalGate,
    pub airlines: AirlineRegistry,
    pub escrow: InsuranceEscrow,
    pub oracles: OracleRegistry,
    pub requests: RequestPool,
}

impl SuretyState {
    pub fn new(config: &SuretyConfig) -> Self {
        Self {
            gate: OperationalGate::new(config.admin.clone()),
            airlines: AirlineRegistry::new(
                config.first_airline.clone(),
                config.first_airline_name.clone(),
                config.activation_threshold,
                MultiPartyQuorum::new(config.bootstrap_airlines),
            ),
            escrow: InsuranceEscrow::new(config.policy_cap, config.payout),
            oracles: OracleRegistry::new(config.oracle_registration_fee, config.oracle_index_bound),
            requests: RequestPool::new(config.min_responses),
        }
    }
}

/// One operation's handle on the live state.
///
/// Operations run every fallible check before their first write, so an `Err`
/// leaves `state` untouched. `events` are published only on `Ok`.
pub struct Transaction<'a> {
    pub state: &'a mut SuretyState,
    pub indexes: &'a mut dyn IndexSource,
    events: Vec<SuretyEvent>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(state: &'a mut SuretyState, indexes: &'a mut dyn IndexSource) -> Self {
        Self {
            state,
            indexes,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: SuretyEvent) {
        self.events.push(event);
    }

    pub(crate) fn into_events(self) -> Vec<SuretyEvent> {
        self.events
    }

    /// Credits the flight's active policies and records the event when
    /// anything was credited.
    pub fn credit_insurees(&mut self, flight: &FlightKey) -> Result<CreditReport> {
        let plan = self.state.escrow.plan_credit(flight)?;
        Ok(self.apply_credit(flight, plan))
    }

    /// Installs a plan from `plan_credit`. Cannot fail.
    pub fn apply_credit(&mut self, flight: &FlightKey, plan: CreditPlan) -> CreditReport {
        let report = self.state.escrow.apply_credit(flight, plan);
        if report.credited > 0 {
            tracing::info!(
                "💰 Credited {} policies on {} (total {})",
                report.credited, flight, report.total
            );
            self.emit(SuretyEvent::InsureesCredited {
                flight: flight.clone(),
                policies: report.credited,
                total: report.total,
            });
        }
        report
    }
}
