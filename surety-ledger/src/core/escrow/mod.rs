//! Insurance escrow: policies, passenger credits and the vault.

pub mod ledger;
pub mod policy;
pub mod vault;

pub use ledger::{CreditPlan, CreditReport, InsuranceEscrow};
pub use policy::InsurancePolicy;
pub use vault::{DepositSource, Vault};
