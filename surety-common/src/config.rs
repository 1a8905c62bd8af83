use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SuretyError},
    types::{units, Amount, Identity, OracleIndex, Ratio},
};

/// Runtime configuration of the engine.
///
/// Amounts are in base units. The defaults reproduce the reference deployment:
/// 10 units to activate an airline, a 1 unit policy cap paying out 1.5x,
/// a 1 unit oracle fee, 10 oracle indexes and 3 matching responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuretyConfig {
    /// Identity allowed to toggle the operational gate and authorize callers.
    pub admin: Identity,
    /// Airline registered at initialization, bypassing the ballot.
    pub first_airline: Identity,
    pub first_airline_name: String,
    pub activation_threshold: Amount,
    pub policy_cap: Amount,
    pub payout: Ratio,
    pub oracle_registration_fee: Amount,
    /// Exclusive upper bound of the oracle index space.
    pub oracle_index_bound: OracleIndex,
    /// Matching responses required to finalize a flight status.
    pub min_responses: u32,
    /// Registrations below this count need no ballot.
    pub bootstrap_airlines: u32,
    /// Hex-encoded 32 bytes mixed into index assignment. Random when absent.
    pub index_entropy: Option<String>,
}

impl Default for SuretyConfig {
    fn default() -> Self {
        Self {
            admin: Identity::from("admin"),
            first_airline: Identity::from("first-airline"),
            first_airline_name: "Fly First".to_string(),
            activation_threshold: units(10),
            policy_cap: units(1),
            payout: Ratio::new(3, 2),
            oracle_registration_fee: units(1),
            oracle_index_bound: 10,
            min_responses: 3,
            bootstrap_airlines: 4,
            index_entropy: None,
        }
    }
}

impl SuretyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.payout.denominator == 0 {
            return Err(SuretyError::Config("payout denominator must not be zero".into()));
        }
        if self.oracle_index_bound < 3 {
            return Err(SuretyError::Config(format!(
                "oracle_index_bound must be at least 3, got {}",
                self.oracle_index_bound
            )));
        }
        if self.min_responses == 0 {
            return Err(SuretyError::Config("min_responses must be at least 1".into()));
        }
        if self.bootstrap_airlines == 0 {
            return Err(SuretyError::Config("bootstrap_airlines must be at least 1".into()));
        }
        if self.admin.as_str().is_empty() || self.first_airline.as_str().is_empty() {
            return Err(SuretyError::Config("admin and first_airline must be set".into()));
        }
        self.entropy()?;
        Ok(())
    }

    /// Decodes `index_entropy`, if configured.
    pub fn entropy(&self) -> Result<Option<[u8; 32]>> {
        let Some(encoded) = &self.index_entropy else {
            return Ok(None);
        };
        let bytes = hex::decode(encoded)
            .map_err(|e| SuretyError::Config(format!("index_entropy is not hex: {}", e)))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            SuretyError::Config(format!("index_entropy must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Some(seed))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SuretyError::Config(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config = serde_json::from_str::<SuretyConfig>(&data)
            .map_err(|e| SuretyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
