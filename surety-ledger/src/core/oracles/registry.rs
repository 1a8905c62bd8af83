use std::collections::HashMap;

use serde::Serialize;
use surety_common::{
    error::{Result, SuretyError},
    Amount, Identity, OracleIndex,
};

use super::indexes::{draw_triple, IndexSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Oracle {
    pub id: Identity,
    /// Assigned once at registration; never changes.
    pub indexes: [OracleIndex; 3],
}

impl Oracle {
    pub fn holds(&self, index: OracleIndex) -> bool {
        self.indexes.contains(&index)
    }
}

/// Registered oracles and the rules for joining.
#[derive(Debug, Clone)]
pub struct OracleRegistry {
    oracles: HashMap<Identity, Oracle>,
    fee: Amount,
    index_bound: OracleIndex,
}

impl OracleRegistry {
    pub fn new(fee: Amount, index_bound: OracleIndex) -> Self {
        Self {
            oracles: HashMap::new(),
            fee,
            index_bound,
        }
    }

    pub fn register(
        &mut self,
        candidate: &Identity,
        paid: Amount,
        source: &mut dyn IndexSource,
    ) -> Result<[OracleIndex; 3]> {
        if self.oracles.contains_key(candidate) {
            return Err(SuretyError::OracleAlreadyRegistered(candidate.clone()));
        }
        if paid < self.fee {
            return Err(SuretyError::InsufficientFee {
                required: self.fee,
                paid,
            });
        }

        let indexes = draw_triple(source, candidate, self.index_bound);
        self.oracles.insert(
            candidate.clone(),
            Oracle {
                id: candidate.clone(),
                indexes,
            },
        );
        Ok(indexes)
    }

    pub fn indexes_of(&self, oracle: &Identity) -> Result<[OracleIndex; 3]> {
        self.oracles
            .get(oracle)
            .map(|o| o.indexes)
            .ok_or_else(|| SuretyError::OracleNotRegistered(oracle.clone()))
    }

    /// Fails unless `oracle` is registered and holds `index`.
    pub fn check_index(&self, oracle: &Identity, index: OracleIndex) -> Result<()> {
        let record = self
            .oracles
            .get(oracle)
            .ok_or_else(|| SuretyError::OracleNotRegistered(oracle.clone()))?;
        if !record.holds(index) {
            return Err(SuretyError::IndexMismatch {
                oracle: oracle.clone(),
                index,
            });
        }
        Ok(())
    }

    pub fn index_bound(&self) -> OracleIndex {
        self.index_bound
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::oracles::indexes::SequenceIndexSource;
    use surety_common::UNIT;

    #[test]
    fn test_register_assigns_triple_once() {
        let mut registry = OracleRegistry::new(UNIT, 10);
        let mut source = SequenceIndexSource::new([1, 2, 3, 4, 5, 6]);
        let oracle = Identity::from("o1");

        assert_eq!(registry.register(&oracle, UNIT, &mut source).unwrap(), [1, 2, 3]);
        assert!(matches!(
            registry.register(&oracle, UNIT, &mut source),
            Err(SuretyError::OracleAlreadyRegistered(_))
        ));
        assert_eq!(registry.indexes_of(&oracle).unwrap(), [1, 2, 3]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fee_required() {
        let mut registry = OracleRegistry::new(UNIT, 10);
        let mut source = SequenceIndexSource::new([1, 2, 3]);
        assert!(matches!(
            registry.register(&"o1".into(), UNIT - 1, &mut source),
            Err(SuretyError::InsufficientFee { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_check_index() {
        let mut registry = OracleRegistry::new(UNIT, 10);
        let mut source = SequenceIndexSource::new([1, 2, 3]);
        registry.register(&"o1".into(), UNIT, &mut source).unwrap();

        assert!(registry.check_index(&"o1".into(), 2).is_ok());
        assert!(matches!(
            registry.check_index(&"o1".into(), 9),
            Err(SuretyError::IndexMismatch { index: 9, .. })
        ));
        assert!(matches!(
            registry.check_index(&"o2".into(), 2),
            Err(SuretyError::OracleNotRegistered(_))
        ));
    }
}
