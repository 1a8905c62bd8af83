use serde::{Deserialize, Serialize};

/// Quorum rule for airline registration.
///
/// Below `bootstrap_size` registered airlines a single active sponsor admits a
/// candidate. From then on a candidate needs `ceil(registered / 2)` votes,
/// counted against the membership before the candidate joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiPartyQuorum {
    pub bootstrap_size: u32,
}

impl Default for MultiPartyQuorum {
    fn default() -> Self {
        Self { bootstrap_size: 4 }
    }
}

impl MultiPartyQuorum {
    pub fn new(bootstrap_size: u32) -> Self {
        Self { bootstrap_size }
    }

    pub fn requires_ballot(&self, registered: u32) -> bool {
        registered >= self.bootstrap_size
    }

    /// Votes needed to admit a candidate; never less than one.
    pub fn required_votes(&self, registered: u32) -> u32 {
        if !self.requires_ballot(registered) {
            return 1;
        }
        registered.div_ceil(2).max(1)
    }

    pub fn is_reached(&self, votes: u32, registered: u32) -> bool {
        votes >= self.required_votes(registered)
    }
}
