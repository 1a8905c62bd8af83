use std::collections::HashMap;

use serde::Serialize;
use surety_common::Identity;

/// Votes collected for one pending airline.
///
/// Each voter is recorded once; `votes` always equals the number of voters
/// marked `true`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ballot {
    voters: HashMap<Identity, bool>,
    votes: u32,
}

impl Ballot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a vote. Returns `false` if the voter had already voted.
    pub fn record(&mut self, voter: &Identity) -> bool {
        if self.has_voted(voter) {
            return false;
        }
        self.voters.insert(voter.clone(), true);
        self.votes += 1;
        true
    }

    pub fn has_voted(&self, voter: &Identity) -> bool {
        self.voters.get(voter).copied().unwrap_or(false)
    }

    pub fn votes(&self) -> u32 {
        self.votes
    }

    pub fn voters(&self) -> impl Iterator<Item = &Identity> {
        self.voters
            .iter()
            .filter(|(_, voted)| **voted)
            .map(|(voter, _)| voter)
    }

    pub fn is_empty(&self) -> bool {
        self.votes == 0
    }
}
