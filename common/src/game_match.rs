use serde::{Deserialize, Serialize};

use crate::extensions::Extensions;
use crate::ticket::{Backfill, Ticket};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pool {
    pub name: String,
}

/// What the pipeline asks matches to be made for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchProfile {
    pub name: String,
    pub pools: Vec<Pool>,
    pub extensions: Extensions,
}

impl MatchProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Match {
    pub match_id: String,
    pub match_profile: String,
    pub match_function: String,
    pub tickets: Vec<Ticket>,
    pub backfill: Option<Backfill>,
    /// Set only when the match needs a brand new game server.
    pub allocate_gameserver: bool,
    pub extensions: Extensions,
}

impl Match {
    pub fn ticket_ids(&self) -> Vec<String> {
        self.tickets.iter().map(|t| t.id.clone()).collect()
    }
}
