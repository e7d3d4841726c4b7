use serde::{Deserialize, Serialize};

use crate::extensions::Extensions;
use crate::game_match::Match;

/// Tickets waiting for a connection, plus the extensions that carry the
/// server filter. The allocator fills in `connection` and moves satisfied
/// ids from `ticket_ids` to `assigned_ticket_ids`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentGroup {
    pub ticket_ids: Vec<String>,
    pub assigned_ticket_ids: Vec<String>,
    pub extensions: Extensions,
    pub connection: Option<String>,
}

impl AssignmentGroup {
    pub fn new(ticket_ids: Vec<String>, extensions: Extensions) -> Self {
        Self {
            ticket_ids,
            extensions,
            ..Default::default()
        }
    }

    pub fn from_match(m: &Match) -> Self {
        Self::new(m.ticket_ids(), m.extensions.clone())
    }

    pub fn is_assigned(&self) -> bool {
        self.connection.is_some()
    }
}
