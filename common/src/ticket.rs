use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capacity::{decode_open_slots, set_open_slots};
use crate::extensions::{CodecError, Extensions};

/// Attributes a ticket was searched with. Only used here to seed the search
/// criteria of a new backfill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFields {
    pub double_args: BTreeMap<String, f64>,
    pub string_args: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

/// A player or party waiting to be placed into a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticket {
    pub id: String,
    pub search_fields: Option<SearchFields>,
    pub extensions: Extensions,
    pub create_time: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// An allocated match that still has room for more players.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backfill {
    /// Empty until the pipeline accepts a newly created backfill.
    pub id: String,
    pub search_fields: Option<SearchFields>,
    pub extensions: Extensions,
    pub generation: i64,
    pub create_time: Option<DateTime<Utc>>,
}

impl Backfill {
    /// Fresh backfill seeded from the ticket that opened the match.
    pub fn for_ticket(ticket: &Ticket, open_slots: i32) -> Result<Self, CodecError> {
        let mut backfill = Self {
            search_fields: ticket.search_fields.clone(),
            create_time: Some(Utc::now()),
            ..Default::default()
        };
        backfill.set_open_slots(open_slots)?;
        Ok(backfill)
    }

    pub fn open_slots(&self, default: i32) -> Result<i32, CodecError> {
        decode_open_slots(&self.extensions, default)
    }

    pub fn set_open_slots(&mut self, slots: i32) -> Result<(), CodecError> {
        set_open_slots(&mut self.extensions, slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backfill_for_ticket_copies_search_fields() {
        let mut ticket = Ticket::new("t1");
        ticket.search_fields = Some(SearchFields {
            tags: vec!["mode.ctf".to_string()],
            ..Default::default()
        });

        let backfill = Backfill::for_ticket(&ticket, 3).unwrap();
        assert_eq!(backfill.search_fields, ticket.search_fields);
        assert_eq!(backfill.open_slots(10).unwrap(), 3);
        assert!(backfill.id.is_empty());
        assert_eq!(backfill.generation, 0);
    }

    #[test]
    fn test_ticket_deserializes_with_missing_fields() {
        let ticket: Ticket = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(ticket, Ticket::new("abc"));
    }
}
