use common::{Match, PLAYER_CAPACITY_MATCHFUNC, Ticket};
use tracing::debug;

use crate::match_function::{
    MatchFunction, MatchFunctionError, MatchFunctionRequest, MatchIdGenerator,
    create_match_for_tickets, validate_request,
};

/// Groups tickets into matches of at most `capacity`, the player capacity of
/// the game servers they will land on. Backfills are not used.
#[derive(Debug, Clone, Copy)]
pub struct PlayerCapacity {
    pub capacity: usize,
}

impl PlayerCapacity {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl MatchFunction for PlayerCapacity {
    fn name(&self) -> &'static str {
        PLAYER_CAPACITY_MATCHFUNC
    }

    fn make_matches(&self, request: &MatchFunctionRequest) -> Result<Vec<Match>, MatchFunctionError> {
        let capacity = i64::try_from(self.capacity).unwrap_or(i64::MAX);
        let profile = validate_request(capacity, request)?;

        // Pools come out in name order, tickets in pool order
        let tickets: Vec<Ticket> = request
            .pool_tickets
            .iter()
            .flat_map(|pools| pools.values())
            .flatten()
            .cloned()
            .collect();

        let mut ids = MatchIdGenerator::new(&profile.name);
        let matches: Vec<Match> = tickets
            .chunks(self.capacity)
            .map(|chunk| {
                let m = create_match_for_tickets(ids.next_id(), profile, self.name(), chunk.to_vec());
                debug!(match_id = %m.match_id, tickets = chunk.len(), "Created match");
                m
            })
            .collect();

        debug!(profile = %profile.name, matches = matches.len(), "Total matches for profile");
        Ok(matches)
    }
}
