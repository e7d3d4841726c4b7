use std::collections::{BTreeMap, VecDeque};
use common::{BACKFILL_MATCHFUNC, Backfill, Match, Ticket};
use tracing::{debug, warn};

use crate::match_function::{
    MatchFunction, MatchFunctionError, MatchFunctionRequest, MatchIdGenerator,
    create_match_for_tickets, validate_request,
};

/// Fills existing backfills first, then opens a new match (and backfill) for
/// every ticket left over.
///
/// Only the first ticket pool and the first backfill pool (by pool name) are
/// read; any others are logged and ignored.
#[derive(Debug, Clone, Copy)]
pub struct BackfillMatching {
    /// Target player count of a match, also the open slots of a backfill
    /// that has none recorded.
    pub players_per_match: i32,
}

impl BackfillMatching {
    pub fn new(players_per_match: i32) -> Self {
        Self { players_per_match }
    }
}

impl MatchFunction for BackfillMatching {
    fn name(&self) -> &'static str {
        BACKFILL_MATCHFUNC
    }

    fn make_matches(&self, request: &MatchFunctionRequest) -> Result<Vec<Match>, MatchFunctionError> {
        let profile = validate_request(i64::from(self.players_per_match), request)?;

        let mut tickets: VecDeque<Ticket> = first_pool(&profile.name, "ticket", request.pool_tickets.as_ref())
            .iter()
            .cloned()
            .collect();
        let backfills = first_pool(&profile.name, "backfill", request.pool_backfills.as_ref()).to_vec();

        let mut ids = MatchIdGenerator::new(&profile.name);
        let mut matches = Vec::new();

        for mut backfill in backfills {
            let open_slots = backfill
                .open_slots(self.players_per_match)
                .map_err(|source| MatchFunctionError::Codec {
                    backfill_id: backfill.id.clone(),
                    source,
                })?;

            let take = usize::try_from(open_slots).unwrap_or(0).min(tickets.len());
            if take == 0 {
                debug!(backfill_id = %backfill.id, open_slots, "No tickets for backfill");
                continue;
            }

            let assigned: Vec<Ticket> = tickets.drain(..take).collect();
            let remaining = open_slots.saturating_sub(i32::try_from(assigned.len()).unwrap_or(i32::MAX));
            backfill
                .set_open_slots(remaining)
                .map_err(|source| MatchFunctionError::Codec {
                    backfill_id: backfill.id.clone(),
                    source,
                })?;

            let mut m = create_match_for_tickets(ids.next_id(), profile, self.name(), assigned);
            debug!(match_id = %m.match_id, backfill_id = %backfill.id, tickets = m.tickets.len(), "Filled backfill");
            m.backfill = Some(backfill);
            matches.push(m);
        }

        let backfilled = matches.len();

        while let Some(ticket) = tickets.pop_front() {
            let backfill = Backfill::for_ticket(&ticket, self.players_per_match - 1).map_err(|source| {
                MatchFunctionError::Codec {
                    backfill_id: String::new(),
                    source,
                }
            })?;
            let mut m = create_match_for_tickets(ids.next_id(), profile, self.name(), vec![ticket]);
            m.backfill = Some(backfill);
            m.allocate_gameserver = true;
            matches.push(m);
        }

        debug!(
            profile = %profile.name,
            backfilled,
            new = matches.len() - backfilled,
            "Total matches for profile"
        );
        Ok(matches)
    }
}

/// Contents of the first pool by name. Extra pools are reported, not merged.
fn first_pool<'a, T>(
    profile: &str,
    kind: &str,
    pools: Option<&'a BTreeMap<String, Vec<T>>>,
) -> &'a [T] {
    let Some(pools) = pools else {
        return &[];
    };

    let mut iter = pools.iter();
    let first = iter.next();

    let ignored: Vec<&String> = iter.map(|(name, _)| name).collect();
    if !ignored.is_empty() {
        warn!(profile, kind, ?ignored, "Only the first pool is used, ignoring the rest");
    }

    first.map(|(_, items)| items.as_slice()).unwrap_or(&[])
}
