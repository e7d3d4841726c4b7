/// Players a match is built for when no target is configured
pub const DEFAULT_PLAYERS_PER_MATCH: i32 = 10;

/// Tickets per match for the fixed capacity strategy when none is configured
pub const DEFAULT_MATCH_CAPACITY: usize = 10;

/// Name recorded on matches built by fixed capacity chunking
pub const PLAYER_CAPACITY_MATCHFUNC: &str = "player_capacity_matchfunc";

/// Name recorded on matches built with backfills
pub const BACKFILL_MATCHFUNC: &str = "backfill_matchfunc";

/// Default discovery request timeout in milliseconds
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 5000;
