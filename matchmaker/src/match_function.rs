use std::collections::{BTreeMap, HashMap};
use chrono::Utc;
use common::{Backfill, CodecError, Match, MatchProfile, Ticket};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// One build cycle's input as handed over by the pipeline. Every field may be
/// missing on the wire, so validation happens in the match functions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchFunctionRequest {
    pub profile: Option<MatchProfile>,
    pub pool_tickets: Option<BTreeMap<String, Vec<Ticket>>>,
    pub pool_backfills: Option<BTreeMap<String, Vec<Backfill>>>,
}

impl MatchFunctionRequest {
    pub fn new(profile: MatchProfile) -> Self {
        Self {
            profile: Some(profile),
            pool_tickets: Some(BTreeMap::new()),
            pool_backfills: Some(BTreeMap::new()),
        }
    }

    pub fn with_tickets(mut self, pool: impl Into<String>, tickets: Vec<Ticket>) -> Self {
        self.pool_tickets
            .get_or_insert_with(BTreeMap::new)
            .insert(pool.into(), tickets);
        self
    }

    pub fn with_backfills(mut self, pool: impl Into<String>, backfills: Vec<Backfill>) -> Self {
        self.pool_backfills
            .get_or_insert_with(BTreeMap::new)
            .insert(pool.into(), backfills);
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchFunctionError {
    #[error("player capacity must be higher than zero, got {0}")]
    InvalidCapacity(i64),

    #[error("match profile is missing")]
    NilProfile,

    #[error("ticket pools are missing")]
    NilPool,

    #[error("backfill '{backfill_id}' has unusable open slots: {source}")]
    Codec {
        backfill_id: String,
        #[source]
        source: CodecError,
    },

    #[error("no match function registered for profile '{0}'")]
    UnknownProfile(String),
}

/// A strategy that turns one cycle's pools into matches.
pub trait MatchFunction: Send + Sync {
    /// Recorded on every match this function produces
    fn name(&self) -> &'static str;

    fn make_matches(&self, request: &MatchFunctionRequest) -> Result<Vec<Match>, MatchFunctionError>;
}

/// Checks shared by every strategy. Returns the profile on success.
pub fn validate_request(
    capacity: i64,
    request: &MatchFunctionRequest,
) -> Result<&MatchProfile, MatchFunctionError> {
    if capacity <= 0 {
        return Err(MatchFunctionError::InvalidCapacity(capacity));
    }

    let profile = request.profile.as_ref().ok_or(MatchFunctionError::NilProfile)?;

    if request.pool_tickets.is_none() {
        return Err(MatchFunctionError::NilPool);
    }

    Ok(profile)
}

/// Hands out `profile-<name>-<nanos>` ids for a single build call. The
/// timestamp is bumped when the clock has not moved so ids never repeat
/// within the call.
pub struct MatchIdGenerator {
    profile_name: String,
    last_nanos: i64,
}

impl MatchIdGenerator {
    pub fn new(profile_name: &str) -> Self {
        Self {
            profile_name: profile_name.to_string(),
            last_nanos: i64::MIN,
        }
    }

    pub fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let nanos = if now > self.last_nanos {
            now
        } else {
            self.last_nanos.saturating_add(1)
        };
        self.last_nanos = nanos;
        format!("profile-{}-{}", self.profile_name, nanos)
    }
}

/// Build a match for `tickets` carrying the profile's extensions along.
pub fn create_match_for_tickets(
    match_id: String,
    profile: &MatchProfile,
    function_name: &str,
    tickets: Vec<Ticket>,
) -> Match {
    Match {
        match_id,
        match_profile: profile.name.clone(),
        match_function: function_name.to_string(),
        tickets,
        backfill: None,
        allocate_gameserver: false,
        extensions: profile.extensions.clone(),
    }
}

/// Picks the strategy for each profile.
#[derive(Default)]
pub struct MatchFunctionRegistry {
    functions: HashMap<String, Box<dyn MatchFunction>>,
}

impl MatchFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, profile: impl Into<String>, function: Box<dyn MatchFunction>) {
        self.functions.insert(profile.into(), function);
    }

    pub fn get(&self, profile: &str) -> Option<&dyn MatchFunction> {
        self.functions.get(profile).map(|f| f.as_ref())
    }

    pub fn run(&self, request: &MatchFunctionRequest) -> Result<Vec<Match>, MatchFunctionError> {
        let profile = request.profile.as_ref().ok_or(MatchFunctionError::NilProfile)?;
        let function = self
            .get(&profile.name)
            .ok_or_else(|| MatchFunctionError::UnknownProfile(profile.name.clone()))?;

        debug!(profile = %profile.name, function = function.name(), "Running match function");
        function.make_matches(request)
    }
}
