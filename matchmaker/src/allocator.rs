use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use common::{AssignmentGroup, CodecError, GameServer, extract_filter, parse_game_servers};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::discovery::GameServerDiscovery;

/// Why a group was left without a connection. Scoped to one group, never
/// fatal to the batch.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("assignment does not have a valid filter extension: {0}")]
    InvalidFilter(#[from] CodecError),

    #[error("discovery request failed: {0}")]
    Discovery(String),

    #[error("discovery response does not contain game servers: {0}")]
    InvalidDiscoveryResponse(#[from] serde_json::Error),

    #[error("no game server has free player slots")]
    NoGameServers,

    #[error("first eligible game server has {first_available} free, {requested} tickets requested")]
    InsufficientCapacity { requested: usize, first_available: i64 },

    #[error("assignment group has no tickets")]
    EmptyGroup,
}

impl AllocationError {
    /// Stable code for logs and reports
    pub fn reason(&self) -> &'static str {
        match self {
            AllocationError::InvalidFilter(_) => "invalid_filter",
            AllocationError::Discovery(_) => "discovery_failed",
            AllocationError::InvalidDiscoveryResponse(_) => "invalid_discovery_response",
            AllocationError::NoGameServers => "no_game_servers",
            AllocationError::InsufficientCapacity { .. } => "insufficient_capacity",
            AllocationError::EmptyGroup => "empty_group",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAllocation {
    pub address: String,
    /// Free slots the server reported before anything was placed on it
    pub free: i64,
    pub ticket_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedAssignment {
    /// One entry per server used, in discovery order
    pub allocations: Vec<ServerAllocation>,
    pub unallocated: Vec<String>,
}

/// Walk the servers in the order discovery returned them and hand each one
/// as many of the pending tickets as it has free slots.
pub fn compute_assignment(ticket_ids: &[String], servers: &[GameServer]) -> ComputedAssignment {
    let mut pending = ticket_ids;
    let mut allocations = Vec::new();

    for gs in servers {
        if pending.is_empty() {
            break;
        }

        let free = gs.remaining_capacity();
        if free <= 0 {
            continue;
        }

        let take = usize::try_from(free).unwrap_or(usize::MAX).min(pending.len());
        let (assigned, rest) = pending.split_at(take);
        allocations.push(ServerAllocation {
            address: gs.address().to_string(),
            free,
            ticket_ids: assigned.to_vec(),
        });
        pending = rest;
    }

    ComputedAssignment {
        allocations,
        unallocated: pending.to_vec(),
    }
}

#[derive(Debug)]
pub enum GroupOutcome {
    Assigned {
        connection: String,
        ticket_ids: Vec<String>,
    },
    Unassigned {
        ticket_ids: Vec<String>,
        error: AllocationError,
    },
}

#[derive(Debug, Default)]
pub struct AllocationReport {
    /// Same order as the groups passed in
    pub outcomes: Vec<GroupOutcome>,
}

impl AllocationReport {
    pub fn assigned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, GroupOutcome::Assigned { .. }))
            .count()
    }

    pub fn unassigned(&self) -> usize {
        self.outcomes.len() - self.assigned()
    }
}

/// Binds assignment groups to game servers found through discovery.
pub struct Allocator {
    discovery: Arc<dyn GameServerDiscovery>,
    request_timeout: Duration,
}

impl Allocator {
    pub fn new(discovery: Arc<dyn GameServerDiscovery>, request_timeout: Duration) -> Self {
        Self {
            discovery,
            request_timeout,
        }
    }

    /// Resolve every group in place. A group that cannot be placed keeps its
    /// pending tickets and no connection; the rest of the batch carries on.
    pub async fn allocate(
        &self,
        cancel: &CancellationToken,
        groups: &mut [AssignmentGroup],
    ) -> AllocationReport {
        let mut report = AllocationReport::default();

        for group in groups.iter_mut() {
            let outcome = match self.assign_group(cancel, group).await {
                Ok(connection) => {
                    info!(%connection, tickets = group.assigned_ticket_ids.len(), "Connection assigned to request");
                    GroupOutcome::Assigned {
                        connection,
                        ticket_ids: group.assigned_ticket_ids.clone(),
                    }
                }
                Err(error) => {
                    warn!(reason = error.reason(), error = %error, tickets = group.ticket_ids.len(), "Request could not have a connection assigned");
                    GroupOutcome::Unassigned {
                        ticket_ids: group.ticket_ids.clone(),
                        error,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        debug!(assigned = report.assigned(), unassigned = report.unassigned(), "Allocation finished");
        report
    }

    async fn assign_group(
        &self,
        cancel: &CancellationToken,
        group: &mut AssignmentGroup,
    ) -> Result<String, AllocationError> {
        if group.ticket_ids.is_empty() {
            return Err(AllocationError::EmptyGroup);
        }

        let query = extract_filter(&group.extensions)?
            .map(|filter| filter.to_query())
            .unwrap_or_default();

        let body = self.list_game_servers(cancel, &query).await?;
        let servers = parse_game_servers(&body)?;

        let computed = compute_assignment(&group.ticket_ids, &servers);
        match computed.allocations.as_slice() {
            [] => Err(AllocationError::NoGameServers),
            [only] if computed.unallocated.is_empty() => {
                let connection = only.address.clone();
                group.assigned_ticket_ids.extend(group.ticket_ids.drain(..only.ticket_ids.len()));
                group.connection = Some(connection.clone());
                Ok(connection)
            }
            [first, ..] => Err(AllocationError::InsufficientCapacity {
                requested: group.ticket_ids.len(),
                first_available: first.free,
            }),
        }
    }

    async fn list_game_servers(
        &self,
        cancel: &CancellationToken,
        query: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, AllocationError> {
        let request = tokio::time::timeout(self.request_timeout, self.discovery.list_game_servers(query));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AllocationError::Discovery("request cancelled".to_string())),
            result = request => match result {
                Ok(Ok(body)) => Ok(body),
                Ok(Err(e)) => Err(AllocationError::Discovery(format!("{:#}", e))),
                Err(_) => Err(AllocationError::Discovery(format!(
                    "timed out after {}ms",
                    self.request_timeout.as_millis()
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t{}", i)).collect()
    }

    #[test]
    fn test_compute_assignment_single_server() {
        let servers = vec![GameServer::new("10.0.0.1:7777", 10, 2)];
        let computed = compute_assignment(&ids(3), &servers);

        assert_eq!(computed.allocations.len(), 1);
        assert_eq!(computed.allocations[0].address, "10.0.0.1:7777");
        assert_eq!(computed.allocations[0].ticket_ids, ids(3));
        assert!(computed.unallocated.is_empty());
    }

    #[test]
    fn test_compute_assignment_spills_in_discovery_order() {
        let servers = vec![
            GameServer::new("full", 4, 4),
            GameServer::new("a", 4, 2),
            GameServer::new("b", 8, 0),
            GameServer::new("c", 8, 0),
        ];
        let computed = compute_assignment(&ids(5), &servers);

        let used: Vec<(&str, usize)> = computed
            .allocations
            .iter()
            .map(|a| (a.address.as_str(), a.ticket_ids.len()))
            .collect();
        assert_eq!(used, vec![("a", 2), ("b", 3)]);
        assert_eq!(computed.allocations[0].ticket_ids, vec!["t0", "t1"]);
        assert!(computed.unallocated.is_empty());
    }

    #[test]
    fn test_compute_assignment_leftovers() {
        let servers = vec![GameServer::new("a", 10, 8)];
        let computed = compute_assignment(&ids(3), &servers);

        assert_eq!(computed.allocations[0].ticket_ids, vec!["t0", "t1"]);
        assert_eq!(computed.allocations[0].free, 2);
        assert_eq!(computed.unallocated, vec!["t2"]);
    }

    #[test]
    fn test_compute_assignment_no_servers() {
        let computed = compute_assignment(&ids(2), &[]);
        assert!(computed.allocations.is_empty());
        assert_eq!(computed.unallocated, ids(2));
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(AllocationError::NoGameServers.reason(), "no_game_servers");
        assert_eq!(
            AllocationError::InsufficientCapacity { requested: 3, first_available: 2 }.reason(),
            "insufficient_capacity"
        );
        assert_eq!(AllocationError::Discovery("x".to_string()).reason(), "discovery_failed");
    }
}
