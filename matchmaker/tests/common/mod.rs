#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use common::{AssignmentGroup, Extensions, FILTER_KEY, Filter, GameServer, Ticket};
use matchmaker::discovery::GameServerDiscovery;

/// What the fake discovery service answers with
pub enum Response {
    Servers(Vec<GameServer>),
    Raw(Vec<u8>),
    Fail(String),
    Hang,
}

/// In-memory discovery service that records every filter it was asked for.
pub struct StaticDiscovery {
    response: Response,
    queries: Mutex<Vec<BTreeMap<String, String>>>,
}

impl StaticDiscovery {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn servers(servers: Vec<GameServer>) -> Self {
        Self::new(Response::Servers(servers))
    }

    pub fn queries(&self) -> Vec<BTreeMap<String, String>> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl GameServerDiscovery for StaticDiscovery {
    async fn list_game_servers(&self, filter: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        self.queries.lock().unwrap().push(filter.clone());

        match &self.response {
            Response::Servers(servers) => Ok(serde_json::to_vec(servers)?),
            Response::Raw(body) => Ok(body.clone()),
            Response::Fail(message) => Err(anyhow!("{}", message)),
            Response::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn tickets(prefix: &str, n: usize) -> Vec<Ticket> {
    (0..n).map(|i| Ticket::new(format!("{}{}", prefix, i))).collect()
}

pub fn ticket_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("t{}", i)).collect()
}

pub fn group(n: usize) -> AssignmentGroup {
    AssignmentGroup::new(ticket_ids(n), Extensions::new())
}

pub fn group_with_filter(n: usize, filter: Filter) -> AssignmentGroup {
    let mut extensions = Extensions::new();
    extensions.insert(FILTER_KEY.to_string(), filter.into_extension().unwrap());
    AssignmentGroup::new(ticket_ids(n), extensions)
}
