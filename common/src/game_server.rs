use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameServerPort {
    pub name: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStatus {
    pub capacity: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameServerStatus {
    pub state: String,
    pub address: String,
    pub ports: Vec<GameServerPort>,
    pub players: Option<PlayerStatus>,
}

/// Snapshot of a live game server as reported by the discovery service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameServer {
    pub metadata: ObjectMeta,
    pub status: GameServerStatus,
}

impl GameServer {
    pub fn new(address: impl Into<String>, capacity: i64, count: i64) -> Self {
        Self {
            metadata: ObjectMeta::default(),
            status: GameServerStatus {
                state: "Ready".to_string(),
                address: address.into(),
                ports: Vec::new(),
                players: Some(PlayerStatus { capacity, count }),
            },
        }
    }

    pub fn address(&self) -> &str {
        &self.status.address
    }

    /// Free player slots. Servers without player tracking have none, and an
    /// over-reported count never yields a negative value.
    pub fn remaining_capacity(&self) -> i64 {
        self.status
            .players
            .map(|p| p.capacity.saturating_sub(p.count).max(0))
            .unwrap_or(0)
    }
}

/// Decode the discovery service's JSON array of game servers.
pub fn parse_game_servers(body: &[u8]) -> Result<Vec<GameServer>, serde_json::Error> {
    serde_json::from_slice(body)
}
