//! Message codec: parses client text frames into [`ClientMessage`] and
//! serializes outgoing [`ServerMessage`] frames.
//!
//! Parsing a frame that doesn't match any known `type` tag, or whose
//! payload doesn't match that type's schema, yields `None` from
//! [`ClientMessage::parse`] — a silent drop, never a reply.
use std::fmt;

use atlas_core::CommandId;
use atlas_core::FaceId;
use atlas_core::ID;
use atlas_core::Q16;
use atlas_core::ServerMillis;
use atlas_core::SnapshotSeq;
use atlas_core::StateSeq;
use atlas_core::TerrainVersion;
use atlas_terrain::Controls;
use atlas_terrain::MovementConfig;
use atlas_terrain::coerce::RawControls;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::actor::Actor;
use crate::player::Player;

// ============================================================================
// CLIENT -> SERVER
// ============================================================================

/// A terrain snapshot as submitted by a `terrain_publish` sender: every
/// sub-field is untyped JSON so an unrecognized or malformed value
/// degrades to that field's default via control normalization (§4.B)
/// rather than failing to parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTerrainSnapshot {
    #[serde(default)]
    pub controls: RawControls,
    #[serde(default)]
    pub movement: RawControls,
    #[serde(rename = "mapWidth", default)]
    pub map_width: Option<Value>,
    #[serde(rename = "mapHeight", default)]
    pub map_height: Option<Value>,
}

/// Flatten a [`RawTerrainSnapshot`] into the single [`RawControls`] map the
/// terrain pipeline's normalization functions read from.
pub fn flatten_raw_snapshot(snapshot: &RawTerrainSnapshot) -> RawControls {
    let mut merged = snapshot.controls.clone();
    for (key, value) in snapshot.movement.iter() {
        merged.insert(key.clone(), value.clone());
    }
    if let Some(width) = &snapshot.map_width {
        merged.insert("mapWidth".to_string(), width.clone());
    }
    if let Some(height) = &snapshot.map_height {
        merged.insert("mapHeight".to_string(), height.clone());
    }
    merged
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join,
    #[serde(rename = "typing")]
    Typing { text: String },
    #[serde(rename = "launch")]
    Launch { text: String },
    #[serde(rename = "terrain_publish")]
    TerrainPublish {
        terrain: RawTerrainSnapshot,
        #[serde(rename = "clientVersion")]
        client_version: TerrainVersion,
    },
    #[serde(rename = "actor_move")]
    ActorMove {
        #[serde(rename = "actorId")]
        actor_id: ID<Actor>,
        #[serde(rename = "targetFace")]
        target_face: FaceId,
        #[serde(rename = "commandId")]
        command_id: CommandId,
        #[serde(rename = "terrainVersion")]
        terrain_version: TerrainVersion,
    },
}

impl ClientMessage {
    /// Parse one text frame. Binary frames never reach this function — the
    /// transport layer rejects them before decoding.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(message) => Some(message),
            Err(err) => {
                log::debug!("dropping malformed client frame: {err}");
                None
            }
        }
    }
}

// ============================================================================
// SERVER -> CLIENT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub id: ID<Player>,
    pub emoji: &'static str,
    pub color: &'static str,
    pub typing: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub text: String,
    pub color: &'static str,
    pub emoji: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainSnapshotView {
    pub controls: Controls,
    pub movement: MovementConfig,
    pub map_width: u32,
    pub map_height: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    pub actor_id: ID<Actor>,
    pub owner_id: ID<Player>,
    pub terrain_version: TerrainVersion,
    pub state_seq: StateSeq,
    pub command_id: CommandId,
    pub moving: bool,
    pub current_face: FaceId,
    pub target_face: Option<FaceId>,
    pub route_start_face: FaceId,
    pub route_target_face: Option<FaceId>,
    pub route_started_at_server_ms: ServerMillis,
    pub segment_from_face: Option<FaceId>,
    pub segment_to_face: Option<FaceId>,
    pub segment_duration_ms: i64,
    #[serde(rename = "segmentTQ16")]
    pub segment_tq16: Q16,
}

/// The closed set of reasons an `actor_move` can be rejected for. Never a
/// bare `String`, so every rejection stays matchable on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TerrainNotReady,
    ActorNotOwned,
    TerrainVersionMismatch,
    StaleCommandId,
    TargetUnreachable,
    NoPath,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::TerrainNotReady => "terrain_not_ready",
            RejectReason::ActorNotOwned => "actor_not_owned",
            RejectReason::TerrainVersionMismatch => "terrain_version_mismatch",
            RejectReason::StaleCommandId => "stale_command_id",
            RejectReason::TargetUnreachable => "target_unreachable",
            RejectReason::NoPath => "no_path",
        };
        f.write_str(s)
    }
}

impl Serialize for RejectReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        id: ID<Player>,
    },
    State {
        players: Vec<PlayerView>,
        #[serde(rename = "hostId")]
        host_id: Option<ID<Player>>,
        #[serde(rename = "sessionStart")]
        session_start: Option<ServerMillis>,
    },
    History {
        messages: Vec<HistoryEntry>,
    },
    Launch {
        text: String,
        id: ID<Player>,
        color: &'static str,
        emoji: &'static str,
    },
    #[serde(rename = "terrain_snapshot")]
    TerrainSnapshot {
        #[serde(rename = "terrainVersion")]
        terrain_version: TerrainVersion,
        terrain: TerrainSnapshotView,
        #[serde(rename = "publishedBy")]
        published_by: ID<Player>,
        #[serde(rename = "serverTime")]
        server_time: ServerMillis,
    },
    #[serde(rename = "world_snapshot")]
    WorldSnapshot {
        #[serde(rename = "terrainVersion")]
        terrain_version: TerrainVersion,
        #[serde(rename = "serverTime")]
        server_time: ServerMillis,
        #[serde(rename = "snapshotSeq")]
        snapshot_seq: SnapshotSeq,
        actors: Vec<ActorView>,
    },
    #[serde(rename = "actor_command")]
    ActorCommand {
        #[serde(rename = "actorId")]
        actor_id: ID<Actor>,
        #[serde(rename = "ownerId")]
        owner_id: ID<Player>,
        #[serde(rename = "commandId")]
        command_id: CommandId,
        #[serde(rename = "startFace")]
        start_face: FaceId,
        #[serde(rename = "targetFace")]
        target_face: FaceId,
        #[serde(rename = "startedAt")]
        started_at: ServerMillis,
        #[serde(rename = "routeStartedAtServerMs")]
        route_started_at_server_ms: ServerMillis,
        #[serde(rename = "terrainVersion")]
        terrain_version: TerrainVersion,
    },
    #[serde(rename = "actor_reject")]
    ActorReject {
        #[serde(rename = "actorId")]
        actor_id: ID<Actor>,
        #[serde(rename = "commandId")]
        command_id: CommandId,
        reason: RejectReason,
        #[serde(rename = "terrainVersion")]
        terrain_version: TerrainVersion,
    },
    #[serde(rename = "terrain_publish_forbidden")]
    TerrainPublishForbidden,
    #[serde(rename = "terrain_publish_invalid")]
    TerrainPublishInvalid { reason: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("server message always serializes")
    }
}
