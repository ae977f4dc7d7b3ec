//! The room state machine itself.
//!
//! `empty -> hosted -> terrainReady` is never stored as an explicit enum:
//! it is always derivable from `connections.is_empty()` and
//! `terrain.is_some()`, which keeps it impossible for the phase to drift
//! out of sync with the data it is supposed to summarize.
use std::collections::HashMap;
use std::collections::VecDeque;

use atlas_core::CommandId;
use atlas_core::FaceId;
use atlas_core::ID;
use atlas_core::MAX_HISTORY;
use atlas_core::SNAPSHOT_INTERVAL_MS;
use atlas_core::ServerMillis;
use atlas_core::SnapshotSeq;
use atlas_core::TerrainVersion;
use atlas_nav::find_path;

use crate::actor::Actor;
use crate::player::Player;
use crate::terrain::TerrainRuntime;
use crate::terrain::build_runtime;
use crate::terrain::pick_spawn_face;
use crate::wire::ActorView;
use crate::wire::ClientMessage;
use crate::wire::HistoryEntry;
use crate::wire::PlayerView;
use crate::wire::RawTerrainSnapshot;
use crate::wire::RejectReason;
use crate::wire::ServerMessage;
use crate::wire::TerrainSnapshotView;
use crate::wire::flatten_raw_snapshot;

/// An event the caller (the async socket bridge in `atlas-hosting`) must
/// deliver. `Room` never touches a socket directly.
#[derive(Debug, Clone)]
pub enum Outbound {
    Unicast(ID<Player>, ServerMessage),
    Broadcast(ServerMessage),
}

/// The single live world this process hosts: one room instance owns the
/// world. No room-directory/multi-room routing lives here; that's an
/// external collaborator this system treats as out of scope.
pub struct Room {
    order: Vec<ID<Player>>,
    players: HashMap<ID<Player>, Player>,
    actors: HashMap<ID<Player>, Actor>,
    host_id: Option<ID<Player>>,
    session_start: Option<ServerMillis>,
    history: VecDeque<HistoryEntry>,
    terrain: Option<TerrainRuntime>,
    terrain_published_by: Option<ID<Player>>,
    snapshot_seq: SnapshotSeq,
    last_snapshot_at: Option<ServerMillis>,
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

impl Room {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            players: HashMap::new(),
            actors: HashMap::new(),
            host_id: None,
            session_start: None,
            history: VecDeque::new(),
            terrain: None,
            terrain_published_by: None,
            snapshot_seq: 0,
            last_snapshot_at: None,
        }
    }

    pub fn host_id(&self) -> Option<ID<Player>> {
        self.host_id
    }

    pub fn terrain_version(&self) -> Option<TerrainVersion> {
        self.terrain.as_ref().map(|t| t.terrain_version)
    }

    pub fn actor_of(&self, player: ID<Player>) -> Option<&Actor> {
        self.actors.get(&player)
    }

    /// Every moving actor's next segment-boundary instant, for the alarm
    /// scheduler to fold into `atlas_room::alarm::next_wakeup`.
    pub fn moving_actor_edges(&self) -> Vec<ServerMillis> {
        self.actors.values().filter_map(Actor::next_edge_at).collect()
    }

    pub fn last_snapshot_at(&self) -> Option<ServerMillis> {
        self.last_snapshot_at
    }

    // ========================================================================
    // CONNECTION LIFECYCLE (connect / disconnect)
    // ========================================================================

    /// Register a new connection. First connection becomes host and starts
    /// the session clock. If terrain is already published, attempt to spawn
    /// an actor for the new player immediately.
    pub fn connect(&mut self, now: ServerMillis) -> (ID<Player>, Vec<Outbound>) {
        let player = Player::new();
        let id = player.id;

        if self.order.is_empty() {
            self.host_id = Some(id);
            self.session_start = Some(now);
        }
        self.order.push(id);
        self.players.insert(id, player);
        log::info!("connection accepted: {id}");

        let spawned = self.spawn_actor_for(id, now);

        let mut events = vec![
            Outbound::Unicast(id, ServerMessage::Welcome { id }),
            Outbound::Broadcast(self.state_message()),
        ];
        if spawned {
            events.push(Outbound::Broadcast(self.broadcast_world_snapshot(now)));
        }
        (id, events)
    }

    /// Remove a connection and its actor. Re-elects the host from the
    /// oldest remaining connection (insertion order) if the disconnecter
    /// was host.
    pub fn disconnect(&mut self, id: ID<Player>, now: ServerMillis) -> Vec<Outbound> {
        if self.players.remove(&id).is_none() {
            return Vec::new();
        }
        self.actors.remove(&id);
        self.order.retain(|&p| p != id);

        if self.host_id == Some(id) {
            self.host_id = self.order.first().copied();
            if self.host_id.is_none() {
                self.session_start = None;
            }
            log::info!("host disconnected; new host is {:?}", self.host_id);
        }

        vec![
            Outbound::Broadcast(self.state_message()),
            Outbound::Broadcast(self.broadcast_world_snapshot(now)),
        ]
    }

    // ========================================================================
    // MESSAGE DISPATCH
    // ========================================================================

    pub fn handle_message(&mut self, sender: ID<Player>, message: ClientMessage, now: ServerMillis) -> Vec<Outbound> {
        match message {
            ClientMessage::Join => self.handle_join(sender, now),
            ClientMessage::Typing { text } => self.handle_typing(sender, text),
            ClientMessage::Launch { text } => self.handle_launch(sender, text),
            ClientMessage::TerrainPublish { terrain, .. } => self.handle_terrain_publish(sender, terrain, now),
            ClientMessage::ActorMove {
                actor_id,
                target_face,
                command_id,
                terrain_version,
            } => self.handle_actor_move(sender, actor_id, target_face, command_id, terrain_version, now),
        }
    }

    fn handle_join(&self, sender: ID<Player>, now: ServerMillis) -> Vec<Outbound> {
        let mut events = vec![
            Outbound::Unicast(sender, self.state_message()),
            Outbound::Unicast(sender, self.history_message()),
        ];
        if let Some(terrain) = &self.terrain {
            events.push(Outbound::Unicast(sender, self.terrain_snapshot_message(terrain, now)));
            events.push(Outbound::Unicast(sender, self.peek_world_snapshot(now)));
        }
        events
    }

    fn handle_typing(&mut self, sender: ID<Player>, text: String) -> Vec<Outbound> {
        let Some(player) = self.players.get_mut(&sender) else {
            return Vec::new();
        };
        if player.typing == text {
            return Vec::new();
        }
        player.typing = text;
        vec![Outbound::Broadcast(self.state_message())]
    }

    fn handle_launch(&mut self, sender: ID<Player>, text: String) -> Vec<Outbound> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        let Some(player) = self.players.get(&sender) else {
            return Vec::new();
        };
        let color = player.color;
        let emoji = player.emoji;
        self.history.push_back(HistoryEntry {
            text: trimmed.to_string(),
            color,
            emoji,
        });
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
        vec![Outbound::Broadcast(ServerMessage::Launch {
            text: trimmed.to_string(),
            id: sender,
            color,
            emoji,
        })]
    }

    fn handle_terrain_publish(&mut self, sender: ID<Player>, raw: RawTerrainSnapshot, now: ServerMillis) -> Vec<Outbound> {
        if self.host_id != Some(sender) {
            log::warn!("terrain_publish rejected: {sender} is not host");
            return vec![Outbound::Unicast(sender, ServerMessage::TerrainPublishForbidden)];
        }

        let flattened = flatten_raw_snapshot(&raw);
        let previous_version = self.terrain_version().unwrap_or(0);
        match build_runtime(&flattened, previous_version) {
            Ok(runtime) => {
                log::info!("terrain published: version {}", runtime.terrain_version);
                self.terrain = Some(runtime);
                self.terrain_published_by = Some(sender);
                self.reseed_actors(now);
                let terrain = self.terrain.as_ref().expect("just set");
                vec![
                    Outbound::Broadcast(self.terrain_snapshot_message(terrain, now)),
                    Outbound::Broadcast(self.broadcast_world_snapshot(now)),
                ]
            }
            Err(err) => {
                log::warn!("terrain_publish_invalid: {err}");
                vec![Outbound::Unicast(
                    sender,
                    ServerMessage::TerrainPublishInvalid { reason: err.to_string() },
                )]
            }
        }
    }

    /// Validation pipeline for `actor_move`.
    fn handle_actor_move(
        &mut self,
        sender: ID<Player>,
        actor_id: ID<crate::actor::Actor>,
        target_face: FaceId,
        command_id: CommandId,
        terrain_version: TerrainVersion,
        now: ServerMillis,
    ) -> Vec<Outbound> {
        let Some(current_version) = self.terrain_version() else {
            return vec![Self::reject(sender, actor_id, command_id, RejectReason::TerrainNotReady, 0)];
        };

        let owns_actor = self
            .actors
            .get(&sender)
            .is_some_and(|actor| actor.owner_id == sender && actor.actor_id == actor_id);
        if !owns_actor {
            return vec![Self::reject(sender, actor_id, command_id, RejectReason::ActorNotOwned, current_version)];
        }
        if terrain_version != current_version {
            return vec![Self::reject(
                sender,
                actor_id,
                command_id,
                RejectReason::TerrainVersionMismatch,
                current_version,
            )];
        }

        let max_seen = {
            let actor = &self.actors[&sender];
            actor.command_id.max(actor.pending_command_id.unwrap_or(0))
        };
        if command_id <= max_seen {
            return vec![Self::reject(sender, actor_id, command_id, RejectReason::StaleCommandId, current_version)];
        }

        let target_in_graph = self
            .terrain
            .as_ref()
            .is_some_and(|t| (target_face as usize) < t.nav.face_to_node.len());
        if !target_in_graph {
            return vec![Self::reject(
                sender,
                actor_id,
                command_id,
                RejectReason::TargetUnreachable,
                current_version,
            )];
        }

        let Room { terrain, actors, .. } = self;
        let terrain = terrain.as_ref().expect("checked above");
        let actor = actors.get_mut(&sender).expect("checked above");
        actor.advance(&terrain.nav, &terrain.build.movement, now);

        if actor.moving {
            let next_face = actor.segment_to_face().unwrap_or(actor.current_face);
            let reachable = find_path(&terrain.nav, next_face, target_face)
                .is_some_and(|result| !result.face_path.is_empty() && result.total_cost.is_finite());
            if !reachable {
                return vec![Self::reject(sender, actor_id, command_id, RejectReason::NoPath, current_version)];
            }
            actor.pending_command_id = Some(command_id);
            actor.pending_target_face = Some(target_face);
            Vec::new()
        } else if actor.start_route(&terrain.nav, &terrain.build.movement, command_id, target_face, now) {
            let message = Self::actor_command_message(actor, current_version);
            vec![Outbound::Broadcast(message)]
        } else {
            vec![Self::reject(sender, actor_id, command_id, RejectReason::NoPath, current_version)]
        }
    }

    // ========================================================================
    // ALARM (on alarm fire)
    // ========================================================================

    /// Advance every actor to `now`. Broadcasts `world_snapshot` when any
    /// actor changed or the heartbeat deadline has elapsed.
    pub fn on_alarm(&mut self, now: ServerMillis) -> Vec<Outbound> {
        let mut any_changed = false;
        if let Some(terrain) = &self.terrain {
            for actor in self.actors.values_mut() {
                if actor.advance(&terrain.nav, &terrain.build.movement, now) {
                    any_changed = true;
                }
            }
        }
        let due = match self.last_snapshot_at {
            Some(at) => now - at >= SNAPSHOT_INTERVAL_MS,
            None => true,
        };
        if any_changed || due {
            vec![Outbound::Broadcast(self.broadcast_world_snapshot(now))]
        } else {
            Vec::new()
        }
    }

    // ========================================================================
    // SPAWNING (spawn rule)
    // ========================================================================

    fn spawn_actor_for(&mut self, id: ID<Player>, now: ServerMillis) -> bool {
        if self.actors.contains_key(&id) {
            return false;
        }
        let Some(terrain) = &self.terrain else {
            return false;
        };
        let Some(face) = pick_spawn_face(terrain.terrain_version, id, &terrain.nav.land_face_ids) else {
            return false;
        };
        self.actors.insert(id, Actor::spawn(id, face, now));
        true
    }

    /// Reseed every currently connected player's actor after a publish,
    /// iterating in lexicographic `playerId` order for determinism.
    /// Disconnected players' actors are dropped implicitly: the map is
    /// rebuilt from scratch.
    fn reseed_actors(&mut self, now: ServerMillis) {
        self.actors.clear();
        let Some(terrain) = &self.terrain else { return };
        let mut ids: Vec<ID<Player>> = self.players.keys().copied().collect();
        ids.sort();
        for id in ids {
            if let Some(face) = pick_spawn_face(terrain.terrain_version, id, &terrain.nav.land_face_ids) {
                self.actors.insert(id, Actor::spawn(id, face, now));
            }
        }
    }

    // ========================================================================
    // MESSAGE BUILDERS
    // ========================================================================

    fn reject(
        sender: ID<Player>,
        actor_id: ID<crate::actor::Actor>,
        command_id: CommandId,
        reason: RejectReason,
        terrain_version: TerrainVersion,
    ) -> Outbound {
        Outbound::Unicast(
            sender,
            ServerMessage::ActorReject {
                actor_id,
                command_id,
                reason,
                terrain_version,
            },
        )
    }

    fn actor_command_message(actor: &Actor, terrain_version: TerrainVersion) -> ServerMessage {
        ServerMessage::ActorCommand {
            actor_id: actor.actor_id,
            owner_id: actor.owner_id,
            command_id: actor.command_id,
            start_face: actor.route_start_face,
            target_face: actor.target_face.unwrap_or(actor.route_start_face),
            started_at: actor.route_started_at_server_ms,
            route_started_at_server_ms: actor.route_started_at_server_ms,
            terrain_version,
        }
    }

    fn state_message(&self) -> ServerMessage {
        let mut players: Vec<PlayerView> = self
            .order
            .iter()
            .filter_map(|id| self.players.get(id))
            .map(|p| PlayerView {
                id: p.id,
                emoji: p.emoji,
                color: p.color,
                typing: p.typing.clone(),
            })
            .collect();
        players.sort_by_key(|p| p.id);
        ServerMessage::State {
            players,
            host_id: self.host_id,
            session_start: self.session_start,
        }
    }

    fn history_message(&self) -> ServerMessage {
        ServerMessage::History {
            messages: self.history.iter().cloned().collect(),
        }
    }

    fn terrain_snapshot_message(&self, terrain: &TerrainRuntime, now: ServerMillis) -> ServerMessage {
        ServerMessage::TerrainSnapshot {
            terrain_version: terrain.terrain_version,
            terrain: TerrainSnapshotView {
                controls: terrain.build.controls,
                movement: terrain.build.movement,
                map_width: terrain.build.map_width,
                map_height: terrain.build.map_height,
            },
            published_by: self.terrain_published_by.unwrap_or(ID::default()),
            server_time: now,
        }
    }

    /// Build the world-snapshot view without touching `snapshot_seq` or
    /// `last_snapshot_at` — used for read-only echoes (`join`) that never
    /// count as a broadcast in their own right.
    fn peek_world_snapshot(&self, now: ServerMillis) -> ServerMessage {
        self.world_snapshot_at(now, self.snapshot_seq)
    }

    /// Build the world-snapshot view *and* advance the broadcast counter —
    /// used for every event that actually fans a snapshot out to everyone.
    fn broadcast_world_snapshot(&mut self, now: ServerMillis) -> ServerMessage {
        self.snapshot_seq += 1;
        self.last_snapshot_at = Some(now);
        self.world_snapshot_at(now, self.snapshot_seq)
    }

    fn world_snapshot_at(&self, now: ServerMillis, snapshot_seq: SnapshotSeq) -> ServerMessage {
        let terrain_version = self.terrain_version().unwrap_or(0);
        let mut actors: Vec<ActorView> = self
            .actors
            .values()
            .map(|actor| ActorView {
                actor_id: actor.actor_id,
                owner_id: actor.owner_id,
                terrain_version,
                state_seq: actor.state_seq,
                command_id: actor.command_id,
                moving: actor.moving,
                current_face: actor.current_face,
                target_face: actor.target_face,
                route_start_face: actor.route_start_face,
                route_target_face: actor.route_target_face,
                route_started_at_server_ms: actor.route_started_at_server_ms,
                segment_from_face: actor.segment_from_face(),
                segment_to_face: actor.segment_to_face(),
                segment_duration_ms: actor.segment_duration_ms(),
                segment_tq16: actor.segment_tq16(now),
            })
            .collect();
        actors.sort_by_key(|a| a.actor_id);
        ServerMessage::WorldSnapshot {
            terrain_version,
            server_time: now,
            snapshot_seq,
            actors,
        }
    }
}
