//! Per-player actor and its movement state machine.
use atlas_core::CommandId;
use atlas_core::FaceId;
use atlas_core::ID;
use atlas_core::Q16;
use atlas_core::Q16_MAX;
use atlas_core::ServerMillis;
use atlas_core::StateSeq;
use atlas_nav::NavGraph;
use atlas_nav::find_path;
use atlas_terrain::MovementConfig;

use crate::player::Player;

/// One actor per connected player; `actor_id` is `owner_id.cast()`
/// (`actorId == ownerId`).
#[derive(Debug, Clone)]
pub struct Actor {
    pub actor_id: ID<Actor>,
    pub owner_id: ID<Player>,
    pub current_face: FaceId,
    pub target_face: Option<FaceId>,
    pub route_start_face: FaceId,
    pub route_target_face: Option<FaceId>,
    pub route_started_at_server_ms: ServerMillis,
    pub command_id: CommandId,
    pub pending_command_id: Option<CommandId>,
    pub pending_target_face: Option<FaceId>,
    pub state_seq: StateSeq,
    pub moving: bool,
    pub path: Vec<FaceId>,
    pub segment_durations_ms: Vec<i64>,
    pub segment_index: usize,
    pub segment_started_at_server_ms: ServerMillis,
}

impl Actor {
    /// Spawn a fresh, stationary actor for `owner` standing on `spawn_face`.
    pub fn spawn(owner: ID<Player>, spawn_face: FaceId, now: ServerMillis) -> Self {
        Self {
            actor_id: owner.cast(),
            owner_id: owner,
            current_face: spawn_face,
            target_face: None,
            route_start_face: spawn_face,
            route_target_face: None,
            route_started_at_server_ms: now,
            command_id: 0,
            pending_command_id: None,
            pending_target_face: None,
            state_seq: 0,
            moving: false,
            path: vec![spawn_face],
            segment_durations_ms: Vec::new(),
            segment_index: 0,
            segment_started_at_server_ms: now,
        }
    }

    /// The face the actor is currently crossing from, when moving.
    pub fn segment_from_face(&self) -> Option<FaceId> {
        self.moving.then(|| self.path[self.segment_index])
    }

    /// The face the actor is currently crossing to, when moving.
    pub fn segment_to_face(&self) -> Option<FaceId> {
        self.moving
            .then(|| self.path.get(self.segment_index + 1).copied())
            .flatten()
    }

    /// Current segment duration in ms, or 0 when not moving.
    pub fn segment_duration_ms(&self) -> i64 {
        if self.moving {
            self.segment_durations_ms[self.segment_index]
        } else {
            0
        }
    }

    /// Q16 fixed-point progress through the current segment, 0 when not
    /// moving.
    pub fn segment_tq16(&self, now: ServerMillis) -> Q16 {
        if !self.moving {
            return 0;
        }
        let duration = self.segment_durations_ms[self.segment_index] as f64;
        if duration <= 0.0 {
            return 0;
        }
        let elapsed = (now - self.segment_started_at_server_ms) as f64;
        let fraction = (elapsed / duration).clamp(0.0, 1.0);
        (fraction * Q16_MAX as f64).round() as Q16
    }

    /// Attempt to start (or restart) a route toward `target`, validated
    /// from the actor's current face, at `started_at`. Returns `false`
    /// (without mutating the actor) if `target` is unreachable: no path, a
    /// path of length 1 that isn't the trivial same-face case, or a
    /// non-positive/non-finite segment duration.
    pub fn start_route(
        &mut self,
        nav: &NavGraph,
        movement: &MovementConfig,
        command_id: CommandId,
        target: FaceId,
        started_at: ServerMillis,
    ) -> bool {
        let start_face = self.current_face;

        if start_face == target {
            self.command_id = command_id;
            self.target_face = None;
            self.route_start_face = start_face;
            self.route_target_face = None;
            self.route_started_at_server_ms = started_at;
            self.path = vec![start_face];
            self.segment_durations_ms = Vec::new();
            self.segment_index = 0;
            self.segment_started_at_server_ms = started_at;
            self.moving = false;
            self.state_seq += 1;
            return true;
        }

        let Some(result) = find_path(nav, start_face, target) else {
            return false;
        };
        if result.face_path.len() < 2 || !result.total_cost.is_finite() {
            return false;
        }

        let mut segment_durations_ms = Vec::with_capacity(result.face_path.len() - 1);
        for pair in result.face_path.windows(2) {
            let Some(cost) = nav.edge_cost(pair[0], pair[1]) else {
                return false;
            };
            let duration_ms = (movement.time_per_face_seconds * cost * 1000.0).round() as i64;
            if duration_ms <= 0 {
                return false;
            }
            segment_durations_ms.push(duration_ms);
        }

        self.command_id = command_id;
        self.route_start_face = start_face;
        self.route_target_face = Some(target);
        self.route_started_at_server_ms = started_at;
        self.target_face = Some(target);
        self.path = result.face_path;
        self.segment_durations_ms = segment_durations_ms;
        self.segment_index = 0;
        self.segment_started_at_server_ms = started_at;
        self.moving = true;
        self.state_seq += 1;
        true
    }

    /// Advance the actor's position to `now`, crossing as many completed
    /// segments as have elapsed and consuming any pending command at the
    /// segment boundary where it arrives. Returns whether anything changed.
    pub fn advance(&mut self, nav: &NavGraph, movement: &MovementConfig, now: ServerMillis) -> bool {
        let mut changed = false;
        while self.moving {
            let duration = self.segment_durations_ms[self.segment_index];
            let next_face = self.path.get(self.segment_index + 1).copied();
            if duration <= 0 || next_face.is_none() {
                self.finish(now);
                changed = true;
                break;
            }
            if self.segment_started_at_server_ms + duration > now {
                break;
            }

            let next_face = next_face.unwrap();
            self.current_face = next_face;
            self.segment_index += 1;
            self.segment_started_at_server_ms += duration;
            self.state_seq += 1;
            changed = true;

            if let (Some(pending_command_id), Some(pending_target)) =
                (self.pending_command_id.take(), self.pending_target_face.take())
            {
                let arrival = self.segment_started_at_server_ms;
                if !self.start_route(nav, movement, pending_command_id, pending_target, arrival) {
                    self.finish(arrival);
                }
                // Either way, the loop re-evaluates against the new state.
            } else if self.segment_index >= self.path.len() - 1 {
                let arrival = self.segment_started_at_server_ms;
                self.finish(arrival);
                break;
            }
        }
        changed
    }

    fn finish(&mut self, now: ServerMillis) {
        self.moving = false;
        self.target_face = None;
        self.route_target_face = None;
        self.pending_command_id = None;
        self.pending_target_face = None;
        self.path = vec![self.current_face];
        self.segment_durations_ms = Vec::new();
        self.segment_index = 0;
        self.segment_started_at_server_ms = now;
        self.state_seq += 1;
    }

    /// `Some(segment_started_at_server_ms + segment_durations_ms[segment_index])`
    /// while moving, the boundary the alarm scheduler (§4.I) waits on.
    pub fn next_edge_at(&self) -> Option<ServerMillis> {
        self.moving
            .then(|| self.segment_started_at_server_ms + self.segment_durations_ms[self.segment_index])
    }
}
