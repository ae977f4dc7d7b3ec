//! Bridges the synchronous `atlas_room::Room` state machine onto tokio
//! tasks and channels. This process owns exactly one room, so there is no
//! room directory to manage and no database to persist it to.
use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use atlas_core::ID;
use atlas_core::ServerMillis;
use atlas_room::ClientMessage;
use atlas_room::Outbound;
use atlas_room::Player;
use atlas_room::Room;
use atlas_room::alarm::next_wakeup;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;
use tokio::time::sleep_until;

enum Event {
    Connect {
        tx: UnboundedSender<String>,
        reply: oneshot::Sender<ID<Player>>,
    },
    Disconnect(ID<Player>),
    Message(ID<Player>, String),
}

/// A cheaply cloned handle to the one running room task. Every connected
/// socket holds one.
#[derive(Clone)]
pub struct RoomHandle {
    events: UnboundedSender<Event>,
}

impl RoomHandle {
    /// Spawn the room task and return a handle to it.
    pub fn spawn() -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        tokio::spawn(run(events_rx));
        Self { events: events_tx }
    }

    /// Register a new connection, returning its player id. `tx` receives
    /// every outbound frame (JSON text) addressed to this player from then
    /// on, until [`RoomHandle::disconnect`] is called for the same id.
    pub async fn connect(&self, tx: UnboundedSender<String>) -> anyhow::Result<ID<Player>> {
        let (reply, reply_rx) = oneshot::channel();
        self.events
            .send(Event::Connect { tx, reply })
            .map_err(|_| anyhow::anyhow!("room task is gone"))?;
        reply_rx.await.map_err(|_| anyhow::anyhow!("room task dropped the connect reply"))
    }

    pub fn disconnect(&self, id: ID<Player>) {
        let _ = self.events.send(Event::Disconnect(id));
    }

    pub fn message(&self, id: ID<Player>, text: String) {
        let _ = self.events.send(Event::Message(id, text));
    }
}

/// The room task: owns the one authoritative [`Room`], a registry of
/// connected players' outbound channels, and the process-relative clock
/// every `ServerMillis` in the room is measured against. Runs until every
/// `RoomHandle` has been dropped.
async fn run(mut events: UnboundedReceiver<Event>) {
    let epoch = Instant::now();
    let mut room = Room::new();
    let mut connections: HashMap<ID<Player>, UnboundedSender<String>> = HashMap::new();

    loop {
        let deadline = next_wakeup(now(epoch), room.moving_actor_edges(), room.last_snapshot_at())
            .map(|at| epoch + Duration::from_millis(at.max(0) as u64));

        let event = match deadline {
            Some(at) => {
                tokio::select! {
                    biased;
                    event = events.recv() => event,
                    _ = sleep_until(at.into()) => {
                        let outbound = room.on_alarm(now(epoch));
                        dispatch(&mut connections, outbound);
                        continue;
                    }
                }
            }
            None => events.recv().await,
        };

        let Some(event) = event else {
            log::info!("room task shutting down: no remaining handles");
            break;
        };

        let now_ms = now(epoch);
        let outbound = match event {
            Event::Connect { tx, reply } => {
                let (id, outbound) = room.connect(now_ms);
                connections.insert(id, tx);
                let _ = reply.send(id);
                outbound
            }
            Event::Disconnect(id) => {
                connections.remove(&id);
                room.disconnect(id, now_ms)
            }
            Event::Message(id, text) => match ClientMessage::parse(&text) {
                Some(message) => room.handle_message(id, message, now_ms),
                None => Vec::new(),
            },
        };
        dispatch(&mut connections, outbound);
    }
}

fn now(epoch: Instant) -> ServerMillis {
    epoch.elapsed().as_millis() as ServerMillis
}

fn dispatch(connections: &mut HashMap<ID<Player>, UnboundedSender<String>>, outbound: Vec<Outbound>) {
    for event in outbound {
        match event {
            Outbound::Unicast(id, message) => {
                let dead = connections.get(&id).is_some_and(|tx| tx.send(message.to_json()).is_err());
                if dead {
                    connections.remove(&id);
                }
            }
            Outbound::Broadcast(message) => {
                let json = message.to_json();
                connections.retain(|_, tx| tx.send(json.clone()).is_ok());
            }
        }
    }
}
