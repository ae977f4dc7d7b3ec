//! Single-wakeup alarm scheduling: the room never sleeps on more than one
//! pending timer. Every state change recomputes the next
//! wakeup as the earlier of the soonest moving actor's segment edge and the
//! next periodic snapshot deadline.
use atlas_core::SNAPSHOT_INTERVAL_MS;
use atlas_core::ServerMillis;

/// The next instant the room loop must wake up on its own (not in response
/// to an inbound message), or `None` to cancel the alarm. With no moving
/// actor there is nothing for a self-driven wakeup to do — periodic
/// snapshots only fire as a side effect of a moving actor's alarm, never on
/// their own: if no actor is moving, the alarm is cancelled outright.
///
/// `moving_actor_edges` is the `next_edge_at()` of every currently moving
/// actor; `last_snapshot_at` is `None` before the first snapshot has ever
/// been sent.
pub fn next_wakeup(
    now: ServerMillis,
    moving_actor_edges: impl IntoIterator<Item = ServerMillis>,
    last_snapshot_at: Option<ServerMillis>,
) -> Option<ServerMillis> {
    let next_edge_at = moving_actor_edges.into_iter().min()?;
    let heartbeat_at = match last_snapshot_at {
        Some(at) => at + SNAPSHOT_INTERVAL_MS,
        None => now,
    };

    // Never schedule a wakeup in the past; the loop always makes forward
    // progress even if a deadline was already overdue when computed.
    Some(next_edge_at.min(heartbeat_at).max(now + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_moving_actors_cancels_the_alarm_even_with_a_prior_snapshot() {
        assert_eq!(next_wakeup(1_000, [], Some(1_000)), None);
        assert_eq!(next_wakeup(1_000, [], None), None);
    }

    #[test]
    fn a_moving_actor_wakes_at_the_earlier_of_its_edge_or_the_heartbeat() {
        let wakeup = next_wakeup(1_000, [5_000], Some(900));
        assert_eq!(wakeup, Some(900 + SNAPSHOT_INTERVAL_MS));
    }

    #[test]
    fn soonest_moving_edge_wins_over_a_later_heartbeat() {
        let wakeup = next_wakeup(1_000, [1_200, 5_000], Some(900));
        assert_eq!(wakeup, Some(1_200));
    }

    #[test]
    fn an_overdue_deadline_still_wakes_in_the_future() {
        let wakeup = next_wakeup(1_000, [500], Some(100));
        assert_eq!(wakeup, Some(1_001));
    }
}
