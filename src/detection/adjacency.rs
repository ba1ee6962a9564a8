//! Selection of the logins that bracket a new login in time

use std::cmp::Ordering;
use crate::models::LoginEvent;

/// The nearest earlier and nearest later login around a new login
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Adjacency<'a> {
    pub previous: Option<&'a LoginEvent>,
    pub next: Option<&'a LoginEvent>,
}

impl<'a> Adjacency<'a> {
    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.next.is_none()
    }
}

/// Orders events by timestamp, then by event id
fn chronological(a: &LoginEvent, b: &LoginEvent) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.event_id.cmp(&b.event_id))
}

/// Find the logins immediately before and after `new_event` in `history`.
///
/// `previous` has the greatest timestamp strictly below the new event's,
/// `next` the smallest timestamp strictly above it. Events sharing the new
/// event's timestamp are never selected. Ties between candidates resolve by
/// event id: the greatest id wins for `previous`, the smallest for `next`.
///
/// Entries carrying the new event's id are skipped, so the history may
/// include the new event itself. The history must only hold events for the
/// same user; its order is not relied upon.
pub fn select_adjacent<'a>(history: &'a [LoginEvent], new_event: &LoginEvent) -> Adjacency<'a> {
    let mut adjacency = Adjacency::default();

    for candidate in history {
        if candidate.event_id == new_event.event_id {
            continue;
        }

        match candidate.timestamp.cmp(&new_event.timestamp) {
            Ordering::Less => {
                let closer = adjacency
                    .previous
                    .map_or(true, |current| chronological(candidate, current) == Ordering::Greater);
                if closer {
                    adjacency.previous = Some(candidate);
                }
            }
            Ordering::Greater => {
                let closer = adjacency
                    .next
                    .map_or(true, |current| chronological(candidate, current) == Ordering::Less);
                if closer {
                    adjacency.next = Some(candidate);
                }
            }
            Ordering::Equal => {}
        }
    }

    adjacency
}
