//! Query-side filter criteria.
//!
//! Filters exist only on the read path: they are built by the query layer
//! from request parameters, applied in one pass over a merged run stream,
//! and never persisted.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::enums::EventKind;
use crate::event::Event;
use crate::ids::ActorId;

/// Default page size when a query does not specify a limit.
pub const DEFAULT_LIMIT: usize = 100;

/// Criteria for selecting and paginating events from a run.
///
/// Every field is optional; an empty criteria matches all events. Ranges
/// are half-open: `from` bounds are inclusive, `to` bounds exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Earliest timestamp to include (inclusive).
    pub from_ts: Option<DateTime<Utc>>,
    /// Timestamp upper bound (exclusive).
    pub to_ts: Option<DateTime<Utc>>,
    /// Kinds to include; `None` means all kinds.
    pub kinds: Option<BTreeSet<EventKind>>,
    /// Actors to include; an event with no actor never matches a non-`None`
    /// actor set.
    pub actors: Option<BTreeSet<ActorId>>,
    /// Earliest turn to include (inclusive).
    pub from_turn: Option<u64>,
    /// Turn upper bound (exclusive).
    pub to_turn: Option<u64>,
    /// Maximum number of events to return.
    pub limit: usize,
    /// Number of matching events to skip before the page starts.
    pub offset: usize,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            from_ts: None,
            to_ts: None,
            kinds: None,
            actors: None,
            from_turn: None,
            to_turn: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl FilterCriteria {
    /// Whether `event` satisfies every configured criterion.
    ///
    /// Pagination (`limit`/`offset`) is applied by the caller after
    /// filtering, not here.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref kinds) = self.kinds
            && !kinds.contains(&event.kind())
        {
            return false;
        }
        if let Some(ref actors) = self.actors {
            match event.actor_id {
                Some(ref actor) if actors.contains(actor) => {}
                _ => return false,
            }
        }
        if let Some(from) = self.from_turn
            && event.turn_number < from
        {
            return false;
        }
        if let Some(to) = self.to_turn
            && event.turn_number >= to
        {
            return false;
        }
        if let Some(from) = self.from_ts
            && event.timestamp < from
        {
            return false;
        }
        if let Some(to) = self.to_ts
            && event.timestamp >= to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::MilestoneType;
    use crate::event::EventBuilder;
    use crate::ids::RunId;

    fn sample_events() -> Vec<Event> {
        let mut builder = EventBuilder::new(RunId::new());
        let actor = ActorId::new();
        let mut events = Vec::new();
        for turn in 0..4u64 {
            builder.begin_turn(turn);
            events.push(builder.milestone(MilestoneType::TurnStart).build());
            events.push(
                builder
                    .decision(actor, "rest_or_work", None, None)
                    .build(),
            );
        }
        events
    }

    #[test]
    fn empty_criteria_matches_everything() {
        let criteria = FilterCriteria::default();
        for event in sample_events() {
            assert!(criteria.matches(&event));
        }
    }

    #[test]
    fn kind_filter_selects_only_named_kinds() {
        let criteria = FilterCriteria {
            kinds: Some([EventKind::Decision].into_iter().collect()),
            ..FilterCriteria::default()
        };
        let matched: Vec<Event> = sample_events()
            .into_iter()
            .filter(|e| criteria.matches(e))
            .collect();
        assert_eq!(matched.len(), 4);
        assert!(matched.iter().all(|e| e.kind() == EventKind::Decision));
    }

    #[test]
    fn actor_filter_excludes_actorless_events() {
        let criteria = FilterCriteria {
            actors: Some([ActorId::new()].into_iter().collect()),
            ..FilterCriteria::default()
        };
        // Milestones carry no actor, and the sample decisions belong to a
        // different actor: nothing matches.
        assert!(!sample_events().iter().any(|e| criteria.matches(e)));
    }

    #[test]
    fn turn_range_is_half_open() {
        let criteria = FilterCriteria {
            from_turn: Some(1),
            to_turn: Some(3),
            ..FilterCriteria::default()
        };
        let matched: Vec<Event> = sample_events()
            .into_iter()
            .filter(|e| criteria.matches(e))
            .collect();
        assert_eq!(matched.len(), 4);
        assert!(matched
            .iter()
            .all(|e| e.turn_number >= 1 && e.turn_number < 3));
    }

    #[test]
    fn time_window_bounds_apply() {
        let events = sample_events();
        let cutoff = events.iter().map(|e| e.timestamp).max().unwrap_or_default();
        let criteria = FilterCriteria {
            to_ts: Some(cutoff),
            ..FilterCriteria::default()
        };
        // The exclusive upper bound drops at least the newest event.
        let matched = events.iter().filter(|e| criteria.matches(e)).count();
        assert!(matched < events.len());
    }
}
