// Event filter engine: AND-composed predicates over normalized events.
//
// Filters never mutate their input; every application returns a new table.
// A comparison against a missing coordinate never matches.

use std::collections::BTreeSet;

use crate::config::PitchConfig;
use crate::model::{Event, EventTable, EventType};
use crate::positions::PositionGroup;

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// A single row test.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Team(String),
    Player(String),
    Type(EventType),
    /// `match_id` is one of the given matches.
    InMatches(BTreeSet<u64>),
    /// `x < threshold`.
    StartsBefore(f64),
    /// `pass_end_x > threshold`.
    PassEndsBeyond(f64),
    /// `carry_end_x > threshold`.
    CarryEndsBeyond(f64),
    /// `pass_outcome` is absent. The provider leaves the outcome empty for
    /// completed passes; any value means the pass failed.
    PassCompleted,
    HasPassRecipient,
    HasLocation,
    /// `position` is one of the group's named positions.
    InPositionGroup(PositionGroup),
    /// `shot_type` is not the given value (absent shot types pass).
    ShotTypeIsNot(String),
}

fn less_than(value: Option<f64>, threshold: f64) -> bool {
    matches!(value, Some(v) if v < threshold)
}

fn greater_than(value: Option<f64>, threshold: f64) -> bool {
    matches!(value, Some(v) if v > threshold)
}

impl Predicate {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Predicate::Team(team) => event.team == *team,
            Predicate::Player(player) => event.player.as_deref() == Some(player.as_str()),
            Predicate::Type(t) => event.event_type == *t,
            Predicate::InMatches(ids) => ids.contains(&event.match_id),
            Predicate::StartsBefore(t) => less_than(event.x, *t),
            Predicate::PassEndsBeyond(t) => greater_than(event.pass_end_x, *t),
            Predicate::CarryEndsBeyond(t) => greater_than(event.carry_end_x, *t),
            Predicate::PassCompleted => event.pass_outcome.is_none(),
            Predicate::HasPassRecipient => event.pass_recipient.is_some(),
            Predicate::HasLocation => event.location().is_some(),
            Predicate::InPositionGroup(group) => group.contains(&event.position),
            Predicate::ShotTypeIsNot(t) => event.shot_type.as_deref() != Some(t.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// An ordered conjunction of predicates. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    predicates: Vec<Predicate>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn team(self, team: impl Into<String>) -> Self {
        self.with(Predicate::Team(team.into()))
    }

    pub fn player(self, player: impl Into<String>) -> Self {
        self.with(Predicate::Player(player.into()))
    }

    pub fn event_type(self, event_type: EventType) -> Self {
        self.with(Predicate::Type(event_type))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.predicates.iter().all(|p| p.matches(event))
    }

    /// Rows that satisfy every predicate, in input order.
    pub fn apply(&self, table: &EventTable) -> EventTable {
        table.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    /// Split a table into (matching, non-matching), both in input order.
    pub fn partition(&self, table: &EventTable) -> (EventTable, EventTable) {
        let (hit, miss): (Vec<Event>, Vec<Event>) =
            table.iter().cloned().partition(|e| self.matches(e));
        (EventTable::new(hit), EventTable::new(miss))
    }

    // -- canonical filters --

    /// Completed passes by `team` that start before the final third and end
    /// inside it.
    pub fn progressive_passes(team: &str, pitch: &PitchConfig) -> Self {
        EventFilter::new()
            .team(team)
            .event_type(EventType::Pass)
            .with(Predicate::StartsBefore(pitch.final_third_x))
            .with(Predicate::PassEndsBeyond(pitch.final_third_x))
            .with(Predicate::PassCompleted)
    }

    /// Carries by `team` that cross into the final third.
    pub fn progressive_carries(team: &str, pitch: &PitchConfig) -> Self {
        EventFilter::new()
            .team(team)
            .event_type(EventType::Carry)
            .with(Predicate::StartsBefore(pitch.final_third_x))
            .with(Predicate::CarryEndsBeyond(pitch.final_third_x))
    }

    pub fn position_group(group: PositionGroup) -> Self {
        EventFilter::new().with(Predicate::InPositionGroup(group))
    }

    /// All shots, optionally without penalties.
    pub fn shots(exclude_penalties: bool) -> Self {
        let filter = EventFilter::new().event_type(EventType::Shot);
        if exclude_penalties {
            filter.with(Predicate::ShotTypeIsNot("Penalty".into()))
        } else {
            filter
        }
    }

    /// Located events of one player.
    pub fn player_touches(player: &str) -> Self {
        EventFilter::new().player(player).with(Predicate::HasLocation)
    }

    /// Completed passes of `team` with a known recipient.
    pub fn completed_team_passes(team: &str) -> Self {
        EventFilter::new()
            .team(team)
            .event_type(EventType::Pass)
            .with(Predicate::PassCompleted)
            .with(Predicate::HasPassRecipient)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
