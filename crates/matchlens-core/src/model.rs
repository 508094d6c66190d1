// Row schema for competitions, matches and normalized events.
//
// Upstream records arrive as loosely-typed JSON. Competitions and matches are
// deserialized directly into typed rows; events stay as raw JSON maps until
// the normalizer flattens them into `Event`.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A point on the pitch in provider coordinates (120 x 80 for StatsBomb).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Midpoint of a set of points, or `None` for an empty set.
    pub fn mean(points: &[Point]) -> Option<Point> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let x = points.iter().map(|p| p.x).sum::<f64>() / n;
        let y = points.iter().map(|p| p.y).sum::<f64>() / n;
        Some(Point { x, y })
    }
}

// ---------------------------------------------------------------------------
// Event type
// ---------------------------------------------------------------------------

/// Categorical event type. Names the views care about get their own variant;
/// anything else is preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    Pass,
    Carry,
    Shot,
    Pressure,
    Duel,
    BallReceipt,
    BallRecovery,
    Block,
    Clearance,
    Interception,
    Dribble,
    DribbledPast,
    Dispossessed,
    Miscontrol,
    FoulCommitted,
    FoulWon,
    GoalKeeper,
    Other(String),
}

impl EventType {
    /// Parse a provider type name. Never fails: unknown names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "Pass" => EventType::Pass,
            "Carry" => EventType::Carry,
            "Shot" => EventType::Shot,
            "Pressure" => EventType::Pressure,
            "Duel" => EventType::Duel,
            "Ball Receipt*" | "Ball Receipt" => EventType::BallReceipt,
            "Ball Recovery" => EventType::BallRecovery,
            "Block" => EventType::Block,
            "Clearance" => EventType::Clearance,
            "Interception" => EventType::Interception,
            "Dribble" => EventType::Dribble,
            "Dribbled Past" => EventType::DribbledPast,
            "Dispossessed" => EventType::Dispossessed,
            "Miscontrol" => EventType::Miscontrol,
            "Foul Committed" => EventType::FoulCommitted,
            "Foul Won" => EventType::FoulWon,
            "Goal Keeper" => EventType::GoalKeeper,
            other => EventType::Other(other.to_string()),
        }
    }

    /// Provider display name.
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Pass => "Pass",
            EventType::Carry => "Carry",
            EventType::Shot => "Shot",
            EventType::Pressure => "Pressure",
            EventType::Duel => "Duel",
            EventType::BallReceipt => "Ball Receipt*",
            EventType::BallRecovery => "Ball Recovery",
            EventType::Block => "Block",
            EventType::Clearance => "Clearance",
            EventType::Interception => "Interception",
            EventType::Dribble => "Dribble",
            EventType::DribbledPast => "Dribbled Past",
            EventType::Dispossessed => "Dispossessed",
            EventType::Miscontrol => "Miscontrol",
            EventType::FoulCommitted => "Foul Committed",
            EventType::FoulWon => "Foul Won",
            EventType::GoalKeeper => "Goal Keeper",
            EventType::Other(name) => name,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Raw event record
// ---------------------------------------------------------------------------

/// One event exactly as the provider returned it.
///
/// Both the nested StatsBomb shape (`pass.outcome.name`) and the flattened
/// column shape (`pass_outcome`) are accepted; the normalizer reads either.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(pub Map<String, Value>);

impl RawEvent {
    /// Stamp the owning match onto the record. The provider's per-match event
    /// files do not carry it.
    pub fn with_match_id(mut self, match_id: u64) -> Self {
        self.0.insert("match_id".into(), Value::from(match_id));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

// ---------------------------------------------------------------------------
// Normalized event row
// ---------------------------------------------------------------------------

/// Sentinel used when an event carries no position.
pub const UNKNOWN_POSITION: &str = "N/A";

/// One on-pitch action with explicit coordinate columns.
///
/// Every `*_x`/`*_y` pair is either both `Some` or both `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub match_id: u64,
    pub index: u32,
    pub period: u8,
    pub minute: u32,
    pub second: u32,
    pub team: String,
    pub player: Option<String>,
    pub position: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub pass_end_x: Option<f64>,
    pub pass_end_y: Option<f64>,
    pub pass_outcome: Option<String>,
    pub pass_recipient: Option<String>,
    pub carry_end_x: Option<f64>,
    pub carry_end_y: Option<f64>,
    pub shot_end_x: Option<f64>,
    pub shot_end_y: Option<f64>,
    pub shot_outcome: Option<String>,
    pub shot_type: Option<String>,
    pub shot_xg: Option<f64>,
}

impl Event {
    /// A blank row for the given match, team and type. Used by fixtures and
    /// as the starting point of normalization.
    pub fn new(match_id: u64, team: impl Into<String>, event_type: EventType) -> Self {
        Event {
            match_id,
            index: 0,
            period: 1,
            minute: 0,
            second: 0,
            team: team.into(),
            player: None,
            position: UNKNOWN_POSITION.to_string(),
            event_type,
            x: None,
            y: None,
            pass_end_x: None,
            pass_end_y: None,
            pass_outcome: None,
            pass_recipient: None,
            carry_end_x: None,
            carry_end_y: None,
            shot_end_x: None,
            shot_end_y: None,
            shot_outcome: None,
            shot_type: None,
            shot_xg: None,
        }
    }

    pub fn location(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }

    pub fn pass_end(&self) -> Option<Point> {
        Some(Point::new(self.pass_end_x?, self.pass_end_y?))
    }

    pub fn carry_end(&self) -> Option<Point> {
        Some(Point::new(self.carry_end_x?, self.carry_end_y?))
    }

    pub fn shot_end(&self) -> Option<Point> {
        Some(Point::new(self.shot_end_x?, self.shot_end_y?))
    }

    pub fn is_goal(&self) -> bool {
        self.event_type == EventType::Shot && self.shot_outcome.as_deref() == Some("Goal")
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// An immutable snapshot of normalized events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventTable {
    rows: Vec<Event>,
}

impl EventTable {
    pub fn new(rows: Vec<Event>) -> Self {
        EventTable { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Event] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Event> {
        self.rows
    }

    /// Concatenate several tables, preserving row order.
    pub fn concat<I: IntoIterator<Item = EventTable>>(tables: I) -> Self {
        let rows = tables.into_iter().flat_map(|t| t.rows).collect();
        EventTable { rows }
    }

    /// Distinct non-null players, sorted.
    pub fn players(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().filter_map(|e| e.player.as_deref()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Distinct match ids present in the table.
    pub fn match_ids(&self) -> BTreeSet<u64> {
        self.rows.iter().map(|e| e.match_id).collect()
    }
}

impl FromIterator<Event> for EventTable {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        EventTable {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a EventTable {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Every event of a whole tournament.
///
/// Report-card rankings only accept this type, so a match-filtered table can
/// never be compared against a tournament-wide population by accident.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentEvents {
    table: EventTable,
}

impl TournamentEvents {
    pub fn new(table: EventTable) -> Self {
        TournamentEvents { table }
    }

    pub fn table(&self) -> &EventTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Competitions
// ---------------------------------------------------------------------------

/// One competition season offered by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    pub competition_id: u32,
    pub season_id: u32,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub competition_name: String,
    #[serde(default)]
    pub competition_gender: String,
    #[serde(default)]
    pub season_name: String,
}

/// Parse the provider's competitions listing. Malformed entries are skipped.
pub fn parse_competitions(values: Vec<Value>) -> Vec<Competition> {
    values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<Competition>(v) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("skipping malformed competition entry: {}", e);
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// One fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub match_id: u64,
    pub competition_id: Option<u32>,
    pub season_id: Option<u32>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

impl Match {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team.as_deref() == Some(team) || self.away_team.as_deref() == Some(team)
    }
}

/// Team reference in either the nested (`{"home_team_name": ..}`) or flat
/// (`"Spain"`) shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTeamRef {
    Name(String),
    Home { home_team_name: String },
    Away { away_team_name: String },
    Named { name: String },
    Unknown(Value),
}

impl RawTeamRef {
    fn into_name(self) -> Option<String> {
        let name = match self {
            RawTeamRef::Name(n) => n,
            RawTeamRef::Home { home_team_name } => home_team_name,
            RawTeamRef::Away { away_team_name } => away_team_name,
            RawTeamRef::Named { name } => name,
            RawTeamRef::Unknown(_) => return None,
        };
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCompetitionRef {
    Id(u32),
    Nested { competition_id: u32 },
    Unknown(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSeasonRef {
    Id(u32),
    Nested { season_id: u32 },
    Unknown(Value),
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    match_id: u64,
    #[serde(default)]
    match_date: Option<String>,
    #[serde(default)]
    home_team: Option<RawTeamRef>,
    #[serde(default)]
    away_team: Option<RawTeamRef>,
    #[serde(default)]
    home_score: Option<u32>,
    #[serde(default)]
    away_score: Option<u32>,
    #[serde(default)]
    competition: Option<RawCompetitionRef>,
    #[serde(default)]
    season: Option<RawSeasonRef>,
    #[serde(default)]
    competition_id: Option<u32>,
    #[serde(default)]
    season_id: Option<u32>,
}

/// Lenient date parsing: accepts `YYYY-MM-DD` with an optional time suffix.
/// Anything else becomes `None`.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parse the provider's match listing. Entries without a usable `match_id`
/// are skipped.
pub fn parse_matches(values: Vec<Value>) -> Vec<Match> {
    let mut matches = Vec::with_capacity(values.len());
    for value in values {
        let raw: RawMatch = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed match entry: {}", e);
                continue;
            }
        };
        let competition_id = raw.competition_id.or(match raw.competition {
            Some(RawCompetitionRef::Id(id))
            | Some(RawCompetitionRef::Nested { competition_id: id }) => Some(id),
            _ => None,
        });
        let season_id = raw.season_id.or(match raw.season {
            Some(RawSeasonRef::Id(id)) | Some(RawSeasonRef::Nested { season_id: id }) => Some(id),
            _ => None,
        });
        matches.push(Match {
            match_id: raw.match_id,
            competition_id,
            season_id,
            home_team: raw.home_team.and_then(RawTeamRef::into_name),
            away_team: raw.away_team.and_then(RawTeamRef::into_name),
            match_date: raw.match_date.as_deref().and_then(parse_match_date),
            home_score: raw.home_score,
            away_score: raw.away_score,
        });
    }
    matches
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_type_names_roundtrip() {
        for name in ["Pass", "Carry", "Shot", "Ball Receipt*", "Goal Keeper"] {
            assert_eq!(EventType::from_name(name).as_str(), name);
        }
        assert_eq!(
            EventType::from_name("Starting XI"),
            EventType::Other("Starting XI".into())
        );
    }

    #[test]
    fn nested_match_shape_parsed() {
        let matches = parse_matches(vec![json!({
            "match_id": 3942819,
            "match_date": "2024-07-14",
            "competition": {"competition_id": 55, "competition_name": "UEFA Euro"},
            "season": {"season_id": 282, "season_name": "2024"},
            "home_team": {"home_team_id": 772, "home_team_name": "Spain"},
            "away_team": {"away_team_id": 768, "away_team_name": "England"},
            "home_score": 2,
            "away_score": 1
        })]);
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.home_team.as_deref(), Some("Spain"));
        assert_eq!(m.away_team.as_deref(), Some("England"));
        assert_eq!(m.competition_id, Some(55));
        assert_eq!(m.season_id, Some(282));
        assert_eq!(m.match_date, NaiveDate::from_ymd_opt(2024, 7, 14));
        assert_eq!(m.home_score, Some(2));
    }

    #[test]
    fn flat_match_shape_parsed() {
        let matches = parse_matches(vec![json!({
            "match_id": 7,
            "home_team": "Germany",
            "away_team": null,
            "match_date": "not a date"
        })]);
        assert_eq!(matches[0].home_team.as_deref(), Some("Germany"));
        assert!(matches[0].away_team.is_none());
        assert!(matches[0].match_date.is_none());
    }

    #[test]
    fn match_without_id_skipped() {
        let matches = parse_matches(vec![json!({"home_team": "A"}), json!({"match_id": 1})]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_id, 1);
    }

    #[test]
    fn match_date_with_time_suffix() {
        assert_eq!(
            parse_match_date("2024-06-14T21:00:00"),
            NaiveDate::from_ymd_opt(2024, 6, 14)
        );
    }

    #[test]
    fn point_mean_of_empty_is_none() {
        assert!(Point::mean(&[]).is_none());
        let m = Point::mean(&[Point::new(0.0, 0.0), Point::new(10.0, 20.0)]).unwrap();
        assert_eq!(m, Point::new(5.0, 10.0));
    }

    #[test]
    fn raw_event_stamps_match_id() {
        let raw = RawEvent::default().with_match_id(42);
        assert_eq!(raw.get("match_id"), Some(&json!(42)));
    }
}
