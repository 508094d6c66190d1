// Event normalization: raw provider records to flat `Event` rows.
//
// Every coordinate-bearing field is reduced to an explicit `(x, y)` pair of
// optional numbers. Malformed input degrades to `None`; nothing here fails.

use serde_json::Value;

use crate::model::{Event, EventTable, EventType, Point, RawEvent, UNKNOWN_POSITION};

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Parse a location value. Only a 2-element array of finite numbers is
/// accepted; anything else is treated as missing.
pub fn parse_location(value: Option<&Value>) -> Option<Point> {
    let items = value?.as_array()?;
    if items.len() != 2 {
        return None;
    }
    finite_pair(&items[0], &items[1])
}

/// Shot end locations carry an optional height as a third element.
fn parse_shot_end(value: Option<&Value>) -> Option<Point> {
    let items = value?.as_array()?;
    if items.len() != 2 && items.len() != 3 {
        return None;
    }
    finite_pair(&items[0], &items[1])
}

fn finite_pair(x: &Value, y: &Value) -> Option<Point> {
    let x = x.as_f64()?;
    let y = y.as_f64()?;
    if x.is_finite() && y.is_finite() {
        Some(Point::new(x, y))
    } else {
        None
    }
}

/// Extract a display name from either a bare string or an object with a
/// `name` key (`{"id": 1, "name": "Pass"}`).
fn name_of(value: Option<&Value>) -> Option<String> {
    let name = match value? {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("name")?.as_str()?,
        _ => return None,
    };
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Look up a field of a nested sub-record (`pass.outcome`), falling back to
/// the flattened column name (`pass_outcome`).
fn nested<'a>(raw: &'a RawEvent, section: &str, field: &str) -> Option<&'a Value> {
    raw.get(section)
        .and_then(|s| s.as_object())
        .and_then(|s| s.get(field))
        .or_else(|| raw.get(&format!("{section}_{field}")))
        .filter(|v| !v.is_null())
}

fn unsigned(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An unsigned field that fits in `u32`. Out-of-range values count as missing.
fn small(value: Option<&Value>) -> Option<u32> {
    unsigned(value).and_then(|v| u32::try_from(v).ok())
}

fn finite(value: Option<&Value>) -> Option<f64> {
    value?.as_f64().filter(|v| v.is_finite())
}

/// Read an already-flattened `(x, y)` column pair. Both must be finite.
fn column_pair(raw: &RawEvent, x: &str, y: &str) -> Option<Point> {
    finite_pair(raw.get(x)?, raw.get(y)?)
}

fn split(point: Option<Point>) -> (Option<f64>, Option<f64>) {
    match point {
        Some(p) => (Some(p.x), Some(p.y)),
        None => (None, None),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Flatten one raw record into an `Event` row.
pub fn normalize_event(raw: &RawEvent) -> Event {
    let match_id = unsigned(raw.get("match_id")).unwrap_or_default();
    let team = name_of(raw.get("team")).unwrap_or_default();
    let event_type = name_of(raw.get("type"))
        .map(|n| EventType::from_name(&n))
        .unwrap_or_else(|| EventType::Other(String::new()));

    let mut event = Event::new(match_id, team, event_type);
    event.index = small(raw.get("index")).unwrap_or_default();
    event.period = unsigned(raw.get("period"))
        .and_then(|v| u8::try_from(v).ok())
        .unwrap_or(1);
    event.minute = small(raw.get("minute")).unwrap_or_default();
    event.second = small(raw.get("second")).unwrap_or_default();
    event.player = name_of(raw.get("player"));
    event.position = name_of(raw.get("position")).unwrap_or_else(|| UNKNOWN_POSITION.to_string());

    // Rows that were flattened before carry `x`/`y` columns instead of
    // location arrays.
    (event.x, event.y) = split(
        parse_location(raw.get("location")).or_else(|| column_pair(raw, "x", "y")),
    );

    (event.pass_end_x, event.pass_end_y) = split(
        parse_location(nested(raw, "pass", "end_location"))
            .or_else(|| column_pair(raw, "pass_end_x", "pass_end_y")),
    );
    event.pass_outcome = name_of(nested(raw, "pass", "outcome"));
    event.pass_recipient = name_of(nested(raw, "pass", "recipient"));

    (event.carry_end_x, event.carry_end_y) = split(
        parse_location(nested(raw, "carry", "end_location"))
            .or_else(|| column_pair(raw, "carry_end_x", "carry_end_y")),
    );

    (event.shot_end_x, event.shot_end_y) = split(
        parse_shot_end(nested(raw, "shot", "end_location"))
            .or_else(|| column_pair(raw, "shot_end_x", "shot_end_y")),
    );
    event.shot_outcome = name_of(nested(raw, "shot", "outcome"));
    event.shot_type = name_of(nested(raw, "shot", "type"));
    event.shot_xg =
        finite(nested(raw, "shot", "statsbomb_xg")).or_else(|| finite(raw.get("shot_xg")));

    event
}

/// Flatten a batch of raw records.
pub fn normalize_events(raws: &[RawEvent]) -> EventTable {
    raws.iter().map(normalize_event).collect()
}

/// Collapse a coordinate pair to both-or-nothing, dropping non-finite values.
fn repair_pair(x: Option<f64>, y: Option<f64>) -> (Option<f64>, Option<f64>) {
    match (x, y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (Some(x), Some(y)),
        _ => (None, None),
    }
}

/// Re-apply the row invariants to an already-flattened event.
pub fn renormalize(mut event: Event) -> Event {
    (event.x, event.y) = repair_pair(event.x, event.y);
    (event.pass_end_x, event.pass_end_y) = repair_pair(event.pass_end_x, event.pass_end_y);
    (event.carry_end_x, event.carry_end_y) = repair_pair(event.carry_end_x, event.carry_end_y);
    (event.shot_end_x, event.shot_end_y) = repair_pair(event.shot_end_x, event.shot_end_y);
    event.shot_xg = event.shot_xg.filter(|v| v.is_finite());
    if event.position.trim().is_empty() {
        event.position = UNKNOWN_POSITION.to_string();
    }
    event
}

impl EventTable {
    /// Return a copy with every row invariant enforced. A no-op on tables
    /// produced by [`normalize_events`].
    pub fn normalized(&self) -> EventTable {
        self.iter().cloned().map(renormalize).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
