// Grouping and aggregation over filtered event tables.
//
// Ordering rule for every ranked output: value descending, then entity key
// ascending. Grouping goes through BTreeMap so the key order is fixed before
// the stable sort runs.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::PitchConfig;
use crate::model::{Event, EventTable, EventType, Point};

/// Size of the node set for passing networks.
pub const STARTING_ELEVEN: usize = 11;

// ---------------------------------------------------------------------------
// Counts and sums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerCount {
    pub player: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub passer: String,
    pub recipient: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSum {
    pub player: String,
    pub total: f64,
}

/// Events per player. Rows without a player are not counted.
pub fn count_by_player(table: &EventTable) -> Vec<PlayerCount> {
    let mut groups: BTreeMap<&str, usize> = BTreeMap::new();
    for player in table.iter().filter_map(|e| e.player.as_deref()) {
        *groups.entry(player).or_default() += 1;
    }
    let mut counts: Vec<PlayerCount> = groups
        .into_iter()
        .map(|(player, count)| PlayerCount {
            player: player.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.player.cmp(&b.player)));
    counts
}

/// Lookup of a single player's count; zero when absent.
pub fn count_for(counts: &[PlayerCount], player: &str) -> usize {
    counts
        .iter()
        .find(|c| c.player == player)
        .map_or(0, |c| c.count)
}

/// Events per (passer, recipient). Rows missing either side are skipped.
pub fn count_by_pair(table: &EventTable) -> Vec<PairCount> {
    let mut groups: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for event in table.iter() {
        if let (Some(passer), Some(recipient)) =
            (event.player.as_deref(), event.pass_recipient.as_deref())
        {
            *groups.entry((passer, recipient)).or_default() += 1;
        }
    }
    let mut pairs: Vec<PairCount> = groups
        .into_iter()
        .map(|((passer, recipient), count)| PairCount {
            passer: passer.to_string(),
            recipient: recipient.to_string(),
            count,
        })
        .collect();
    pairs.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.passer.cmp(&b.passer))
            .then_with(|| a.recipient.cmp(&b.recipient))
    });
    pairs
}

/// Sum of `value` per player, skipping rows where it is absent.
pub fn sum_by_player<F>(table: &EventTable, value: F) -> Vec<PlayerSum>
where
    F: Fn(&Event) -> Option<f64>,
{
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for event in table.iter() {
        let (Some(player), Some(v)) = (event.player.as_deref(), value(event)) else {
            continue;
        };
        *groups.entry(player).or_default() += v;
    }
    let mut sums: Vec<PlayerSum> = groups
        .into_iter()
        .map(|(player, total)| PlayerSum {
            player: player.to_string(),
            total,
        })
        .collect();
    sums.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.player.cmp(&b.player))
    });
    sums
}

// ---------------------------------------------------------------------------
// Passing networks
// ---------------------------------------------------------------------------

/// How often a player touched the ball in a set of passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Involvement {
    pub player: String,
    pub passes_made: usize,
    pub passes_received: usize,
}

impl Involvement {
    pub fn total(&self) -> usize {
        self.passes_made + self.passes_received
    }
}

/// Involvement of every passer and recipient, ranked by total.
pub fn involvement(passes: &EventTable) -> Vec<Involvement> {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for event in passes.iter() {
        if let Some(passer) = event.player.as_deref() {
            groups.entry(passer).or_default().0 += 1;
        }
        if let Some(recipient) = event.pass_recipient.as_deref() {
            groups.entry(recipient).or_default().1 += 1;
        }
    }
    let mut ranked: Vec<Involvement> = groups
        .into_iter()
        .map(|(player, (made, received))| Involvement {
            player: player.to_string(),
            passes_made: made,
            passes_received: received,
        })
        .collect();
    ranked.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.player.cmp(&b.player)));
    ranked
}

/// The eleven most involved players, used as passing-network nodes.
pub fn starting_eleven(passes: &EventTable) -> Vec<Involvement> {
    let mut ranked = involvement(passes);
    ranked.truncate(STARTING_ELEVEN);
    ranked
}

/// Average position of a player: the mean of their own pass origins and the
/// end points of passes they received. Falls back to one side when the other
/// is empty, and to (0, 0) when both are.
pub fn average_position(passes: &EventTable, player: &str) -> Point {
    let origins: Vec<Point> = passes
        .iter()
        .filter(|e| e.player.as_deref() == Some(player))
        .filter_map(Event::location)
        .collect();
    let receptions: Vec<Point> = passes
        .iter()
        .filter(|e| e.pass_recipient.as_deref() == Some(player))
        .filter_map(Event::pass_end)
        .collect();

    match (Point::mean(&origins), Point::mean(&receptions)) {
        (Some(a), Some(b)) => Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => Point::new(0.0, 0.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkNode {
    pub player: String,
    pub x: f64,
    pub y: f64,
    pub passes_made: usize,
    pub passes_received: usize,
}

/// Node positions for the given ranked players.
pub fn network_nodes(passes: &EventTable, players: &[Involvement]) -> Vec<NetworkNode> {
    players
        .iter()
        .map(|inv| {
            let pos = average_position(passes, &inv.player);
            NetworkNode {
                player: inv.player.clone(),
                x: pos.x,
                y: pos.y,
                passes_made: inv.passes_made,
                passes_received: inv.passes_received,
            }
        })
        .collect()
}

/// Pass counts between node players, dropping pairs below `min_passes`.
pub fn network_edges(
    passes: &EventTable,
    players: &[Involvement],
    min_passes: usize,
) -> Vec<PairCount> {
    let nodes: BTreeSet<&str> = players.iter().map(|p| p.player.as_str()).collect();
    count_by_pair(passes)
        .into_iter()
        .filter(|p| p.count >= min_passes.max(1))
        .filter(|p| nodes.contains(p.passer.as_str()) && nodes.contains(p.recipient.as_str()))
        .collect()
}

// ---------------------------------------------------------------------------
// Heatmaps
// ---------------------------------------------------------------------------

/// Event counts over a regular grid laid on the pitch. `counts[row][col]`:
/// rows run along the pitch width (y), columns along its length (x).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapGrid {
    pub bins_x: usize,
    pub bins_y: usize,
    pub cell_length: f64,
    pub cell_width: f64,
    pub counts: Vec<Vec<usize>>,
}

impl HeatmapGrid {
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// The busiest cell as (column, row, count); ties go to the lowest
    /// row, then the lowest column.
    pub fn peak(&self) -> Option<(usize, usize, usize)> {
        let mut best: Option<(usize, usize, usize)> = None;
        for (row, cells) in self.counts.iter().enumerate() {
            for (col, &count) in cells.iter().enumerate() {
                if count > 0 && best.map_or(true, |(_, _, c)| count > c) {
                    best = Some((col, row, count));
                }
            }
        }
        best
    }
}

fn bin_index(value: f64, extent: f64, bins: usize) -> usize {
    let scaled = (value / extent * bins as f64).floor();
    if scaled <= 0.0 {
        0
    } else {
        (scaled as usize).min(bins - 1)
    }
}

/// Bin the locations of every located event. Points outside the pitch clamp
/// to the edge cells. Bin counts of zero are treated as one.
pub fn bin_locations(
    table: &EventTable,
    pitch: &PitchConfig,
    bins_x: usize,
    bins_y: usize,
) -> HeatmapGrid {
    let bins_x = bins_x.max(1);
    let bins_y = bins_y.max(1);
    let mut counts = vec![vec![0usize; bins_x]; bins_y];
    for point in table.iter().filter_map(Event::location) {
        let col = bin_index(point.x, pitch.length, bins_x);
        let row = bin_index(point.y, pitch.width, bins_y);
        counts[row][col] += 1;
    }
    HeatmapGrid {
        bins_x,
        bins_y,
        cell_length: pitch.length / bins_x as f64,
        cell_width: pitch.width / bins_y as f64,
        counts,
    }
}

/// Number of goals in a table of shots.
pub fn goals(table: &EventTable) -> usize {
    table
        .iter()
        .filter(|e| e.event_type == EventType::Shot && e.is_goal())
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event_by(player: &str) -> Event {
        let mut e = Event::new(1, "A", EventType::Pressure);
        e.player = Some(player.into());
        e
    }

    fn pass(from: &str, to: &str, origin: (f64, f64), end: (f64, f64)) -> Event {
        let mut e = Event::new(1, "A", EventType::Pass);
        e.player = Some(from.into());
        e.pass_recipient = Some(to.into());
        e.x = Some(origin.0);
        e.y = Some(origin.1);
        e.pass_end_x = Some(end.0);
        e.pass_end_y = Some(end.1);
        e
    }

    #[test]
    fn counts_sorted_by_count_then_name() {
        let table = EventTable::new(vec![
            event_by("zed"),
            event_by("amy"),
            event_by("bob"),
            event_by("bob"),
            Event::new(1, "A", EventType::Pressure),
        ]);
        let counts = count_by_player(&table);
        let flat: Vec<(&str, usize)> =
            counts.iter().map(|c| (c.player.as_str(), c.count)).collect();
        assert_eq!(flat, vec![("bob", 2), ("amy", 1), ("zed", 1)]);
        assert_eq!(count_for(&counts, "bob"), 2);
        assert_eq!(count_for(&counts, "nobody"), 0);
    }

    #[test]
    fn pair_counts() {
        let table = EventTable::new(vec![
            pass("a", "b", (0.0, 0.0), (1.0, 1.0)),
            pass("a", "b", (0.0, 0.0), (1.0, 1.0)),
            pass("b", "a", (0.0, 0.0), (1.0, 1.0)),
            pass("a", "c", (0.0, 0.0), (1.0, 1.0)),
        ]);
        let pairs = count_by_pair(&table);
        assert_eq!(pairs[0], PairCount { passer: "a".into(), recipient: "b".into(), count: 2 });
        assert_eq!(pairs[1].recipient, "c");
        assert_eq!(pairs[2].passer, "b");
    }

    #[test]
    fn sums_skip_missing_values() {
        let mut s1 = Event::new(1, "A", EventType::Shot);
        s1.player = Some("x".into());
        s1.shot_xg = Some(0.25);
        let mut s2 = s1.clone();
        s2.shot_xg = Some(0.5);
        let mut s3 = s1.clone();
        s3.shot_xg = None;
        let mut s4 = s1.clone();
        s4.player = Some("y".into());
        s4.shot_xg = Some(0.1);
        let sums = sum_by_player(&EventTable::new(vec![s1, s2, s3, s4]), |e| e.shot_xg);
        assert_eq!(sums.len(), 2);
        assert_eq!(sums[0].player, "x");
        assert!((sums[0].total - 0.75).abs() < 1e-12);
    }

    #[test]
    fn average_position_combines_both_sides() {
        let table = EventTable::new(vec![
            pass("a", "b", (10.0, 20.0), (50.0, 60.0)),
            pass("b", "a", (30.0, 40.0), (70.0, 80.0)),
        ]);
        // a: origin (10,20), received (70,80) -> (40,50)
        assert_eq!(average_position(&table, "a"), Point::new(40.0, 50.0));
    }

    #[test]
    fn average_position_one_side_only() {
        let table = EventTable::new(vec![pass("a", "b", (10.0, 20.0), (50.0, 60.0))]);
        assert_eq!(average_position(&table, "a"), Point::new(10.0, 20.0));
        assert_eq!(average_position(&table, "b"), Point::new(50.0, 60.0));
    }

    #[test]
    fn average_position_falls_back_to_origin() {
        let table = EventTable::new(vec![pass("a", "b", (10.0, 20.0), (50.0, 60.0))]);
        assert_eq!(average_position(&table, "ghost"), Point::new(0.0, 0.0));
        assert_eq!(average_position(&EventTable::empty(), "a"), Point::new(0.0, 0.0));
    }

    #[test]
    fn starting_eleven_takes_top_eleven_with_tie_break() {
        // Players p01..p13; involvement decreases with index, except p11 and
        // p12 tie, and p12 sorts after p11 by name.
        let mut rows = Vec::new();
        let wanted = [30, 28, 26, 24, 22, 20, 18, 16, 14, 12, 5, 5, 1];
        for (i, &n) in wanted.iter().enumerate() {
            let name = format!("p{:02}", i + 1);
            for _ in 0..n {
                let mut e = Event::new(1, "A", EventType::Pass);
                e.player = Some(name.clone());
                rows.push(e);
            }
        }
        let eleven = starting_eleven(&EventTable::new(rows));
        assert_eq!(eleven.len(), STARTING_ELEVEN);
        let names: Vec<&str> = eleven.iter().map(|i| i.player.as_str()).collect();
        assert_eq!(names[10], "p11");
        assert!(!names.contains(&"p12"));
        assert!(!names.contains(&"p13"));
    }

    #[test]
    fn involvement_counts_both_roles() {
        let table = EventTable::new(vec![
            pass("a", "b", (0.0, 0.0), (1.0, 1.0)),
            pass("b", "a", (0.0, 0.0), (1.0, 1.0)),
            pass("c", "a", (0.0, 0.0), (1.0, 1.0)),
        ]);
        let ranked = involvement(&table);
        assert_eq!(ranked[0].player, "a");
        assert_eq!(ranked[0].passes_made, 1);
        assert_eq!(ranked[0].passes_received, 2);
        assert_eq!(ranked[0].total(), 3);
    }

    #[test]
    fn edges_restricted_to_nodes_and_threshold() {
        let table = EventTable::new(vec![
            pass("a", "b", (0.0, 0.0), (1.0, 1.0)),
            pass("a", "b", (0.0, 0.0), (1.0, 1.0)),
            pass("a", "z", (0.0, 0.0), (1.0, 1.0)),
            pass("a", "z", (0.0, 0.0), (1.0, 1.0)),
            pass("b", "a", (0.0, 0.0), (1.0, 1.0)),
        ]);
        let nodes = vec![
            Involvement { player: "a".into(), passes_made: 5, passes_received: 1 },
            Involvement { player: "b".into(), passes_made: 1, passes_received: 2 },
        ];
        let edges = network_edges(&table, &nodes, 2);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].passer.as_str(), edges[0].recipient.as_str()), ("a", "b"));
    }

    #[test]
    fn heatmap_bins_and_clamps() {
        let mut rows = Vec::new();
        for (x, y) in [(0.0, 0.0), (119.9, 79.9), (130.0, -5.0), (60.0, 40.0)] {
            let mut e = Event::new(1, "A", EventType::Carry);
            e.x = Some(x);
            e.y = Some(y);
            rows.push(e);
        }
        rows.push(Event::new(1, "A", EventType::Carry));
        let grid = bin_locations(&EventTable::new(rows), &PitchConfig::default(), 6, 4);
        assert_eq!(grid.total(), 4);
        assert_eq!(grid.counts[0][0], 1);
        assert_eq!(grid.counts[3][5], 1);
        assert_eq!(grid.counts[0][5], 1);
        assert_eq!(grid.counts[2][3], 1);
        assert!((grid.cell_length - 20.0).abs() < 1e-12);
        assert!((grid.cell_width - 20.0).abs() < 1e-12);
        assert_eq!(grid.peak(), Some((0, 0, 1)));
    }
}
