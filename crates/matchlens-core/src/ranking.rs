// Percentile ranking of a player against a position-group population.
//
// Both the population and the ranked player's count come from the same
// tournament-wide table, restricted to the group's positions. Functions here
// take `TournamentEvents`, never a match-filtered `EventTable`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::EventFilter;
use crate::metrics::{metrics_for, MetricDefinition};
use crate::model::{EventTable, TournamentEvents};
use crate::positions::PositionGroup;

/// Percentile of `score` within `population`, using the mean-rank convention:
/// `(below + 0.5 * equal) / n * 100`.
///
/// Returns 0.0 for an empty population. The result is always finite and in
/// `[0, 100]`.
pub fn percentile_of_score(population: &[usize], score: usize) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let below = population.iter().filter(|&&v| v < score).count() as f64;
    let equal = population.iter().filter(|&&v| v == score).count() as f64;
    (below + 0.5 * equal) / population.len() as f64 * 100.0
}

/// One report-card line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileResult {
    pub metric: String,
    pub count: usize,
    pub percentile: f64,
    /// Players with a non-zero count for this metric.
    pub ranked_against: usize,
}

/// Per-player counts of a metric over a group-restricted table. Players who
/// never produced the metric are absent.
fn metric_counts<'a>(
    group_events: &'a EventTable,
    metric: &MetricDefinition,
) -> BTreeMap<&'a str, usize> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in group_events.iter().filter(|e| metric.counts(e)) {
        if let Some(player) = event.player.as_deref() {
            *counts.entry(player).or_default() += 1;
        }
    }
    counts
}

/// Events of the tournament played from one of the group's positions.
pub fn group_events(tournament: &TournamentEvents, group: PositionGroup) -> EventTable {
    EventFilter::position_group(group).apply(tournament.table())
}

/// Players who appear in the tournament at one of the group's positions.
pub fn players_in_group(tournament: &TournamentEvents, group: PositionGroup) -> Vec<String> {
    group_events(tournament, group).players()
}

/// The population of per-player counts for one metric within a group.
pub fn metric_population(
    tournament: &TournamentEvents,
    group: PositionGroup,
    metric: &MetricDefinition,
) -> Vec<usize> {
    let events = group_events(tournament, group);
    metric_counts(&events, metric).into_values().collect()
}

/// Rank one player on every metric of the group's report card.
pub fn rank_player(
    tournament: &TournamentEvents,
    player: &str,
    group: PositionGroup,
) -> Vec<PercentileResult> {
    let events = group_events(tournament, group);
    metrics_for(group)
        .iter()
        .map(|metric| {
            let counts = metric_counts(&events, metric);
            let count = counts.get(player).copied().unwrap_or(0);
            let population: Vec<usize> = counts.into_values().collect();
            PercentileResult {
                metric: metric.label.to_string(),
                count,
                percentile: percentile_of_score(&population, count),
                ranked_against: population.len(),
            }
        })
        .collect()
}
