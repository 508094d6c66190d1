// Dashboard views as pure functions over normalized tables.
//
// Each view returns `ViewResult`: either the renderer-facing data or a typed
// reason why there is nothing to show. Empty selections are never errors.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::aggregate::{
    bin_locations, count_by_player, goals, network_edges, network_nodes, starting_eleven,
    sum_by_player, HeatmapGrid, NetworkNode, PairCount, PlayerCount, PlayerSum,
};
use crate::config::{PitchConfig, ViewsConfig};
use crate::filter::EventFilter;
use crate::model::{Event, EventTable, Match, Point, TournamentEvents};
use crate::positions::PositionGroup;
use crate::ranking::{players_in_group, rank_player, PercentileResult};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Why a view has nothing to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NoDataReason {
    NoMatchesForTeam(String),
    NoMatchesSelected,
    NoEvents,
    NoPlayers,
    NotEnoughPlayers,
    PlayerNotFound(String),
    NoShots,
    NoPasses(String),
    NoTouches(String),
    NoPlayersInGroup(PositionGroup),
    /// A required selection (player, group, ...) was not provided.
    MissingSelection(&'static str),
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::NoMatchesForTeam(team) => write!(f, "No matches found for {team}."),
            NoDataReason::NoMatchesSelected => write!(f, "Please select at least one match."),
            NoDataReason::NoEvents => {
                write!(f, "No event data available for the selected match(es).")
            }
            NoDataReason::NoPlayers => {
                write!(f, "No player data available in the selected match(es).")
            }
            NoDataReason::NotEnoughPlayers => {
                write!(f, "Not enough players available for comparison.")
            }
            NoDataReason::PlayerNotFound(player) => write!(f, "No events found for {player}."),
            NoDataReason::NoShots => write!(f, "No shots in the selected match(es)."),
            NoDataReason::NoPasses(team) => write!(f, "No completed passes for {team}."),
            NoDataReason::NoTouches(player) => write!(f, "No located touches for {player}."),
            NoDataReason::NoPlayersInGroup(group) => {
                write!(f, "No {group} players in the tournament.")
            }
            NoDataReason::MissingSelection(what) => write!(f, "Select a {what} first."),
        }
    }
}

/// Output of a view: the data to render, or why there is none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ViewResult<T> {
    Ready(T),
    NoData(NoDataReason),
}

impl<T> ViewResult<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewResult::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            ViewResult::Ready(v) => Some(v),
            ViewResult::NoData(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ViewResult<U> {
        match self {
            ViewResult::Ready(v) => ViewResult::Ready(f(v)),
            ViewResult::NoData(r) => ViewResult::NoData(r),
        }
    }
}

// ---------------------------------------------------------------------------
// Team and match selection
// ---------------------------------------------------------------------------

/// Every team appearing as home or away, deduplicated and sorted.
pub fn all_teams(matches: &[Match]) -> Vec<String> {
    let teams: BTreeSet<&str> = matches
        .iter()
        .flat_map(|m| [m.home_team.as_deref(), m.away_team.as_deref()])
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .collect();
    teams.into_iter().map(str::to_string).collect()
}

/// Matches the team played in, ordered by date (undated last) then id.
pub fn team_matches(matches: &[Match], team: &str) -> Vec<Match> {
    let mut selected: Vec<Match> = matches.iter().filter(|m| m.involves(team)).cloned().collect();
    selected.sort_by(|a, b| {
        let date = match (a.match_date, b.match_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        date.then_with(|| a.match_id.cmp(&b.match_id))
    });
    selected
}

/// Human-readable label for a match selector.
pub fn match_label(m: &Match) -> String {
    let home = m.home_team.as_deref().unwrap_or("?");
    let away = m.away_team.as_deref().unwrap_or("?");
    match m.match_date {
        Some(date) => format!("{} - {} vs {}", date.format("%Y-%m-%d"), home, away),
        None => format!("Match {}: {} vs {}", m.match_id, home, away),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOption {
    pub label: String,
    pub match_id: u64,
    pub score: Option<String>,
}

/// Selector entries for a team's matches.
pub fn match_options(matches: &[Match], team: &str) -> ViewResult<Vec<MatchOption>> {
    let selected = team_matches(matches, team);
    if selected.is_empty() {
        return ViewResult::NoData(NoDataReason::NoMatchesForTeam(team.to_string()));
    }
    ViewResult::Ready(
        selected
            .iter()
            .map(|m| MatchOption {
                label: match_label(m),
                match_id: m.match_id,
                score: match (m.home_score, m.away_score) {
                    (Some(h), Some(a)) => Some(format!("{h}-{a}")),
                    _ => None,
                },
            })
            .collect(),
    )
}

/// Distinct named players in a table, sorted.
pub fn players(events: &EventTable) -> Vec<String> {
    events.players()
}

fn require_events(events: &EventTable) -> Result<(), NoDataReason> {
    if events.is_empty() {
        Err(NoDataReason::NoEvents)
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Progressions into the final third
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progressions {
    pub team: String,
    pub passes: Vec<PlayerCount>,
    pub carries: Vec<PlayerCount>,
}

impl Progressions {
    pub fn total_passes(&self) -> usize {
        self.passes.iter().map(|c| c.count).sum()
    }

    pub fn total_carries(&self) -> usize {
        self.carries.iter().map(|c| c.count).sum()
    }
}

/// Per-player completed passes and carries from before the final third into it.
pub fn progressions(
    events: &EventTable,
    team: &str,
    pitch: &PitchConfig,
) -> ViewResult<Progressions> {
    if let Err(reason) = require_events(events) {
        return ViewResult::NoData(reason);
    }
    let passes = EventFilter::progressive_passes(team, pitch).apply(events);
    let carries = EventFilter::progressive_carries(team, pitch).apply(events);
    ViewResult::Ready(Progressions {
        team: team.to_string(),
        passes: count_by_player(&passes),
        carries: count_by_player(&carries),
    })
}

// ---------------------------------------------------------------------------
// Touch comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerTouches {
    pub player: String,
    pub touches: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TouchComparison {
    pub first: PlayerTouches,
    pub second: PlayerTouches,
}

fn touches_of(events: &EventTable, player: &str) -> PlayerTouches {
    PlayerTouches {
        player: player.to_string(),
        touches: EventFilter::player_touches(player)
            .apply(events)
            .iter()
            .filter_map(Event::location)
            .collect(),
    }
}

/// Touch locations of two different players side by side.
pub fn touch_comparison(
    events: &EventTable,
    first: &str,
    second: &str,
) -> ViewResult<TouchComparison> {
    if let Err(reason) = require_events(events) {
        return ViewResult::NoData(reason);
    }
    let available = events.players();
    if available.is_empty() {
        return ViewResult::NoData(NoDataReason::NoPlayers);
    }
    if available.len() < 2 || first == second {
        return ViewResult::NoData(NoDataReason::NotEnoughPlayers);
    }
    for player in [first, second] {
        if !available.iter().any(|p| p == player) {
            return ViewResult::NoData(NoDataReason::PlayerNotFound(player.to_string()));
        }
    }
    ViewResult::Ready(TouchComparison {
        first: touches_of(events, first),
        second: touches_of(events, second),
    })
}

// ---------------------------------------------------------------------------
// Shot map
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotMap {
    pub team: Option<String>,
    pub shots: EventTable,
    pub xg_by_player: Vec<PlayerSum>,
    pub total_xg: f64,
    pub goals: usize,
}

/// Shots of a team (or both teams), with xG totals.
pub fn shot_map(
    events: &EventTable,
    team: Option<&str>,
    views: &ViewsConfig,
) -> ViewResult<ShotMap> {
    if let Err(reason) = require_events(events) {
        return ViewResult::NoData(reason);
    }
    let mut filter = EventFilter::shots(views.exclude_penalties);
    if let Some(team) = team {
        filter = filter.team(team);
    }
    let shots = filter.apply(events);
    if shots.is_empty() {
        return ViewResult::NoData(NoDataReason::NoShots);
    }
    let xg_by_player = sum_by_player(&shots, |e| e.shot_xg);
    let total_xg = shots.iter().filter_map(|e| e.shot_xg).sum();
    ViewResult::Ready(ShotMap {
        team: team.map(str::to_string),
        goals: goals(&shots),
        xg_by_player,
        total_xg,
        shots,
    })
}

// ---------------------------------------------------------------------------
// Touch heatmap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TouchHeatmap {
    pub player: String,
    pub grid: HeatmapGrid,
}

pub fn touch_heatmap(
    events: &EventTable,
    player: &str,
    pitch: &PitchConfig,
    views: &ViewsConfig,
) -> ViewResult<TouchHeatmap> {
    if let Err(reason) = require_events(events) {
        return ViewResult::NoData(reason);
    }
    let touches = EventFilter::player_touches(player).apply(events);
    if touches.is_empty() {
        return ViewResult::NoData(NoDataReason::NoTouches(player.to_string()));
    }
    ViewResult::Ready(TouchHeatmap {
        player: player.to_string(),
        grid: bin_locations(&touches, pitch, views.heatmap_bins_x, views.heatmap_bins_y),
    })
}

// ---------------------------------------------------------------------------
// Passing network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassingNetwork {
    pub team: String,
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<PairCount>,
}

/// Nodes for the team's eleven most involved players, placed at their
/// average positions, plus pass counts between them.
pub fn passing_network(
    events: &EventTable,
    team: &str,
    views: &ViewsConfig,
) -> ViewResult<PassingNetwork> {
    if let Err(reason) = require_events(events) {
        return ViewResult::NoData(reason);
    }
    let passes = EventFilter::completed_team_passes(team).apply(events);
    if passes.is_empty() {
        return ViewResult::NoData(NoDataReason::NoPasses(team.to_string()));
    }
    let eleven = starting_eleven(&passes);
    ViewResult::Ready(PassingNetwork {
        team: team.to_string(),
        nodes: network_nodes(&passes, &eleven),
        edges: network_edges(&passes, &eleven, views.network_min_passes),
    })
}

// ---------------------------------------------------------------------------
// Report card
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportCard {
    pub player: String,
    pub group: PositionGroup,
    /// Players seen at the group's positions. Each metric line carries its
    /// own `ranked_against` count.
    pub group_size: usize,
    pub metrics: Vec<PercentileResult>,
}

/// Percentile report card for a player against everyone who played the same
/// position group in the tournament.
pub fn report_card(
    tournament: &TournamentEvents,
    player: &str,
    group: PositionGroup,
) -> ViewResult<ReportCard> {
    let group_players = players_in_group(tournament, group);
    if group_players.is_empty() {
        return ViewResult::NoData(NoDataReason::NoPlayersInGroup(group));
    }
    if !group_players.iter().any(|p| p == player) {
        return ViewResult::NoData(NoDataReason::PlayerNotFound(player.to_string()));
    }
    ViewResult::Ready(ReportCard {
        player: player.to_string(),
        group,
        group_size: group_players.len(),
        metrics: rank_player(tournament, player, group),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventType;
    use chrono::NaiveDate;

    fn fixture_match(id: u64, home: Option<&str>, away: Option<&str>, date: Option<&str>) -> Match {
        Match {
            match_id: id,
            competition_id: Some(55),
            season_id: Some(282),
            home_team: home.map(str::to_string),
            away_team: away.map(str::to_string),
            match_date: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            home_score: Some(1),
            away_score: Some(0),
        }
    }

    fn fixtures() -> Vec<Match> {
        vec![
            fixture_match(2, Some("Spain"), Some("Italy"), Some("2024-06-20")),
            fixture_match(1, Some("Spain"), Some("Croatia"), Some("2024-06-15")),
            fixture_match(3, Some("Germany"), None, None),
            fixture_match(4, Some(""), Some("Italy"), None),
        ]
    }

    #[test]
    fn teams_are_deduplicated_and_sorted() {
        assert_eq!(all_teams(&fixtures()), vec!["Croatia", "Germany", "Italy", "Spain"]);
    }

    #[test]
    fn match_labels() {
        let m = fixtures();
        assert_eq!(match_label(&m[1]), "2024-06-15 - Spain vs Croatia");
        assert_eq!(match_label(&m[2]), "Match 3: Germany vs ?");
    }

    #[test]
    fn team_matches_ordered_by_date() {
        let ids: Vec<u64> = team_matches(&fixtures(), "Spain").iter().map(|m| m.match_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn no_matches_for_unknown_team() {
        assert_eq!(
            match_options(&fixtures(), "France"),
            ViewResult::NoData(NoDataReason::NoMatchesForTeam("France".into()))
        );
        let options = match_options(&fixtures(), "Italy").ready().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].score.as_deref(), Some("1-0"));
    }

    fn located(team: &str, player: &str, event_type: EventType, x: f64, y: f64) -> Event {
        let mut e = Event::new(1, team, event_type);
        e.player = Some(player.into());
        e.x = Some(x);
        e.y = Some(y);
        e
    }

    #[test]
    fn touch_comparison_requires_two_known_players() {
        let table = EventTable::new(vec![
            located("A", "p1", EventType::Pass, 10.0, 10.0),
            located("A", "p2", EventType::Carry, 50.0, 40.0),
            located("A", "p2", EventType::BallReceipt, 60.0, 40.0),
        ]);
        let cmp = touch_comparison(&table, "p1", "p2").ready().unwrap();
        assert_eq!(cmp.first.touches.len(), 1);
        assert_eq!(cmp.second.touches.len(), 2);

        assert_eq!(
            touch_comparison(&table, "p1", "p1"),
            ViewResult::NoData(NoDataReason::NotEnoughPlayers)
        );
        assert_eq!(
            touch_comparison(&table, "p1", "ghost"),
            ViewResult::NoData(NoDataReason::PlayerNotFound("ghost".into()))
        );
        assert_eq!(
            touch_comparison(&EventTable::empty(), "p1", "p2"),
            ViewResult::NoData(NoDataReason::NoEvents)
        );
    }

    #[test]
    fn shot_map_sums_xg() {
        let mut a = located("A", "s1", EventType::Shot, 100.0, 40.0);
        a.shot_xg = Some(0.25);
        a.shot_outcome = Some("Goal".into());
        let mut b = located("A", "s1", EventType::Shot, 105.0, 35.0);
        b.shot_xg = Some(0.5);
        let mut pen = located("A", "s2", EventType::Shot, 108.0, 40.0);
        pen.shot_type = Some("Penalty".into());
        pen.shot_xg = Some(0.78);
        let table = EventTable::new(vec![a, b, pen]);

        let map = shot_map(&table, Some("A"), &ViewsConfig::default()).ready().unwrap();
        assert_eq!(map.shots.len(), 2);
        assert_eq!(map.goals, 1);
        assert!((map.total_xg - 0.75).abs() < 1e-9);
        assert_eq!(map.xg_by_player[0].player, "s1");

        assert_eq!(
            shot_map(&table, Some("B"), &ViewsConfig::default()),
            ViewResult::NoData(NoDataReason::NoShots)
        );
    }

    #[test]
    fn heatmap_counts_player_touches() {
        let table = EventTable::new(vec![
            located("A", "p1", EventType::Pass, 5.0, 5.0),
            located("A", "p1", EventType::Pass, 6.0, 6.0),
            located("A", "p2", EventType::Pass, 100.0, 70.0),
        ]);
        let view = touch_heatmap(&table, "p1", &PitchConfig::default(), &ViewsConfig::default())
            .ready()
            .unwrap();
        assert_eq!(view.grid.total(), 2);
        assert_eq!(view.grid.peak(), Some((0, 0, 2)));
        let views = ViewsConfig::default();
        assert!(!touch_heatmap(&table, "p3", &PitchConfig::default(), &views).is_ready());
    }

    #[test]
    fn passing_network_uses_completed_passes() {
        let mut rows = Vec::new();
        for _ in 0..3 {
            let mut p = located("A", "p1", EventType::Pass, 30.0, 40.0);
            p.pass_recipient = Some("p2".into());
            p.pass_end_x = Some(50.0);
            p.pass_end_y = Some(40.0);
            rows.push(p);
        }
        let mut failed = located("A", "p2", EventType::Pass, 50.0, 40.0);
        failed.pass_recipient = Some("p3".into());
        failed.pass_outcome = Some("Incomplete".into());
        rows.push(failed);
        let table = EventTable::new(rows);

        let net = passing_network(&table, "A", &ViewsConfig::default()).ready().unwrap();
        let names: Vec<_> = net.nodes.iter().map(|n| n.player.as_str()).collect();
        assert_eq!(names, vec!["p1", "p2"]);
        assert_eq!(net.edges.len(), 1);
        assert_eq!(net.edges[0].count, 3);
        assert_eq!(
            passing_network(&table, "B", &ViewsConfig::default()),
            ViewResult::NoData(NoDataReason::NoPasses("B".into()))
        );
    }

    #[test]
    fn report_card_checks_group_membership() {
        let mut gk = Event::new(1, "A", EventType::GoalKeeper);
        gk.player = Some("keeper".into());
        gk.position = "Goalkeeper".into();
        let tournament = TournamentEvents::new(EventTable::new(vec![gk]));

        let card = report_card(&tournament, "keeper", PositionGroup::Goalkeeper).ready().unwrap();
        assert_eq!(card.group_size, 1);
        assert_eq!(card.metrics[0].ranked_against, 1);
        assert_eq!(card.metrics[0].count, 1);
        assert_eq!(card.metrics[0].percentile, 50.0);

        assert_eq!(
            report_card(&tournament, "keeper", PositionGroup::Forward),
            ViewResult::NoData(NoDataReason::NoPlayersInGroup(PositionGroup::Forward))
        );
        assert_eq!(
            report_card(&tournament, "other", PositionGroup::Goalkeeper),
            ViewResult::NoData(NoDataReason::PlayerNotFound("other".into()))
        );
    }
}
