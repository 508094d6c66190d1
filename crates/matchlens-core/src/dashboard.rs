// One render pass: cache lookup, normalization, filtering and aggregation for
// the selected view.
//
// The dashboard owns the cache, so repeated renders over the same selection
// reuse fetched tables. Nothing else is shared between renders.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::TournamentCache;
use crate::config::Config;
use crate::model::{EventTable, Match, TournamentEvents};
use crate::positions::PositionGroup;
use crate::source::{EventSource, FetchError};
use crate::views::{
    self, MatchOption, NoDataReason, PassingNetwork, Progressions, ReportCard, ShotMap,
    TouchComparison, TouchHeatmap, ViewResult,
};

// ---------------------------------------------------------------------------
// View menu
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViewKind {
    Progressions,
    TouchComparison,
    ShotMap,
    TouchHeatmap,
    PassingNetwork,
    ReportCard,
}

impl ViewKind {
    pub const ALL: [ViewKind; 6] = [
        ViewKind::Progressions,
        ViewKind::TouchComparison,
        ViewKind::ShotMap,
        ViewKind::TouchHeatmap,
        ViewKind::PassingNetwork,
        ViewKind::ReportCard,
    ];

    /// Command-line name.
    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Progressions => "progressions",
            ViewKind::TouchComparison => "touches",
            ViewKind::ShotMap => "shots",
            ViewKind::TouchHeatmap => "heatmap",
            ViewKind::PassingNetwork => "network",
            ViewKind::ReportCard => "report",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ViewKind::Progressions => "Progressions into Final Third",
            ViewKind::TouchComparison => "Touch Comparison",
            ViewKind::ShotMap => "Shot Map",
            ViewKind::TouchHeatmap => "Touch Heatmap",
            ViewKind::PassingNetwork => "Passing Network",
            ViewKind::ReportCard => "Player Report Card",
        }
    }

    /// Parse a view name (case-insensitive, `-`/`_` ignored).
    pub fn from_name(s: &str) -> Option<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "progressions" | "progression" => Some(ViewKind::Progressions),
            "touches" | "touchcomparison" => Some(ViewKind::TouchComparison),
            "shots" | "shotmap" => Some(ViewKind::ShotMap),
            "heatmap" | "touchheatmap" => Some(ViewKind::TouchHeatmap),
            "network" | "passingnetwork" => Some(ViewKind::PassingNetwork),
            "report" | "reportcard" => Some(ViewKind::ReportCard),
            _ => None,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What the user picked. An empty `match_ids` means every match of the team.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub team: String,
    pub match_ids: Vec<u64>,
    pub player: Option<String>,
    pub player2: Option<String>,
    pub group: Option<PositionGroup>,
}

impl Selection {
    pub fn team(team: impl Into<String>) -> Self {
        Selection {
            team: team.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ViewOutput {
    Progressions(Progressions),
    TouchComparison(TouchComparison),
    ShotMap(ShotMap),
    TouchHeatmap(TouchHeatmap),
    PassingNetwork(PassingNetwork),
    ReportCard(ReportCard),
}

/// The group a player appeared in most often across the tournament. Ties go
/// to the group listed first.
pub fn primary_group(tournament: &TournamentEvents, player: &str) -> Option<PositionGroup> {
    let mut counts: BTreeMap<PositionGroup, usize> = BTreeMap::new();
    for event in tournament.table().iter() {
        if event.player.as_deref() != Some(player) {
            continue;
        }
        if let Some(group) = PositionGroup::of(&event.position) {
            *counts.entry(group).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(PositionGroup, usize)>, (group, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((group, n)),
        })
        .map(|(group, _)| group)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard<S> {
    config: Config,
    cache: TournamentCache<S>,
}

impl<S: EventSource> Dashboard<S> {
    pub fn new(config: Config, source: S) -> Self {
        Dashboard {
            config,
            cache: TournamentCache::new(source),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &TournamentCache<S> {
        &self.cache
    }

    /// The configured tournament's fixtures.
    pub async fn matches(&self) -> Result<Arc<Vec<Match>>, FetchError> {
        let t = &self.config.tournament;
        self.cache.matches(t.competition_id, t.season_id).await
    }

    pub async fn teams(&self) -> Result<Vec<String>, FetchError> {
        Ok(views::all_teams(&self.matches().await?))
    }

    pub async fn match_options(
        &self,
        team: &str,
    ) -> Result<ViewResult<Vec<MatchOption>>, FetchError> {
        Ok(views::match_options(&self.matches().await?, team))
    }

    pub async fn tournament(&self) -> Result<Arc<TournamentEvents>, FetchError> {
        self.cache.tournament_events(&self.config.tournament.query()).await
    }

    /// Events for the selected matches of the selected team. Requested ids the
    /// team did not play in are dropped.
    pub async fn selected_events(
        &self,
        selection: &Selection,
    ) -> Result<ViewResult<Arc<EventTable>>, FetchError> {
        let played = views::team_matches(&self.matches().await?, &selection.team);
        if played.is_empty() {
            return Ok(ViewResult::NoData(NoDataReason::NoMatchesForTeam(
                selection.team.clone(),
            )));
        }
        let played_ids: BTreeSet<u64> = played.iter().map(|m| m.match_id).collect();
        let ids: BTreeSet<u64> = if selection.match_ids.is_empty() {
            played_ids
        } else {
            selection
                .match_ids
                .iter()
                .copied()
                .filter(|id| played_ids.contains(id))
                .collect()
        };
        if ids.is_empty() {
            return Ok(ViewResult::NoData(NoDataReason::NoMatchesSelected));
        }
        debug!("selected matches for {}: {:?}", selection.team, ids);
        let events = self.cache.match_events(ids).await?;
        if events.is_empty() {
            return Ok(ViewResult::NoData(NoDataReason::NoEvents));
        }
        Ok(ViewResult::Ready(events))
    }

    async fn with_events<F>(
        &self,
        selection: &Selection,
        view: F,
    ) -> Result<ViewResult<ViewOutput>, FetchError>
    where
        F: FnOnce(&EventTable) -> ViewResult<ViewOutput>,
    {
        Ok(match self.selected_events(selection).await? {
            ViewResult::Ready(events) => view(&events),
            ViewResult::NoData(reason) => ViewResult::NoData(reason),
        })
    }

    /// Compute one view for the selection.
    pub async fn render(
        &self,
        kind: ViewKind,
        selection: &Selection,
    ) -> Result<ViewResult<ViewOutput>, FetchError> {
        info!("rendering {} for {}", kind, selection.team);
        let pitch = &self.config.pitch;
        let opts = &self.config.views;
        let team = selection.team.as_str();

        match kind {
            ViewKind::Progressions => {
                self.with_events(selection, |events| {
                    views::progressions(events, team, pitch).map(ViewOutput::Progressions)
                })
                .await
            }
            ViewKind::TouchComparison => {
                let (Some(a), Some(b)) =
                    (selection.player.as_deref(), selection.player2.as_deref())
                else {
                    let missing = if selection.player.is_none() {
                        "player"
                    } else {
                        "second player"
                    };
                    return Ok(ViewResult::NoData(NoDataReason::MissingSelection(missing)));
                };
                self.with_events(selection, |events| {
                    views::touch_comparison(events, a, b).map(ViewOutput::TouchComparison)
                })
                .await
            }
            ViewKind::ShotMap => {
                self.with_events(selection, |events| {
                    views::shot_map(events, Some(team), opts).map(ViewOutput::ShotMap)
                })
                .await
            }
            ViewKind::TouchHeatmap => {
                let Some(player) = selection.player.as_deref() else {
                    return Ok(ViewResult::NoData(NoDataReason::MissingSelection("player")));
                };
                self.with_events(selection, |events| {
                    views::touch_heatmap(events, player, pitch, opts).map(ViewOutput::TouchHeatmap)
                })
                .await
            }
            ViewKind::PassingNetwork => {
                self.with_events(selection, |events| {
                    views::passing_network(events, team, opts).map(ViewOutput::PassingNetwork)
                })
                .await
            }
            ViewKind::ReportCard => self.render_report_card(selection).await,
        }
    }

    async fn render_report_card(
        &self,
        selection: &Selection,
    ) -> Result<ViewResult<ViewOutput>, FetchError> {
        let Some(player) = selection.player.as_deref() else {
            return Ok(ViewResult::NoData(NoDataReason::MissingSelection("player")));
        };
        let tournament = self.tournament().await?;
        let group = match selection.group.or_else(|| primary_group(&tournament, player)) {
            Some(group) => group,
            None => return Ok(ViewResult::NoData(NoDataReason::PlayerNotFound(player.to_string()))),
        };
        Ok(views::report_card(&tournament, player, group).map(ViewOutput::ReportCard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Event, EventType};

    #[test]
    fn view_names_round_trip() {
        for kind in ViewKind::ALL {
            assert_eq!(ViewKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ViewKind::from_name("Passing-Network"), Some(ViewKind::PassingNetwork));
        assert_eq!(ViewKind::from_name("shot_map"), Some(ViewKind::ShotMap));
        assert_eq!(ViewKind::from_name("pizza"), None);
    }

    #[test]
    fn primary_group_is_most_frequent() {
        let mut rows = Vec::new();
        for position in [
            "Center Back",
            "Center Back",
            "Left Back",
            "Right Wing",
            "Center Forward",
        ] {
            let mut e = Event::new(1, "A", EventType::Pass);
            e.player = Some("p".into());
            e.position = position.into();
            rows.push(e);
        }
        let tournament = TournamentEvents::new(EventTable::new(rows));
        assert_eq!(primary_group(&tournament, "p"), Some(PositionGroup::Defender));
        assert_eq!(primary_group(&tournament, "q"), None);
    }
}
