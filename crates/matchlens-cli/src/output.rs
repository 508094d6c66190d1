// Plain-text rendering of view results for the terminal.

use std::fmt::Write;

use matchlens_core::aggregate::PlayerCount;
use matchlens_core::dashboard::{ViewKind, ViewOutput};
use matchlens_core::views::{MatchOption, PlayerTouches, ViewResult};

fn counts_table(out: &mut String, heading: &str, counts: &[PlayerCount]) {
    let _ = writeln!(out, "{heading}");
    if counts.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    let width = counts.iter().map(|c| c.player.chars().count()).max().unwrap_or(0);
    for c in counts {
        let _ = writeln!(out, "  {:<width$}  {:>3}", c.player, c.count);
    }
}

fn touches_summary(out: &mut String, touches: &PlayerTouches) {
    let n = touches.touches.len();
    let _ = write!(out, "  {:<24} {:>4} touches", touches.player, n);
    if n > 0 {
        let mean_x = touches.touches.iter().map(|p| p.x).sum::<f64>() / n as f64;
        let mean_y = touches.touches.iter().map(|p| p.y).sum::<f64>() / n as f64;
        let _ = write!(out, "  mean ({mean_x:.1}, {mean_y:.1})");
    }
    out.push('\n');
}

/// Format a rendered view for stdout.
pub fn format_view(kind: ViewKind, result: &ViewResult<ViewOutput>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", kind.title());

    let output = match result {
        ViewResult::Ready(output) => output,
        ViewResult::NoData(reason) => {
            let _ = writeln!(out, "{reason}");
            return out;
        }
    };

    match output {
        ViewOutput::Progressions(view) => {
            let _ = writeln!(out, "Team: {}", view.team);
            counts_table(&mut out, "Passes into the final third:", &view.passes);
            counts_table(&mut out, "Carries into the final third:", &view.carries);
        }
        ViewOutput::TouchComparison(view) => {
            touches_summary(&mut out, &view.first);
            touches_summary(&mut out, &view.second);
        }
        ViewOutput::ShotMap(view) => {
            let _ = writeln!(
                out,
                "{} shots, {} goals, {:.2} xG",
                view.shots.len(),
                view.goals,
                view.total_xg
            );
            for sum in &view.xg_by_player {
                let _ = writeln!(out, "  {:<24} {:>5.2}", sum.player, sum.total);
            }
        }
        ViewOutput::TouchHeatmap(view) => {
            let grid = &view.grid;
            let _ = writeln!(
                out,
                "{}: {} touches on a {}x{} grid",
                view.player,
                grid.total(),
                grid.bins_x,
                grid.bins_y
            );
            for row in &grid.counts {
                let cells: Vec<String> = row.iter().map(|c| format!("{c:>4}")).collect();
                let _ = writeln!(out, " {}", cells.join(""));
            }
        }
        ViewOutput::PassingNetwork(view) => {
            let _ = writeln!(out, "Team: {}", view.team);
            for node in &view.nodes {
                let _ = writeln!(
                    out,
                    "  {:<24} ({:>5.1}, {:>5.1})  made {:>3}  received {:>3}",
                    node.player, node.x, node.y, node.passes_made, node.passes_received
                );
            }
            let _ = writeln!(out, "Links:");
            for edge in &view.edges {
                let _ = writeln!(out, "  {} -> {}: {}", edge.passer, edge.recipient, edge.count);
            }
        }
        ViewOutput::ReportCard(card) => {
            let _ = writeln!(
                out,
                "{} ({}, {} players in group)",
                card.player, card.group, card.group_size
            );
            for m in &card.metrics {
                let _ = writeln!(
                    out,
                    "  {:<20} {:>4}  {:>5.1} pct  (of {})",
                    m.metric, m.count, m.percentile, m.ranked_against
                );
            }
        }
    }
    out
}

/// One line per selectable match.
pub fn format_match_options(options: &[MatchOption]) -> String {
    let mut out = String::new();
    for option in options {
        let _ = write!(out, "{:>10}  {}", option.match_id, option.label);
        if let Some(score) = &option.score {
            let _ = write!(out, " ({score})");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchlens_core::ranking::PercentileResult;
    use matchlens_core::positions::PositionGroup;
    use matchlens_core::views::{NoDataReason, Progressions, ReportCard};

    #[test]
    fn no_data_prints_reason() {
        let text = format_view(
            ViewKind::ShotMap,
            &ViewResult::NoData(NoDataReason::NoShots),
        );
        assert_eq!(text, "== Shot Map ==\nNo shots in the selected match(es).\n");
    }

    #[test]
    fn progressions_table() {
        let view = Progressions {
            team: "Spain".into(),
            passes: vec![PlayerCount {
                player: "Rodri".into(),
                count: 3,
            }],
            carries: vec![],
        };
        let text = format_view(
            ViewKind::Progressions,
            &ViewResult::Ready(ViewOutput::Progressions(view)),
        );
        assert!(text.contains("Team: Spain"));
        assert!(text.contains("  Rodri    3"));
        assert!(text.contains("(none)"));
    }

    #[test]
    fn report_card_lines() {
        let card = ReportCard {
            player: "Kai Havertz".into(),
            group: PositionGroup::Forward,
            group_size: 12,
            metrics: vec![PercentileResult {
                metric: "Shots".into(),
                count: 9,
                percentile: 87.5,
                ranked_against: 8,
            }],
        };
        let text = format_view(
            ViewKind::ReportCard,
            &ViewResult::Ready(ViewOutput::ReportCard(card)),
        );
        assert!(text.contains("Kai Havertz (Forward, 12 players in group)"));
        assert!(text.contains("87.5 pct  (of 8)"));
    }

    #[test]
    fn match_option_lines() {
        let options = vec![MatchOption {
            label: "2024-06-15 - Spain vs Croatia".into(),
            match_id: 3942226,
            score: Some("3-0".into()),
        }];
        assert_eq!(
            format_match_options(&options),
            "   3942226  2024-06-15 - Spain vs Croatia (3-0)\n"
        );
    }
}
