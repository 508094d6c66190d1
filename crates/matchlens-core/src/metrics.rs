// Report-card metric definitions per position group.

use crate::model::{Event, EventType};
use crate::positions::PositionGroup;

/// What a metric counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricKind {
    /// Events of one type.
    Count(EventType),
    /// Shots whose outcome is `Goal`.
    Goals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    pub label: &'static str,
    pub kind: MetricKind,
}

impl MetricDefinition {
    pub fn count(label: &'static str, event_type: EventType) -> Self {
        MetricDefinition {
            label,
            kind: MetricKind::Count(event_type),
        }
    }

    pub fn goals(label: &'static str) -> Self {
        MetricDefinition {
            label,
            kind: MetricKind::Goals,
        }
    }

    /// Whether an event contributes one to this metric.
    pub fn counts(&self, event: &Event) -> bool {
        match &self.kind {
            MetricKind::Count(t) => event.event_type == *t,
            MetricKind::Goals => event.is_goal(),
        }
    }
}

/// Ordered metric list shown on a group's report card.
pub fn metrics_for(group: PositionGroup) -> Vec<MetricDefinition> {
    use EventType::*;
    match group {
        PositionGroup::Goalkeeper => vec![
            MetricDefinition::count("Goalkeeper Actions", GoalKeeper),
            MetricDefinition::count("Passes", Pass),
            MetricDefinition::count("Clearances", Clearance),
            MetricDefinition::count("Ball Recoveries", BallRecovery),
        ],
        PositionGroup::Defender => vec![
            MetricDefinition::count("Duels", Duel),
            MetricDefinition::count("Interceptions", Interception),
            MetricDefinition::count("Clearances", Clearance),
            MetricDefinition::count("Blocks", Block),
            MetricDefinition::count("Ball Recoveries", BallRecovery),
            MetricDefinition::count("Pressures", Pressure),
            MetricDefinition::count("Passes", Pass),
        ],
        PositionGroup::Midfielder => vec![
            MetricDefinition::count("Passes", Pass),
            MetricDefinition::count("Carries", Carry),
            MetricDefinition::count("Dribbles", Dribble),
            MetricDefinition::count("Pressures", Pressure),
            MetricDefinition::count("Ball Recoveries", BallRecovery),
            MetricDefinition::count("Interceptions", Interception),
            MetricDefinition::count("Shots", Shot),
        ],
        PositionGroup::Forward => vec![
            MetricDefinition::count("Shots", Shot),
            MetricDefinition::goals("Goal"),
            MetricDefinition::count("Dribbles", Dribble),
            MetricDefinition::count("Carries", Carry),
            MetricDefinition::count("Passes", Pass),
            MetricDefinition::count("Pressures", Pressure),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_metric_only_counts_scoring_shots() {
        let goal = MetricDefinition::goals("Goal");
        let mut shot = Event::new(1, "A", EventType::Shot);
        shot.shot_outcome = Some("Saved".into());
        assert!(!goal.counts(&shot));
        shot.shot_outcome = Some("Goal".into());
        assert!(goal.counts(&shot));

        let mut own_goal = Event::new(1, "A", EventType::Other("Own Goal For".into()));
        own_goal.shot_outcome = Some("Goal".into());
        assert!(!goal.counts(&own_goal));
    }

    #[test]
    fn every_group_has_metrics_with_unique_labels() {
        for group in PositionGroup::ALL {
            let metrics = metrics_for(group);
            assert!(!metrics.is_empty());
            let mut labels: Vec<_> = metrics.iter().map(|m| m.label).collect();
            labels.sort();
            labels.dedup();
            assert_eq!(labels.len(), metrics.len(), "{group}");
        }
    }

    #[test]
    fn forward_card_has_goal_metric() {
        let metrics = metrics_for(PositionGroup::Forward);
        assert_eq!(metrics[1].kind, MetricKind::Goals);
    }
}
