// Position groups used to scope report-card populations.

use serde::{Deserialize, Serialize};
use std::fmt;

const GOALKEEPER_POSITIONS: &[&str] = &["Goalkeeper"];

const DEFENDER_POSITIONS: &[&str] = &[
    "Right Back",
    "Right Center Back",
    "Center Back",
    "Left Center Back",
    "Left Back",
];

const MIDFIELDER_POSITIONS: &[&str] = &[
    "Right Defensive Midfield",
    "Center Defensive Midfield",
    "Left Defensive Midfield",
    "Right Midfield",
    "Right Center Midfield",
    "Center Midfield",
    "Left Center Midfield",
    "Left Midfield",
    "Right Attacking Midfield",
    "Center Attacking Midfield",
    "Left Attacking Midfield",
    "Secondary Striker",
];

const FORWARD_POSITIONS: &[&str] =
    &["Right Center Forward", "Center Forward", "Left Center Forward"];

/// A closed set of named positions. Membership is an exact string match on
/// the event's `position`; nothing is inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionGroup {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl PositionGroup {
    pub const ALL: [PositionGroup; 4] = [
        PositionGroup::Goalkeeper,
        PositionGroup::Defender,
        PositionGroup::Midfielder,
        PositionGroup::Forward,
    ];

    pub fn positions(&self) -> &'static [&'static str] {
        match self {
            PositionGroup::Goalkeeper => GOALKEEPER_POSITIONS,
            PositionGroup::Defender => DEFENDER_POSITIONS,
            PositionGroup::Midfielder => MIDFIELDER_POSITIONS,
            PositionGroup::Forward => FORWARD_POSITIONS,
        }
    }

    pub fn contains(&self, position: &str) -> bool {
        self.positions().contains(&position)
    }

    /// The group a position belongs to, if any.
    pub fn of(position: &str) -> Option<PositionGroup> {
        Self::ALL.into_iter().find(|g| g.contains(position))
    }

    /// Parse a group name, case-insensitively, accepting common short forms.
    pub fn from_str_group(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "goalkeeper" | "gk" | "keeper" => Some(PositionGroup::Goalkeeper),
            "defender" | "def" | "df" => Some(PositionGroup::Defender),
            "midfielder" | "mid" | "mf" => Some(PositionGroup::Midfielder),
            "forward" | "fwd" | "fw" | "attacker" => Some(PositionGroup::Forward),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PositionGroup::Goalkeeper => "Goalkeeper",
            PositionGroup::Defender => "Defender",
            PositionGroup::Midfielder => "Midfielder",
            PositionGroup::Forward => "Forward",
        }
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
