// Lineup slots and position eligibility.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of slots in every lineup.
pub const LINEUP_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// Raw position tags
// ---------------------------------------------------------------------------

/// A basketball position tag as published on a slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionTag {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
}

impl PositionTag {
    /// Parse a single tag ("PG", "sg", " C ").
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PG" => Some(PositionTag::PointGuard),
            "SG" => Some(PositionTag::ShootingGuard),
            "SF" => Some(PositionTag::SmallForward),
            "PF" => Some(PositionTag::PowerForward),
            "C" => Some(PositionTag::Center),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            PositionTag::PointGuard => "PG",
            PositionTag::ShootingGuard => "SG",
            PositionTag::SmallForward => "SF",
            PositionTag::PowerForward => "PF",
            PositionTag::Center => "C",
        }
    }
}

impl fmt::Display for PositionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Parse raw tag strings into known position tags.
///
/// Each entry may hold one tag or several joined by `/` or `,` ("PG/SG").
/// Unknown tags are skipped and duplicates collapse, keeping first-seen order.
pub fn parse_tags<S: AsRef<str>>(raw: &[S]) -> Vec<PositionTag> {
    let mut tags = Vec::new();
    for entry in raw {
        for part in entry.as_ref().split(['/', ',']) {
            if let Some(tag) = PositionTag::from_str_pos(part) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
    }
    tags
}

// ---------------------------------------------------------------------------
// Lineup slots
// ---------------------------------------------------------------------------

/// The eight lineup slots, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotKind {
    #[serde(rename = "PG")]
    PointGuard,
    #[serde(rename = "SG")]
    ShootingGuard,
    #[serde(rename = "SF")]
    SmallForward,
    #[serde(rename = "PF")]
    PowerForward,
    #[serde(rename = "C")]
    Center,
    #[serde(rename = "G")]
    Guard,
    #[serde(rename = "F")]
    Forward,
    #[serde(rename = "UTIL")]
    Utility,
}

impl SlotKind {
    /// All slots in lineup order.
    pub const ALL: [SlotKind; LINEUP_SIZE] = [
        SlotKind::PointGuard,
        SlotKind::ShootingGuard,
        SlotKind::SmallForward,
        SlotKind::PowerForward,
        SlotKind::Center,
        SlotKind::Guard,
        SlotKind::Forward,
        SlotKind::Utility,
    ];

    /// Position of this slot within a lineup (0..8).
    pub fn index(&self) -> usize {
        match self {
            SlotKind::PointGuard => 0,
            SlotKind::ShootingGuard => 1,
            SlotKind::SmallForward => 2,
            SlotKind::PowerForward => 3,
            SlotKind::Center => 4,
            SlotKind::Guard => 5,
            SlotKind::Forward => 6,
            SlotKind::Utility => 7,
        }
    }

    /// Parse a slot abbreviation ("PG", "UTIL", ...).
    pub fn from_str_slot(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PG" => Some(SlotKind::PointGuard),
            "SG" => Some(SlotKind::ShootingGuard),
            "SF" => Some(SlotKind::SmallForward),
            "PF" => Some(SlotKind::PowerForward),
            "C" => Some(SlotKind::Center),
            "G" => Some(SlotKind::Guard),
            "F" => Some(SlotKind::Forward),
            "UTIL" => Some(SlotKind::Utility),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            SlotKind::PointGuard => "PG",
            SlotKind::ShootingGuard => "SG",
            SlotKind::SmallForward => "SF",
            SlotKind::PowerForward => "PF",
            SlotKind::Center => "C",
            SlotKind::Guard => "G",
            SlotKind::Forward => "F",
            SlotKind::Utility => "UTIL",
        }
    }

    /// Long-form name used in human-readable failure reasons.
    pub fn label(&self) -> &'static str {
        match self {
            SlotKind::PointGuard => "Point Guard",
            SlotKind::ShootingGuard => "Shooting Guard",
            SlotKind::SmallForward => "Small Forward",
            SlotKind::PowerForward => "Power Forward",
            SlotKind::Center => "Center",
            SlotKind::Guard => "Guard",
            SlotKind::Forward => "Forward",
            SlotKind::Utility => "Utility",
        }
    }

    /// Whether a player carrying `tag` may fill this slot.
    pub fn accepts(&self, tag: PositionTag) -> bool {
        match self {
            SlotKind::PointGuard => tag == PositionTag::PointGuard,
            SlotKind::ShootingGuard => tag == PositionTag::ShootingGuard,
            SlotKind::SmallForward => tag == PositionTag::SmallForward,
            SlotKind::PowerForward => tag == PositionTag::PowerForward,
            SlotKind::Center => tag == PositionTag::Center,
            SlotKind::Guard => {
                matches!(tag, PositionTag::PointGuard | PositionTag::ShootingGuard)
            }
            SlotKind::Forward => {
                matches!(tag, PositionTag::SmallForward | PositionTag::PowerForward)
            }
            SlotKind::Utility => true,
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Slot sets
// ---------------------------------------------------------------------------

/// A set of lineup slots stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotSet(u8);

impl SlotSet {
    pub const fn empty() -> Self {
        SlotSet(0)
    }

    pub fn insert(&mut self, slot: SlotKind) {
        self.0 |= 1 << slot.index();
    }

    pub fn contains(&self, slot: SlotKind) -> bool {
        self.0 & (1 << slot.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Slots in lineup order.
    pub fn iter(&self) -> impl Iterator<Item = SlotKind> + '_ {
        SlotKind::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl FromIterator<SlotKind> for SlotSet {
    fn from_iter<I: IntoIterator<Item = SlotKind>>(iter: I) -> Self {
        let mut set = SlotSet::empty();
        for slot in iter {
            set.insert(slot);
        }
        set
    }
}

/// Resolve which slots a player with the given raw tags may occupy.
///
/// A player with no recognized tag gets an empty set: unplaceable, not an error.
pub fn eligible_slots<S: AsRef<str>>(raw: &[S]) -> SlotSet {
    let tags = parse_tags(raw);
    SlotKind::ALL
        .into_iter()
        .filter(|slot| tags.iter().any(|&tag| slot.accepts(tag)))
        .collect()
}
