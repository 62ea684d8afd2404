// Lineups and slot assignment.

use serde::{Deserialize, Serialize};

use crate::player::PlayerRecord;
use crate::slot::{SlotKind, SlotSet, LINEUP_SIZE};

/// One filled lineup slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupSlot {
    pub slot: SlotKind,
    pub player: PlayerRecord,
}

/// Aggregate statistics of a lineup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineupTotals {
    pub total_salary: u32,
    /// Cap minus total salary.
    pub remaining_salary: u32,
    pub projected_points: f64,
    pub total_floor: f64,
    pub total_ceiling: f64,
    pub avg_ownership: f64,
    pub total_leverage: f64,
    pub avg_volatility: f64,
    pub avg_boom_probability: f64,
    /// Objective value of the lineup under its mode (without jitter).
    pub total_utility: f64,
}

/// A complete eight-slot lineup, slots in lineup order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub slots: Vec<LineupSlot>,
    pub totals: LineupTotals,
}

impl Lineup {
    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.slots.iter().map(|s| &s.player)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players().any(|p| p.id == player_id)
    }

    /// The player in `slot`, if filled.
    pub fn player_in(&self, slot: SlotKind) -> Option<&PlayerRecord> {
        self.slots
            .iter()
            .find(|s| s.slot == slot)
            .map(|s| &s.player)
    }
}

// ---------------------------------------------------------------------------
// Slot matching
// ---------------------------------------------------------------------------

/// Result of matching players to slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMatching {
    /// For each slot (by `SlotKind::index`), the member occupying it.
    pub slot_owner: [Option<usize>; LINEUP_SIZE],
    /// For each member, the slot it was given.
    pub member_slot: Vec<Option<SlotKind>>,
}

impl SlotMatching {
    /// Every member received a slot.
    pub fn all_members_placed(&self) -> bool {
        self.member_slot.iter().all(Option::is_some)
    }

    /// Every slot received a member.
    pub fn all_slots_filled(&self) -> bool {
        self.slot_owner.iter().all(Option::is_some)
    }

    /// Slots left empty, in lineup order.
    pub fn open_slots(&self) -> Vec<SlotKind> {
        SlotKind::ALL
            .into_iter()
            .filter(|s| self.slot_owner[s.index()].is_none())
            .collect()
    }

    /// Members (by index) assigned to each slot, when every slot is filled.
    pub fn complete(&self) -> Option<[usize; LINEUP_SIZE]> {
        let mut out = [0usize; LINEUP_SIZE];
        for (i, owner) in self.slot_owner.iter().enumerate() {
            out[i] = (*owner)?;
        }
        Some(out)
    }
}

/// Maximum bipartite matching of members to slots.
///
/// Members are placed in order, each trying its eligible slots in the order
/// given by `preference` and displacing earlier members along augmenting paths
/// when needed. Deterministic for identical inputs.
pub fn match_slots(eligibility: &[SlotSet], preference: &[SlotKind]) -> SlotMatching {
    let mut slot_owner: [Option<usize>; LINEUP_SIZE] = [None; LINEUP_SIZE];
    for member in 0..eligibility.len() {
        let mut visited = [false; LINEUP_SIZE];
        augment(member, eligibility, preference, &mut slot_owner, &mut visited);
    }

    let mut member_slot = vec![None; eligibility.len()];
    for slot in SlotKind::ALL {
        if let Some(owner) = slot_owner[slot.index()] {
            member_slot[owner] = Some(slot);
        }
    }
    SlotMatching {
        slot_owner,
        member_slot,
    }
}

fn augment(
    member: usize,
    eligibility: &[SlotSet],
    preference: &[SlotKind],
    slot_owner: &mut [Option<usize>; LINEUP_SIZE],
    visited: &mut [bool; LINEUP_SIZE],
) -> bool {
    // An open slot is taken before anyone is displaced.
    for &slot in preference {
        if eligibility[member].contains(slot) && slot_owner[slot.index()].is_none() {
            slot_owner[slot.index()] = Some(member);
            return true;
        }
    }
    for &slot in preference {
        let s = slot.index();
        if !eligibility[member].contains(slot) || visited[s] {
            continue;
        }
        visited[s] = true;
        if let Some(other) = slot_owner[s] {
            if augment(other, eligibility, preference, slot_owner, visited) {
                slot_owner[s] = Some(member);
                return true;
            }
        }
    }
    false
}

/// Assign exactly eight players to the eight slots, if possible.
///
/// Returns, for each slot in lineup order, the index of the player in it.
pub fn assign_slots(eligibility: &[SlotSet]) -> Option<[usize; LINEUP_SIZE]> {
    if eligibility.len() != LINEUP_SIZE {
        return None;
    }
    match_slots(eligibility, &SlotKind::ALL).complete()
}
