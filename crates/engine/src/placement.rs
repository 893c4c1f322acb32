//! Slot placement: feasibility, multi-term cost, and best-slot search.

use std::hash::{Hash, Hasher};

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::slots::DayGrid;

/// Exploration stays off once personalization is this strong.
const EXPLORATION_STRENGTH_CUTOFF: f64 = 0.4;
const EXPLORATION_PROBABILITY: f64 = 0.10;
const EXPLORATION_POOL: usize = 3;

/// Per-task placement parameters, fixed for the whole slot search.
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub required_slots: usize,
    pub latest_end: NaiveDateTime,
    pub preferred_window: (usize, usize),
    pub energy: String,
    pub duration_minutes: i64,
    pub hours_until_deadline: f64,
}

/// Deterministic RNG seed for one planning request: same date and profile,
/// same exploration decisions.
pub fn placement_seed(plan_date: NaiveDate, user_profile: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    plan_date.to_string().hash(&mut hasher);
    user_profile.hash(&mut hasher);
    hasher.finish()
}

/// A start index is feasible when the task fits inside the day, ends before
/// `latest_end`, and every covered slot is free.
pub fn can_place(grid: &DayGrid, start_idx: usize, req: &SlotRequest) -> bool {
    let end_idx = start_idx + req.required_slots;
    if end_idx > grid.len() {
        return false;
    }
    if grid.slots[end_idx - 1] >= req.latest_end {
        return false;
    }
    grid.is_free_range(start_idx, end_idx)
}

fn fragmentation_penalty(occupied: &[Option<i64>], start_idx: usize, required_slots: usize) -> f64 {
    let n_slots = occupied.len();
    let end_idx = start_idx + required_slots;
    let mut penalty = 0.0;

    // A gap of exactly one free slot against an occupied neighbor is dead
    // time nothing else can use.
    let mut left_gap = 0usize;
    let mut i = start_idx as i64 - 1;
    while i >= 0 && occupied[i as usize].is_none() {
        left_gap += 1;
        i -= 1;
    }
    if left_gap == 1 && i >= 0 && occupied[i as usize].is_some() {
        penalty += 1.0;
    }

    let mut right_gap = 0usize;
    let mut j = end_idx;
    while j < n_slots && occupied[j].is_none() {
        right_gap += 1;
        j += 1;
    }
    if right_gap == 1 && j < n_slots && occupied[j].is_some() {
        penalty += 1.0;
    }

    penalty * 2.0
}

/// Cost of starting at `start_idx`; lower is better.
pub fn placement_cost(grid: &DayGrid, start_idx: usize, req: &SlotRequest) -> f64 {
    let (pref_lo, pref_hi) = req.preferred_window;
    let preferred_penalty = if pref_lo <= start_idx && start_idx < pref_hi {
        0.0
    } else {
        4.0
    };

    let end = grid.slots[start_idx] + Duration::minutes(req.duration_minutes);
    let slack_minutes = ((req.latest_end - end).num_seconds() as f64 / 60.0).max(0.0);
    let mut urgency_penalty = 0.0;
    if req.hours_until_deadline < 48.0 {
        let urgency_weight = (48.0 - req.hours_until_deadline) / 48.0;
        if slack_minutes < 240.0 {
            urgency_penalty = ((240.0 - slack_minutes) / 240.0) * 6.0 * urgency_weight;
        }
    }

    let start_hour = grid.slots[start_idx].hour();
    let energy_mismatch_penalty = if (req.energy == "high" && start_hour >= 17)
        || (req.energy == "low" && start_hour < 12)
    {
        2.0
    } else {
        0.0
    };

    let fragmentation = fragmentation_penalty(&grid.occupied, start_idx, req.required_slots);

    preferred_penalty + urgency_penalty + energy_mismatch_penalty + fragmentation
}

/// Find the lowest-cost feasible start index, or `None`.
///
/// Ties break toward the preferred-window center, away from the very first
/// slot, then toward the earlier index. While personalization is still weak
/// the search occasionally samples among the three cheapest candidates so
/// feedback has something to react to.
pub fn best_start_slot(
    grid: &DayGrid,
    req: &SlotRequest,
    feedback_strength: f64,
    rng: &mut StdRng,
) -> Option<usize> {
    let n_slots = grid.len();
    let max_start = n_slots.checked_sub(req.required_slots)?;

    let (pref_lo, pref_hi) = req.preferred_window;
    let pref_center = if pref_hi > pref_lo {
        (pref_lo + pref_hi - 1) as f64 / 2.0
    } else {
        (((n_slots as f64) - 1.0) / 2.0).max(0.0)
    };

    struct Candidate {
        cost: f64,
        center_distance: f64,
        early_start_penalty: u8,
        start_idx: usize,
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for start_idx in 0..=max_start {
        if !can_place(grid, start_idx, req) {
            continue;
        }
        let cost = placement_cost(grid, start_idx, req);
        candidates.push(Candidate {
            cost,
            center_distance: (start_idx as f64 - pref_center).abs(),
            early_start_penalty: u8::from(start_idx == 0),
            start_idx,
        });
    }

    if candidates.is_empty() {
        return None;
    }

    if feedback_strength < EXPLORATION_STRENGTH_CUTOFF
        && rng.gen_range(0.0..1.0) < EXPLORATION_PROBABILITY
    {
        let mut by_cost: Vec<(f64, usize)> =
            candidates.iter().map(|c| (c.cost, c.start_idx)).collect();
        by_cost.sort_by(|a, b| a.0.total_cmp(&b.0));
        let pool: Vec<usize> = by_cost
            .iter()
            .take(EXPLORATION_POOL)
            .map(|&(_, idx)| idx)
            .collect();
        return pool.choose(rng).copied();
    }

    candidates.sort_by(|a, b| {
        a.cost
            .total_cmp(&b.cost)
            .then(a.center_distance.total_cmp(&b.center_distance))
            .then(a.early_start_penalty.cmp(&b.early_start_penalty))
            .then(a.start_idx.cmp(&b.start_idx))
    });
    Some(candidates[0].start_idx)
}
