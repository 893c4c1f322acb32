//! Day slot grid.
//!
//! A day is an ordered list of 30-minute anchor instants inside the working
//! hours, plus an occupancy vector. Slot `i` covers
//! `[slots[i], slots[i] + 30min)`.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::SLOT_MINUTES;

/// Occupant id marking a slot blocked by a pre-existing plan item. Never
/// released by placement or local improvement.
pub const BLOCKED: i64 = -1;

/// Build the anchor instants for one day: 30-minute steps starting at
/// `start_hour:00`, strictly before `end_hour:00`. Empty when
/// `end_hour <= start_hour`.
pub fn build_day_slots(day: NaiveDate, start_hour: u32, end_hour: u32) -> Vec<NaiveDateTime> {
    let Some(start) = day.and_hms_opt(start_hour, 0, 0) else {
        return Vec::new();
    };
    let Some(end) = day.and_hms_opt(end_hour, 0, 0) else {
        return Vec::new();
    };
    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        slots.push(current);
        current += Duration::minutes(SLOT_MINUTES);
    }
    slots
}

/// Map a preferred-time tag to a half-open slot-index window against the
/// configured working hours. The window may be empty (lo >= hi) when the
/// working day does not reach that part of the day.
pub fn preferred_window(
    preferred_time: &str,
    n_slots: usize,
    start_hour: u32,
    end_hour: u32,
) -> (usize, usize) {
    let hour_to_idx = |hour: i64| -> usize {
        let minutes = (hour - start_hour as i64) * 60;
        (minutes / SLOT_MINUTES).max(0) as usize
    };

    let morning_end = (end_hour as i64).min(12);
    let afternoon_start = (start_hour as i64).max(12);
    let afternoon_end = (end_hour as i64).min(18);
    let evening_start = (start_hour as i64).max(18);

    match preferred_time {
        "morning" => (0, hour_to_idx(morning_end)),
        "afternoon" => (hour_to_idx(afternoon_start), hour_to_idx(afternoon_end)),
        "evening" => (hour_to_idx(evening_start), n_slots),
        _ => (0, n_slots),
    }
}

/// A day's slot anchors plus its occupancy map.
#[derive(Debug, Clone)]
pub struct DayGrid {
    pub slots: Vec<NaiveDateTime>,
    pub occupied: Vec<Option<i64>>,
}

impl DayGrid {
    pub fn new(day: NaiveDate, start_hour: u32, end_hour: u32) -> Self {
        let slots = build_day_slots(day, start_hour, end_hour);
        let occupied = vec![None; slots.len()];
        DayGrid { slots, occupied }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Block every slot overlapping one of the given `[start, end)` intervals.
    pub fn block_intervals(&mut self, intervals: &[(NaiveDateTime, NaiveDateTime)]) {
        if self.slots.is_empty() {
            return;
        }
        let day_start = self.slots[0];
        let day_end = *self.slots.last().unwrap() + Duration::minutes(SLOT_MINUTES);
        for &(start, end) in intervals {
            if end <= day_start || start >= day_end {
                continue;
            }
            for (idx, &slot_start) in self.slots.iter().enumerate() {
                let slot_end = slot_start + Duration::minutes(SLOT_MINUTES);
                if slot_start < end && slot_end > start {
                    self.occupied[idx] = Some(BLOCKED);
                }
            }
        }
    }

    pub fn is_free_range(&self, start_idx: usize, end_idx: usize) -> bool {
        self.occupied[start_idx..end_idx].iter().all(Option::is_none)
    }

    pub fn claim(&mut self, start_idx: usize, end_idx: usize, task_id: i64) {
        for slot in &mut self.occupied[start_idx..end_idx] {
            *slot = Some(task_id);
        }
    }

    pub fn release(&mut self, task_id: i64) {
        for slot in &mut self.occupied {
            if *slot == Some(task_id) {
                *slot = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    #[test]
    fn builds_half_open_slot_range() {
        let slots = build_day_slots(day(), 8, 10);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0], day().and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(slots[3], day().and_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn inverted_hours_yield_no_slots() {
        assert!(build_day_slots(day(), 18, 8).is_empty());
        assert!(build_day_slots(day(), 9, 9).is_empty());
    }

    #[test]
    fn preferred_windows_follow_working_hours() {
        // 08:00-22:00 is 28 slots.
        let n = 28;
        assert_eq!(preferred_window("morning", n, 8, 22), (0, 8));
        assert_eq!(preferred_window("afternoon", n, 8, 22), (8, 20));
        assert_eq!(preferred_window("evening", n, 8, 22), (20, 28));
        assert_eq!(preferred_window("anytime", n, 8, 22), (0, 28));
    }

    #[test]
    fn morning_window_collapses_for_afternoon_only_hours() {
        // 13:00-17:00: mornings are unreachable.
        let n = 8;
        let (lo, hi) = preferred_window("morning", n, 13, 17);
        assert!(hi <= lo);
    }

    #[test]
    fn blocking_intervals_marks_overlapping_slots() {
        let mut grid = DayGrid::new(day(), 8, 12);
        let start = day().and_hms_opt(9, 15, 0).unwrap();
        let end = day().and_hms_opt(10, 0, 0).unwrap();
        grid.block_intervals(&[(start, end)]);

        // 09:00 and 09:30 slots overlap [09:15, 10:00); 08:00, 08:30, and
        // 10:00+ do not.
        assert_eq!(grid.occupied[0], None);
        assert_eq!(grid.occupied[1], None);
        assert_eq!(grid.occupied[2], Some(BLOCKED));
        assert_eq!(grid.occupied[3], Some(BLOCKED));
        assert_eq!(grid.occupied[4], None);
    }

    #[test]
    fn claim_and_release_round_trip() {
        let mut grid = DayGrid::new(day(), 8, 10);
        grid.claim(1, 3, 42);
        assert!(!grid.is_free_range(0, 2));
        assert!(grid.is_free_range(3, 4));
        grid.release(42);
        assert!(grid.is_free_range(0, 4));
    }
}
