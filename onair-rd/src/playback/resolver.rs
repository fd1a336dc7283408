//! Schedule resolver
//!
//! Pure function of (current time, full schedule) to on-air state. No side
//! effects, no I/O; recomputed on every controller tick. The schedule is
//! expected in start-time ascending order, as published by the repository.

use onair_common::ScheduleEntry;
use serde::Serialize;

/// Resolver output for one instant. Recomputed every tick, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedState {
    /// The entry whose interval contains "now", if any
    pub on_air: Option<ScheduleEntry>,

    /// Seconds elapsed since the on-air entry's start; 0 when nothing is
    /// on-air. Always in `[0, duration_seconds)` when `on_air` is present.
    pub offset_seconds: u32,

    /// True iff an entry is on-air
    pub is_live: bool,

    /// The chronologically earliest entry starting after "now"
    pub next: Option<ScheduleEntry>,

    /// All entries whose end is still in the future, start-time ascending
    pub visible: Vec<ScheduleEntry>,
}

/// Resolve the on-air state at `now` against an ascending-ordered schedule.
///
/// On-air selection takes the first entry (in collection order) whose
/// half-open interval `[start, start + duration)` contains `now`. If the
/// repository holds overlapping entries the first match wins; that is a
/// deterministic tie-break, not a correctness guarantee — overlap is
/// rejected at write time.
pub fn resolve(now: i64, schedule: &[ScheduleEntry]) -> ResolvedState {
    let on_air = schedule.iter().find(|e| e.covers(now)).cloned();

    let offset_seconds = on_air
        .as_ref()
        .map(|e| u32::try_from(now - e.start_time).unwrap_or(0))
        .unwrap_or(0);

    let next = schedule.iter().find(|e| e.start_time > now).cloned();

    let visible: Vec<ScheduleEntry> = schedule
        .iter()
        .filter(|e| !e.has_ended(now))
        .cloned()
        .collect();

    ResolvedState {
        is_live: on_air.is_some(),
        on_air,
        offset_seconds,
        next,
        visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(id: u128, start: i64, duration: u32) -> ScheduleEntry {
        ScheduleEntry {
            id: Uuid::from_u128(id),
            title: format!("show-{}", id),
            artist: "Preacher".to_string(),
            audio_url: format!("https://archive.org/show-{}.mp3", id),
            start_time: start,
            duration_seconds: duration,
        }
    }

    #[test]
    fn test_on_air_at_start_instant() {
        // Scenario A: offset 0 at the entry's first second
        let schedule = vec![entry(1, 1000, 600)];
        let state = resolve(1000, &schedule);

        assert_eq!(state.on_air.as_ref().unwrap().id, Uuid::from_u128(1));
        assert_eq!(state.offset_seconds, 0);
        assert!(state.is_live);
    }

    #[test]
    fn test_on_air_mid_show_offset() {
        // Scenario B: joining mid-show hears the wall-clock offset
        let schedule = vec![entry(1, 1000, 600)];
        let state = resolve(1599, &schedule);

        assert_eq!(state.on_air.as_ref().unwrap().id, Uuid::from_u128(1));
        assert_eq!(state.offset_seconds, 599);
        assert!(state.is_live);
    }

    #[test]
    fn test_end_instant_is_excluded() {
        // Scenario C: the interval is half-open; the end second is off-air
        let schedule = vec![entry(1, 1000, 600)];
        let state = resolve(1600, &schedule);

        assert!(state.on_air.is_none());
        assert!(!state.is_live);
        assert_eq!(state.offset_seconds, 0);
        assert!(state.next.is_none());
        assert!(state.visible.is_empty());
    }

    #[test]
    fn test_empty_schedule() {
        // Scenario D: empty input, empty output
        let state = resolve(123_456, &[]);
        assert_eq!(state, ResolvedState::default());
    }

    #[test]
    fn test_next_entry_is_earliest_future_start() {
        let schedule = vec![entry(1, 1000, 600), entry(2, 2000, 600), entry(3, 3000, 600)];

        let state = resolve(1100, &schedule);
        assert_eq!(state.on_air.as_ref().unwrap().id, Uuid::from_u128(1));
        assert_eq!(state.next.as_ref().unwrap().id, Uuid::from_u128(2));

        // Between shows: nothing on-air, next still resolves
        let state = resolve(1700, &schedule);
        assert!(state.on_air.is_none());
        assert_eq!(state.next.as_ref().unwrap().id, Uuid::from_u128(2));

        // After everything: schedule exhausted
        let state = resolve(9999, &schedule);
        assert!(state.next.is_none());
    }

    #[test]
    fn test_visible_keeps_order_and_drops_ended() {
        let schedule = vec![entry(1, 1000, 600), entry(2, 2000, 600), entry(3, 3000, 600)];

        let state = resolve(2100, &schedule);
        let ids: Vec<Uuid> = state.visible.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(2), Uuid::from_u128(3)]);
    }

    #[test]
    fn test_zero_duration_entry_never_on_air() {
        let schedule = vec![entry(1, 1000, 0)];

        assert!(!resolve(1000, &schedule).is_live);
        assert!(!resolve(999, &schedule).is_live);
        // Before its start it is still visible and upcoming
        assert_eq!(resolve(999, &schedule).next.as_ref().unwrap().id, Uuid::from_u128(1));
        // Once its start second passes it is invisible
        assert!(resolve(1000, &schedule).visible.is_empty());
    }

    #[test]
    fn test_overlap_tie_break_is_first_in_order() {
        // Overlap should be rejected at write time; if present anyway, the
        // first entry in collection order wins deterministically.
        let schedule = vec![entry(1, 1000, 700), entry(2, 1200, 600)];
        let state = resolve(1300, &schedule);
        assert_eq!(state.on_air.as_ref().unwrap().id, Uuid::from_u128(1));
    }

    #[test]
    fn test_resolve_is_pure() {
        let schedule = vec![entry(1, 1000, 600), entry(2, 2000, 600)];
        assert_eq!(resolve(1500, &schedule), resolve(1500, &schedule));
    }

    #[test]
    fn test_offset_stays_in_bounds_across_interval() {
        let schedule = vec![entry(1, 1000, 600)];
        for now in 1000..1600 {
            let state = resolve(now, &schedule);
            let e = state.on_air.as_ref().expect("on-air across interval");
            assert!(state.offset_seconds < e.duration_seconds);
            assert_eq!(i64::from(state.offset_seconds), now - e.start_time);
        }
    }

    #[test]
    fn test_visibility_is_monotonic() {
        // Entries only leave the visible set as time advances
        let schedule = vec![entry(1, 1000, 600), entry(2, 2000, 600), entry(3, 3000, 600)];

        let mut previous = resolve(0, &schedule).visible;
        for now in [500, 1000, 1599, 1600, 2600, 3600, 9000] {
            let current = resolve(now, &schedule).visible;
            for e in &current {
                assert!(previous.contains(e), "entry reappeared at t={}", now);
            }
            previous = current;
        }
        assert!(previous.is_empty());
    }
}
