//! Completion-streak calculation.
//!
//! A streak is a run of consecutive calendar dates with a completion record.
//! The statistics are recomputed on demand from the full progress
//! collection; there is no stored counter to drift out of sync.
//!
//! Adjacency is calendar-day arithmetic (`NaiveDate::succ_opt`), so runs
//! survive month and year boundaries. The evaluation instant is an explicit
//! `today` argument, which keeps the function pure and the tests
//! deterministic.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::model::{DayProgress, StreakInfo};

/// Compute streak statistics from an unordered progress collection.
///
/// Duplicate dates are deduplicated defensively; the storage layer already
/// guarantees at most one record per date.
///
/// `current_streak` is the length of the run ending at the most recent
/// completion, but only while that completion is today or yesterday
/// relative to `today`. A lapsed streak reports 0 even though
/// `longest_streak` still remembers the history.
pub fn calculate_streak(progress: &[DayProgress], today: NaiveDate) -> StreakInfo {
    let dates: BTreeSet<NaiveDate> = progress.iter().map(|p| p.date).collect();

    let Some(&last_completed) = dates.iter().next_back() else {
        return StreakInfo {
            current_streak: 0,
            longest_streak: 0,
            last_completed_date: None,
            streak_active: false,
        };
    };

    let mut longest = 1u32;
    let mut run = 1u32;
    let mut previous: Option<NaiveDate> = None;
    for &date in &dates {
        if let Some(prev) = previous {
            if prev.succ_opt() == Some(date) {
                run += 1;
            } else {
                run = 1;
            }
            longest = longest.max(run);
        }
        previous = Some(date);
    }

    // The iteration above ends on the latest date, so `run` is the length
    // of the run that finishes at `last_completed`.
    let streak_active =
        last_completed == today || Some(last_completed) == today.pred_opt();

    StreakInfo {
        current_streak: if streak_active { run } else { 0 },
        longest_streak: longest,
        last_completed_date: Some(last_completed),
        streak_active,
    }
}
