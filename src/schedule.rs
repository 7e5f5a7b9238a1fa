//! Plan scheduling and completion mutations.
//!
//! A freshly generated plan has numbered days but no calendar dates.
//! Choosing a start date binds every day number at once
//! (`date = start + day_number - 1`); afterwards individual days can be
//! moved, completed weeks can be copied forward, and days can be marked
//! complete, which freezes a [`DayProgress`] snapshot.
//!
//! All functions here are pure: they take the current schedule/progress
//! state and return the records to persist, or a [`ScheduleError`] when a
//! date collision would occur. A refused operation produces nothing to
//! persist, so there is no partial mutation to roll back.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

use crate::aggregation;
use crate::error::ScheduleError;
use crate::model::{Day, DayProgress, MealPlan, ScheduledDay};

/// Bind every day of a plan to a calendar date, starting at `start_date`.
///
/// Returns the full scheduled-day set; the caller persists it as one
/// logical replacement; no partially scheduled plan is ever observable.
pub fn assign_start_date(plan: &MealPlan, start_date: NaiveDate) -> Vec<ScheduledDay> {
    plan.days
        .iter()
        .map(|day| ScheduledDay {
            day_number: day.day_number,
            date: start_date + Duration::days(i64::from(day.day_number) - 1),
        })
        .collect()
}

/// Move a single scheduled day to a new date.
///
/// The target date must not be used by any other scheduled day nor by a
/// completed day; collisions are refused as a validation error rather than
/// silently overwritten.
pub fn reassign_day(
    scheduled: &[ScheduledDay],
    completed_dates: &HashSet<NaiveDate>,
    day_number: u32,
    new_date: NaiveDate,
) -> Result<ScheduledDay, ScheduleError> {
    if !scheduled.iter().any(|s| s.day_number == day_number) {
        return Err(ScheduleError::UnknownDay(day_number));
    }

    let taken_by_other = scheduled
        .iter()
        .any(|s| s.day_number != day_number && s.date == new_date);
    if taken_by_other || completed_dates.contains(&new_date) {
        return Err(ScheduleError::DateTaken(new_date));
    }

    Ok(ScheduledDay {
        day_number,
        date: new_date,
    })
}

/// Copy a completed week of progress records onto a new start date.
///
/// Each source record keeps its offset within the week, so the Nth source
/// date lands on `target_start + (N - 1)`. The copy is all-or-nothing: if
/// any target date is already scheduled or completed the whole operation is
/// refused and nothing is produced.
pub fn copy_week(
    source: &[DayProgress],
    source_start: NaiveDate,
    target_start: NaiveDate,
    occupied: &HashSet<NaiveDate>,
) -> Result<Vec<DayProgress>, ScheduleError> {
    let source_end = source_start + Duration::days(6);

    let mut week: Vec<&DayProgress> = source
        .iter()
        .filter(|p| p.date >= source_start && p.date <= source_end)
        .collect();
    week.sort_by_key(|p| p.date);

    if week.is_empty() {
        return Err(ScheduleError::EmptySourceWeek);
    }

    // Validate every target date before producing anything.
    let mut copies = Vec::with_capacity(week.len());
    for progress in week {
        let offset = progress.date - source_start;
        let target_date = target_start + offset;
        if occupied.contains(&target_date) {
            return Err(ScheduleError::DateTaken(target_date));
        }
        let mut copy = progress.clone();
        copy.date = target_date;
        copies.push(copy);
    }

    Ok(copies)
}

/// Freeze a completion snapshot for a plan day.
///
/// The snapshot owns clones of the day's meals and its recomputed totals;
/// later plan edits or regenerations leave it untouched. Marking an already
/// completed date again simply produces an identical record (the storage
/// layer upserts by date), and unmarking deletes it. Both are idempotent.
pub fn complete_day(day: &Day, date: NaiveDate) -> DayProgress {
    let totals = aggregation::day_totals(&day.meals);
    DayProgress {
        date,
        completed_meals: day.meals.clone(),
        total_nutrition: totals.nutrition,
        total_cost_eur: totals.cost_eur,
        meals_count: day.meals.len() as u32,
    }
}
