//! Error taxonomy for Mealsmith.
//!
//! Three failure families, per the product's error-handling design:
//!
//! - **Validation**: user input out of range. Surfaced as 422 before any
//!   state is mutated.
//! - **Conflict**: a scheduling consistency violation (date collision).
//!   Surfaced as 409; the operation is refused with no partial mutation.
//! - **Collaborator/storage failures**: caught at the call site and surfaced
//!   as 5xx. Translation is the exception: it degrades to identity output
//!   instead of erroring (see [`crate::translation`]).
//!
//! Nothing here is fatal: every failure path leaves previously persisted
//! state intact so the user can retry.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// User-input validation failures. Checked before any write.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Budget amounts must be strictly positive.
    #[error("budget must be greater than zero (got {0})")]
    NonPositiveBudget(f64),

    /// Plan length is limited to 1..=14 days.
    #[error("meal plan length must be between 1 and 14 days (got {0})")]
    DaysOutOfRange(u32),

    /// Without a manual calorie target, every biometric field is required
    /// to derive one.
    #[error("either a calorie target or complete biometrics (weight, height, age, sex, activity level, objective) are required")]
    MissingCalorieTarget,

    /// A plan must contain at least one day.
    #[error("meal plan has no days")]
    EmptyPlan,

    /// Day numbers are 1-based and unique within a plan.
    #[error("day number {0} is duplicated or out of sequence")]
    BadDayNumber(u32),

    /// No two meals of the same type within one day.
    #[error("day {day_number} has more than one {meal_type} meal")]
    DuplicateMealType { day_number: u32, meal_type: String },

    /// Nutrition and cost figures are never negative.
    #[error("negative {field} in {context}")]
    NegativeValue {
        field: &'static str,
        context: String,
    },

    /// Stored rollups disagree with the sum of their parts beyond tolerance.
    #[error("{field} rollup mismatch: stored {stored}, computed {computed}")]
    RollupMismatch {
        field: &'static str,
        stored: f64,
        computed: f64,
    },

    /// Portion multipliers must be strictly positive.
    #[error("portion multiplier must be greater than zero (got {0})")]
    NonPositiveMultiplier(f64),

    /// Unknown translation target language code.
    #[error("unsupported language code '{0}'")]
    UnknownLanguage(String),
}

/// Scheduling consistency violations. Refused whole, never partially applied.
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    /// The requested date already belongs to another scheduled or completed
    /// day in the plan.
    #[error("date {0} is already scheduled or completed")]
    DateTaken(NaiveDate),

    /// The plan has no day with the requested number.
    #[error("plan has no day number {0}")]
    UnknownDay(u32),

    /// Copy-week needs at least one source day to copy.
    #[error("no completed days found in the source week")]
    EmptySourceWeek,
}

/// Top-level error for the HTTP surface.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unresolvable bearer token.
    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] ScheduleError),

    /// Requested aggregate does not exist for this user.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// An external collaborator call failed.
    #[error("upstream service error")]
    Collaborator(#[source] anyhow::Error),

    /// The deployment has no client configured for this collaborator.
    #[error("{0} is not configured")]
    Unconfigured(&'static str),

    /// Persistence failure.
    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Collaborator(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unconfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures keep their detail in the log, not the body.
        match &self {
            ApiError::Storage(e) => warn!(error = %e, "storage failure"),
            ApiError::Collaborator(e) => warn!(error = %e, "collaborator failure"),
            _ => {}
        }

        let message = match &self {
            ApiError::Storage(_) => "internal storage error".to_string(),
            ApiError::Collaborator(_) => "upstream service error".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422() {
        let err = ApiError::Validation(ValidationError::NonPositiveBudget(-3.0));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let err = ApiError::Conflict(ScheduleError::DateTaken(date));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("2024-02-01"));
    }

    #[test]
    fn test_storage_detail_is_not_leaked() {
        let err = ApiError::Storage(anyhow::anyhow!("secret dsn"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
