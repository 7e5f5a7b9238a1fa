//! HTTP API handlers for Mealsmith.
//!
//! Every route except `/health` is bearer-authenticated; all stored data is
//! keyed by the resolved user identity. Handlers follow one shape: resolve
//! the user, validate input before any write, delegate the actual work to
//! the pure core modules, persist the result, log the outcome.
//!
//! Collaborator degradation rules:
//!
//! - no auth client configured → the bearer token itself is the user id
//!   (local development and tests)
//! - no planner configured → `POST /plans/generate` answers 503
//! - no translator configured → translation requests return the original
//!   English text; they never fail

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::{Json, Router, routing::get, routing::patch, routing::post, routing::put};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::AuthClient;
use crate::error::{ApiError, ScheduleError};
use crate::model::{
    Badge, DayProgress, MealPlan, MealPortionAdjustment, MealPreference, MealPrepPlan,
    ScheduledDay, ShoppingList, ShoppingListItem, StreakInfo, UserProfile,
};
use crate::planner::PlannerClient;
use crate::shopping::ConsolidationConfig;
use crate::storage::Storage;
use crate::translation::{Language, TranslationCache, TranslationClient};
use crate::{aggregation, export, schedule, shopping, streak, translation};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub auth: Option<AuthClient>,
    pub planner: Option<PlannerClient>,
    pub translator: Option<TranslationClient>,
    pub translation_cache: Arc<TranslationCache>,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/profile",
            get(get_profile).put(put_profile).delete(delete_profile),
        )
        .route(
            "/plans/current",
            get(get_current_plan)
                .put(put_current_plan)
                .delete(delete_current_plan),
        )
        .route("/plans", get(list_saved_plans).post(save_current_plan))
        .route("/plans/:plan_id", axum::routing::delete(delete_saved_plan))
        .route("/plans/generate", post(generate_plan))
        .route("/plans/current/schedule", put(put_schedule))
        .route("/schedule", get(get_schedule))
        .route("/schedule/:day_number", put(put_schedule_day))
        .route("/schedule/copy-week", post(copy_week))
        .route("/progress", get(get_progress))
        .route(
            "/progress/:date",
            put(put_progress_date).delete(delete_progress_date),
        )
        .route("/streak", get(get_streak))
        .route("/plans/current/shopping-list", get(get_shopping_list))
        .route(
            "/plans/current/shopping-list/:ingredient_id",
            patch(patch_shopping_item),
        )
        .route("/plans/current/shopping-list/share", get(get_share_text))
        .route(
            "/plans/current/shopping-list/share/links",
            get(get_share_links),
        )
        .route(
            "/plans/current/shopping-list/document",
            get(get_shopping_document),
        )
        .route("/plans/current/translate", post(translate_current_plan))
        .route("/preferences", get(list_preferences).put(put_preference))
        .route(
            "/preferences/:meal_id",
            axum::routing::delete(delete_preference),
        )
        .route("/portions", get(list_portions).put(put_portion))
        .route("/portions/:meal_id", axum::routing::delete(delete_portion))
        .route("/badges", get(list_badges).put(put_badge))
        .route("/plans/current/prep", get(get_prep_plan).put(put_prep_plan))
        .route("/health", get(health_check))
        .with_state(state)
}

/// The identity and raw token of an authenticated request.
struct AuthedUser {
    user_id: String,
    token: String,
}

/// Resolve the request's bearer token to a user identity.
///
/// With an auth client configured the token is verified upstream; without
/// one (development, tests) the token itself is the user id. Either way an
/// absent or rejected token is a 401; there is no anonymous data.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthedUser, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let user_id = match &state.auth {
        Some(client) => client
            .resolve_user(token)
            .await
            .map_err(ApiError::Collaborator)?
            .ok_or(ApiError::Unauthorized)?,
        None => token.to_string(),
    };

    Ok(AuthedUser {
        user_id,
        token: token.to_string(),
    })
}

// ============================================================================
// Profile
// ============================================================================

#[instrument(skip(state, headers))]
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let profile = state
        .storage
        .get_profile(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("profile"))?;
    Ok(Json(profile))
}

#[instrument(skip(state, headers, profile))]
pub async fn put_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    profile.validate()?;
    state.storage.upsert_profile(&user.user_id, &profile).await?;
    info!(
        budget_eur = profile.budget_eur,
        days = profile.meal_plan_days,
        "Profile saved"
    );
    Ok(Json(profile))
}

#[instrument(skip(state, headers))]
pub async fn delete_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;
    state.storage.delete_profile(&user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Meal plans
// ============================================================================

#[instrument(skip(state, headers))]
pub async fn get_current_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MealPlan>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let plan = state
        .storage
        .get_current_plan(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;
    Ok(Json(plan))
}

/// Accept a plan as the user's current plan.
///
/// The plan is structurally validated, its rollups are recomputed from the
/// leaf data and re-verified, and its owner is forced to the authenticated
/// user before anything is written.
#[instrument(skip(state, headers, plan))]
pub async fn put_current_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut plan): Json<MealPlan>,
) -> Result<Json<MealPlan>, ApiError> {
    let user = authenticate(&state, &headers).await?;

    plan.validate_structure()?;
    aggregation::recompute(&mut plan);
    aggregation::verify_rollups(&plan)?;
    plan.user_id = user.user_id.clone();

    state.storage.set_current_plan(&user.user_id, &plan).await?;
    info!(
        plan_id = %plan.plan_id,
        days = plan.metadata.days,
        cost_eur = plan.metadata.period_cost_eur,
        over_budget = plan.metadata.is_over_budget,
        "Current plan saved"
    );
    Ok(Json(plan))
}

#[instrument(skip(state, headers))]
pub async fn delete_current_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;
    state.storage.clear_current_plan(&user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, headers))]
pub async fn list_saved_plans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MealPlan>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let plans = state.storage.list_saved_plans(&user.user_id).await?;
    Ok(Json(plans))
}

/// Save the current plan into the library.
#[instrument(skip(state, headers))]
pub async fn save_current_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<MealPlan>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let plan = state
        .storage
        .get_current_plan(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;

    state.storage.save_plan(&user.user_id, &plan).await?;
    info!(plan_id = %plan.plan_id, "Plan saved to library");
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(state, headers))]
pub async fn delete_saved_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(plan_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let removed = state.storage.delete_saved_plan(&user.user_id, &plan_id).await?;
    if !removed {
        return Err(ApiError::NotFound("saved meal plan"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Ask the hosted generator for a fresh plan and make it current.
#[instrument(skip(state, headers))]
pub async fn generate_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MealPlan>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let planner = state
        .planner
        .as_ref()
        .ok_or(ApiError::Unconfigured("meal plan generator"))?;

    let mut plan = planner
        .generate_plan(&user.token)
        .await
        .map_err(ApiError::Collaborator)?;

    // A structurally broken plan is the generator's fault, not the user's.
    if let Err(e) = plan.validate_structure() {
        return Err(ApiError::Collaborator(anyhow::anyhow!(
            "generator returned an invalid plan: {e}"
        )));
    }
    aggregation::recompute(&mut plan);
    plan.user_id = user.user_id.clone();

    state.storage.set_current_plan(&user.user_id, &plan).await?;
    info!(
        plan_id = %plan.plan_id,
        days = plan.metadata.days,
        attempts = plan.metadata.generation_attempts,
        "Generated plan saved as current"
    );
    Ok(Json(plan))
}

// ============================================================================
// Scheduling
// ============================================================================

/// Request body for PUT /plans/current/schedule.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    /// Calendar date for day number 1.
    pub start_date: NaiveDate,
}

#[instrument(skip(state, headers))]
pub async fn put_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<Vec<ScheduledDay>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let mut plan = state
        .storage
        .get_current_plan(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;

    let scheduled = schedule::assign_start_date(&plan, request.start_date);

    // One logical update: the stored schedule and the plan's day dates move
    // together.
    state
        .storage
        .replace_scheduled_days(&user.user_id, &scheduled)
        .await?;
    for day in &mut plan.days {
        day.date = scheduled
            .iter()
            .find(|s| s.day_number == day.day_number)
            .map(|s| s.date);
    }
    state.storage.set_current_plan(&user.user_id, &plan).await?;

    info!(
        start_date = %request.start_date,
        days = scheduled.len(),
        "Plan scheduled"
    );
    Ok(Json(scheduled))
}

#[instrument(skip(state, headers))]
pub async fn get_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ScheduledDay>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let days = state.storage.list_scheduled_days(&user.user_id).await?;
    Ok(Json(days))
}

/// Request body for PUT /schedule/{day_number}.
#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub date: NaiveDate,
}

#[instrument(skip(state, headers))]
pub async fn put_schedule_day(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(day_number): Path<u32>,
    Json(request): Json<ReassignRequest>,
) -> Result<Json<ScheduledDay>, ApiError> {
    let user = authenticate(&state, &headers).await?;

    let scheduled = state.storage.list_scheduled_days(&user.user_id).await?;
    let completed: HashSet<NaiveDate> = state
        .storage
        .list_day_progress(&user.user_id)
        .await?
        .iter()
        .map(|p| p.date)
        .collect();

    let moved = schedule::reassign_day(&scheduled, &completed, day_number, request.date)?;
    state.storage.upsert_scheduled_day(&user.user_id, &moved).await?;

    // Mirror the new date onto the plan itself when one is loaded.
    if let Some(mut plan) = state.storage.get_current_plan(&user.user_id).await? {
        if let Some(day) = plan.days.iter_mut().find(|d| d.day_number == day_number) {
            day.date = Some(moved.date);
            state.storage.set_current_plan(&user.user_id, &plan).await?;
        }
    }

    info!(day_number, date = %moved.date, "Scheduled day moved");
    Ok(Json(moved))
}

/// Request body for POST /schedule/copy-week.
#[derive(Debug, Deserialize)]
pub struct CopyWeekRequest {
    /// First date of the completed source week.
    pub source_start: NaiveDate,

    /// Date the copied week should start on.
    pub target_start: NaiveDate,
}

#[instrument(skip(state, headers))]
pub async fn copy_week(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CopyWeekRequest>,
) -> Result<(StatusCode, Json<Vec<DayProgress>>), ApiError> {
    let user = authenticate(&state, &headers).await?;

    let progress = state.storage.list_day_progress(&user.user_id).await?;
    let scheduled = state.storage.list_scheduled_days(&user.user_id).await?;

    let mut occupied: HashSet<NaiveDate> = progress.iter().map(|p| p.date).collect();
    occupied.extend(scheduled.iter().map(|s| s.date));

    let copies = schedule::copy_week(
        &progress,
        request.source_start,
        request.target_start,
        &occupied,
    )?;

    // Collision checking is complete by now; these writes cannot half-fail
    // validation.
    for copy in &copies {
        state.storage.upsert_day_progress(&user.user_id, copy).await?;
    }

    info!(
        source_start = %request.source_start,
        target_start = %request.target_start,
        days = copies.len(),
        "Week copied"
    );
    Ok((StatusCode::CREATED, Json(copies)))
}

// ============================================================================
// Progress & streaks
// ============================================================================

#[instrument(skip(state, headers))]
pub async fn get_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<DayProgress>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let progress = state.storage.list_day_progress(&user.user_id).await?;
    Ok(Json(progress))
}

/// Mark the day scheduled on `date` as completed.
///
/// Freezes a snapshot of the plan day's meals and totals. Re-completing an
/// already completed date overwrites with an identical record, observably
/// a no-op.
#[instrument(skip(state, headers))]
pub async fn put_progress_date(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayProgress>, ApiError> {
    let user = authenticate(&state, &headers).await?;

    let scheduled = state.storage.list_scheduled_days(&user.user_id).await?;
    let day_number = scheduled
        .iter()
        .find(|s| s.date == date)
        .map(|s| s.day_number)
        .ok_or(ApiError::NotFound("scheduled day for that date"))?;

    let plan = state
        .storage
        .get_current_plan(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;
    let day = plan
        .days
        .iter()
        .find(|d| d.day_number == day_number)
        .ok_or_else(|| ApiError::Conflict(ScheduleError::UnknownDay(day_number)))?;

    let snapshot = schedule::complete_day(day, date);
    state.storage.upsert_day_progress(&user.user_id, &snapshot).await?;

    info!(%date, day_number, meals = snapshot.meals_count, "Day completed");
    Ok(Json(snapshot))
}

/// Unmark a completed day. Deleting an absent record is a no-op.
#[instrument(skip(state, headers))]
pub async fn delete_progress_date(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(date): Path<NaiveDate>,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let removed = state.storage.delete_day_progress(&user.user_id, date).await?;
    if removed {
        info!(%date, "Day completion removed");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, headers))]
pub async fn get_streak(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StreakInfo>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let progress = state.storage.list_day_progress(&user.user_id).await?;
    let info = streak::calculate_streak(&progress, Utc::now().date_naive());
    Ok(Json(info))
}

// ============================================================================
// Shopping list
// ============================================================================

/// Derive the current plan's shopping list.
///
/// Consolidates the plan, then merges `owned`/`deleted` flags from any
/// previously persisted list so regeneration never drops user edits, and
/// persists the merged result.
#[instrument(skip(state, headers))]
pub async fn get_shopping_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ShoppingList>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let plan = state
        .storage
        .get_current_plan(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;

    let mut list = shopping::consolidate(&plan, &ConsolidationConfig::default(), Utc::now());
    if let Some(previous) = state
        .storage
        .get_shopping_list(&user.user_id, &plan.plan_id)
        .await?
    {
        shopping::merge_user_flags(&mut list, &previous);
    }
    state.storage.upsert_shopping_list(&user.user_id, &list).await?;

    info!(
        plan_id = %plan.plan_id,
        items = list.summary.total_items,
        waste_eur = list.summary.waste_cost_eur,
        "Shopping list generated"
    );
    Ok(Json(list))
}

/// Request body for PATCH /plans/current/shopping-list/{ingredient_id}.
#[derive(Debug, Deserialize)]
pub struct ShoppingItemPatch {
    pub owned: Option<bool>,
    pub deleted: Option<bool>,
}

#[instrument(skip(state, headers))]
pub async fn patch_shopping_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ingredient_id): Path<String>,
    Json(patch): Json<ShoppingItemPatch>,
) -> Result<Json<ShoppingListItem>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let plan = state
        .storage
        .get_current_plan(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;
    let mut list = state
        .storage
        .get_shopping_list(&user.user_id, &plan.plan_id)
        .await?
        .ok_or(ApiError::NotFound("shopping list"))?;

    let item = list
        .items
        .iter_mut()
        .find(|item| item.ingredient_id == ingredient_id)
        .ok_or(ApiError::NotFound("shopping list item"))?;
    if let Some(owned) = patch.owned {
        item.owned = owned;
    }
    if let Some(deleted) = patch.deleted {
        item.deleted = deleted;
    }
    let updated = item.clone();

    state.storage.upsert_shopping_list(&user.user_id, &list).await?;
    Ok(Json(updated))
}

/// Query parameters for the share-text endpoint.
#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    /// Skip items the user already owns (default: true).
    #[serde(default = "default_only_unowned")]
    pub only_unowned: bool,
}

fn default_only_unowned() -> bool {
    true
}

async fn load_persisted_list(
    state: &AppState,
    user_id: &str,
) -> Result<ShoppingList, ApiError> {
    let plan = state
        .storage
        .get_current_plan(user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;
    state
        .storage
        .get_shopping_list(user_id, &plan.plan_id)
        .await?
        .ok_or(ApiError::NotFound("shopping list"))
}

#[instrument(skip(state, headers))]
pub async fn get_share_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ShareQuery>,
) -> Result<String, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let list = load_persisted_list(&state, &user.user_id).await?;
    Ok(export::share_text(&list, query.only_unowned))
}

/// Share URLs for the rendered text.
#[derive(Debug, Serialize)]
pub struct ShareLinks {
    pub whatsapp_url: String,
    pub email_url: String,
}

#[instrument(skip(state, headers))]
pub async fn get_share_links(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ShareQuery>,
) -> Result<Json<ShareLinks>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let list = load_persisted_list(&state, &user.user_id).await?;
    let text = export::share_text(&list, query.only_unowned);
    Ok(Json(ShareLinks {
        whatsapp_url: export::whatsapp_share_url(&text),
        email_url: export::email_share_url("Shopping List from Mealsmith", &text),
    }))
}

#[instrument(skip(state, headers))]
pub async fn get_shopping_document(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<String, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let list = load_persisted_list(&state, &user.user_id).await?;
    Ok(export::document_text(&list))
}

// ============================================================================
// Translation
// ============================================================================

/// Request body for POST /plans/current/translate.
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    /// Two-letter target language code ("de", "fr", ...).
    pub target_language: String,
}

/// Return the current plan with display text translated.
///
/// Collaborator failures degrade to untranslated text; this endpoint only
/// errors when there is no plan or the language code is unknown.
#[instrument(skip(state, headers))]
pub async fn translate_current_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<MealPlan>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let target = Language::from_code(&request.target_language).ok_or_else(|| {
        crate::error::ValidationError::UnknownLanguage(request.target_language.clone())
    })?;

    let plan = state
        .storage
        .get_current_plan(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;

    let translated = translation::translate_meal_plan(
        state.translator.as_ref(),
        &state.translation_cache,
        &plan,
        target,
    )
    .await;

    info!(
        plan_id = %plan.plan_id,
        language = request.target_language,
        cached_entries = state.translation_cache.len(),
        "Plan translated"
    );
    Ok(Json(translated))
}

// ============================================================================
// Preferences, portions, badges, prep plans
// ============================================================================

#[instrument(skip(state, headers))]
pub async fn list_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MealPreference>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let preferences = state.storage.list_meal_preferences(&user.user_id).await?;
    Ok(Json(preferences))
}

#[instrument(skip(state, headers, preference))]
pub async fn put_preference(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(preference): Json<MealPreference>,
) -> Result<Json<MealPreference>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    state
        .storage
        .upsert_meal_preference(&user.user_id, &preference)
        .await?;
    info!(meal_id = %preference.meal_id, liked = preference.liked, "Meal rated");
    Ok(Json(preference))
}

#[instrument(skip(state, headers))]
pub async fn delete_preference(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(meal_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let removed = state
        .storage
        .delete_meal_preference(&user.user_id, &meal_id)
        .await?;
    if !removed {
        return Err(ApiError::NotFound("meal preference"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, headers))]
pub async fn list_portions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MealPortionAdjustment>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let adjustments = state.storage.list_portion_adjustments(&user.user_id).await?;
    Ok(Json(adjustments))
}

#[instrument(skip(state, headers, adjustment))]
pub async fn put_portion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(adjustment): Json<MealPortionAdjustment>,
) -> Result<Json<MealPortionAdjustment>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    adjustment.validate()?;
    state
        .storage
        .upsert_portion_adjustment(&user.user_id, &adjustment)
        .await?;
    Ok(Json(adjustment))
}

#[instrument(skip(state, headers))]
pub async fn delete_portion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(meal_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let removed = state
        .storage
        .delete_portion_adjustment(&user.user_id, &meal_id)
        .await?;
    if !removed {
        return Err(ApiError::NotFound("portion adjustment"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, headers))]
pub async fn list_badges(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Badge>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let badges = state.storage.list_badges(&user.user_id).await?;
    Ok(Json(badges))
}

#[instrument(skip(state, headers, badge))]
pub async fn put_badge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(badge): Json<Badge>,
) -> Result<Json<Badge>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    state.storage.upsert_badge(&user.user_id, &badge).await?;
    info!(badge_id = %badge.badge_id, "Badge stored");
    Ok(Json(badge))
}

#[instrument(skip(state, headers))]
pub async fn get_prep_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MealPrepPlan>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let plan = state
        .storage
        .get_current_plan(&user.user_id)
        .await?
        .ok_or(ApiError::NotFound("current meal plan"))?;
    let prep = state
        .storage
        .get_prep_plan(&user.user_id, &plan.plan_id)
        .await?
        .ok_or(ApiError::NotFound("meal prep plan"))?;
    Ok(Json(prep))
}

#[instrument(skip(state, headers, prep))]
pub async fn put_prep_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(prep): Json<MealPrepPlan>,
) -> Result<Json<MealPrepPlan>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    state.storage.upsert_prep_plan(&user.user_id, &prep).await?;
    Ok(Json(prep))
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
