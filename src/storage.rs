//! SQLite storage layer for Mealsmith.
//!
//! Stands in for the hosted per-user data service the product consumes:
//! every aggregate (profile, plans, preferences, schedule, progress, badges,
//! shopping lists, prep plans) is stored whole as a JSON payload keyed by
//! user id, with get-by-user / upsert / delete-by-key operations and no
//! cross-aggregate transactions.
//!
//! Two invariants live in the schema itself:
//!
//! - `day_progress` has a `(user_id, date)` primary key: at most one
//!   completion record per date; saving the same date again overwrites.
//! - `meal_plans` carries `is_current`/`is_saved` flags so the single
//!   current plan and the saved library share one table.

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::{
    Badge, DayProgress, MealPlan, MealPortionAdjustment, MealPreference, MealPrepPlan,
    ScheduledDay, ShoppingList, UserProfile,
};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

fn encode<T: serde::Serialize>(value: &T, what: &'static str) -> anyhow::Result<String> {
    serde_json::to_string(value).with_context(|| format!("serializing {what}"))
}

fn decode<T: serde::de::DeserializeOwned>(data: &str, what: &'static str) -> anyhow::Result<T> {
    serde_json::from_str(data).with_context(|| format!("deserializing stored {what}"))
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:mealsmith.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// Create the database schema if it doesn't exist.
    async fn initialize_schema(&self) -> anyhow::Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                data TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS meal_plans (
                user_id TEXT NOT NULL,
                plan_id TEXT NOT NULL,
                is_current INTEGER NOT NULL DEFAULT 0,
                is_saved INTEGER NOT NULL DEFAULT 0,
                data TEXT NOT NULL,
                PRIMARY KEY (user_id, plan_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS meal_preferences (
                user_id TEXT NOT NULL,
                meal_id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (user_id, meal_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS portion_adjustments (
                user_id TEXT NOT NULL,
                meal_id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (user_id, meal_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS scheduled_days (
                user_id TEXT NOT NULL,
                day_number INTEGER NOT NULL,
                date TEXT NOT NULL,
                PRIMARY KEY (user_id, day_number)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS day_progress (
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (user_id, date)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS badges (
                user_id TEXT NOT NULL,
                badge_id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (user_id, badge_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS shopping_lists (
                user_id TEXT NOT NULL,
                plan_id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (user_id, plan_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS meal_prep_plans (
                user_id TEXT NOT NULL,
                plan_id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (user_id, plan_id)
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    pub async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT data FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| decode(r.get::<String, _>("data").as_str(), "profile"))
            .transpose()
    }

    pub async fn upsert_profile(&self, user_id: &str, profile: &UserProfile) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, data) VALUES (?, ?)
            ON CONFLICT (user_id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(user_id)
        .bind(encode(profile, "profile")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_profile(&self, user_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Meal plans (current + saved library)
    // ------------------------------------------------------------------

    pub async fn get_current_plan(&self, user_id: &str) -> anyhow::Result<Option<MealPlan>> {
        let row = sqlx::query("SELECT data FROM meal_plans WHERE user_id = ? AND is_current = 1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| decode(r.get::<String, _>("data").as_str(), "meal plan"))
            .transpose()
    }

    /// Make `plan` the user's single current plan.
    ///
    /// Any previous current plan keeps its row only if it was saved to the
    /// library; otherwise it is dropped.
    pub async fn set_current_plan(&self, user_id: &str, plan: &MealPlan) -> anyhow::Result<()> {
        sqlx::query(
            "DELETE FROM meal_plans WHERE user_id = ? AND is_current = 1 AND is_saved = 0 AND plan_id != ?",
        )
        .bind(user_id)
        .bind(&plan.plan_id)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE meal_plans SET is_current = 0 WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO meal_plans (user_id, plan_id, is_current, is_saved, data)
            VALUES (?, ?, 1, 0, ?)
            ON CONFLICT (user_id, plan_id)
            DO UPDATE SET data = excluded.data, is_current = 1
            "#,
        )
        .bind(user_id)
        .bind(&plan.plan_id)
        .bind(encode(plan, "meal plan")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop the current-plan marker; unsaved plans disappear entirely.
    pub async fn clear_current_plan(&self, user_id: &str) -> anyhow::Result<bool> {
        let deleted =
            sqlx::query("DELETE FROM meal_plans WHERE user_id = ? AND is_current = 1 AND is_saved = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        let demoted = sqlx::query("UPDATE meal_plans SET is_current = 0 WHERE user_id = ? AND is_current = 1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected() > 0 || demoted.rows_affected() > 0)
    }

    pub async fn list_saved_plans(&self, user_id: &str) -> anyhow::Result<Vec<MealPlan>> {
        let rows = sqlx::query(
            "SELECT data FROM meal_plans WHERE user_id = ? AND is_saved = 1 ORDER BY plan_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| decode(r.get::<String, _>("data").as_str(), "meal plan"))
            .collect()
    }

    /// Save a plan into the library, preserving its current-plan marker.
    pub async fn save_plan(&self, user_id: &str, plan: &MealPlan) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO meal_plans (user_id, plan_id, is_current, is_saved, data)
            VALUES (?, ?, 0, 1, ?)
            ON CONFLICT (user_id, plan_id)
            DO UPDATE SET data = excluded.data, is_saved = 1
            "#,
        )
        .bind(user_id)
        .bind(&plan.plan_id)
        .bind(encode(plan, "meal plan")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove a plan from the library. A plan that is also current stays on
    /// record with just its saved flag cleared.
    pub async fn delete_saved_plan(&self, user_id: &str, plan_id: &str) -> anyhow::Result<bool> {
        let demoted = sqlx::query(
            "UPDATE meal_plans SET is_saved = 0 WHERE user_id = ? AND plan_id = ? AND is_saved = 1 AND is_current = 1",
        )
        .bind(user_id)
        .bind(plan_id)
        .execute(&self.pool)
        .await?;

        let deleted = sqlx::query(
            "DELETE FROM meal_plans WHERE user_id = ? AND plan_id = ? AND is_saved = 1 AND is_current = 0",
        )
        .bind(user_id)
        .bind(plan_id)
        .execute(&self.pool)
        .await?;

        Ok(demoted.rows_affected() > 0 || deleted.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Meal preferences
    // ------------------------------------------------------------------

    pub async fn list_meal_preferences(&self, user_id: &str) -> anyhow::Result<Vec<MealPreference>> {
        let rows = sqlx::query("SELECT data FROM meal_preferences WHERE user_id = ? ORDER BY meal_id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| decode(r.get::<String, _>("data").as_str(), "meal preference"))
            .collect()
    }

    /// One active preference per meal: re-rating overwrites.
    pub async fn upsert_meal_preference(
        &self,
        user_id: &str,
        preference: &MealPreference,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO meal_preferences (user_id, meal_id, data) VALUES (?, ?, ?)
            ON CONFLICT (user_id, meal_id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(user_id)
        .bind(&preference.meal_id)
        .bind(encode(preference, "meal preference")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_meal_preference(&self, user_id: &str, meal_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM meal_preferences WHERE user_id = ? AND meal_id = ?")
            .bind(user_id)
            .bind(meal_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Portion adjustments
    // ------------------------------------------------------------------

    pub async fn list_portion_adjustments(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Vec<MealPortionAdjustment>> {
        let rows =
            sqlx::query("SELECT data FROM portion_adjustments WHERE user_id = ? ORDER BY meal_id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|r| decode(r.get::<String, _>("data").as_str(), "portion adjustment"))
            .collect()
    }

    pub async fn upsert_portion_adjustment(
        &self,
        user_id: &str,
        adjustment: &MealPortionAdjustment,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO portion_adjustments (user_id, meal_id, data) VALUES (?, ?, ?)
            ON CONFLICT (user_id, meal_id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(user_id)
        .bind(&adjustment.meal_id)
        .bind(encode(adjustment, "portion adjustment")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_portion_adjustment(
        &self,
        user_id: &str,
        meal_id: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM portion_adjustments WHERE user_id = ? AND meal_id = ?")
            .bind(user_id)
            .bind(meal_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Scheduled days
    // ------------------------------------------------------------------

    pub async fn list_scheduled_days(&self, user_id: &str) -> anyhow::Result<Vec<ScheduledDay>> {
        let rows = sqlx::query(
            "SELECT day_number, date FROM scheduled_days WHERE user_id = ? ORDER BY day_number",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let date: String = r.get("date");
                Ok(ScheduledDay {
                    day_number: r.get::<i64, _>("day_number") as u32,
                    date: date.parse().context("parsing stored schedule date")?,
                })
            })
            .collect()
    }

    /// Replace the whole schedule in one logical update, so assigning a start
    /// date never leaves a partially scheduled plan behind.
    pub async fn replace_scheduled_days(
        &self,
        user_id: &str,
        days: &[ScheduledDay],
    ) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM scheduled_days WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        for day in days {
            sqlx::query("INSERT INTO scheduled_days (user_id, day_number, date) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(i64::from(day.day_number))
                .bind(day.date.to_string())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn upsert_scheduled_day(
        &self,
        user_id: &str,
        day: &ScheduledDay,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scheduled_days (user_id, day_number, date) VALUES (?, ?, ?)
            ON CONFLICT (user_id, day_number) DO UPDATE SET date = excluded.date
            "#,
        )
        .bind(user_id)
        .bind(i64::from(day.day_number))
        .bind(day.date.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Day progress
    // ------------------------------------------------------------------

    pub async fn list_day_progress(&self, user_id: &str) -> anyhow::Result<Vec<DayProgress>> {
        let rows = sqlx::query("SELECT data FROM day_progress WHERE user_id = ? ORDER BY date")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| decode(r.get::<String, _>("data").as_str(), "day progress"))
            .collect()
    }

    /// Upsert keyed by date: completing an already-completed day overwrites
    /// the record instead of duplicating it.
    pub async fn upsert_day_progress(
        &self,
        user_id: &str,
        progress: &DayProgress,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO day_progress (user_id, date, data) VALUES (?, ?, ?)
            ON CONFLICT (user_id, date) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(user_id)
        .bind(progress.date.to_string())
        .bind(encode(progress, "day progress")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_day_progress(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM day_progress WHERE user_id = ? AND date = ?")
            .bind(user_id)
            .bind(date.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Badges
    // ------------------------------------------------------------------

    pub async fn list_badges(&self, user_id: &str) -> anyhow::Result<Vec<Badge>> {
        let rows = sqlx::query("SELECT data FROM badges WHERE user_id = ? ORDER BY badge_id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| decode(r.get::<String, _>("data").as_str(), "badge"))
            .collect()
    }

    pub async fn upsert_badge(&self, user_id: &str, badge: &Badge) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO badges (user_id, badge_id, data) VALUES (?, ?, ?)
            ON CONFLICT (user_id, badge_id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(user_id)
        .bind(&badge.badge_id)
        .bind(encode(badge, "badge")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shopping lists
    // ------------------------------------------------------------------

    pub async fn get_shopping_list(
        &self,
        user_id: &str,
        plan_id: &str,
    ) -> anyhow::Result<Option<ShoppingList>> {
        let row = sqlx::query("SELECT data FROM shopping_lists WHERE user_id = ? AND plan_id = ?")
            .bind(user_id)
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| decode(r.get::<String, _>("data").as_str(), "shopping list"))
            .transpose()
    }

    pub async fn upsert_shopping_list(
        &self,
        user_id: &str,
        list: &ShoppingList,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shopping_lists (user_id, plan_id, data) VALUES (?, ?, ?)
            ON CONFLICT (user_id, plan_id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(user_id)
        .bind(&list.plan_id)
        .bind(encode(list, "shopping list")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Meal-prep plans
    // ------------------------------------------------------------------

    pub async fn get_prep_plan(
        &self,
        user_id: &str,
        plan_id: &str,
    ) -> anyhow::Result<Option<MealPrepPlan>> {
        let row = sqlx::query("SELECT data FROM meal_prep_plans WHERE user_id = ? AND plan_id = ?")
            .bind(user_id)
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| decode(r.get::<String, _>("data").as_str(), "meal prep plan"))
            .transpose()
    }

    pub async fn upsert_prep_plan(&self, user_id: &str, plan: &MealPrepPlan) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO meal_prep_plans (user_id, plan_id, data) VALUES (?, ?, ?)
            ON CONFLICT (user_id, plan_id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(user_id)
        .bind(&plan.plan_id)
        .bind(encode(plan, "meal prep plan")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
