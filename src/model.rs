//! Domain types for Mealsmith.
//!
//! Everything the service persists or returns is defined here: the user
//! profile, generated meal plans with their nutrition/cost rollups, derived
//! shopping lists, scheduling records and completion snapshots.
//!
//! # Conventions
//!
//! - Calendar dates are `chrono::NaiveDate`; a plan day is bound to a date
//!   at scheduling time, not generation time.
//! - Timestamps (`generated_at`, `rated_at`, ...) are `DateTime<Utc>`.
//! - Money is euros as `f64`; nutrition is kcal and grams as `f64`.
//! - Field names match the persisted wire format (`quantity_g`, `cost_eur`,
//!   `carbohydrates_g`, ...), so stored payloads round-trip unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Hard limit on plan length, inclusive.
pub const MAX_PLAN_DAYS: u32 = 14;

/// The period a budget amount refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
}

/// Slot of a meal within a day. At most one of each per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

/// Biological sex, as used by the Mifflin-St Jeor formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Self-reported activity tier. Each maps to a fixed TDEE multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

/// The user's dietary objective. Each maps to a fixed calorie offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    LoseWeight,
    Maintain,
    GainMuscle,
}

/// The biometric inputs needed to derive a calorie target.
///
/// Either these or a manual `target_calories` must be present on a profile;
/// the invariant is enforced by [`UserProfile::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biometrics {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub sex: Sex,
    pub activity_level: ActivityLevel,
    pub objective: Objective,
}

/// Onboarding output: budget, preferences and calorie targeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Budget amount for one `budget_period`.
    pub budget_eur: f64,

    /// Whether `budget_eur` covers a day or a week.
    pub budget_period: BudgetPeriod,

    /// Dietary tags such as "Vegetarian" or "Gluten-Free".
    #[serde(default)]
    pub dietary_preferences: Vec<String>,

    /// Allergen tags. Plans must never include these.
    #[serde(default)]
    pub allergens: Vec<String>,

    /// Cuisine tags such as "Italian" or "Mediterranean".
    #[serde(default)]
    pub cuisine_preferences: Vec<String>,

    /// Requested plan length in days (1..=14).
    pub meal_plan_days: u32,

    /// Meals generated per day.
    #[serde(default = "default_meals_per_day")]
    pub meals_per_day: u32,

    /// Manually entered daily calorie target. When absent the target is
    /// derived from `biometrics`.
    #[serde(default)]
    pub target_calories: Option<u32>,

    /// Biometric inputs for a derived target.
    #[serde(default)]
    pub biometrics: Option<Biometrics>,
}

fn default_meals_per_day() -> u32 {
    3
}

impl UserProfile {
    /// Validate onboarding input before anything is persisted.
    ///
    /// Enforces: positive budget, plan length within 1..=14, and that a
    /// calorie target is obtainable: manually entered, or derivable from a
    /// complete biometrics block.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.budget_eur <= 0.0 {
            return Err(ValidationError::NonPositiveBudget(self.budget_eur));
        }
        if self.meal_plan_days == 0 || self.meal_plan_days > MAX_PLAN_DAYS {
            return Err(ValidationError::DaysOutOfRange(self.meal_plan_days));
        }
        if self.target_calories.is_none() && self.biometrics.is_none() {
            return Err(ValidationError::MissingCalorieTarget);
        }
        Ok(())
    }

    /// The daily calorie target: the manual entry wins, otherwise derived
    /// from biometrics. `validate` guarantees one of the two exists.
    pub fn resolved_target_calories(&self) -> Option<u32> {
        self.target_calories.or_else(|| {
            self.biometrics
                .as_ref()
                .map(crate::calories::calculate_target_calories)
        })
    }
}

/// Macronutrient block shared by ingredients, meals and rollups.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein_g: f64,
    pub carbohydrates_g: f64,
    pub fats_g: f64,
}

impl Nutrition {
    /// Accumulate another block into this one.
    pub fn add(&mut self, other: &Nutrition) {
        self.calories += other.calories;
        self.protein_g += other.protein_g;
        self.carbohydrates_g += other.carbohydrates_g;
        self.fats_g += other.fats_g;
    }
}

/// One purchasable ingredient inside a meal.
///
/// Ingredients are owned by their meal; aggregations (shopping lists)
/// reference them by `ingredient_id` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub ingredient_id: String,
    pub name: String,
    pub quantity_g: f64,
    pub nutrition: Nutrition,
    pub cost_eur: f64,
}

/// Cost block of a meal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MealCost {
    pub meal_cost_eur: f64,
}

/// A single recipe slot within a plan day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_id: String,
    pub meal_type: MealType,
    pub recipe_name: String,
    pub nutrition: Nutrition,
    pub cost: MealCost,
    pub ingredients: Vec<Ingredient>,
    /// Step-by-step instructions; optional in older stored plans.
    #[serde(default)]
    pub cooking_instructions: Vec<String>,
}

/// Day-level rollup: nutrition plus cost.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DayTotals {
    #[serde(flatten)]
    pub nutrition: Nutrition,
    pub cost_eur: f64,
}

/// One numbered slot in a plan.
///
/// `date` stays `None` until the plan is scheduled; scheduling binds every
/// day number to `start_date + (day_number - 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    /// 1-based position, unique within the plan.
    pub day_number: u32,

    /// Calendar date assigned at scheduling time.
    #[serde(default)]
    pub date: Option<NaiveDate>,

    pub meals: Vec<Meal>,

    /// Rollup of this day's meals. Maintained by
    /// [`crate::aggregation::recompute`].
    #[serde(default)]
    pub totals: DayTotals,
}

/// Plan-level rollup.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanTotals {
    #[serde(flatten)]
    pub nutrition: Nutrition,
    pub total_cost_eur: f64,
}

/// Budget/cost bookkeeping attached to a generated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    /// Budget for the plan's period, copied from the profile at generation.
    pub period_budget_eur: f64,

    /// Total computed cost of the plan.
    pub period_cost_eur: f64,

    /// `period_budget_eur - period_cost_eur`; negative when over budget.
    pub budget_remaining_eur: f64,

    pub is_over_budget: bool,

    /// How many attempts the generator needed to fit the budget.
    pub generation_attempts: u32,

    /// Number of days; always equals `days.len()` of the owning plan.
    pub days: u32,
}

/// A generated multi-day meal plan with nutrition/cost rollups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub plan_id: String,
    pub generated_at: DateTime<Utc>,
    pub user_id: String,
    pub metadata: PlanMetadata,
    pub days: Vec<Day>,
    #[serde(default)]
    pub plan_totals: PlanTotals,
}

impl MealPlan {
    /// Structural validation of an incoming plan.
    ///
    /// Checks day-number uniqueness and sequence, per-day meal-type
    /// uniqueness, and that no nutrition or cost figure is negative.
    /// Rollup consistency is checked separately by
    /// [`crate::aggregation::verify_rollups`] after a recompute.
    pub fn validate_structure(&self) -> Result<(), ValidationError> {
        if self.days.is_empty() {
            return Err(ValidationError::EmptyPlan);
        }
        if self.days.len() as u32 > MAX_PLAN_DAYS {
            return Err(ValidationError::DaysOutOfRange(self.days.len() as u32));
        }

        let mut seen_days = std::collections::HashSet::new();
        for day in &self.days {
            if day.day_number == 0
                || day.day_number > self.days.len() as u32
                || !seen_days.insert(day.day_number)
            {
                return Err(ValidationError::BadDayNumber(day.day_number));
            }

            let mut seen_types = std::collections::HashSet::new();
            for meal in &day.meals {
                if !seen_types.insert(meal.meal_type) {
                    return Err(ValidationError::DuplicateMealType {
                        day_number: day.day_number,
                        meal_type: meal.meal_type.label().to_lowercase(),
                    });
                }
                meal.validate()?;
            }
        }
        Ok(())
    }
}

impl Meal {
    fn validate(&self) -> Result<(), ValidationError> {
        let context = || format!("meal '{}'", self.recipe_name);
        for (field, value) in [
            ("calories", self.nutrition.calories),
            ("protein_g", self.nutrition.protein_g),
            ("carbohydrates_g", self.nutrition.carbohydrates_g),
            ("fats_g", self.nutrition.fats_g),
            ("meal_cost_eur", self.cost.meal_cost_eur),
        ] {
            if value < 0.0 {
                return Err(ValidationError::NegativeValue {
                    field,
                    context: context(),
                });
            }
        }
        for ingredient in &self.ingredients {
            if ingredient.quantity_g < 0.0 || ingredient.cost_eur < 0.0 {
                return Err(ValidationError::NegativeValue {
                    field: "quantity_g/cost_eur",
                    context: format!("ingredient '{}'", ingredient.name),
                });
            }
        }
        Ok(())
    }
}

/// The binding of a plan day (by number) to a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDay {
    pub day_number: u32,
    pub date: NaiveDate,
}

/// Frozen record of a day the user actually completed.
///
/// The meal list and totals are snapshots taken at completion time and stay
/// unchanged even if the plan is edited or regenerated afterwards. At most
/// one record exists per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub completed_meals: Vec<Meal>,
    pub total_nutrition: Nutrition,
    pub total_cost_eur: f64,
    pub meals_count: u32,
}

/// Derived streak statistics. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakInfo {
    /// Length of the run ending today/yesterday; 0 when the streak lapsed.
    pub current_streak: u32,

    /// Longest run ever observed.
    pub longest_streak: u32,

    pub last_completed_date: Option<NaiveDate>,

    /// True iff the last completion was today or yesterday.
    pub streak_active: bool,
}

/// A like/dislike rating for a generated meal. Re-rating overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPreference {
    pub meal_id: String,
    pub recipe_name: String,
    pub meal_type: MealType,
    #[serde(default)]
    pub ingredient_names: Vec<String>,
    pub liked: bool,
    pub rated_at: DateTime<Utc>,
}

/// A per-meal portion multiplier chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPortionAdjustment {
    pub meal_id: String,
    pub multiplier: f64,
    pub adjusted_at: DateTime<Utc>,
}

impl MealPortionAdjustment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.multiplier <= 0.0 {
            return Err(ValidationError::NonPositiveMultiplier(self.multiplier));
        }
        Ok(())
    }
}

/// An achievement earned by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub badge_id: String,
    pub name: String,
    pub earned_at: DateTime<Utc>,
}

/// Meal-prep companion plan. Owned by the prep feature; stored and returned
/// verbatim, never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPrepPlan {
    pub plan_id: String,
    pub generated_at: DateTime<Utc>,
    pub content: serde_json::Value,
}

// ============================================================================
// Shopping list
// ============================================================================

/// One consolidated purchasable line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    /// Identity of the underlying ingredient; unique within a list.
    pub ingredient_id: String,

    pub display_name: String,

    /// Aggregated quantity across the whole plan, rounded **up** to the
    /// purchase granularity. Never less than the raw summed quantity.
    pub total_quantity: f64,

    /// Unit of `total_quantity` (grams).
    pub unit: String,

    /// Informational store floor; not enforced on `total_quantity`.
    pub minimum_purchase_quantity: f64,

    pub estimated_price_eur: f64,

    /// User already has this at home.
    #[serde(default)]
    pub owned: bool,

    /// User removed this from the list.
    #[serde(default)]
    pub deleted: bool,
}

/// Cost summary of a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingSummary {
    pub total_items: u32,

    /// Sum of item prices after purchase-unit rounding.
    pub total_shopping_cost_eur: f64,

    /// The plan's own total cost.
    pub plan_cost_eur: f64,

    /// `max(0, total_shopping_cost_eur - plan_cost_eur)`: the overhead
    /// introduced by rounding quantities up to purchase units.
    pub waste_cost_eur: f64,
}

/// The deduplicated, purchase-unit-rounded ingredient list for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub plan_id: String,
    pub generated_at: DateTime<Utc>,
    pub items: Vec<ShoppingListItem>,
    pub summary: ShoppingSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_profile() -> UserProfile {
        UserProfile {
            budget_eur: 50.0,
            budget_period: BudgetPeriod::Weekly,
            dietary_preferences: vec!["Vegetarian".to_string()],
            allergens: vec![],
            cuisine_preferences: vec!["Italian".to_string()],
            meal_plan_days: 7,
            meals_per_day: 3,
            target_calories: Some(2000),
            biometrics: None,
        }
    }

    #[test]
    fn test_profile_valid() {
        assert!(base_profile().validate().is_ok());
    }

    #[test]
    fn test_profile_rejects_non_positive_budget() {
        let mut profile = base_profile();
        profile.budget_eur = 0.0;
        assert_eq!(
            profile.validate(),
            Err(ValidationError::NonPositiveBudget(0.0))
        );
    }

    #[test]
    fn test_profile_rejects_out_of_range_days() {
        let mut profile = base_profile();
        profile.meal_plan_days = 15;
        assert_eq!(profile.validate(), Err(ValidationError::DaysOutOfRange(15)));

        profile.meal_plan_days = 0;
        assert_eq!(profile.validate(), Err(ValidationError::DaysOutOfRange(0)));
    }

    #[test]
    fn test_profile_requires_target_or_biometrics() {
        let mut profile = base_profile();
        profile.target_calories = None;
        assert_eq!(
            profile.validate(),
            Err(ValidationError::MissingCalorieTarget)
        );

        profile.biometrics = Some(Biometrics {
            weight_kg: 70.0,
            height_cm: 175.0,
            age: 30,
            sex: Sex::Male,
            activity_level: ActivityLevel::Moderate,
            objective: Objective::Maintain,
        });
        assert!(profile.validate().is_ok());
        // Derived target kicks in when no manual value exists.
        assert_eq!(profile.resolved_target_calories(), Some(2594));
    }

    #[test]
    fn test_manual_calories_win_over_biometrics() {
        let mut profile = base_profile();
        profile.biometrics = Some(Biometrics {
            weight_kg: 70.0,
            height_cm: 175.0,
            age: 30,
            sex: Sex::Male,
            activity_level: ActivityLevel::Moderate,
            objective: Objective::Maintain,
        });
        assert_eq!(profile.resolved_target_calories(), Some(2000));
    }

    #[test]
    fn test_plan_rejects_duplicate_meal_type() {
        let meal = |meal_type| Meal {
            meal_id: "m1".to_string(),
            meal_type,
            recipe_name: "Test".to_string(),
            nutrition: Nutrition::default(),
            cost: MealCost::default(),
            ingredients: vec![],
            cooking_instructions: vec![],
        };

        let plan = MealPlan {
            plan_id: "p1".to_string(),
            generated_at: Utc::now(),
            user_id: "u1".to_string(),
            metadata: PlanMetadata {
                period_budget_eur: 50.0,
                period_cost_eur: 0.0,
                budget_remaining_eur: 50.0,
                is_over_budget: false,
                generation_attempts: 1,
                days: 1,
            },
            days: vec![Day {
                day_number: 1,
                date: None,
                meals: vec![meal(MealType::Breakfast), meal(MealType::Breakfast)],
                totals: DayTotals::default(),
            }],
            plan_totals: PlanTotals::default(),
        };

        assert!(matches!(
            plan.validate_structure(),
            Err(ValidationError::DuplicateMealType { day_number: 1, .. })
        ));
    }

    #[test]
    fn test_plan_rejects_duplicate_day_numbers() {
        let day = |n| Day {
            day_number: n,
            date: None,
            meals: vec![],
            totals: DayTotals::default(),
        };
        let plan = MealPlan {
            plan_id: "p1".to_string(),
            generated_at: Utc::now(),
            user_id: "u1".to_string(),
            metadata: PlanMetadata {
                period_budget_eur: 50.0,
                period_cost_eur: 0.0,
                budget_remaining_eur: 50.0,
                is_over_budget: false,
                generation_attempts: 1,
                days: 2,
            },
            days: vec![day(1), day(1)],
            plan_totals: PlanTotals::default(),
        };
        assert_eq!(
            plan.validate_structure(),
            Err(ValidationError::BadDayNumber(1))
        );
    }

    #[test]
    fn test_date_serializes_as_plain_day() {
        let scheduled = ScheduledDay {
            day_number: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        };
        let json = serde_json::to_string(&scheduled).unwrap();
        assert!(json.contains("\"2024-03-05\""));
    }
}
