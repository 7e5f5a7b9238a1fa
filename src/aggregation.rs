//! Nutrition and cost rollups for meal plans.
//!
//! Meals carry their own stored nutrition and cost; this module's job is the
//! upward rollup: day totals are the sum of their meals, plan totals the sum
//! of their days, and the plan's budget metadata is derived from the plan
//! total against the period budget.
//!
//! Everything here is pure and total: plain floating addition over the
//! plan tree, no failure modes. Consumers that ingest externally generated
//! plans call [`recompute`] followed by [`verify_rollups`] so that stored
//! rollups can never drift from the leaf data.

use crate::error::ValidationError;
use crate::model::{Day, DayTotals, Meal, MealPlan, PlanTotals};

/// Accumulated floating error allowed between stored and computed calories.
pub const CALORIE_TOLERANCE: f64 = 1.0;

/// Accumulated floating error allowed between stored and computed euros.
pub const COST_TOLERANCE: f64 = 0.01;

/// Roll a day's meals up into day-level totals.
pub fn day_totals(meals: &[Meal]) -> DayTotals {
    let mut totals = DayTotals::default();
    for meal in meals {
        totals.nutrition.add(&meal.nutrition);
        totals.cost_eur += meal.cost.meal_cost_eur;
    }
    totals
}

/// Roll a plan's days up into plan-level totals.
///
/// Sums the stored day totals; callers that cannot trust those run
/// [`recompute`] first.
pub fn plan_totals(days: &[Day]) -> PlanTotals {
    let mut totals = PlanTotals::default();
    for day in days {
        totals.nutrition.add(&day.totals.nutrition);
        totals.total_cost_eur += day.totals.cost_eur;
    }
    totals
}

/// Rewrite every rollup in the plan from its leaf data.
///
/// Day totals, plan totals and the budget metadata block
/// (`period_cost_eur`, `budget_remaining_eur`, `is_over_budget`, `days`)
/// are all recomputed; `period_budget_eur` and `generation_attempts` are
/// inputs and stay untouched.
pub fn recompute(plan: &mut MealPlan) {
    for day in &mut plan.days {
        day.totals = day_totals(&day.meals);
    }
    plan.plan_totals = plan_totals(&plan.days);

    let metadata = &mut plan.metadata;
    metadata.period_cost_eur = plan.plan_totals.total_cost_eur;
    metadata.budget_remaining_eur = metadata.period_budget_eur - metadata.period_cost_eur;
    metadata.is_over_budget = metadata.period_cost_eur > metadata.period_budget_eur;
    metadata.days = plan.days.len() as u32;
}

/// Check that the stored rollups agree with the sums of their parts.
///
/// Tolerances: 1 kcal for calories, 0.01 EUR for cost. Room for
/// accumulated floating error, nothing more.
pub fn verify_rollups(plan: &MealPlan) -> Result<(), ValidationError> {
    let mut computed = PlanTotals::default();
    for day in &plan.days {
        let expected = day_totals(&day.meals);
        if (day.totals.nutrition.calories - expected.nutrition.calories).abs() > CALORIE_TOLERANCE {
            return Err(ValidationError::RollupMismatch {
                field: "day calories",
                stored: day.totals.nutrition.calories,
                computed: expected.nutrition.calories,
            });
        }
        if (day.totals.cost_eur - expected.cost_eur).abs() > COST_TOLERANCE {
            return Err(ValidationError::RollupMismatch {
                field: "day cost_eur",
                stored: day.totals.cost_eur,
                computed: expected.cost_eur,
            });
        }
        computed.nutrition.add(&day.totals.nutrition);
        computed.total_cost_eur += day.totals.cost_eur;
    }

    if (plan.plan_totals.nutrition.calories - computed.nutrition.calories).abs()
        > CALORIE_TOLERANCE
    {
        return Err(ValidationError::RollupMismatch {
            field: "plan calories",
            stored: plan.plan_totals.nutrition.calories,
            computed: computed.nutrition.calories,
        });
    }
    if (plan.plan_totals.total_cost_eur - computed.total_cost_eur).abs() > COST_TOLERANCE {
        return Err(ValidationError::RollupMismatch {
            field: "plan total_cost_eur",
            stored: plan.plan_totals.total_cost_eur,
            computed: computed.total_cost_eur,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Ingredient, MealCost, MealType, Nutrition, PlanMetadata,
    };
    use chrono::Utc;

    fn meal(meal_type: MealType, calories: f64, cost: f64) -> Meal {
        Meal {
            meal_id: format!("meal-{}", meal_type.label()),
            meal_type,
            recipe_name: format!("{} recipe", meal_type.label()),
            nutrition: Nutrition {
                calories,
                protein_g: calories / 20.0,
                carbohydrates_g: calories / 10.0,
                fats_g: calories / 30.0,
            },
            cost: MealCost { meal_cost_eur: cost },
            ingredients: vec![Ingredient {
                ingredient_id: "ing-1".to_string(),
                name: "Oats".to_string(),
                quantity_g: 80.0,
                nutrition: Nutrition::default(),
                cost_eur: cost,
            }],
            cooking_instructions: vec![],
        }
    }

    fn three_day_plan() -> MealPlan {
        let days = (1..=3)
            .map(|n| Day {
                day_number: n,
                date: None,
                meals: vec![
                    meal(MealType::Breakfast, 420.0, 2.40),
                    meal(MealType::Lunch, 680.0, 3.80),
                    meal(MealType::Dinner, 750.0, 4.10),
                ],
                totals: DayTotals::default(),
            })
            .collect();

        MealPlan {
            plan_id: "plan-1".to_string(),
            generated_at: Utc::now(),
            user_id: "user-1".to_string(),
            metadata: PlanMetadata {
                period_budget_eur: 50.0,
                period_cost_eur: 0.0,
                budget_remaining_eur: 0.0,
                is_over_budget: false,
                generation_attempts: 1,
                days: 0,
            },
            days,
            plan_totals: PlanTotals::default(),
        }
    }

    #[test]
    fn test_day_totals_sum_meals() {
        let plan = three_day_plan();
        let totals = day_totals(&plan.days[0].meals);
        assert!((totals.nutrition.calories - 1850.0).abs() < 1e-9);
        assert!((totals.cost_eur - 10.30).abs() < 1e-9);
    }

    #[test]
    fn test_recompute_fills_all_levels() {
        let mut plan = three_day_plan();
        recompute(&mut plan);

        assert!((plan.days[1].totals.nutrition.calories - 1850.0).abs() < 1e-9);
        assert!((plan.plan_totals.nutrition.calories - 5550.0).abs() < 1e-9);
        assert!((plan.plan_totals.total_cost_eur - 30.90).abs() < 1e-9);

        assert!((plan.metadata.period_cost_eur - 30.90).abs() < 1e-9);
        assert!((plan.metadata.budget_remaining_eur - 19.10).abs() < 1e-9);
        assert!(!plan.metadata.is_over_budget);
        assert_eq!(plan.metadata.days, 3);
    }

    #[test]
    fn test_recompute_flags_over_budget() {
        let mut plan = three_day_plan();
        plan.metadata.period_budget_eur = 20.0;
        recompute(&mut plan);

        assert!(plan.metadata.is_over_budget);
        assert!(plan.metadata.budget_remaining_eur < 0.0);
    }

    #[test]
    fn test_verify_rollups_accepts_recomputed_plan() {
        let mut plan = three_day_plan();
        recompute(&mut plan);
        assert!(verify_rollups(&plan).is_ok());
    }

    #[test]
    fn test_verify_rollups_tolerates_float_noise() {
        let mut plan = three_day_plan();
        recompute(&mut plan);
        plan.plan_totals.nutrition.calories += 0.9;
        plan.plan_totals.total_cost_eur += 0.009;
        assert!(verify_rollups(&plan).is_ok());
    }

    #[test]
    fn test_verify_rollups_rejects_drifted_day() {
        let mut plan = three_day_plan();
        recompute(&mut plan);
        plan.days[0].totals.cost_eur += 5.0;
        assert!(matches!(
            verify_rollups(&plan),
            Err(ValidationError::RollupMismatch {
                field: "day cost_eur",
                ..
            })
        ));
    }

    #[test]
    fn test_verify_rollups_rejects_drifted_plan_total() {
        let mut plan = three_day_plan();
        recompute(&mut plan);
        plan.plan_totals.nutrition.calories += 10.0;
        assert!(matches!(
            verify_rollups(&plan),
            Err(ValidationError::RollupMismatch {
                field: "plan calories",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_day_list_is_all_zero() {
        let totals = plan_totals(&[]);
        assert_eq!(totals.nutrition.calories, 0.0);
        assert_eq!(totals.total_cost_eur, 0.0);
    }
}
