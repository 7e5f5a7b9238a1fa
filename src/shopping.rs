//! Shopping-list consolidation.
//!
//! Collapses every ingredient occurrence across a plan's days and meals into
//! one purchasable line item per ingredient identity. Quantities are rounded
//! **up** to a purchase granularity (supermarkets do not sell 37 g of rice),
//! which is where the list's "waste cost" comes from: the delta between what
//! the rounded purchases cost and what the plan actually consumes.
//!
//! Consolidation is deterministic and idempotent: the same plan always
//! yields the same list, modulo the generation timestamp. User edits
//! (`owned`/`deleted` flags) live on the persisted list and are carried
//! forward through regeneration by [`merge_user_flags`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{MealPlan, ShoppingList, ShoppingListItem, ShoppingSummary};

/// Purchase-unit settings for consolidation.
#[derive(Debug, Clone, Copy)]
pub struct ConsolidationConfig {
    /// Quantities are rounded up to multiples of this many grams.
    pub purchase_granularity_g: f64,

    /// Informational store floor attached to every item; not enforced on
    /// the rounded quantity.
    pub minimum_purchase_g: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            purchase_granularity_g: 50.0,
            minimum_purchase_g: 100.0,
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build the consolidated shopping list for a plan.
///
/// Groups ingredient occurrences by `ingredient_id`, accumulates raw grams
/// and cost, rounds each quantity up to the purchase granularity and sorts
/// the result case-insensitively by display name. The summary's waste cost
/// is `max(0, total item price - plan cost)`; rounding is always upward,
/// so it can never go negative.
pub fn consolidate(
    plan: &MealPlan,
    config: &ConsolidationConfig,
    generated_at: DateTime<Utc>,
) -> ShoppingList {
    struct Accumulated {
        name: String,
        quantity_g: f64,
        cost_eur: f64,
    }

    let mut by_ingredient: HashMap<&str, Accumulated> = HashMap::new();
    for day in &plan.days {
        for meal in &day.meals {
            for ingredient in &meal.ingredients {
                by_ingredient
                    .entry(ingredient.ingredient_id.as_str())
                    .and_modify(|acc| {
                        acc.quantity_g += ingredient.quantity_g;
                        acc.cost_eur += ingredient.cost_eur;
                    })
                    .or_insert_with(|| Accumulated {
                        name: ingredient.name.clone(),
                        quantity_g: ingredient.quantity_g,
                        cost_eur: ingredient.cost_eur,
                    });
            }
        }
    }

    let granularity = config.purchase_granularity_g.max(1.0);
    let mut items: Vec<ShoppingListItem> = by_ingredient
        .into_iter()
        .map(|(id, acc)| ShoppingListItem {
            ingredient_id: id.to_string(),
            display_name: acc.name,
            total_quantity: (acc.quantity_g / granularity).ceil() * granularity,
            unit: "g".to_string(),
            minimum_purchase_quantity: config.minimum_purchase_g,
            estimated_price_eur: round_cents(acc.cost_eur),
            owned: false,
            deleted: false,
        })
        .collect();

    items.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.ingredient_id.cmp(&b.ingredient_id))
    });

    let total_shopping_cost: f64 = items.iter().map(|item| item.estimated_price_eur).sum();
    let plan_cost = plan.plan_totals.total_cost_eur;

    ShoppingList {
        plan_id: plan.plan_id.clone(),
        generated_at,
        summary: ShoppingSummary {
            total_items: items.len() as u32,
            total_shopping_cost_eur: round_cents(total_shopping_cost),
            plan_cost_eur: plan_cost,
            waste_cost_eur: round_cents((total_shopping_cost - plan_cost).max(0.0)),
        },
        items,
    }
}

/// Carry `owned`/`deleted` flags from a previously persisted list onto a
/// freshly consolidated one.
///
/// Matching is by `ingredient_id`; flags for ingredients that no longer
/// appear in the plan are dropped with the ingredient. Regeneration must
/// never silently discard user edits for surviving items.
pub fn merge_user_flags(fresh: &mut ShoppingList, previous: &ShoppingList) {
    let flags: HashMap<&str, (bool, bool)> = previous
        .items
        .iter()
        .map(|item| (item.ingredient_id.as_str(), (item.owned, item.deleted)))
        .collect();

    for item in &mut fresh.items {
        if let Some(&(owned, deleted)) = flags.get(item.ingredient_id.as_str()) {
            item.owned = owned;
            item.deleted = deleted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation;
    use crate::model::{
        Day, DayTotals, Ingredient, Meal, MealCost, MealType, Nutrition, PlanMetadata, PlanTotals,
    };

    fn ingredient(id: &str, name: &str, quantity_g: f64, cost_eur: f64) -> Ingredient {
        Ingredient {
            ingredient_id: id.to_string(),
            name: name.to_string(),
            quantity_g,
            nutrition: Nutrition::default(),
            cost_eur,
        }
    }

    fn meal(meal_type: MealType, ingredients: Vec<Ingredient>) -> Meal {
        let cost = ingredients.iter().map(|i| i.cost_eur).sum();
        Meal {
            meal_id: format!("meal-{}", meal_type.label()),
            meal_type,
            recipe_name: format!("{} recipe", meal_type.label()),
            nutrition: Nutrition::default(),
            cost: MealCost { meal_cost_eur: cost },
            ingredients,
            cooking_instructions: vec![],
        }
    }

    fn plan_with_days(days: Vec<Day>) -> MealPlan {
        let mut plan = MealPlan {
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
        };
        aggregation::recompute(&mut plan);
        plan
    }

    fn two_day_plan() -> MealPlan {
        plan_with_days(vec![
            Day {
                day_number: 1,
                date: None,
                meals: vec![
                    meal(
                        MealType::Breakfast,
                        vec![
                            ingredient("yogurt", "Greek Yogurt", 200.0, 1.20),
                            ingredient("berries", "Mixed Berries", 100.0, 0.80),
                        ],
                    ),
                    meal(
                        MealType::Lunch,
                        vec![
                            ingredient("chicken", "Chicken Breast", 150.0, 2.10),
                            ingredient("rice", "Basmati Rice", 80.0, 0.30),
                        ],
                    ),
                ],
                totals: DayTotals::default(),
            },
            Day {
                day_number: 2,
                date: None,
                meals: vec![meal(
                    MealType::Dinner,
                    vec![
                        ingredient("chicken", "Chicken Breast", 170.0, 2.30),
                        ingredient("rice", "Basmati Rice", 90.0, 0.35),
                    ],
                )],
                totals: DayTotals::default(),
            },
        ])
    }

    #[test]
    fn test_ingredients_are_unique_and_accumulated() {
        let list = consolidate(&two_day_plan(), &ConsolidationConfig::default(), Utc::now());

        assert_eq!(list.items.len(), 4);
        let mut ids: Vec<&str> = list.items.iter().map(|i| i.ingredient_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);

        let chicken = list
            .items
            .iter()
            .find(|i| i.ingredient_id == "chicken")
            .unwrap();
        // 150 + 170 = 320 raw, rounded up to the next 50 g step.
        assert_eq!(chicken.total_quantity, 350.0);
        assert_eq!(chicken.estimated_price_eur, 4.40);
    }

    #[test]
    fn test_rounding_is_always_upward() {
        let plan = two_day_plan();
        let list = consolidate(&plan, &ConsolidationConfig::default(), Utc::now());

        let mut raw: HashMap<String, f64> = HashMap::new();
        for day in &plan.days {
            for meal in &day.meals {
                for ing in &meal.ingredients {
                    *raw.entry(ing.ingredient_id.clone()).or_default() += ing.quantity_g;
                }
            }
        }
        for item in &list.items {
            assert!(
                item.total_quantity >= raw[&item.ingredient_id],
                "{} rounded below its raw quantity",
                item.display_name
            );
            assert_eq!(item.total_quantity % 50.0, 0.0);
            assert_eq!(item.minimum_purchase_quantity, 100.0);
        }
    }

    #[test]
    fn test_waste_cost_is_never_negative() {
        let list = consolidate(&two_day_plan(), &ConsolidationConfig::default(), Utc::now());
        assert!(list.summary.waste_cost_eur >= 0.0);
        assert_eq!(
            list.summary.waste_cost_eur,
            round_cents(
                (list.summary.total_shopping_cost_eur - list.summary.plan_cost_eur).max(0.0)
            )
        );
    }

    #[test]
    fn test_items_sorted_by_display_name() {
        let list = consolidate(&two_day_plan(), &ConsolidationConfig::default(), Utc::now());
        let names: Vec<&str> = list.items.iter().map(|i| i.display_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Basmati Rice", "Chicken Breast", "Greek Yogurt", "Mixed Berries"]
        );
    }

    #[test]
    fn test_consolidation_is_deterministic() {
        let plan = two_day_plan();
        let at = Utc::now();
        let first = consolidate(&plan, &ConsolidationConfig::default(), at);
        let second = consolidate(&plan, &ConsolidationConfig::default(), at);
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_preserves_user_flags() {
        let plan = two_day_plan();
        let mut previous = consolidate(&plan, &ConsolidationConfig::default(), Utc::now());
        previous
            .items
            .iter_mut()
            .find(|i| i.ingredient_id == "rice")
            .unwrap()
            .owned = true;
        previous
            .items
            .iter_mut()
            .find(|i| i.ingredient_id == "berries")
            .unwrap()
            .deleted = true;

        let mut fresh = consolidate(&plan, &ConsolidationConfig::default(), Utc::now());
        merge_user_flags(&mut fresh, &previous);

        assert!(fresh.items.iter().find(|i| i.ingredient_id == "rice").unwrap().owned);
        assert!(
            fresh
                .items
                .iter()
                .find(|i| i.ingredient_id == "berries")
                .unwrap()
                .deleted
        );
        assert!(!fresh.items.iter().find(|i| i.ingredient_id == "chicken").unwrap().owned);
    }

    #[test]
    fn test_merge_drops_flags_for_vanished_ingredients() {
        let plan = two_day_plan();
        let mut previous = consolidate(&plan, &ConsolidationConfig::default(), Utc::now());
        previous.items.push(ShoppingListItem {
            ingredient_id: "tofu".to_string(),
            display_name: "Tofu".to_string(),
            total_quantity: 200.0,
            unit: "g".to_string(),
            minimum_purchase_quantity: 100.0,
            estimated_price_eur: 1.50,
            owned: true,
            deleted: false,
        });

        let mut fresh = consolidate(&plan, &ConsolidationConfig::default(), Utc::now());
        merge_user_flags(&mut fresh, &previous);

        assert!(fresh.items.iter().all(|i| i.ingredient_id != "tofu"));
    }

    #[test]
    fn test_empty_plan_gives_empty_list() {
        let plan = plan_with_days(vec![Day {
            day_number: 1,
            date: None,
            meals: vec![],
            totals: DayTotals::default(),
        }]);
        let list = consolidate(&plan, &ConsolidationConfig::default(), Utc::now());
        assert!(list.items.is_empty());
        assert_eq!(list.summary.total_items, 0);
        assert_eq!(list.summary.waste_cost_eur, 0.0);
    }
}
