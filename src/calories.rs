//! Calorie-target and macronutrient arithmetic.
//!
//! The daily calorie target comes from the Mifflin-St Jeor basal metabolic
//! rate, scaled by a fixed activity multiplier and shifted by the user's
//! objective. Macro targets are percentage splits of that calorie total,
//! converted to grams at 4 kcal/g for protein and carbohydrates and
//! 9 kcal/g for fat.
//!
//! All functions here are pure and total; input validation is the caller's
//! concern (see [`crate::model::UserProfile::validate`]).

use serde::{Deserialize, Serialize};

use crate::model::{ActivityLevel, Biometrics, Objective, Sex};

/// Calories removed per day for a weight-loss objective.
const LOSE_WEIGHT_OFFSET: f64 = -500.0;

/// Calories added per day for a muscle-gain objective.
const GAIN_MUSCLE_OFFSET: f64 = 300.0;

impl ActivityLevel {
    /// Fixed TDEE multiplier for this tier.
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    /// Human-readable label for onboarding screens.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary (little or no exercise)",
            ActivityLevel::Light => "Light (exercise 1-3 days/week)",
            ActivityLevel::Moderate => "Moderate (exercise 3-5 days/week)",
            ActivityLevel::Active => "Active (exercise 6-7 days/week)",
            ActivityLevel::VeryActive => "Very Active (intense exercise daily)",
        }
    }
}

impl Objective {
    /// Fixed daily calorie adjustment for this objective.
    pub fn calorie_offset(&self) -> f64 {
        match self {
            Objective::LoseWeight => LOSE_WEIGHT_OFFSET,
            Objective::Maintain => 0.0,
            Objective::GainMuscle => GAIN_MUSCLE_OFFSET,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Objective::LoseWeight => "Lose Weight",
            Objective::Maintain => "Maintain Weight",
            Objective::GainMuscle => "Gain Muscle",
        }
    }
}

/// Mifflin-St Jeor basal metabolic rate in kcal/day.
///
/// `10*weight + 6.25*height - 5*age + 5` for males; the trailing constant
/// is `-161` for females.
pub fn basal_metabolic_rate(biometrics: &Biometrics) -> f64 {
    let base = 10.0 * biometrics.weight_kg + 6.25 * biometrics.height_cm
        - 5.0 * f64::from(biometrics.age);
    match biometrics.sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

/// Daily calorie target: BMR x activity multiplier + objective offset,
/// rounded to the nearest whole calorie.
pub fn calculate_target_calories(biometrics: &Biometrics) -> u32 {
    let tdee = basal_metabolic_rate(biometrics) * biometrics.activity_level.multiplier();
    let target = tdee + biometrics.objective.calorie_offset();
    target.round().max(0.0) as u32
}

/// Percentage split of daily calories across the three macros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub protein_percentage: f64,
    pub carbs_percentage: f64,
    pub fats_percentage: f64,
}

/// Named macro splits offered during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroPreset {
    Balanced,
    HighProtein,
    LowCarb,
    Keto,
    Endurance,
}

impl MacroPreset {
    /// The percentage split this preset stands for.
    pub fn targets(&self) -> MacroTargets {
        let (protein, carbs, fats) = match self {
            MacroPreset::Balanced => (30.0, 40.0, 30.0),
            MacroPreset::HighProtein => (40.0, 35.0, 25.0),
            MacroPreset::LowCarb => (35.0, 25.0, 40.0),
            MacroPreset::Keto => (25.0, 5.0, 70.0),
            MacroPreset::Endurance => (20.0, 55.0, 25.0),
        };
        MacroTargets {
            protein_percentage: protein,
            carbs_percentage: carbs,
            fats_percentage: fats,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MacroPreset::Balanced => "Balanced (30/40/30)",
            MacroPreset::HighProtein => "High Protein (40/35/25)",
            MacroPreset::LowCarb => "Low Carb (35/25/40)",
            MacroPreset::Keto => "Ketogenic (25/5/70)",
            MacroPreset::Endurance => "Endurance (20/55/25)",
        }
    }
}

/// Daily macro targets in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroGrams {
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fats_g: u32,
}

impl MacroTargets {
    /// Whether the split adds up to 100% within a 0.1 tolerance.
    pub fn is_complete(&self) -> bool {
        let total = self.protein_percentage + self.carbs_percentage + self.fats_percentage;
        (total - 100.0).abs() < 0.1
    }

    /// Rescale the split proportionally so it totals 100%. A split that is
    /// already complete is returned unchanged.
    pub fn normalized(&self) -> MacroTargets {
        if self.is_complete() {
            return *self;
        }
        let total = self.protein_percentage + self.carbs_percentage + self.fats_percentage;
        if total <= 0.0 {
            return MacroPreset::Balanced.targets();
        }
        MacroTargets {
            protein_percentage: self.protein_percentage / total * 100.0,
            carbs_percentage: self.carbs_percentage / total * 100.0,
            fats_percentage: self.fats_percentage / total * 100.0,
        }
    }
}

/// Convert a calorie total and a percentage split into daily grams.
///
/// Splits that do not total 100% are normalized proportionally first.
pub fn calculate_macro_grams(calories: u32, targets: &MacroTargets) -> MacroGrams {
    let targets = targets.normalized();
    let calories = f64::from(calories);

    let protein_calories = calories * targets.protein_percentage / 100.0;
    let carbs_calories = calories * targets.carbs_percentage / 100.0;
    let fats_calories = calories * targets.fats_percentage / 100.0;

    MacroGrams {
        protein_g: (protein_calories / 4.0).round() as u32,
        carbs_g: (carbs_calories / 4.0).round() as u32,
        fats_g: (fats_calories / 9.0).round() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_male() -> Biometrics {
        Biometrics {
            weight_kg: 70.0,
            height_cm: 175.0,
            age: 30,
            sex: Sex::Male,
            activity_level: ActivityLevel::Moderate,
            objective: Objective::Maintain,
        }
    }

    #[test]
    fn test_bmr_reference_male() {
        // 10*70 + 6.25*175 - 5*30 + 5 = 1673.75
        let bmr = basal_metabolic_rate(&reference_male());
        assert!((bmr - 1673.75).abs() < 1e-9);
    }

    #[test]
    fn test_target_calories_reference_male() {
        // 1673.75 * 1.55 = 2594.3125, maintain offset 0, rounds to 2594.
        assert_eq!(calculate_target_calories(&reference_male()), 2594);
    }

    #[test]
    fn test_female_constant() {
        let mut biometrics = reference_male();
        biometrics.sex = Sex::Female;
        let bmr = basal_metabolic_rate(&biometrics);
        // Same formula with -161 instead of +5.
        assert!((bmr - 1507.75).abs() < 1e-9);
    }

    #[test]
    fn test_objective_offsets() {
        let mut biometrics = reference_male();
        biometrics.objective = Objective::LoseWeight;
        assert_eq!(calculate_target_calories(&biometrics), 2094);

        biometrics.objective = Objective::GainMuscle;
        assert_eq!(calculate_target_calories(&biometrics), 2894);
    }

    #[test]
    fn test_activity_multipliers() {
        assert_eq!(ActivityLevel::Sedentary.multiplier(), 1.2);
        assert_eq!(ActivityLevel::Light.multiplier(), 1.375);
        assert_eq!(ActivityLevel::Moderate.multiplier(), 1.55);
        assert_eq!(ActivityLevel::Active.multiplier(), 1.725);
        assert_eq!(ActivityLevel::VeryActive.multiplier(), 1.9);
    }

    #[test]
    fn test_macro_grams_balanced_2000() {
        // 2000 kcal at 30/40/30: 600/4, 800/4, 600/9.
        let grams = calculate_macro_grams(2000, &MacroPreset::Balanced.targets());
        assert_eq!(
            grams,
            MacroGrams {
                protein_g: 150,
                carbs_g: 200,
                fats_g: 67,
            }
        );
    }

    #[test]
    fn test_macro_split_normalization() {
        let lopsided = MacroTargets {
            protein_percentage: 30.0,
            carbs_percentage: 30.0,
            fats_percentage: 30.0,
        };
        assert!(!lopsided.is_complete());

        let normalized = lopsided.normalized();
        assert!(normalized.is_complete());
        // Equal shares stay equal after rescaling.
        assert!((normalized.protein_percentage - normalized.fats_percentage).abs() < 1e-9);

        // Grams computed from the lopsided split match the normalized one.
        assert_eq!(
            calculate_macro_grams(1800, &lopsided),
            calculate_macro_grams(1800, &normalized)
        );
    }

    #[test]
    fn test_degenerate_split_falls_back_to_balanced() {
        let zero = MacroTargets {
            protein_percentage: 0.0,
            carbs_percentage: 0.0,
            fats_percentage: 0.0,
        };
        assert_eq!(zero.normalized(), MacroPreset::Balanced.targets());
    }

    #[test]
    fn test_preset_splits_are_complete() {
        for preset in [
            MacroPreset::Balanced,
            MacroPreset::HighProtein,
            MacroPreset::LowCarb,
            MacroPreset::Keto,
            MacroPreset::Endurance,
        ] {
            assert!(preset.targets().is_complete(), "{:?}", preset);
        }
    }
}
