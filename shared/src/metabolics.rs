//! Metabolic calculations module
//!
//! Translates body metrics and a goal type into calorie and macronutrient
//! targets: BMR → TDEE → target calories → macro split.
//!
//! # Design Principles
//!
//! 1. **Pure Functions**: All calculations are pure, no side effects
//! 2. **Evidence-Based**: Mifflin-St Jeor for BMR, FDA fiber heuristic
//! 3. **Validate First**: Range validation is a separate, explicit step that
//!    reports every violation at once
//! 4. **Integer Outputs**: Calories and grams are rounded integers

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Input Types
// ============================================================================

/// Biological sex for metabolic calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

/// Plan goal type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// Calorie deficit for fat loss
    Cut,
    /// Maintenance calories
    Maintain,
    /// Calorie surplus for muscle gain
    Bulk,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Cut => "cut",
            GoalType::Maintain => "maintain",
            GoalType::Bulk => "bulk",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            GoalType::Cut => "Fat loss with a moderate calorie deficit",
            GoalType::Maintain => "Maintain current weight and body composition",
            GoalType::Bulk => "Muscle gain with a moderate calorie surplus",
        }
    }

    /// Calorie adjustment relative to TDEE
    ///
    /// 15% deficit/surplus targets a sustainable ~0.5-1 lb/week rate of change.
    pub fn calorie_adjustment(&self) -> f64 {
        match self {
            GoalType::Cut => 0.85,
            GoalType::Maintain => 1.0,
            GoalType::Bulk => 1.15,
        }
    }

    /// Protein target in grams per kg of body weight
    ///
    /// Higher protein during a deficit preserves lean mass.
    pub fn protein_g_per_kg(&self) -> f64 {
        match self {
            GoalType::Cut => 2.2,
            GoalType::Maintain => 1.8,
            GoalType::Bulk => 2.0,
        }
    }

    /// Share of total calories allocated to fat
    pub fn fat_calorie_share(&self) -> f64 {
        match self {
            GoalType::Cut => 0.25,
            GoalType::Maintain => 0.30,
            GoalType::Bulk => 0.20,
        }
    }
}

impl std::str::FromStr for GoalType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cut" => Ok(GoalType::Cut),
            "maintain" => Ok(GoalType::Maintain),
            "bulk" => Ok(GoalType::Bulk),
            _ => Err(()),
        }
    }
}

/// Raw caller-supplied goal data, validated before use
///
/// `activity_level` is a decimal multiplier encoded as a string
/// (e.g. "1.55"), matching what goal-setup clients submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalInput {
    /// Age in years
    pub age_years: i32,
    /// Current weight in kilograms
    pub weight_kg: f64,
    /// Height in centimeters
    pub height_cm: f64,
    /// "male" or "female"
    pub sex: String,
    /// Activity multiplier as a string, in [1.2, 2.0]
    pub activity_level: String,
    /// "cut", "maintain", or "bulk"
    pub goal_type: String,
}

/// Parsed and validated goal data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserGoalData {
    pub age_years: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sex: Sex,
    pub activity_multiplier: f64,
    pub goal: GoalType,
}

// ============================================================================
// Result Types
// ============================================================================

/// Daily macronutrient targets in grams, all non-negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub fiber_g: i32,
}

/// Complete calculation result, recomputed fresh on every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdeeResult {
    /// Basal Metabolic Rate in kcal/day
    pub bmr: i32,
    /// Total Daily Energy Expenditure in kcal/day
    pub tdee: i32,
    /// Goal-adjusted calorie target in kcal/day
    pub target_calories: i32,
    pub macros: MacroTargets,
}

/// Validation outcome listing every violated rule
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Calculation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetabolicError {
    #[error("Invalid activity level: {0} (must be a multiplier between 1.2 and 2.0)")]
    InvalidActivityLevel(String),

    #[error("Invalid user data: {0}")]
    InvalidInput(String),
}

// ============================================================================
// Validation
// ============================================================================

/// Activity multiplier bounds (sedentary to extremely active)
pub const ACTIVITY_MULTIPLIER_MIN: f64 = 1.2;
pub const ACTIVITY_MULTIPLIER_MAX: f64 = 2.0;

const AGE_RANGE: (i32, i32) = (15, 120);
const WEIGHT_RANGE_KG: (f64, f64) = (30.0, 300.0);
const HEIGHT_RANGE_CM: (f64, f64) = (120.0, 250.0);

/// Validate raw goal input, reporting all violated rules at once
/// rather than failing fast on the first
pub fn validate_goal_input(input: &GoalInput) -> ValidationReport {
    let mut errors = Vec::new();

    if input.age_years < AGE_RANGE.0 || input.age_years > AGE_RANGE.1 {
        errors.push(format!(
            "Age must be between {} and {} years",
            AGE_RANGE.0, AGE_RANGE.1
        ));
    }

    if !input.weight_kg.is_finite()
        || input.weight_kg < WEIGHT_RANGE_KG.0
        || input.weight_kg > WEIGHT_RANGE_KG.1
    {
        errors.push(format!(
            "Weight must be between {} and {} kg",
            WEIGHT_RANGE_KG.0, WEIGHT_RANGE_KG.1
        ));
    }

    if !input.height_cm.is_finite()
        || input.height_cm < HEIGHT_RANGE_CM.0
        || input.height_cm > HEIGHT_RANGE_CM.1
    {
        errors.push(format!(
            "Height must be between {} and {} cm",
            HEIGHT_RANGE_CM.0, HEIGHT_RANGE_CM.1
        ));
    }

    if input.sex != "male" && input.sex != "female" {
        errors.push("Sex must be 'male' or 'female'".to_string());
    }

    if parse_activity_multiplier(&input.activity_level).is_err() {
        errors.push(format!(
            "Activity level must be a multiplier between {} and {}",
            ACTIVITY_MULTIPLIER_MIN, ACTIVITY_MULTIPLIER_MAX
        ));
    }

    if input.goal_type.parse::<GoalType>().is_err() {
        errors.push("Goal type must be 'cut', 'maintain', or 'bulk'".to_string());
    }

    ValidationReport { errors }
}

impl GoalInput {
    /// Validate and convert to typed goal data
    ///
    /// Returns the full validation report on failure.
    pub fn parse(&self) -> Result<UserGoalData, ValidationReport> {
        let report = validate_goal_input(self);
        if !report.is_valid() {
            return Err(report);
        }

        let sex = match self.sex.as_str() {
            "male" => Sex::Male,
            _ => Sex::Female,
        };
        // Infallible after validation
        let activity_multiplier =
            parse_activity_multiplier(&self.activity_level).unwrap_or(ACTIVITY_MULTIPLIER_MIN);
        let goal = self
            .goal_type
            .parse::<GoalType>()
            .unwrap_or(GoalType::Maintain);

        Ok(UserGoalData {
            age_years: self.age_years,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            sex,
            activity_multiplier,
            goal,
        })
    }
}

// ============================================================================
// Calculations
// ============================================================================

/// Calculate Basal Metabolic Rate using the Mifflin-St Jeor equation
///
/// Men: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5
/// Women: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 161
///
/// Performs no input validation; callers validate first.
pub fn calculate_bmr(weight_kg: f64, height_cm: f64, age_years: i32, sex: Sex) -> i32 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    let bmr = match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    };
    bmr.round() as i32
}

/// Parse a string-encoded activity multiplier
pub fn parse_activity_multiplier(activity_level: &str) -> Result<f64, MetabolicError> {
    let multiplier: f64 = activity_level
        .trim()
        .parse()
        .map_err(|_| MetabolicError::InvalidActivityLevel(activity_level.to_string()))?;

    if !(ACTIVITY_MULTIPLIER_MIN..=ACTIVITY_MULTIPLIER_MAX).contains(&multiplier) {
        return Err(MetabolicError::InvalidActivityLevel(
            activity_level.to_string(),
        ));
    }

    Ok(multiplier)
}

/// Calculate Total Daily Energy Expenditure
///
/// TDEE = BMR × activity multiplier
pub fn calculate_tdee(bmr: i32, activity_level: &str) -> Result<i32, MetabolicError> {
    let multiplier = parse_activity_multiplier(activity_level)?;
    Ok((bmr as f64 * multiplier).round() as i32)
}

/// Calculate the goal-adjusted calorie target
///
/// Cut: 15% deficit. Bulk: 15% surplus. Maintain: TDEE unchanged.
pub fn calculate_target_calories(tdee: i32, goal: GoalType) -> i32 {
    match goal {
        GoalType::Maintain => tdee,
        _ => (tdee as f64 * goal.calorie_adjustment()).round() as i32,
    }
}

/// Calculate daily macro targets from the calorie target
///
/// Protein and fat are fixed by goal type; carbs take the remaining
/// calories, so rounding error accumulates only in carbs. If protein
/// and fat together exceed the calorie target (very low targets combined
/// with high body weight), carbs clamp at zero rather than going negative.
pub fn calculate_macro_targets(target_calories: i32, goal: GoalType, weight_kg: f64) -> MacroTargets {
    let protein_g = (weight_kg * goal.protein_g_per_kg()).round() as i32;
    let fat_calories = target_calories as f64 * goal.fat_calorie_share();
    let fat_g = (fat_calories / 9.0).round() as i32;

    let carb_calories = target_calories - protein_g * 4 - fat_g * 9;
    let carbs_g = ((carb_calories as f64 / 4.0).round() as i32).max(0);

    let fiber_g = (target_calories as f64 / 1000.0 * 14.0).round() as i32;

    MacroTargets {
        protein_g,
        carbs_g,
        fat_g,
        fiber_g,
    }
}

/// Run the complete pipeline on already-validated goal data
pub fn calculate_complete_tdee(data: &UserGoalData) -> TdeeResult {
    let bmr = calculate_bmr(data.weight_kg, data.height_cm, data.age_years, data.sex);
    let tdee = (bmr as f64 * data.activity_multiplier).round() as i32;
    let target_calories = calculate_target_calories(tdee, data.goal);
    let macros = calculate_macro_targets(target_calories, data.goal, data.weight_kg);

    TdeeResult {
        bmr,
        tdee,
        target_calories,
        macros,
    }
}

/// Validate raw input and run the complete pipeline
///
/// Fails with the joined validation messages if any rule is violated.
pub fn calculate_complete(input: &GoalInput) -> Result<TdeeResult, MetabolicError> {
    let data = input
        .parse()
        .map_err(|report| MetabolicError::InvalidInput(report.errors.join("; ")))?;
    Ok(calculate_complete_tdee(&data))
}
