//! Plan content model and schema validation
//!
//! A generated plan is a 4-week narrative: a summary block with the numeric
//! targets plus one entry per week. Model output is untrusted, so everything
//! here is validated structurally before acceptance; a plan is either fully
//! valid or rejected outright.

use crate::metabolics::MacroTargets;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every plan spans exactly this many weeks
pub const PLAN_WEEKS: usize = 4;

/// Generated plan narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanContent {
    pub summary: PlanSummaryBlock,
    pub weeks: Vec<WeeklyPlan>,
}

/// Plan summary echoing the computed targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummaryBlock {
    pub daily_calories: i32,
    pub macros: MacroTargets,
    pub goal_description: String,
}

/// One week of the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    /// 1-based week number matching the entry's position
    pub week: i32,
    pub focus: String,
    pub nutrition: Vec<String>,
    pub workouts: Vec<String>,
    pub motivation: String,
}

/// Validate plan structure, collecting every violation
///
/// An empty result means the content is acceptable. Any violation rejects
/// the whole plan; there is no partial acceptance.
pub fn validate_plan_content(content: &PlanContent) -> Vec<String> {
    let mut errors = Vec::new();

    if content.summary.daily_calories <= 0 {
        errors.push("summary.daily_calories must be positive".to_string());
    }

    if content.weeks.len() != PLAN_WEEKS {
        errors.push(format!(
            "plan must contain exactly {} weeks, found {}",
            PLAN_WEEKS,
            content.weeks.len()
        ));
    }

    for (idx, week) in content.weeks.iter().enumerate() {
        let expected = idx as i32 + 1;
        if week.week != expected {
            errors.push(format!(
                "week at position {} is numbered {}, expected {}",
                idx, week.week, expected
            ));
        }
        if week.focus.trim().is_empty() {
            errors.push(format!("week {} has an empty focus", expected));
        }
        if week.nutrition.is_empty() {
            errors.push(format!("week {} has no nutrition tips", expected));
        }
        if week.workouts.is_empty() {
            errors.push(format!("week {} has no workout tips", expected));
        }
        if week.motivation.trim().is_empty() {
            errors.push(format!("week {} has an empty motivation", expected));
        }
    }

    errors
}

/// Compute the current plan week from elapsed time
///
/// Week 1 starts at generation; each week is 7 days; clamped to [1, 4]
/// so an old plan keeps reporting its final week.
pub fn current_week(generated_at: DateTime<Utc>, now: DateTime<Utc>) -> i32 {
    let days = (now - generated_at).num_days().max(0);
    ((days / 7) as i32 + 1).min(PLAN_WEEKS as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_content() -> PlanContent {
        PlanContent {
            summary: PlanSummaryBlock {
                daily_calories: 2200,
                macros: MacroTargets {
                    protein_g: 165,
                    carbs_g: 218,
                    fat_g: 61,
                    fiber_g: 31,
                },
                goal_description: "Fat loss".to_string(),
            },
            weeks: (1..=4)
                .map(|n| WeeklyPlan {
                    week: n,
                    focus: format!("Week {} focus", n),
                    nutrition: vec!["Eat protein with every meal".to_string()],
                    workouts: vec!["Train 3-4 times".to_string()],
                    motivation: "Keep going".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_valid_content_passes() {
        assert!(validate_plan_content(&sample_content()).is_empty());
    }

    #[test]
    fn test_rejects_wrong_week_count() {
        let mut content = sample_content();
        content.weeks.pop();
        let errors = validate_plan_content(&content);
        assert!(errors.iter().any(|e| e.contains("exactly 4 weeks")));
    }

    #[test]
    fn test_rejects_misnumbered_weeks() {
        let mut content = sample_content();
        content.weeks[2].week = 7;
        let errors = validate_plan_content(&content);
        assert!(errors.iter().any(|e| e.contains("numbered 7")));
    }

    #[test]
    fn test_rejects_empty_fields_and_collects_all() {
        let mut content = sample_content();
        content.summary.daily_calories = 0;
        content.weeks[0].focus = "  ".to_string();
        content.weeks[1].nutrition.clear();
        content.weeks[3].motivation = String::new();
        let errors = validate_plan_content(&content);
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_current_week_progression() {
        let start = Utc::now();
        assert_eq!(current_week(start, start), 1);
        assert_eq!(current_week(start, start + Duration::days(6)), 1);
        assert_eq!(current_week(start, start + Duration::days(7)), 2);
        assert_eq!(current_week(start, start + Duration::days(20)), 3);
        assert_eq!(current_week(start, start + Duration::days(27)), 4);
        // Clamped at the final week
        assert_eq!(current_week(start, start + Duration::days(90)), 4);
        // Clock skew never yields week 0
        assert_eq!(current_week(start, start - Duration::days(3)), 1);
    }
}
