//! Template fallback plan generator
//!
//! Hand-authored 4-week scripts per goal type, populated with the real
//! computed calorie and macro targets. This is the correctness guarantee
//! behind AI generation: if the input validates, a plan always exists,
//! regardless of model availability.

use crate::metabolics::{GoalType, TdeeResult};
use crate::plan::{PlanContent, PlanSummaryBlock, WeeklyPlan};

struct WeekScript {
    focus: &'static str,
    nutrition: &'static [&'static str],
    workouts: &'static [&'static str],
    motivation: &'static str,
}

const CUT_WEEKS: [WeekScript; 4] = [
    WeekScript {
        focus: "Establish the deficit and build tracking habits",
        nutrition: &[
            "Log every meal before you eat it, not after",
            "Front-load protein: aim for 30-40g at breakfast",
            "Swap liquid calories for water or zero-calorie drinks",
        ],
        workouts: &[
            "3 full-body strength sessions to signal muscle retention",
            "Add 8,000 daily steps as your baseline activity",
        ],
        motivation: "The first week is about consistency, not perfection. Hit your calorie target five days out of seven and you are winning.",
    },
    WeekScript {
        focus: "Dial in hunger management",
        nutrition: &[
            "Build meals around high-volume foods: vegetables, lean protein, potatoes",
            "Keep fat sources measured - oils and nut butters hide calories",
            "Plan one flexible meal so the week never feels restrictive",
        ],
        workouts: &[
            "Keep lifting heavy; do not chase fatigue with extra cardio yet",
            "One 20-30 minute low-intensity cardio session on a rest day",
        ],
        motivation: "Hunger between meals is normal in a deficit. Trust the numbers on the scale trend, not a single day's reading.",
    },
    WeekScript {
        focus: "Protect muscle while the deficit compounds",
        nutrition: &[
            "Re-check portion sizes - they tend to drift upward by week three",
            "Spread protein evenly across 3-4 meals",
            "Salt food normally and drink enough water to manage training quality",
        ],
        workouts: &[
            "Push for small strength PRs on your main lifts",
            "Add a second cardio session only if weight loss has stalled two weeks",
        ],
        motivation: "Halfway there. The mirror lags the scale by weeks - keep stacking consistent days.",
    },
    WeekScript {
        focus: "Finish strong and plan the next phase",
        nutrition: &[
            "Hold the same calorie target even as weight drops",
            "Practice eating at maintenance one day to rehearse the transition",
            "Review the month: which meals made the deficit easy? Keep those",
        ],
        workouts: &[
            "Maintain training volume; fatigue management matters most now",
            "Take a full rest day before any strength testing",
        ],
        motivation: "Four weeks of evidence beats any motivation. You built the system - now decide whether to extend the cut or hold your result.",
    },
];

const MAINTAIN_WEEKS: [WeekScript; 4] = [
    WeekScript {
        focus: "Calibrate true maintenance intake",
        nutrition: &[
            "Track intake honestly for the week to verify the calculated target",
            "Keep protein consistent from day to day",
            "Weigh in 3-4 mornings and watch the weekly average, not daily swings",
        ],
        workouts: &[
            "Train 3-4 times with a balanced split you enjoy",
            "Pick one performance metric to improve this month",
        ],
        motivation: "Maintenance is a skill of its own. This month is about making your weight boring and your training interesting.",
    },
    WeekScript {
        focus: "Shift attention to performance",
        nutrition: &[
            "Time carbohydrates around your training sessions",
            "Eat mostly whole foods but leave room for meals you enjoy",
            "Adjust intake by ~100 kcal only if the weekly average moved",
        ],
        workouts: &[
            "Add a small progression: one extra set or 2.5kg on main lifts",
            "Include mobility work twice this week",
        ],
        motivation: "With energy balance handled, every calorie works for your training. Chase numbers in the gym, not on the scale.",
    },
    WeekScript {
        focus: "Stress-test the routine",
        nutrition: &[
            "Practice eating out while staying near your target once this week",
            "Prep fallback meals for the days that go sideways",
            "Keep fiber intake up - it is the first thing to drop on busy weeks",
        ],
        workouts: &[
            "If a session is missed, shorten the next one rather than skipping it",
            "One outdoor or recreational activity this week",
        ],
        motivation: "A plan that survives a bad week is worth ten perfect ones. Flexibility is the goal, not the exception.",
    },
    WeekScript {
        focus: "Review and set the next direction",
        nutrition: &[
            "Compare the month's average weight to the start - within a kilo is a win",
            "Note your actual maintenance calories for future phases",
            "Keep the meal patterns that required zero willpower",
        ],
        workouts: &[
            "Retest the performance metric you picked in week one",
            "Plan the next training block before this one ends",
        ],
        motivation: "You now know your maintenance numbers from lived data, not a formula. That knowledge makes every future cut or bulk easier.",
    },
];

const BULK_WEEKS: [WeekScript; 4] = [
    WeekScript {
        focus: "Ease into the surplus",
        nutrition: &[
            "Add the surplus through carbohydrates around training first",
            "Set calendar reminders for meals - undereating is the usual failure in a bulk",
            "Use calorie-dense additions: rice, oats, milk, olive oil",
        ],
        workouts: &[
            "4 strength sessions; push close to failure on compound lifts",
            "Log every working set so progression is visible",
        ],
        motivation: "Muscle is built by training hard and eating enough, in that order. Feed the work.",
    },
    WeekScript {
        focus: "Drive progressive overload",
        nutrition: &[
            "A pre-bed protein feeding helps hit the daily target",
            "Do not skip vegetables just because calories are high",
            "Expect scale weight to rise ~0.25-0.5% per week; faster is mostly fat",
        ],
        workouts: &[
            "Add weight or reps on at least two main lifts this week",
            "Sleep 7-9 hours; it is the cheapest recovery tool you have",
        ],
        motivation: "Strength on the bar is your best proxy for muscle gained. Win the logbook battle every session.",
    },
    WeekScript {
        focus: "Manage digestion and recovery",
        nutrition: &[
            "If appetite lags, shift some food to liquid: shakes and smoothies",
            "Keep fiber near target but not far above it during a surplus",
            "Spread meals into 4-5 feedings if fullness becomes the limit",
        ],
        workouts: &[
            "Deload a lift if joints complain - two light sessions beat one missed week",
            "Keep easy cardio twice weekly for appetite and work capacity",
        ],
        motivation: "A bulk is a marathon of meals. Boring consistency at the table beats heroic single days.",
    },
    WeekScript {
        focus: "Consolidate gains and assess",
        nutrition: &[
            "Compare your four-week weight trend to the intended rate of gain",
            "Hold the surplus if the trend is on target; trim 100-150 kcal if fast",
            "Keep protein steady regardless of any calorie adjustment",
        ],
        workouts: &[
            "Test rep maxes rather than true 1RMs to gauge progress safely",
            "Photos and measurements tell you what the scale cannot",
        ],
        motivation: "One month of surplus is a foundation, not a finish line. Lock in the habits and carry the momentum into the next block.",
    },
];

fn scripts_for(goal: GoalType) -> &'static [WeekScript; 4] {
    match goal {
        GoalType::Cut => &CUT_WEEKS,
        GoalType::Maintain => &MAINTAIN_WEEKS,
        GoalType::Bulk => &BULK_WEEKS,
    }
}

/// Build the deterministic fallback plan for a goal, using the real
/// computed targets
pub fn template_plan(goal: GoalType, targets: &TdeeResult) -> PlanContent {
    let weeks = scripts_for(goal)
        .iter()
        .enumerate()
        .map(|(idx, script)| WeeklyPlan {
            week: idx as i32 + 1,
            focus: script.focus.to_string(),
            nutrition: script.nutrition.iter().map(|s| s.to_string()).collect(),
            workouts: script.workouts.iter().map(|s| s.to_string()).collect(),
            motivation: script.motivation.to_string(),
        })
        .collect();

    PlanContent {
        summary: PlanSummaryBlock {
            daily_calories: targets.target_calories,
            macros: targets.macros,
            goal_description: goal.description().to_string(),
        },
        weeks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolics::MacroTargets;
    use crate::plan::validate_plan_content;

    fn targets() -> TdeeResult {
        TdeeResult {
            bmr: 1699,
            tdee: 2633,
            target_calories: 2238,
            macros: MacroTargets {
                protein_g: 165,
                carbs_g: 255,
                fat_g: 62,
                fiber_g: 31,
            },
        }
    }

    #[test]
    fn test_templates_pass_schema_validation_for_all_goals() {
        for goal in [GoalType::Cut, GoalType::Maintain, GoalType::Bulk] {
            let plan = template_plan(goal, &targets());
            let errors = validate_plan_content(&plan);
            assert!(errors.is_empty(), "{:?}: {:?}", goal, errors);
        }
    }

    #[test]
    fn test_template_uses_real_targets() {
        let plan = template_plan(GoalType::Cut, &targets());
        assert_eq!(plan.summary.daily_calories, 2238);
        assert_eq!(plan.summary.macros, targets().macros);
        assert_eq!(plan.summary.goal_description, GoalType::Cut.description());
    }

    #[test]
    fn test_goals_get_distinct_scripts() {
        let cut = template_plan(GoalType::Cut, &targets());
        let bulk = template_plan(GoalType::Bulk, &targets());
        assert_ne!(cut.weeks[0].focus, bulk.weeks[0].focus);
    }
}
