//! Fitness goals mirror repository
//!
//! A single flat record per user holding the latest macro targets, consumed
//! by dashboard displays. This service only ever writes it: the record is
//! overwritten (not versioned) on each plan generation that requests the
//! mirror update.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Flat macro-target record mirrored from a generated plan
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FitnessGoalsRecord {
    pub user_id: Uuid,
    pub target_calories: i32,
    pub protein_target_g: i32,
    pub carbs_target_g: i32,
    pub fat_target_g: i32,
    pub fiber_target_g: i32,
    pub tdee: i32,
    pub goal_type: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: i32,
    pub sex: String,
    pub activity_level: String,
    pub updated_at: DateTime<Utc>,
}

/// Input for upserting the fitness goals record
#[derive(Debug, Clone)]
pub struct UpsertFitnessGoals {
    pub user_id: Uuid,
    pub target_calories: i32,
    pub protein_target_g: i32,
    pub carbs_target_g: i32,
    pub fat_target_g: i32,
    pub fiber_target_g: i32,
    pub tdee: i32,
    pub goal_type: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: i32,
    pub sex: String,
    pub activity_level: String,
}

/// Fitness goals repository
pub struct FitnessGoalsRepository;

impl FitnessGoalsRepository {
    /// Overwrite the user's fitness goals with the latest targets
    pub async fn upsert(
        pool: &PgPool,
        input: UpsertFitnessGoals,
    ) -> Result<FitnessGoalsRecord, sqlx::Error> {
        sqlx::query_as::<_, FitnessGoalsRecord>(
            r#"
            INSERT INTO fitness_goals (
                user_id, target_calories, protein_target_g, carbs_target_g,
                fat_target_g, fiber_target_g, tdee, goal_type,
                weight_kg, height_cm, age_years, sex, activity_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id) DO UPDATE SET
                target_calories = EXCLUDED.target_calories,
                protein_target_g = EXCLUDED.protein_target_g,
                carbs_target_g = EXCLUDED.carbs_target_g,
                fat_target_g = EXCLUDED.fat_target_g,
                fiber_target_g = EXCLUDED.fiber_target_g,
                tdee = EXCLUDED.tdee,
                goal_type = EXCLUDED.goal_type,
                weight_kg = EXCLUDED.weight_kg,
                height_cm = EXCLUDED.height_cm,
                age_years = EXCLUDED.age_years,
                sex = EXCLUDED.sex,
                activity_level = EXCLUDED.activity_level,
                updated_at = NOW()
            RETURNING user_id, target_calories, protein_target_g, carbs_target_g,
                      fat_target_g, fiber_target_g, tdee, goal_type,
                      weight_kg, height_cm, age_years, sex, activity_level,
                      updated_at
            "#,
        )
        .bind(input.user_id)
        .bind(input.target_calories)
        .bind(input.protein_target_g)
        .bind(input.carbs_target_g)
        .bind(input.fat_target_g)
        .bind(input.fiber_target_g)
        .bind(input.tdee)
        .bind(&input.goal_type)
        .bind(input.weight_kg)
        .bind(input.height_cm)
        .bind(input.age_years)
        .bind(&input.sex)
        .bind(&input.activity_level)
        .fetch_one(pool)
        .await
    }
}
