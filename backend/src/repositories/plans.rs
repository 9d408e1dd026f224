//! Plan repository for database operations
//!
//! Owns the `user_plans` table: versioned plan documents with a
//! single-active-plan invariant per user. The activation swap happens inside
//! one transaction, so readers never observe two active plans or a
//! half-applied swap. A per-user advisory lock serializes concurrent saves,
//! which keeps the read-max-then-increment version assignment race-free.

use chrono::{DateTime, Utc};
use macroplan_shared::metabolics::{GoalType, MacroTargets};
use macroplan_shared::plan::PlanContent;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Plan record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanRecord {
    /// Derived as `{user_id}_v{version}`
    pub id: String,
    pub user_id: Uuid,
    pub goal_type: String,
    pub tdee: i32,
    pub target_calories: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub fiber_g: i32,
    pub plan_content: Json<PlanContent>,
    pub generated_at: DateTime<Utc>,
    pub is_active: bool,
    pub version: i32,
}

impl PlanRecord {
    pub fn macros(&self) -> MacroTargets {
        MacroTargets {
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            fiber_g: self.fiber_g,
        }
    }
}

/// Input for saving a new plan version
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub user_id: Uuid,
    pub goal_type: GoalType,
    pub tdee: i32,
    pub target_calories: i32,
    pub macros: MacroTargets,
    pub plan_content: PlanContent,
}

const PLAN_COLUMNS: &str = "id, user_id, goal_type, tdee, target_calories, \
     protein_g, carbs_g, fat_g, fiber_g, plan_content, generated_at, \
     is_active, version";

/// Plan repository
pub struct PlanRepository;

impl PlanRepository {
    /// Save a new plan version, deactivating all prior versions
    ///
    /// Runs in one transaction: take a per-user advisory lock, compute the
    /// next version, flip every currently-active plan to inactive, insert
    /// the new plan as active. The transaction either fully commits or fully
    /// fails; no partial state is externally observable.
    pub async fn save(pool: &PgPool, input: CreatePlan) -> Result<PlanRecord, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Serialize concurrent saves for the same user
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(input.user_id.to_string())
            .execute(&mut *tx)
            .await?;

        let version: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM user_plans WHERE user_id = $1",
        )
        .bind(input.user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE user_plans SET is_active = FALSE WHERE user_id = $1 AND is_active")
            .bind(input.user_id)
            .execute(&mut *tx)
            .await?;

        let id = format!("{}_v{}", input.user_id, version);
        let record = sqlx::query_as::<_, PlanRecord>(&format!(
            r#"
            INSERT INTO user_plans (
                id, user_id, goal_type, tdee, target_calories,
                protein_g, carbs_g, fat_g, fiber_g, plan_content,
                is_active, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, $11)
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(input.user_id)
        .bind(input.goal_type.as_str())
        .bind(input.tdee)
        .bind(input.target_calories)
        .bind(input.macros.protein_g)
        .bind(input.macros.carbs_g)
        .bind(input.macros.fat_g)
        .bind(input.macros.fiber_g)
        .bind(Json(&input.plan_content))
        .bind(version)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(record)
    }

    /// Get the single active plan for a user
    ///
    /// Returns `None` for users with no plan; that is the normal state for
    /// new users, not an error. Highest version wins if duplicates ever
    /// exist.
    pub async fn get_active(pool: &PgPool, user_id: Uuid) -> Result<Option<PlanRecord>, sqlx::Error> {
        sqlx::query_as::<_, PlanRecord>(&format!(
            r#"
            SELECT {PLAN_COLUMNS}
            FROM user_plans
            WHERE user_id = $1 AND is_active
            ORDER BY version DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// List a user's plan versions, newest first
    pub async fn get_history(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PlanRecord>, sqlx::Error> {
        sqlx::query_as::<_, PlanRecord>(&format!(
            r#"
            SELECT {PLAN_COLUMNS}
            FROM user_plans
            WHERE user_id = $1
            ORDER BY version DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Set a plan's activation flag
    pub async fn set_activation(
        pool: &PgPool,
        plan_id: &str,
        is_active: bool,
    ) -> Result<Option<PlanRecord>, sqlx::Error> {
        sqlx::query_as::<_, PlanRecord>(&format!(
            r#"
            UPDATE user_plans SET is_active = $2
            WHERE id = $1
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(plan_id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }

    /// Deactivate a plan by id
    pub async fn deactivate(pool: &PgPool, plan_id: &str) -> Result<bool, sqlx::Error> {
        let record = Self::set_activation(pool, plan_id, false).await?;
        Ok(record.is_some())
    }

    /// Count plans generated today (calendar day, server time)
    pub async fn count_today(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM user_plans
            WHERE user_id = $1 AND generated_at::date = CURRENT_DATE
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Timestamp of the user's most recent generation, if any
    pub async fn latest_generated_at(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(generated_at) FROM user_plans WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}
