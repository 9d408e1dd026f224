//! Plan generation service
//!
//! Orchestrates one plan-generation request as a single sequential pipeline:
//! validate input, compute targets, ask the model for a narrative, validate
//! its shape, fall back to the template generator on any model failure, and
//! persist the result. Model failures never reach the caller as errors; the
//! template fallback guarantees a plan whenever the input validates.

use crate::repositories::fitness_goals::{FitnessGoalsRepository, UpsertFitnessGoals};
use crate::repositories::plans::{CreatePlan, PlanRecord, PlanRepository};
use crate::services::ai::{parse_plan_text, ModelError, PlanModel, PlanPromptContext};
use crate::services::rate_limit::RateLimitPolicy;
use chrono::{DateTime, Utc};
use macroplan_shared::metabolics::{
    calculate_complete_tdee, MacroTargets, TdeeResult, UserGoalData,
};
use macroplan_shared::plan::{current_week, validate_plan_content, PlanContent};
use macroplan_shared::templates::template_plan;
use macroplan_shared::types::GeneratePlanRequest;
use metrics::counter;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Shown when a summary's week has no matching plan entry; the 4-week
/// invariant makes this unreachable in practice
const FALLBACK_FOCUS: &str = "Stay consistent with your plan";

/// Plan generation error taxonomy
///
/// Each boundary reports its own kind: the model client raises
/// [`ModelError`], storage raises `sqlx::Error`. Model and schema failures
/// are absorbed by the template fallback during generation and only surface
/// from the content path itself.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid user data: {}", .0.join("; "))]
    InvalidUserData(Vec<String>),

    #[error("plan generation rate limit exceeded")]
    RateLimitExceeded,

    #[error("plan model failed: {0}")]
    Model(#[from] ModelError),

    #[error("generated plan failed schema validation: {}", .0.join("; "))]
    SchemaValidation(Vec<String>),

    #[error("plan storage failed: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Where the persisted plan narrative came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Ai,
    Template,
}

impl ContentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Ai => "ai",
            ContentSource::Template => "template",
        }
    }
}

/// A persisted plan
#[derive(Debug, Clone)]
pub struct UserPlan {
    pub id: String,
    pub user_id: Uuid,
    pub goal_type: String,
    pub tdee: i32,
    pub target_calories: i32,
    pub macros: MacroTargets,
    pub plan_content: PlanContent,
    pub generated_at: DateTime<Utc>,
    pub is_active: bool,
    pub version: i32,
}

/// Read-only projection of the active plan for dashboard display
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub goal_type: String,
    pub target_calories: i32,
    pub macros: MacroTargets,
    pub current_week: i32,
    pub current_focus: String,
    pub generated_at: DateTime<Utc>,
    pub version: i32,
}

/// Result of a successful generation
///
/// The fitness-goals mirror write is reported separately: its failure is
/// swallowed rather than undoing an already-saved plan, so callers can
/// surface a warning instead of silence.
#[derive(Debug)]
pub struct PlanGenerationOutcome {
    pub plan: UserPlan,
    pub fitness_goals_updated: bool,
    pub content_source: ContentSource,
}

/// Plan service for business logic
pub struct PlanService;

impl PlanService {
    /// Generate, persist, and activate a new plan for a user
    ///
    /// One sequential attempt, no retry loop. The only fatal failures are
    /// invalid input, an exceeded rate limit, and a storage error.
    pub async fn generate_plan(
        pool: &PgPool,
        model: Option<&dyn PlanModel>,
        policy: &dyn RateLimitPolicy,
        req: &GeneratePlanRequest,
    ) -> Result<PlanGenerationOutcome, PlanError> {
        if !policy.allow(pool, req.user_id).await? {
            counter!("plan_generation_total", "outcome" => "rate_limited").increment(1);
            return Err(PlanError::RateLimitExceeded);
        }

        let data = req.goal_input().parse().map_err(|report| {
            counter!("plan_generation_total", "outcome" => "invalid_input").increment(1);
            PlanError::InvalidUserData(report.errors)
        })?;

        let targets = calculate_complete_tdee(&data);
        let (content, source) = Self::resolve_content(model, &data, &targets).await;

        let record = PlanRepository::save(
            pool,
            CreatePlan {
                user_id: req.user_id,
                goal_type: data.goal,
                tdee: targets.tdee,
                target_calories: targets.target_calories,
                macros: targets.macros,
                plan_content: content,
            },
        )
        .await
        .map_err(|e| {
            counter!("plan_generation_total", "outcome" => "storage_error").increment(1);
            PlanError::Storage(e)
        })?;

        let fitness_goals_updated = if req.update_fitness_goals {
            Self::mirror_fitness_goals(pool, req, &data, &targets).await
        } else {
            false
        };

        counter!("plan_generation_total", "outcome" => "success", "source" => source.as_str())
            .increment(1);
        info!(
            user_id = %req.user_id,
            version = record.version,
            source = source.as_str(),
            fitness_goals_updated,
            "Plan generated"
        );

        Ok(PlanGenerationOutcome {
            plan: Self::record_to_plan(record),
            fitness_goals_updated,
            content_source: source,
        })
    }

    /// Produce plan content, preferring the model but guaranteeing a result
    async fn resolve_content(
        model: Option<&dyn PlanModel>,
        data: &UserGoalData,
        targets: &TdeeResult,
    ) -> (PlanContent, ContentSource) {
        let Some(model) = model else {
            return (template_plan(data.goal, targets), ContentSource::Template);
        };

        let ctx = PlanPromptContext {
            age_years: data.age_years,
            weight_kg: data.weight_kg,
            height_cm: data.height_cm,
            sex: data.sex,
            goal: data.goal,
            activity_level: format!("{}", data.activity_multiplier),
            targets: *targets,
        };

        match Self::generate_ai_content(model, &ctx).await {
            Ok(content) => (content, ContentSource::Ai),
            Err(e) => {
                warn!(error = %e, "AI plan generation failed, using template fallback");
                counter!("plan_generation_fallback_total").increment(1);
                (template_plan(data.goal, targets), ContentSource::Template)
            }
        }
    }

    /// Ask the model for content and validate it structurally
    ///
    /// The model's text is untrusted: it must parse as JSON and pass the full
    /// schema check. Any violation rejects the content outright; there is no
    /// partial acceptance.
    async fn generate_ai_content(
        model: &dyn PlanModel,
        ctx: &PlanPromptContext,
    ) -> Result<PlanContent, PlanError> {
        let text = model.generate_plan_text(ctx).await?;
        let content = parse_plan_text(&text)?;

        let errors = validate_plan_content(&content);
        if !errors.is_empty() {
            return Err(PlanError::SchemaValidation(errors));
        }

        Ok(content)
    }

    /// Push the flat macro record to the fitness goals mirror
    ///
    /// Failure here is logged and swallowed: the plan is already saved, and
    /// a missing mirror update must not undo a successful generation.
    async fn mirror_fitness_goals(
        pool: &PgPool,
        req: &GeneratePlanRequest,
        data: &UserGoalData,
        targets: &TdeeResult,
    ) -> bool {
        let input = UpsertFitnessGoals {
            user_id: req.user_id,
            target_calories: targets.target_calories,
            protein_target_g: targets.macros.protein_g,
            carbs_target_g: targets.macros.carbs_g,
            fat_target_g: targets.macros.fat_g,
            fiber_target_g: targets.macros.fiber_g,
            tdee: targets.tdee,
            goal_type: data.goal.as_str().to_string(),
            weight_kg: data.weight_kg,
            height_cm: data.height_cm,
            age_years: data.age_years,
            sex: data.sex.as_str().to_string(),
            activity_level: req.activity_level.clone(),
        };

        match FitnessGoalsRepository::upsert(pool, input).await {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id = %req.user_id, error = %e, "Fitness goals mirror update failed");
                counter!("fitness_goals_mirror_failures_total").increment(1);
                false
            }
        }
    }

    /// Get the user's active plan, if any
    pub async fn get_active_plan(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<UserPlan>, sqlx::Error> {
        let record = PlanRepository::get_active(pool, user_id).await?;
        Ok(record.map(Self::record_to_plan))
    }

    /// Derive the dashboard summary from the active plan
    pub async fn get_plan_summary(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<PlanSummary>, sqlx::Error> {
        let Some(record) = PlanRepository::get_active(pool, user_id).await? else {
            return Ok(None);
        };

        let week = current_week(record.generated_at, Utc::now());
        let current_focus = record
            .plan_content
            .0
            .weeks
            .iter()
            .find(|w| w.week == week)
            .map(|w| w.focus.clone())
            .unwrap_or_else(|| FALLBACK_FOCUS.to_string());

        Ok(Some(PlanSummary {
            goal_type: record.goal_type.clone(),
            target_calories: record.target_calories,
            macros: record.macros(),
            current_week: week,
            current_focus,
            generated_at: record.generated_at,
            version: record.version,
        }))
    }

    /// List a user's plan versions, newest first
    pub async fn get_plan_history(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<UserPlan>, sqlx::Error> {
        let records = PlanRepository::get_history(pool, user_id, limit).await?;
        Ok(records.into_iter().map(Self::record_to_plan).collect())
    }

    /// Deactivate a plan by id
    pub async fn deactivate_plan(pool: &PgPool, plan_id: &str) -> Result<bool, sqlx::Error> {
        PlanRepository::deactivate(pool, plan_id).await
    }

    /// Convert database record to domain model
    fn record_to_plan(record: PlanRecord) -> UserPlan {
        let macros = record.macros();
        UserPlan {
            id: record.id,
            user_id: record.user_id,
            goal_type: record.goal_type,
            tdee: record.tdee,
            target_calories: record.target_calories,
            macros,
            plan_content: record.plan_content.0,
            generated_at: record.generated_at,
            is_active: record.is_active,
            version: record.version,
        }
    }
}
