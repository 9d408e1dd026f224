//! Plan API routes

use crate::error::ApiError;
use crate::services::plans::{PlanService, PlanSummary, UserPlan};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use macroplan_shared::types::{
    ActivePlanResponse, DeactivatePlanResponse, GeneratePlanRequest, GeneratePlanResponse,
    PlanHistoryQuery, PlanHistoryResponse, PlanResponse, PlanSummaryEnvelope, PlanSummaryResponse,
    UserQuery,
};

const DEFAULT_HISTORY_LIMIT: i64 = 10;
const MAX_HISTORY_LIMIT: i64 = 50;

/// Create plan routes
pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_plan))
        .route("/active", get(get_active_plan))
        .route("/summary", get(get_plan_summary))
        .route("/history", get(get_plan_history))
        .route("/:id/deactivate", post(deactivate_plan))
}

/// POST /api/v1/plans/generate - Generate and activate a new plan
async fn generate_plan(
    State(state): State<AppState>,
    Json(req): Json<GeneratePlanRequest>,
) -> Result<Json<GeneratePlanResponse>, ApiError> {
    let outcome =
        PlanService::generate_plan(state.db(), state.model(), state.rate_limit.as_ref(), &req)
            .await?;

    Ok(Json(GeneratePlanResponse {
        plan: plan_to_response(outcome.plan),
        fitness_goals_updated: outcome.fitness_goals_updated,
        content_source: outcome.content_source.as_str().to_string(),
    }))
}

/// GET /api/v1/plans/active - Get the user's active plan
///
/// Responds with `{"plan": null}` when the user has none; that is the
/// normal state for new users, not an error.
async fn get_active_plan(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ActivePlanResponse>, ApiError> {
    let plan = PlanService::get_active_plan(state.db(), query.user_id).await?;

    Ok(Json(ActivePlanResponse {
        plan: plan.map(plan_to_response),
    }))
}

/// GET /api/v1/plans/summary - Get the dashboard summary of the active plan
async fn get_plan_summary(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<PlanSummaryEnvelope>, ApiError> {
    let summary = PlanService::get_plan_summary(state.db(), query.user_id).await?;

    Ok(Json(PlanSummaryEnvelope {
        summary: summary.map(summary_to_response),
    }))
}

/// GET /api/v1/plans/history - List the user's plan versions, newest first
async fn get_plan_history(
    State(state): State<AppState>,
    Query(query): Query<PlanHistoryQuery>,
) -> Result<Json<PlanHistoryResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let plans = PlanService::get_plan_history(state.db(), query.user_id, limit).await?;

    Ok(Json(PlanHistoryResponse {
        plans: plans.into_iter().map(plan_to_response).collect(),
    }))
}

/// POST /api/v1/plans/:id/deactivate - Deactivate a plan
async fn deactivate_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeactivatePlanResponse>, ApiError> {
    let deactivated = PlanService::deactivate_plan(state.db(), &id).await?;

    if deactivated {
        Ok(Json(DeactivatePlanResponse { deactivated: true }))
    } else {
        Err(ApiError::NotFound("Plan not found".to_string()))
    }
}

fn plan_to_response(plan: UserPlan) -> PlanResponse {
    PlanResponse {
        id: plan.id,
        user_id: plan.user_id,
        goal_type: plan.goal_type,
        tdee: plan.tdee,
        target_calories: plan.target_calories,
        macros: plan.macros,
        plan_content: plan.plan_content,
        generated_at: plan.generated_at,
        is_active: plan.is_active,
        version: plan.version,
    }
}

fn summary_to_response(summary: PlanSummary) -> PlanSummaryResponse {
    PlanSummaryResponse {
        goal_type: summary.goal_type,
        target_calories: summary.target_calories,
        macros: summary.macros,
        current_week: summary.current_week,
        current_focus: summary.current_focus,
        generated_at: summary.generated_at,
        version: summary.version,
    }
}
