//! API request/response types
//!
//! Wire types shared between the backend and its clients.

use crate::metabolics::{GoalInput, MacroTargets};
use crate::plan::PlanContent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Common Types
// ============================================================================

/// Error response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

// ============================================================================
// Plan Generation
// ============================================================================

/// Request to generate a new plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePlanRequest {
    pub user_id: Uuid,
    pub age_years: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sex: String,
    /// Activity multiplier encoded as a string, e.g. "1.55"
    pub activity_level: String,
    pub goal_type: String,
    /// Mirror the computed macro targets into the fitness goals record
    #[serde(default)]
    pub update_fitness_goals: bool,
}

impl GeneratePlanRequest {
    /// Extract the calculator input fields
    pub fn goal_input(&self) -> GoalInput {
        GoalInput {
            age_years: self.age_years,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            sex: self.sex.clone(),
            activity_level: self.activity_level.clone(),
            goal_type: self.goal_type.clone(),
        }
    }
}

/// A persisted plan as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
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

/// Result of a plan generation request
///
/// `fitness_goals_updated` is reported separately so callers can surface a
/// warning when the primary save succeeded but the mirror write did not.
#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratePlanResponse {
    pub plan: PlanResponse,
    pub fitness_goals_updated: bool,
    /// "ai" or "template"
    pub content_source: String,
}

/// Active plan lookup; `plan` is null when the user has none
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivePlanResponse {
    pub plan: Option<PlanResponse>,
}

/// Lightweight plan projection for dashboard display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummaryResponse {
    pub goal_type: String,
    pub target_calories: i32,
    pub macros: MacroTargets,
    pub current_week: i32,
    pub current_focus: String,
    pub generated_at: DateTime<Utc>,
    pub version: i32,
}

/// Summary lookup envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanSummaryEnvelope {
    pub summary: Option<PlanSummaryResponse>,
}

/// Plan history listing, newest version first
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanHistoryResponse {
    pub plans: Vec<PlanResponse>,
}

/// Query parameters identifying a user
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

/// Query parameters for plan history
#[derive(Debug, Deserialize)]
pub struct PlanHistoryQuery {
    pub user_id: Uuid,
    pub limit: Option<i64>,
}

/// Plan deactivation result
#[derive(Debug, Serialize, Deserialize)]
pub struct DeactivatePlanResponse {
    pub deactivated: bool,
}
