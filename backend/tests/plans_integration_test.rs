//! Integration tests for the plan API
//!
//! AI generation is disabled in the test config, so every generate call
//! exercises the template fallback path end to end.

mod common;

use axum::http::StatusCode;
use macroplan_backend::config::{AiConfig, PlanPolicyConfig};
use macroplan_backend::services::ai::ChatCompletionModel;
use macroplan_backend::services::rate_limit::{DailyQuota, RateLimitPolicy};
use macroplan_shared::metabolics::{GoalType, MacroTargets, TdeeResult};
use macroplan_shared::templates::template_plan;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generate_body(user_id: Uuid) -> String {
    serde_json::json!({
        "user_id": user_id,
        "age_years": 30,
        "weight_kg": 75.0,
        "height_cm": 175.0,
        "sex": "male",
        "activity_level": "1.55",
        "goal_type": "cut",
        "update_fitness_goals": true
    })
    .to_string()
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_generate_plan_returns_template_content() {
    let app = common::TestApp::new().await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    let (status, body) = app
        .post("/api/v1/plans/generate", &generate_body(user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["content_source"], "template");
    assert_eq!(json["fitness_goals_updated"], true);
    assert_eq!(json["plan"]["version"], 1);
    assert_eq!(json["plan"]["is_active"], true);
    assert_eq!(json["plan"]["goal_type"], "cut");
    assert_eq!(json["plan"]["plan_content"]["weeks"].as_array().unwrap().len(), 4);
    // Mifflin-St Jeor for the fixture profile, 1.55 multiplier, 15% cut
    assert_eq!(json["plan"]["tdee"], 2633);
    assert_eq!(json["plan"]["target_calories"], 2238);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_second_generation_deactivates_the_first() {
    let app = common::TestApp::new().await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    let (status, first) = app
        .post("/api/v1/plans/generate", &generate_body(user_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let first: Value = serde_json::from_str(&first).unwrap();

    let (status, second) = app
        .post("/api/v1/plans/generate", &generate_body(user_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let second: Value = serde_json::from_str(&second).unwrap();

    assert_eq!(first["plan"]["version"], 1);
    assert_eq!(second["plan"]["version"], 2);

    // Only the newest version may be active
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM user_plans WHERE user_id = $1 AND is_active",
    )
    .bind(user_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(count, 1);

    let (status, active) = app
        .get(&format!("/api/v1/plans/active?user_id={}", user_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let active: Value = serde_json::from_str(&active).unwrap();
    assert_eq!(active["plan"]["version"], 2);
    assert_eq!(active["plan"]["id"], format!("{}_v2", user_id));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_generate_rejects_invalid_user_data() {
    let app = common::TestApp::new().await;
    let user_id = Uuid::new_v4();

    let body = serde_json::json!({
        "user_id": user_id,
        "age_years": 10,
        "weight_kg": 20.0,
        "height_cm": 175.0,
        "sex": "other",
        "activity_level": "3.5",
        "goal_type": "shred"
    })
    .to_string();

    let (status, body) = app.post("/api/v1/plans/generate", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "INVALID_USER_DATA");
    // All violations reported at once
    let message = json["error"]["message"].as_str().unwrap();
    assert!(message.contains("Age must be"));
    assert!(message.contains("Weight must be"));
    assert!(message.contains("Sex must be"));
    assert!(message.contains("Activity level must be"));
    assert!(message.contains("Goal type must be"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_active_plan_is_null_for_unknown_user() {
    let app = common::TestApp::new().await;

    let (status, body) = app
        .get(&format!("/api/v1/plans/active?user_id={}", Uuid::new_v4()))
        .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert!(json["plan"].is_null());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_summary_reports_first_week_for_fresh_plan() {
    let app = common::TestApp::new().await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    app.post("/api/v1/plans/generate", &generate_body(user_id))
        .await;

    let (status, body) = app
        .get(&format!("/api/v1/plans/summary?user_id={}", user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["summary"]["current_week"], 1);
    assert_eq!(json["summary"]["goal_type"], "cut");
    assert!(json["summary"]["current_focus"].as_str().unwrap().len() > 0);
    assert!(json["summary"]["macros"]["protein_g"].as_i64().unwrap() > 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_history_is_newest_first() {
    let app = common::TestApp::new().await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    for _ in 0..3 {
        app.post("/api/v1/plans/generate", &generate_body(user_id))
            .await;
    }

    let (status, body) = app
        .get(&format!("/api/v1/plans/history?user_id={}", user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let plans = json["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[0]["version"], 3);
    assert_eq!(plans[1]["version"], 2);
    assert_eq!(plans[2]["version"], 1);
    assert_eq!(plans[0]["is_active"], true);
    assert_eq!(plans[1]["is_active"], false);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_history_limit_is_applied() {
    let app = common::TestApp::new().await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    for _ in 0..3 {
        app.post("/api/v1/plans/generate", &generate_body(user_id))
            .await;
    }

    let (status, body) = app
        .get(&format!("/api/v1/plans/history?user_id={}&limit=2", user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["plans"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_deactivate_plan() {
    let app = common::TestApp::new().await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    app.post("/api/v1/plans/generate", &generate_body(user_id))
        .await;

    let plan_id = format!("{}_v1", user_id);
    let (status, body) = app
        .post(&format!("/api/v1/plans/{}/deactivate", plan_id), "{}")
        .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["deactivated"], true);

    let (status, body) = app
        .get(&format!("/api/v1/plans/active?user_id={}", user_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert!(json["plan"].is_null());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_deactivate_unknown_plan_is_404() {
    let app = common::TestApp::new().await;

    let (status, _) = app
        .post(
            &format!("/api/v1/plans/{}_v99/deactivate", Uuid::new_v4()),
            "{}",
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_daily_quota_denies_on_exhaustion_and_inside_interval() {
    let app = common::TestApp::new().await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    // No plans yet: any quota allows
    let quota = DailyQuota::new(1, 0);
    assert!(quota.allow(&app.pool, user_id).await.unwrap());

    app.post("/api/v1/plans/generate", &generate_body(user_id))
        .await;

    // One plan today exhausts a quota of one
    assert!(!quota.allow(&app.pool, user_id).await.unwrap());

    // Quota has headroom and the interval is zero: allowed
    let roomy = DailyQuota::new(5, 0);
    assert!(roomy.allow(&app.pool, user_id).await.unwrap());

    // Quota has headroom but the plan was generated seconds ago: the
    // minimum interval denies
    let spaced = DailyQuota::new(5, 10);
    assert!(!spaced.allow(&app.pool, user_id).await.unwrap());

    // Other users are unaffected
    assert!(quota.allow(&app.pool, Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_enabled_rate_limit_maps_to_429() {
    let app = common::TestApp::with_plan_policy(PlanPolicyConfig {
        rate_limit_enabled: true,
        max_plans_per_day: 1,
        min_interval_minutes: 0,
    })
    .await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    let (status, _) = app
        .post("/api/v1/plans/generate", &generate_body(user_id))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/v1/plans/generate", &generate_body(user_id))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "RATE_LIMIT_EXCEEDED");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_generate_uses_model_content_when_available() {
    // Model endpoint returning a structurally valid plan document
    let server = MockServer::start().await;
    let plan_json = serde_json::to_string(&template_plan(
        GoalType::Cut,
        &TdeeResult {
            bmr: 1699,
            tdee: 2633,
            target_calories: 2238,
            macros: MacroTargets {
                protein_g: 165,
                carbs_g: 255,
                fat_g: 62,
                fiber_g: 31,
            },
        },
    ))
    .unwrap();
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": plan_json}}]
        })))
        .mount(&server)
        .await;

    let model = ChatCompletionModel::new(&AiConfig {
        enabled: true,
        base_url: server.uri(),
        model: "test-model".to_string(),
        api_key: None,
        timeout_secs: 5,
    })
    .unwrap();

    let app = common::TestApp::with_model(Arc::new(model)).await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    let (status, body) = app
        .post("/api/v1/plans/generate", &generate_body(user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["content_source"], "ai");
    assert_eq!(json["plan"]["plan_content"]["weeks"].as_array().unwrap().len(), 4);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_fitness_goals_mirror_row_is_written() {
    let app = common::TestApp::new().await;
    app.cleanup().await;
    let user_id = Uuid::new_v4();

    app.post("/api/v1/plans/generate", &generate_body(user_id))
        .await;

    let (goal_type, target_calories): (String, i32) = sqlx::query_as(
        "SELECT goal_type, target_calories FROM fitness_goals WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();

    assert_eq!(goal_type, "cut");
    assert_eq!(target_calories, 2238);
}
