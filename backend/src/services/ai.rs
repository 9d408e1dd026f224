//! Plan model client
//!
//! Talks to an OpenAI-compatible chat completions endpoint (Ollama serves
//! this API locally) to generate plan narratives. The model's output is
//! untrusted text: it is parsed and schema-validated downstream, and every
//! failure mode here is a typed [`ModelError`] so the orchestrator never
//! has to inspect error messages.

use crate::config::AiConfig;
use async_trait::async_trait;
use macroplan_shared::metabolics::{GoalType, Sex, TdeeResult};
use macroplan_shared::plan::PlanContent;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Context passed to the model: the computed targets plus profile fields
#[derive(Debug, Clone)]
pub struct PlanPromptContext {
    pub age_years: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sex: Sex,
    pub goal: GoalType,
    pub activity_level: String,
    pub targets: TdeeResult,
}

/// Model client error types
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model request timed out")]
    Timeout,

    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model response was not a valid plan: {0}")]
    MalformedResponse(String),
}

/// Abstraction over the plan-generating model
#[async_trait]
pub trait PlanModel: Send + Sync {
    /// Generate the raw plan text for the given context
    async fn generate_plan_text(&self, ctx: &PlanPromptContext) -> Result<String, ModelError>;
}

/// Parse raw model output into plan content
///
/// Accepts the JSON document directly or wrapped in markdown code fences.
/// Missing top-level `summary`/`weeks` fields are a parse failure; the
/// caller treats this as recoverable.
pub fn parse_plan_text(text: &str) -> Result<PlanContent, ModelError> {
    let stripped = strip_code_fences(text);
    serde_json::from_str(stripped).map_err(|e| ModelError::MalformedResponse(e.to_string()))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag after the opening fence
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .trim_end_matches('`')
        .trim()
}

// ============================================================================
// Chat Completion Client
// ============================================================================

const SYSTEM_PROMPT: &str = "You are a fitness and nutrition coach. \
Respond with a single JSON object and nothing else. The object must have a \
'summary' field {daily_calories, macros {protein_g, carbs_g, fat_g, fiber_g}, \
goal_description} and a 'weeks' array of exactly 4 entries, each with fields \
{week (1-4, sequential), focus, nutrition (array of tips), workouts (array of \
tips), motivation}. The summary numbers must exactly match the targets given \
by the user.";

/// HTTP plan model over an OpenAI-compatible chat completions API
pub struct ChatCompletionModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionModel {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn build_prompt(ctx: &PlanPromptContext) -> String {
        let m = &ctx.targets.macros;
        format!(
            "Create a 4-week {goal} plan for this person:\n\
             - Age: {age}, sex: {sex}\n\
             - Weight: {weight:.1} kg, height: {height:.1} cm\n\
             - Activity multiplier: {activity}\n\
             - TDEE: {tdee} kcal\n\
             - Daily calorie target: {target} kcal\n\
             - Macro targets: {protein}g protein, {carbs}g carbs, {fat}g fat, {fiber}g fiber\n\
             Use daily_calories={target} and these exact macro values in the summary.",
            goal = ctx.goal.as_str(),
            age = ctx.age_years,
            sex = ctx.sex.as_str(),
            weight = ctx.weight_kg,
            height = ctx.height_cm,
            activity = ctx.activity_level,
            tdee = ctx.targets.tdee,
            target = ctx.targets.target_calories,
            protein = m.protein_g,
            carbs = m.carbs_g,
            fat = m.fat_g,
            fiber = m.fiber_g,
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl PlanModel for ChatCompletionModel {
    async fn generate_plan_text(&self, ctx: &PlanPromptContext) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::build_prompt(ctx),
                },
            ],
            stream: false,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut req = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout
            } else {
                ModelError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ModelError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroplan_shared::metabolics::MacroTargets;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_context() -> PlanPromptContext {
        PlanPromptContext {
            age_years: 30,
            weight_kg: 75.0,
            height_cm: 175.0,
            sex: Sex::Male,
            goal: GoalType::Cut,
            activity_level: "1.55".to_string(),
            targets: TdeeResult {
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
        }
    }

    fn test_model(base_url: &str, timeout_secs: u64) -> ChatCompletionModel {
        ChatCompletionModel::new(&AiConfig {
            enabled: true,
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
            api_key: None,
            timeout_secs,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_decodes_chat_completion_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"plan\": true}"}}]
            })))
            .mount(&server)
            .await;

        let model = test_model(&server.uri(), 5);
        let text = model.generate_plan_text(&test_context()).await.unwrap();
        assert_eq!(text, "{\"plan\": true}");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let model = test_model(&server.uri(), 1);
        let err = model.generate_plan_text(&test_context()).await.unwrap_err();
        assert!(matches!(err, ModelError::Timeout));
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let model = test_model(&server.uri(), 5);
        let err = model.generate_plan_text(&test_context()).await.unwrap_err();
        match err {
            ModelError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": ""}}]
            })))
            .mount(&server)
            .await;

        let model = test_model(&server.uri(), 5);
        let err = model.generate_plan_text(&test_context()).await.unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_plan_text("Here is your plan! Week 1: eat well."),
            Err(ModelError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_weeks_field() {
        let err = parse_plan_text(r#"{"summary": {"daily_calories": 2000}}"#).unwrap_err();
        assert!(matches!(err, ModelError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_strips_markdown_fences() {
        let json = r#"{"summary":{"daily_calories":2238,"macros":{"protein_g":165,"carbs_g":255,"fat_g":62,"fiber_g":31},"goal_description":"cut"},"weeks":[]}"#;
        let fenced = format!("```json\n{json}\n```");
        let content = parse_plan_text(&fenced).unwrap();
        assert_eq!(content.summary.daily_calories, 2238);
    }
}
