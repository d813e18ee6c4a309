//! Advisory oracle for goal validation and check-in feedback.
//!
//! Backed by an OpenAI-compatible chat completion endpoint. Every
//! call is bounded by a timeout and degrades to a neutral verdict on
//! any failure, so a slow or broken endpoint can never stall or fail
//! the state transition that asked for advice.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AdvisoryConfig;
use crate::model::{GoalVerdict, Track};

/// Inputs for validating a participant's goal.
#[derive(Debug, Clone, Serialize)]
pub struct GoalParams {
    pub track: Track,
    pub start_weight: f64,
    pub start_waist: f64,
    pub height: Option<f64>,
    pub target_weight: f64,
    pub target_waist: f64,
    pub duration_days: i64,
}

/// Oracle verdict on a proposed goal.
#[derive(Debug, Clone, Deserialize)]
pub struct GoalValidation {
    pub result: GoalVerdict,
    pub feedback: String,
}

impl GoalValidation {
    /// The verdict used when the oracle is unreachable or disabled.
    pub fn neutral() -> Self {
        Self {
            result: GoalVerdict::Realistic,
            feedback: "Goal accepted.".to_string(),
        }
    }
}

/// Inputs for per-check-in advice.
#[derive(Debug, Clone, Serialize)]
pub struct AdviceParams {
    pub track: Track,
    pub start_weight: f64,
    pub start_waist: f64,
    pub current_weight: f64,
    pub current_waist: f64,
    pub target_weight: f64,
    pub target_waist: f64,
    pub checkin_number: i64,
}

/// Structured feedback attached to a check-in.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckinAdvice {
    pub progress_assessment: String,
    pub body_composition_notes: String,
    pub nutrition_advice: String,
    pub training_advice: String,
    pub motivational_message: String,
    #[serde(default)]
    pub warning_flags: Vec<String>,
}

pub trait AdvisoryOracle {
    /// Judge a goal. Never fails; unreachable oracles answer
    /// [`GoalValidation::neutral`].
    fn validate_goal(&self, params: &GoalParams) -> GoalValidation;

    /// Advice for a fresh check-in. `None` when no advice could be
    /// produced; the check-in itself is already committed either way.
    fn checkin_advice(&self, params: &AdviceParams) -> Option<CheckinAdvice>;

    /// Model identifier recorded alongside stored advice.
    fn model_name(&self) -> &str;
}

/// Oracle that always answers neutrally. Used when no API key is
/// configured.
pub struct NullOracle;

impl AdvisoryOracle for NullOracle {
    fn validate_goal(&self, _params: &GoalParams) -> GoalValidation {
        GoalValidation::neutral()
    }

    fn checkin_advice(&self, _params: &AdviceParams) -> Option<CheckinAdvice> {
        None
    }

    fn model_name(&self) -> &str {
        "none"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
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
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Oracle backed by an OpenAI-compatible HTTP endpoint.
pub struct HttpOracle {
    config: AdvisoryConfig,
    client: reqwest::blocking::Client,
}

impl HttpOracle {
    pub fn new(config: AdvisoryConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Send one prompt and extract the assistant message content.
    fn complete(&self, system: &str, user: String) -> Option<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<ChatResponse>());
        match response {
            Ok(body) => body.choices.into_iter().next().map(|c| c.message.content),
            Err(err) => {
                warn!("advisory oracle call failed: {err}");
                None
            }
        }
    }
}

const GOAL_SYSTEM_PROMPT: &str = "You are a fitness coach reviewing a body-recomposition goal. \
     Answer with a JSON object: {\"result\": \"realistic\"|\"too_aggressive\"|\"too_easy\", \
     \"feedback\": \"...\"}. No other text.";

const ADVICE_SYSTEM_PROMPT: &str = "You are a fitness coach reviewing a progress check-in. \
     Answer with a JSON object with string fields progress_assessment, body_composition_notes, \
     nutrition_advice, training_advice, motivational_message and an optional warning_flags \
     string array. No other text.";

impl AdvisoryOracle for HttpOracle {
    fn validate_goal(&self, params: &GoalParams) -> GoalValidation {
        let user = match serde_json::to_string(params) {
            Ok(json) => json,
            Err(err) => {
                warn!("could not serialize goal params: {err}");
                return GoalValidation::neutral();
            }
        };
        let Some(content) = self.complete(GOAL_SYSTEM_PROMPT, user) else {
            return GoalValidation::neutral();
        };
        match serde_json::from_str::<GoalValidation>(&content) {
            Ok(validation) => validation,
            Err(err) => {
                warn!("unparseable goal verdict, treating as realistic: {err}");
                GoalValidation::neutral()
            }
        }
    }

    fn checkin_advice(&self, params: &AdviceParams) -> Option<CheckinAdvice> {
        let user = serde_json::to_string(params).ok()?;
        let content = self.complete(ADVICE_SYSTEM_PROMPT, user)?;
        match serde_json::from_str::<CheckinAdvice>(&content) {
            Ok(advice) => Some(advice),
            Err(err) => {
                warn!("unparseable check-in advice, skipping: {err}");
                None
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GoalParams {
        GoalParams {
            track: Track::Cut,
            start_weight: 100.0,
            start_waist: 100.0,
            height: Some(180.0),
            target_weight: 90.0,
            target_waist: 90.0,
            duration_days: 180,
        }
    }

    fn oracle_for(server: &mockito::ServerGuard) -> HttpOracle {
        HttpOracle::new(AdvisoryConfig {
            base_url: server.url(),
            api_key: "test-key".into(),
            model: "test-model".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn parses_verdict_from_completion() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"content":
                "{\"result\":\"too_aggressive\",\"feedback\":\"Slow down\"}"}}]}"#,
            )
            .create();

        let validation = oracle_for(&server).validate_goal(&params());
        assert_eq!(validation.result, GoalVerdict::TooAggressive);
        assert_eq!(validation.feedback, "Slow down");
    }

    #[test]
    fn server_error_degrades_to_neutral() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .create();

        let validation = oracle_for(&server).validate_goal(&params());
        assert_eq!(validation.result, GoalVerdict::Realistic);
    }

    #[test]
    fn garbage_content_degrades_to_neutral() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"sure, sounds good!"}}]}"#)
            .create();

        let validation = oracle_for(&server).validate_goal(&params());
        assert_eq!(validation.result, GoalVerdict::Realistic);
    }

    #[test]
    fn null_oracle_is_neutral() {
        let oracle = NullOracle;
        assert_eq!(oracle.validate_goal(&params()).result, GoalVerdict::Realistic);
        assert!(oracle
            .checkin_advice(&AdviceParams {
                track: Track::Cut,
                start_weight: 100.0,
                start_waist: 100.0,
                current_weight: 95.0,
                current_waist: 97.0,
                target_weight: 90.0,
                target_waist: 90.0,
                checkin_number: 1,
            })
            .is_none());
    }
}
