//! OpenAI-backed classifier for routing, validation, and action ranking.
//!
//! Everything the model returns crosses the same trust boundary: text is
//! stripped of code fences, parsed into the closed enums, and anything the
//! parser rejects falls back to the caller's safe default.

use std::time::Duration;

use tracing::debug;

use crate::orchestrator::classifier::{
    Classifier, RouteContext, RouteDecision, ValidationContext, ValidationVerdict,
};
use crate::orchestrator::error::{classifier_error, GraphResult};
use crate::orchestrator::node::{BoxFuture, RouteTarget};
use crate::orchestrator::plan::ActionKind;

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const ROUTE_SYSTEM_PROMPT: &str = "You route messages in a travel planning assistant. \
Reply with exactly one label from: DESTINATION_PLANNER, PLANNER, FLIGHT, HOTEL, \
ACTIVITY, ITINERARY, VALIDATOR, END. Use DESTINATION_PLANNER when the user has no \
destination yet, PLANNER for broad trip requests, and END only when there is nothing \
left to do. No punctuation, no explanation.";

const VALIDATE_SYSTEM_PROMPT: &str = "You judge whether a travel planning session has \
satisfied the user's request. Reply with JSON only: \
{\"satisfied\": true|false, \"next_target\": \"FLIGHT|HOTEL|ACTIVITY|ITINERARY|PLANNER|END\"}. \
Omit next_target when satisfied is true.";

const RANK_SYSTEM_PROMPT: &str = "You rank follow-up actions for a travel planning \
assistant by how useful they are right now. Reply with a JSON array of the given \
action names, most useful first. Only use names from the provided list.";

/// Configuration for the OpenAI classifier.
#[derive(Clone, Debug)]
pub struct OpenAiClassifierConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl OpenAiClassifierConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            base_url: OPENAI_DEFAULT_BASE_URL.to_string(),
            timeout_ms: 15_000,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Classifier over the OpenAI chat completions API.
#[derive(Clone, Debug)]
pub struct OpenAiClassifier {
    model: String,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
}

impl OpenAiClassifier {
    pub fn new(config: OpenAiClassifierConfig) -> GraphResult<Self> {
        let api_key = resolve_api_key(config.api_key)?;
        if config.model.trim().is_empty() {
            return Err(classifier_error("model is required"));
        }
        Ok(Self {
            model: config.model,
            api_key,
            base_url: config.base_url,
            timeout_ms: config.timeout_ms.max(1),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn complete(&self, system: &str, user: String) -> GraphResult<String> {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(self.timeout_ms))
            .build();

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0.0,
        });

        let response = agent
            .post(&self.endpoint())
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(payload);

        let response_json = match response {
            Ok(resp) => resp
                .into_json::<serde_json::Value>()
                .map_err(|err| classifier_error(format!("decode response failed: {}", err)))?,
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                let detail = parse_error_message(&body).unwrap_or(body);
                return Err(classifier_error(format!(
                    "openai request failed with status {}: {}",
                    status, detail
                )));
            }
            Err(err) => {
                return Err(classifier_error(format!("openai request failed: {}", err)));
            }
        };

        let content = response_json
            .get("choices")
            .and_then(|choices| choices.as_array())
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| classifier_error("missing message content in response"))?;
        Ok(strip_code_fences(content).to_string())
    }
}

impl Classifier for OpenAiClassifier {
    fn route(&self, context: RouteContext) -> BoxFuture<'_, GraphResult<RouteDecision>> {
        Box::pin(async move {
            let user = serde_json::to_string(&context)
                .map_err(|err| classifier_error(format!("encode context failed: {}", err)))?;
            let answer = self.complete(ROUTE_SYSTEM_PROMPT, user)?;
            debug!(answer = %answer, "route classification answer");
            // An off-vocabulary label gets the safe default rather than an
            // error; only transport failures are worth surfacing.
            let target = RouteTarget::parse(&answer).unwrap_or(RouteTarget::Planner);
            Ok(RouteDecision { target })
        })
    }

    fn validate(
        &self,
        context: ValidationContext,
    ) -> BoxFuture<'_, GraphResult<ValidationVerdict>> {
        Box::pin(async move {
            let user = serde_json::to_string(&context)
                .map_err(|err| classifier_error(format!("encode context failed: {}", err)))?;
            let answer = self.complete(VALIDATE_SYSTEM_PROMPT, user)?;
            debug!(answer = %answer, "validation answer");
            Ok(parse_verdict(&answer))
        })
    }

    fn rank_actions(
        &self,
        context: ValidationContext,
        available: Vec<ActionKind>,
    ) -> BoxFuture<'_, GraphResult<Vec<ActionKind>>> {
        Box::pin(async move {
            let names: Vec<&str> = available.iter().map(|action| action.as_str()).collect();
            let user = serde_json::json!({
                "context": context,
                "actions": names,
            })
            .to_string();
            let answer = self.complete(RANK_SYSTEM_PROMPT, user)?;
            debug!(answer = %answer, "ranking answer");
            Ok(parse_ranked(&answer, &available))
        })
    }
}

fn resolve_api_key(explicit: Option<String>) -> GraphResult<String> {
    if let Some(key) = explicit {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }
    Err(classifier_error(
        "missing OPENAI_API_KEY (provide config.api_key or environment variable)",
    ))
}

/// Models wrap JSON answers in markdown fences often enough that stripping
/// them here is cheaper than prompting harder.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Lenient verdict parse. An unreadable answer counts as satisfied, the same
/// default the Validator applies to a transport failure.
fn parse_verdict(answer: &str) -> ValidationVerdict {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(answer) else {
        return ValidationVerdict::satisfied();
    };
    let satisfied = value
        .get("satisfied")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    if satisfied {
        return ValidationVerdict::satisfied();
    }
    let next_target = value
        .get("next_target")
        .and_then(|v| v.as_str())
        .and_then(RouteTarget::parse);
    ValidationVerdict {
        satisfied: false,
        next_target,
    }
}

/// Parse a ranking answer against the candidate set. Unknown names drop out;
/// an empty or unreadable answer yields the original order.
fn parse_ranked(answer: &str, available: &[ActionKind]) -> Vec<ActionKind> {
    let parsed: Vec<ActionKind> = serde_json::from_str::<Vec<String>>(answer)
        .unwrap_or_default()
        .iter()
        .filter_map(|name| ActionKind::parse(name))
        .filter(|action| available.contains(action))
        .collect();
    if parsed.is_empty() {
        available.to_vec()
    } else {
        parsed
    }
}

fn parse_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
        .map(|message| message.to_string())
}
