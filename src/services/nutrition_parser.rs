//! Free-text food descriptions to structured nutrition candidates.

use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::models::food_entry::{FoodItemCandidate, Micronutrients};
use crate::services::llm::{BackendError, CompletionBackend};

pub const SYSTEM_PROMPT: &str = r#"You are a nutritional analysis AI. Parse food descriptions and return nutritional data in JSON format.

Return ONLY a JSON array of food items with this exact structure:
[
  {
    "food_name": "descriptive name with quantity",
    "calories": number,
    "carbs": number,
    "protein": number,
    "fat": number,
    "quantity": "serving size description",
    "vitamin_a": number (mcg RAE),
    "vitamin_c": number (mg),
    "vitamin_d": number (mcg),
    "calcium": number (mg),
    "iron": number (mg),
    "fiber": number (g)
  }
]

Rules:
- Use standard nutritional values per serving
- If quantity not specified, assume standard serving
- Return multiple items if multiple foods mentioned
- Be accurate with nutritional and micronutrient values
- Include the quantity in food_name (e.g., "Roti (2 rotis)", "Egg omelette (2 eggs)")
- Provide micronutrient values based on standard food databases

Example input: "I ate 2 rotis and an omelette with 2 eggs"
Example output: [{"food_name":"Roti (2 rotis)","calories":240,"carbs":40,"protein":6,"fat":2,"quantity":"2 rotis","vitamin_a":0,"vitamin_c":0,"vitamin_d":0,"calcium":20,"iron":2.4,"fiber":4},{"food_name":"Egg omelette (2 eggs)","calories":180,"carbs":2,"protein":12,"fat":14,"quantity":"2 eggs","vitamin_a":260,"vitamin_c":0,"vitamin_d":2,"calcium":56,"iron":1.8,"fiber":0}]"#;

const UNKNOWN_FOOD: &str = "Unknown food";

lazy_static! {
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"```[A-Za-z]*[ \t]*\r?\n?([\s\S]*?)```").expect("fenced block pattern");
}

#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("malformed response")]
    Malformed,

    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("AI usage quota exhausted. Check the account's billing.")]
    QuotaExceeded,

    #[error("Service temporarily unavailable after {attempts} attempts. Please try again in a moment.")]
    ServiceUnavailable { attempts: u32 },

    #[error("Unexpected response from the AI service (status {status})")]
    Upstream { status: u16 },

    #[error("Could not reach the AI service: {0}")]
    Transport(String),

    #[error("Food parsing is not configured")]
    NotConfigured,

    #[error("Request cancelled")]
    Cancelled,
}

impl From<BackendError> for ParserError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Status { status: 429, .. } => ParserError::RateLimited,
            BackendError::Status { status: 402, .. } => ParserError::QuotaExceeded,
            BackendError::Status { status: 503, .. } => {
                ParserError::ServiceUnavailable { attempts: 1 }
            }
            BackendError::Status { status, .. } => ParserError::Upstream { status },
            BackendError::Transport(e) => ParserError::Transport(e.to_string()),
            BackendError::Envelope => ParserError::Malformed,
            BackendError::NotConfigured => ParserError::NotConfigured,
        }
    }
}

/// Backoff schedule for transient unavailability.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// `initial_delay * 2^retry`, so 1s then 2s with the defaults.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.initial_delay.saturating_mul(1u32 << retry.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
        }
    }
}

pub struct NutritionParser {
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
}

impl NutritionParser {
    pub fn new(backend: Arc<dyn CompletionBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub fn from_config(backend: Arc<dyn CompletionBackend>, config: &Config) -> Self {
        Self::new(
            backend,
            RetryPolicy {
                max_retries: config.parser_max_retries,
                initial_delay: config.parser_initial_backoff(),
            },
        )
    }

    pub async fn parse(&self, text: &str) -> Result<Vec<FoodItemCandidate>, ParserError> {
        self.parse_with_cancel(text, &CancellationToken::new()).await
    }

    /// Parse `text`, retrying only on 503. Cancelling `cancel` aborts the
    /// in-flight request or the pending backoff.
    pub async fn parse_with_cancel(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<FoodItemCandidate>, ParserError> {
        let max_attempts = self.retry.max_retries.saturating_add(1);

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.retry.delay_for_retry(attempt - 1);
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "text-generation service unavailable, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ParserError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ParserError::Cancelled),
                r = self.backend.complete(SYSTEM_PROMPT, text) => r,
            };

            match result {
                Ok(raw) => {
                    tracing::debug!(attempt = attempt + 1, "text-generation response received");
                    return parse_candidates(&raw);
                }
                Err(BackendError::Status { status: 503, .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ParserError::ServiceUnavailable {
            attempts: max_attempts,
        })
    }
}

/// Locate the JSON payload inside generated text: a fenced code block wins,
/// then the span from the first `[` to the last `]`, then the whole text.
pub fn extract_json_payload(raw: &str) -> &str {
    if let Some(body) = FENCED_BLOCK.captures(raw).and_then(|c| c.get(1)) {
        return body.as_str().trim();
    }

    match (raw.find('['), raw.rfind(']')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw.trim(),
    }
}

/// Strictly parse generated text into candidates. One candidate per array
/// element; anything that is not an array of objects is malformed.
pub fn parse_candidates(raw: &str) -> Result<Vec<FoodItemCandidate>, ParserError> {
    let payload = extract_json_payload(raw);
    let value: Value = serde_json::from_str(payload).map_err(|e| {
        tracing::warn!(error = %e, "generated text is not valid JSON");
        ParserError::Malformed
    })?;

    let items = value.as_array().ok_or(ParserError::Malformed)?;
    items
        .iter()
        .map(|item| {
            item.as_object()
                .map(candidate_from_object)
                .ok_or(ParserError::Malformed)
        })
        .collect()
}

fn candidate_from_object(obj: &Map<String, Value>) -> FoodItemCandidate {
    FoodItemCandidate {
        food_name: text_field(obj, "food_name").unwrap_or_else(|| UNKNOWN_FOOD.to_string()),
        calories: number_field(obj, "calories").round().min(i32::MAX as f64) as i32,
        carbs: number_field(obj, "carbs"),
        protein: number_field(obj, "protein"),
        fat: number_field(obj, "fat"),
        quantity: text_field(obj, "quantity"),
        micronutrients: Micronutrients {
            vitamin_a: number_field(obj, "vitamin_a"),
            vitamin_c: number_field(obj, "vitamin_c"),
            vitamin_d: number_field(obj, "vitamin_d"),
            calcium: number_field(obj, "calcium"),
            iron: number_field(obj, "iron"),
            fiber: number_field(obj, "fiber"),
        },
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Missing, null, non-numeric, negative and non-finite values all become 0.
fn number_field(obj: &Map<String, Value>, key: &str) -> f64 {
    let n = match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}
