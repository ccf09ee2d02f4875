use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use quizbank_types::api::AnswerBody;

/// Everything the generator gets to see about the question being varied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorInput {
    pub subject_id: String,
    pub difficulty: String,
    pub question: String,
    pub description: String,
    pub answers: Vec<AnswerBody>,
    pub correct_answer_key: i64,
    pub correct_answer_explanation: String,
}

/// A draft question as the model returns it. Lenient on purpose: unknown
/// fields are ignored and the handler re-validates everything before any
/// write.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub question: String,
    pub description: Option<String>,
    pub answers: Vec<AnswerBody>,
    pub correct_answer_key: i64,
    pub correct_answer_explanation: Option<String>,
    pub difficulty: String,
}

/// External question-variant generator. Boxed in app state so tests can swap
/// in a canned implementation.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_variant(&self, original: &GeneratorInput) -> anyhow::Result<QuestionDraft>;
}

/// Production generator backed by the Cohere chat API.
pub struct CohereGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl CohereGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self { client: reqwest::Client::new(), api_key, model }
    }
}

fn build_prompt(original: &GeneratorInput) -> anyhow::Result<String> {
    let original = serde_json::to_string_pretty(original)?;
    Ok(format!(
        "You are given a multiple-choice exam question as JSON:\n\n{original}\n\n\
         Write a NEW question testing the same concept with different wording, \
         numbers or scenario. Reply with a single JSON object and nothing else, \
         with exactly these fields: question (string), description (string), \
         answers (array of {{key: int, text: string}}), correctAnswerKey (int, \
         one of the answer keys), correctAnswerExplanation (string), difficulty \
         (one of EASY, MEDIUM, HARD)."
    ))
}

/// Slice out the first JSON object in a model reply. Chat models wrap their
/// answer in prose more often than not, so take everything between the first
/// `{` and the last `}` and let the parser judge it.
pub fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

#[async_trait]
impl QuestionGenerator for CohereGenerator {
    async fn generate_variant(&self, original: &GeneratorInput) -> anyhow::Result<QuestionDraft> {
        let prompt = build_prompt(original)?;

        let response = self
            .client
            .post("https://api.cohere.com/v1/chat")
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "message": prompt,
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response.json().await?;
        let text = body
            .get("text")
            .and_then(|t| t.as_str())
            .ok_or_else(|| anyhow::anyhow!("generator reply carried no text field"))?;
        debug!(reply_len = text.len(), "generator replied");

        let raw = extract_json(text)
            .ok_or_else(|| anyhow::anyhow!("generator reply contained no JSON object"))?;
        let draft: QuestionDraft = serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("generator reply did not parse as a draft: {}", e))?;
        Ok(draft)
    }
}
