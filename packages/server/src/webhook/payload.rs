use common::GenerationStatus;
use serde::{Deserialize, Serialize};

/// Fallback error text when the provider reports failure without a message.
pub const GENERIC_FAILURE: &str = "Provider reported failure";

/// Callback body posted by the provider when a task changes state.
#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct WebhookPayload {
    #[schema(example = 200)]
    pub code: i64,
    pub data: WebhookData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookData {
    /// Provider task id, matched against the stored provider job id.
    #[schema(example = "task-1")]
    pub task_id: String,
    /// Provider task state, e.g. "success", "fail", "processing".
    #[schema(example = "success")]
    pub state: String,
    /// JSON-encoded string holding `resultUrls`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "{\"resultUrls\":[\"https://cdn.example/out.png\"]}")]
    pub result_json: Option<String>,
    #[serde(default)]
    pub fail_code: Option<String>,
    #[serde(default)]
    pub fail_msg: Option<String>,
}

#[derive(Deserialize)]
struct ResultJson {
    #[serde(rename = "resultUrls", default)]
    result_urls: Vec<String>,
}

impl WebhookData {
    /// Local status the provider state maps to.
    pub fn target_status(&self) -> GenerationStatus {
        GenerationStatus::from_provider_state(&self.state)
    }

    /// First entry of `resultUrls` inside `resultJson`.
    ///
    /// `Ok(None)` when there is no result JSON or it lists no URLs.
    pub fn result_url(&self) -> Result<Option<String>, serde_json::Error> {
        let Some(raw) = self.result_json.as_deref() else {
            return Ok(None);
        };
        let parsed: ResultJson = serde_json::from_str(raw)?;
        Ok(parsed.result_urls.into_iter().next())
    }

    /// Error text to store for a failed task.
    pub fn failure_message(&self) -> String {
        if let Some(msg) = self.fail_msg.as_deref().filter(|m| !m.is_empty()) {
            return msg.to_string();
        }
        match self.fail_code.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => format!("{GENERIC_FAILURE} ({code})"),
            None => GENERIC_FAILURE.to_string(),
        }
    }
}
