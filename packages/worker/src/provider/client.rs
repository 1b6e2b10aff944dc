use std::time::Duration;

use async_trait::async_trait;
use common::config::ProviderConfig;
use common::params::IMAGE_QUALITY;
use common::{GenerationJob, GenerationStatus, ModeParams};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{Provider, ProviderError, ProviderSubmission};

/// HTTP client for the provider's task API.
pub struct ProviderClient {
    client: reqwest::Client,
    create_task_url: Url,
    api_key: String,
    callback_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest<'a> {
    model: &'a str,
    call_back_url: &'a str,
    input: TaskInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum TaskInput<'a> {
    Image {
        prompt: &'a str,
        aspect_ratio: &'static str,
        quality: &'static str,
    },
    Video {
        prompt: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        input_urls: Option<&'a [String]>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aspect_ratio: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        resolution: Option<&'static str>,
        /// Sent as a string of seconds.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fixed_lens: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        generate_audio: Option<bool>,
    },
}

impl<'a> TaskInput<'a> {
    fn from_job(job: &'a GenerationJob) -> Self {
        match &job.params {
            ModeParams::Image(p) => TaskInput::Image {
                prompt: &job.prompt,
                aspect_ratio: p.aspect_ratio.as_str(),
                quality: IMAGE_QUALITY,
            },
            ModeParams::Video(p) => TaskInput::Video {
                prompt: &job.prompt,
                input_urls: (!p.input_image_urls.is_empty())
                    .then_some(p.input_image_urls.as_slice()),
                aspect_ratio: p.aspect_ratio.map(|r| r.as_str()),
                resolution: p.resolution.map(|r| r.as_str()),
                duration: p.duration.map(|d| d.seconds().to_string()),
                fixed_lens: p.fixed_lens,
                generate_audio: p.generate_audio,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<CreateTaskData>,
}

#[derive(Debug, Deserialize)]
struct CreateTaskData {
    #[serde(rename = "taskId", default)]
    task_id: Option<String>,
}

/// Extract the task id from a `createTask` response body.
fn parse_create_task(body: &str) -> Result<String, ProviderError> {
    let response: CreateTaskResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("{e}: {body}")))?;

    let task_id = response
        .data
        .and_then(|d| d.task_id)
        .filter(|id| !id.is_empty());

    match task_id {
        Some(task_id) if response.code == 200 => Ok(task_id),
        _ => Err(ProviderError::Application {
            code: response.code,
            message: response
                .msg
                .or(response.message)
                .unwrap_or_else(|| format!("no task id in response: {body}")),
        }),
    }
}

impl ProviderClient {
    /// Build a client from configuration.
    ///
    /// Fails when the API key or the callback address is missing, or when
    /// either URL does not parse.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::Config("provider.api_key is not set".into()))?;

        let callback_url = config.callback_url().ok_or_else(|| {
            ProviderError::Config(
                "neither provider.webhook_url nor provider.public_base_url is set".into(),
            )
        })?;
        Url::parse(&callback_url).map_err(|e| {
            ProviderError::Config(format!("invalid callback url '{callback_url}': {e}"))
        })?;

        let create_task_url = Url::parse(&format!(
            "{}/jobs/createTask",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| ProviderError::Config(format!("invalid provider.base_url: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            create_task_url,
            api_key,
            callback_url,
        })
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Returns the response unchanged on 2xx, otherwise an
    /// [`ProviderError::HttpStatus`] carrying the body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Provider for ProviderClient {
    async fn submit(&self, job: &GenerationJob) -> Result<ProviderSubmission, ProviderError> {
        let request = CreateTaskRequest {
            model: &job.model,
            call_back_url: &self.callback_url,
            input: TaskInput::from_job(job),
        };

        debug!(
            generation_id = %job.generation_id,
            model = %job.model,
            url = %self.create_task_url,
            "Submitting task to provider"
        );

        let response = self
            .client
            .post(self.create_task_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = Self::ensure_success(response).await?.text().await?;
        let provider_job_id = parse_create_task(&body)?;

        Ok(ProviderSubmission {
            provider_job_id,
            state: GenerationStatus::Pending,
        })
    }
}
