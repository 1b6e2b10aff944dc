use chrono::{DateTime, Utc};
use common::config::ProviderConfig;
use common::params::MAX_INPUT_IMAGES;
use common::{
    AspectRatio, Generation, GenerationStatus, ImageParams, Mode, ModeParams, NewGeneration,
    Resolution, VideoDuration, VideoParams,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::error::{AppError, FieldError};

/// Longest accepted prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Largest page a client may ask for.
pub const MAX_LIST_LIMIT: u64 = 100;

/// Request body for creating a generation.
///
/// Fields are read as raw JSON and checked by [`validate_create_generation`],
/// so wrong types are reported per field alongside every other problem.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGenerationRequest {
    /// 1-1000 characters.
    #[schema(value_type = Option<String>, example = "a red fox in the snow")]
    pub prompt: Option<Value>,
    /// "image" (default) or "video".
    #[schema(value_type = Option<String>, example = "image")]
    pub mode: Option<Value>,
    /// Video only. Up to 2 absolute http(s) URLs of reference images.
    #[schema(value_type = Option<Vec<String>>)]
    pub input_image_urls: Option<Value>,
    /// One of "1:1", "16:9", "9:16", "4:3", "3:4".
    #[schema(value_type = Option<String>, example = "1:1")]
    pub aspect_ratio: Option<Value>,
    /// Video only. "480p" or "720p".
    #[schema(value_type = Option<String>, example = "480p")]
    pub resolution: Option<Value>,
    /// Video only. 4, 8, or 12 seconds.
    #[schema(value_type = Option<i64>, example = 4)]
    pub duration: Option<Value>,
    /// Video only.
    #[schema(value_type = Option<bool>)]
    pub fixed_lens: Option<Value>,
    /// Video only.
    #[schema(value_type = Option<bool>)]
    pub generate_audio: Option<Value>,
}

impl CreateGenerationRequest {
    /// The requested mode name, if it was given as a string.
    pub fn mode_name(&self) -> Option<&str> {
        self.mode.as_ref().and_then(Value::as_str)
    }
}

/// Reads optional request fields, recording a [`FieldError`] for each one
/// that holds the wrong JSON type.
struct FieldReader {
    errors: Vec<FieldError>,
}

impl FieldReader {
    fn mismatch<T>(&mut self, field: &str, expected: &str) -> Option<T> {
        self.errors.push(FieldError::new(field, format!("Must be {expected}")));
        None
    }

    fn string<'a>(&mut self, field: &str, value: Option<&'a Value>) -> Option<&'a str> {
        match value? {
            Value::String(s) => Some(s),
            _ => self.mismatch(field, "a string"),
        }
    }

    fn boolean(&mut self, field: &str, value: Option<&Value>) -> Option<bool> {
        match value? {
            Value::Bool(b) => Some(*b),
            _ => self.mismatch(field, "a boolean"),
        }
    }

    fn integer(&mut self, field: &str, value: Option<&Value>) -> Option<i64> {
        match value?.as_i64() {
            Some(n) => Some(n),
            None => self.mismatch(field, "an integer"),
        }
    }

    fn string_list(&mut self, field: &str, value: Option<&Value>) -> Option<Vec<String>> {
        let items = value?.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        });
        match items {
            Some(items) => Some(items),
            None => self.mismatch(field, "an array of strings"),
        }
    }
}

/// Check a create request and resolve it into a record to store.
///
/// Applies the per-mode defaults and picks the provider model for the mode.
pub fn validate_create_generation(
    req: &CreateGenerationRequest,
    provider: &ProviderConfig,
) -> Result<NewGeneration, AppError> {
    let mut fields = FieldReader { errors: Vec::new() };

    let prompt = match req.prompt.as_ref() {
        None => {
            fields.errors.push(FieldError::new("prompt", "Prompt is required"));
            String::new()
        }
        Some(value) => match fields.string("prompt", Some(value)) {
            None => String::new(),
            Some(p) => {
                let len = p.chars().count();
                if len == 0 || len > MAX_PROMPT_CHARS {
                    fields.errors.push(FieldError::new(
                        "prompt",
                        format!("Prompt must be 1-{MAX_PROMPT_CHARS} characters"),
                    ));
                }
                p.to_string()
            }
        },
    };

    let mode = match fields.string("mode", req.mode.as_ref()) {
        None => Mode::Image,
        Some(m) => m.parse().unwrap_or_else(|e: String| {
            fields.errors.push(FieldError::new("mode", e));
            Mode::Image
        }),
    };

    let aspect_ratio = fields
        .string("aspectRatio", req.aspect_ratio.as_ref())
        .and_then(|r| {
            r.parse::<AspectRatio>()
                .map_err(|e| fields.errors.push(FieldError::new("aspectRatio", e)))
                .ok()
        });

    let params = match mode {
        Mode::Image => {
            let video_only = [
                ("inputImageUrls", req.input_image_urls.is_some()),
                ("resolution", req.resolution.is_some()),
                ("duration", req.duration.is_some()),
                ("fixedLens", req.fixed_lens.is_some()),
                ("generateAudio", req.generate_audio.is_some()),
            ];
            for (field, present) in video_only {
                if present {
                    fields.errors.push(FieldError::new(field, "Only supported in video mode"));
                }
            }
            ModeParams::Image(ImageParams {
                aspect_ratio: aspect_ratio.unwrap_or(AspectRatio::Square),
            })
        }
        Mode::Video => {
            let input_image_urls = fields
                .string_list("inputImageUrls", req.input_image_urls.as_ref())
                .unwrap_or_default();
            if input_image_urls.len() > MAX_INPUT_IMAGES {
                fields.errors.push(FieldError::new(
                    "inputImageUrls",
                    format!("At most {MAX_INPUT_IMAGES} reference images are allowed"),
                ));
            }
            for url in &input_image_urls {
                if !is_http_url(url) {
                    fields.errors.push(FieldError::new(
                        "inputImageUrls",
                        format!("'{url}' is not an absolute http(s) URL"),
                    ));
                }
            }

            let resolution = fields
                .string("resolution", req.resolution.as_ref())
                .and_then(|r| {
                    r.parse::<Resolution>()
                        .map_err(|e| fields.errors.push(FieldError::new("resolution", e)))
                        .ok()
                });

            let duration = fields
                .integer("duration", req.duration.as_ref())
                .and_then(|secs| {
                    u32::try_from(secs)
                        .map_err(|_| "Duration must be 4, 8, or 12 seconds".to_string())
                        .and_then(VideoDuration::try_from)
                        .map_err(|e| fields.errors.push(FieldError::new("duration", e)))
                        .ok()
                });

            let fixed_lens = fields.boolean("fixedLens", req.fixed_lens.as_ref());
            let generate_audio = fields.boolean("generateAudio", req.generate_audio.as_ref());

            ModeParams::Video(
                VideoParams {
                    input_image_urls,
                    aspect_ratio,
                    resolution,
                    duration,
                    fixed_lens,
                    generate_audio,
                }
                .with_defaults(),
            )
        }
    };

    if !fields.errors.is_empty() {
        return Err(AppError::InvalidRequest(fields.errors));
    }

    Ok(NewGeneration {
        prompt,
        model: provider.model_for(mode).to_string(),
        params,
    })
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// Query parameters for generation listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct GenerationListQuery {
    /// Number of records to return, newest first. 1-100, default 50.
    #[param(example = 50)]
    pub limit: Option<u64>,
}

/// Resolve the page size for a listing request.
pub fn resolve_list_limit(query: &GenerationListQuery, default: u64) -> Result<u64, AppError> {
    match query.limit {
        None => Ok(default.clamp(1, MAX_LIST_LIMIT)),
        Some(limit) if (1..=MAX_LIST_LIMIT).contains(&limit) => Ok(limit),
        Some(_) => Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        ))),
    }
}

/// The fields echoed back when a generation is created.
#[derive(Serialize, utoipa::ToSchema)]
pub struct GenerationSummary {
    pub id: Uuid,
    pub status: GenerationStatus,
    pub prompt: String,
    pub mode: Mode,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateGenerationResponse {
    pub success: bool,
    pub generation: GenerationSummary,
}

/// A generation as shown to polling clients.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationDto {
    pub id: Uuid,
    pub prompt: String,
    #[schema(example = "seedream/4.5-text-to-image")]
    pub model: String,
    pub mode: Mode,
    pub status: GenerationStatus,
    pub provider_job_id: Option<String>,
    pub queue_job_id: Option<String>,
    pub input_image_urls: Vec<String>,
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Option<Resolution>,
    /// Seconds.
    pub duration: Option<u32>,
    pub fixed_lens: Option<bool>,
    pub generate_audio: Option<bool>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Generation> for GenerationDto {
    fn from(generation: Generation) -> Self {
        let mode = generation.mode();
        let aspect_ratio = generation.params.aspect_ratio();
        let (input_image_urls, resolution, duration, fixed_lens, generate_audio) =
            match generation.params {
                ModeParams::Image(_) => (Vec::new(), None, None, None, None),
                ModeParams::Video(p) => (
                    p.input_image_urls,
                    p.resolution,
                    p.duration.map(|d| d.seconds()),
                    p.fixed_lens,
                    p.generate_audio,
                ),
            };

        Self {
            id: generation.id,
            prompt: generation.prompt,
            model: generation.model,
            mode,
            status: generation.status,
            provider_job_id: generation.provider_job_id,
            queue_job_id: generation.queue_job_id,
            input_image_urls,
            aspect_ratio,
            resolution,
            duration,
            fixed_lens,
            generate_audio,
            result_url: generation.result_url,
            error_message: generation.error_message,
            created_at: generation.created_at,
            updated_at: generation.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GenerationResponse {
    pub success: bool,
    pub generation: GenerationDto,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GenerationListResponse {
    pub success: bool,
    pub generations: Vec<GenerationDto>,
}
