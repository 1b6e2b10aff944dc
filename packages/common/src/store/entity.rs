use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::generation_status::GenerationStatus;
use crate::params::Mode;

/// A stored image or video generation.
///
/// Mode parameters are flattened into nullable columns; image rows leave the
/// video-only columns empty.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "generation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub prompt: String,

    pub model: String,

    pub mode: Mode,

    #[sea_orm(indexed)]
    pub status: GenerationStatus,

    #[sea_orm(unique)]
    pub provider_job_id: Option<String>,

    pub queue_job_id: Option<String>,

    pub aspect_ratio: Option<String>,

    pub resolution: Option<String>,

    pub duration: Option<i32>,

    pub fixed_lens: Option<bool>,

    pub generate_audio: Option<bool>,

    /// Reference image URLs as a JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub input_image_urls: Json,

    #[sea_orm(column_type = "Text", nullable)]
    pub result_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
