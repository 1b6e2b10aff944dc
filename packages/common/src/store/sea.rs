use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use super::entity::{self as generation, Column, Entity};
use super::error::StoreError;
use super::traits::{GenerationStore, UpdateOutcome};
use crate::generation::{Generation, GenerationPatch, NewGeneration};
use crate::generation_status::GenerationStatus;
use crate::params::{
    AspectRatio, ImageParams, Mode, ModeParams, Resolution, VideoDuration, VideoParams,
};

/// Connect to the database and sync the `generation` table.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("common::store::entity::*")
        .sync(&db)
        .await?;
    tracing::info!("Generation schema synced");

    Ok(db)
}

/// [`GenerationStore`] backed by a SeaORM connection.
#[derive(Clone)]
pub struct SeaGenerationStore {
    db: DatabaseConnection,
}

impl SeaGenerationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_write_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
        _ => StoreError::Database(err.to_string()),
    }
}

fn to_active_model(generation: &Generation) -> generation::ActiveModel {
    let (video, input_image_urls) = match &generation.params {
        ModeParams::Image(_) => (None, Vec::new()),
        ModeParams::Video(p) => (Some(p), p.input_image_urls.clone()),
    };

    generation::ActiveModel {
        id: Set(generation.id),
        prompt: Set(generation.prompt.clone()),
        model: Set(generation.model.clone()),
        mode: Set(generation.mode()),
        status: Set(generation.status),
        provider_job_id: Set(generation.provider_job_id.clone()),
        queue_job_id: Set(generation.queue_job_id.clone()),
        aspect_ratio: Set(generation.params.aspect_ratio().map(|r| r.as_str().to_string())),
        resolution: Set(video.and_then(|p| p.resolution).map(|r| r.as_str().to_string())),
        duration: Set(video.and_then(|p| p.duration).map(|d| d.seconds() as i32)),
        fixed_lens: Set(video.and_then(|p| p.fixed_lens)),
        generate_audio: Set(video.and_then(|p| p.generate_audio)),
        input_image_urls: Set(serde_json::json!(input_image_urls)),
        result_url: Set(generation.result_url.clone()),
        error_message: Set(generation.error_message.clone()),
        created_at: Set(generation.created_at),
        updated_at: Set(generation.updated_at),
    }
}

fn corrupt(id: Uuid, what: impl std::fmt::Display) -> StoreError {
    StoreError::Database(format!("generation {id} has an unreadable column: {what}"))
}

impl TryFrom<generation::Model> for Generation {
    type Error = StoreError;

    fn try_from(model: generation::Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let aspect_ratio = model
            .aspect_ratio
            .as_deref()
            .map(str::parse::<AspectRatio>)
            .transpose()
            .map_err(|e| corrupt(id, e))?;

        let params = match model.mode {
            Mode::Image => ModeParams::Image(ImageParams {
                aspect_ratio: aspect_ratio.unwrap_or(AspectRatio::Square),
            }),
            Mode::Video => {
                let input_image_urls: Vec<String> =
                    serde_json::from_value(model.input_image_urls).map_err(|e| corrupt(id, e))?;
                let resolution = model
                    .resolution
                    .as_deref()
                    .map(str::parse::<Resolution>)
                    .transpose()
                    .map_err(|e| corrupt(id, e))?;
                let duration = model
                    .duration
                    .map(|secs| VideoDuration::try_from(secs.max(0) as u32))
                    .transpose()
                    .map_err(|e| corrupt(id, e))?;
                ModeParams::Video(VideoParams {
                    input_image_urls,
                    aspect_ratio,
                    resolution,
                    duration,
                    fixed_lens: model.fixed_lens,
                    generate_audio: model.generate_audio,
                })
            }
        };

        Ok(Generation {
            id,
            prompt: model.prompt,
            model: model.model,
            params,
            status: model.status,
            provider_job_id: model.provider_job_id,
            queue_job_id: model.queue_job_id,
            result_url: model.result_url,
            error_message: model.error_message,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[async_trait]
impl GenerationStore for SeaGenerationStore {
    async fn create(&self, new: NewGeneration) -> Result<Generation, StoreError> {
        let generation = new.into_generation();
        let inserted = to_active_model(&generation)
            .insert(&self.db)
            .await
            .map_err(map_write_err)?;
        Generation::try_from(inserted)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Generation>, StoreError> {
        Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Generation::try_from)
            .transpose()
    }

    async fn find_by_provider_job_id(&self, key: &str) -> Result<Option<Generation>, StoreError> {
        Entity::find()
            .filter(Column::ProviderJobId.eq(key))
            .one(&self.db)
            .await?
            .map(Generation::try_from)
            .transpose()
    }

    async fn list_recent(&self, limit: u64) -> Result<Vec<Generation>, StoreError> {
        Entity::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Generation::try_from)
            .collect()
    }

    async fn update_if(
        &self,
        id: Uuid,
        expected: &[GenerationStatus],
        patch: GenerationPatch,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut update = Entity::update_many().col_expr(Column::UpdatedAt, Expr::value(Utc::now()));

        if let Some(status) = patch.status() {
            update = update.col_expr(Column::Status, Expr::value(status));
        }
        if let Some(key) = patch.provider_job_id() {
            update = update.col_expr(Column::ProviderJobId, Expr::value(key));
        }
        if let Some(handle) = patch.queue_job_id() {
            update = update.col_expr(Column::QueueJobId, Expr::value(handle));
        }
        if let Some(url) = patch.result_url() {
            update = update.col_expr(Column::ResultUrl, Expr::value(url));
        }
        if let Some(message) = patch.error_message() {
            update = update.col_expr(Column::ErrorMessage, Expr::value(message));
        }

        let result = update
            .filter(Column::Id.eq(id))
            .filter(Column::Status.is_in(expected.iter().copied()))
            .exec(&self.db)
            .await
            .map_err(map_write_err)?;

        let current = self.get(id).await?.ok_or(StoreError::NotFound(id))?;
        if result.rows_affected > 0 {
            Ok(UpdateOutcome::Applied(current))
        } else {
            Ok(UpdateOutcome::Skipped(current))
        }
    }
}
