pub mod config;
pub mod generation;
pub mod generation_job;
pub mod generation_status;
pub mod params;
pub mod store;

pub use generation::{Generation, GenerationPatch, NewGeneration};
pub use generation_job::GenerationJob;
pub use generation_status::GenerationStatus;
pub use params::{
    AspectRatio, ImageParams, Mode, ModeParams, Resolution, VideoDuration, VideoParams,
};
