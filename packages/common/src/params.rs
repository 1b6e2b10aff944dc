//! Mode-specific generation parameters.
//!
//! Image and video requests carry different knobs. They are modelled as a
//! tagged variant ([`ModeParams`]) and only flattened into nullable columns at
//! the storage edge and into provider fields at the wire edge.

#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of reference images a video request may carry.
pub const MAX_INPUT_IMAGES: usize = 2;

/// Quality tier sent for every image request.
pub const IMAGE_QUALITY: &str = "basic";

/// What kind of media to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "image"))]
    Image,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "video"))]
    Video,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Image
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(format!("Invalid mode '{s}'. Must be 'image' or 'video'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:4")]
    Portrait3x4,
}

impl AspectRatio {
    pub const ALL: &'static [AspectRatio] = &[
        Self::Square,
        Self::Landscape16x9,
        Self::Portrait9x16,
        Self::Landscape4x3,
        Self::Portrait3x4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape16x9 => "16:9",
            Self::Portrait9x16 => "9:16",
            Self::Landscape4x3 => "4:3",
            Self::Portrait3x4 => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ratio| ratio.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid aspect ratio '{s}'. Valid values: {}",
                    Self::ALL
                        .iter()
                        .map(|r| r.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Resolution {
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P480 => "480p",
            Self::P720 => "720p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "480p" => Ok(Self::P480),
            "720p" => Ok(Self::P720),
            _ => Err(format!("Invalid resolution '{s}'. Must be '480p' or '720p'")),
        }
    }
}

/// Video length. Serialized as the number of seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum VideoDuration {
    Secs4,
    Secs8,
    Secs12,
}

impl VideoDuration {
    pub fn seconds(&self) -> u32 {
        match self {
            Self::Secs4 => 4,
            Self::Secs8 => 8,
            Self::Secs12 => 12,
        }
    }
}

impl TryFrom<u32> for VideoDuration {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Secs4),
            8 => Ok(Self::Secs8),
            12 => Ok(Self::Secs12),
            _ => Err("Duration must be 4, 8, or 12 seconds".to_string()),
        }
    }
}

impl From<VideoDuration> for u32 {
    fn from(value: VideoDuration) -> Self {
        value.seconds()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageParams {
    pub aspect_ratio: AspectRatio,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::Square,
        }
    }
}

/// Video knobs. Every field is optional on the wire; intake fills the
/// defaults through [`VideoParams::with_defaults`] before a record is created.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoParams {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<VideoDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_lens: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_audio: Option<bool>,
}

impl VideoParams {
    /// Fill every unset knob with the video default.
    pub fn with_defaults(self) -> Self {
        Self {
            input_image_urls: self.input_image_urls,
            aspect_ratio: Some(self.aspect_ratio.unwrap_or(AspectRatio::Landscape16x9)),
            resolution: Some(self.resolution.unwrap_or(Resolution::P480)),
            duration: Some(self.duration.unwrap_or(VideoDuration::Secs4)),
            fixed_lens: Some(self.fixed_lens.unwrap_or(false)),
            generate_audio: Some(self.generate_audio.unwrap_or(false)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ModeParams {
    Image(ImageParams),
    Video(VideoParams),
}

impl ModeParams {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Image(_) => Mode::Image,
            Self::Video(_) => Mode::Video,
        }
    }

    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        match self {
            Self::Image(p) => Some(p.aspect_ratio),
            Self::Video(p) => p.aspect_ratio,
        }
    }
}
