//! Operation endpoints.
//!
//! Request bodies mirror the JSON accepted on the wire: every field is
//! optional and defaults are applied in `into_request()`, which also turns
//! the source fields into a [`SourceDescriptor`].

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use clipforge_core::{
    engine::AudioFormat,
    filter::{
        Color, Dimensions, FillColor, FitMode, PlatformPreset, SubtitlePosition, SubtitleStyle,
        Transition,
    },
    operations::{
        ConcatRequest, ExtractAudioRequest, MergeRequest, MusicRequest, NormalizeRequest,
        ResizeRequest, SubtitleMode, SubtitleRequest, SubtitleSource, ThumbnailRequest, TrimRange,
        TrimRequest,
    },
    JobError, MediaProbe, Operation, OperationOutput, PipelineRequest, SourceDescriptor,
};

use super::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Responses
// ============================================================================

/// Success body shared by every operation.
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub success: bool,
    pub job_id: String,
    pub operation: Operation,
    pub output_url: String,
    pub file_size: u64,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl From<OperationOutput> for OperationResponse {
    fn from(output: OperationOutput) -> Self {
        Self {
            success: true,
            output_url: download_url(output.job_id.as_str(), &output.artifact.name),
            job_id: output.job_id.to_string(),
            operation: output.operation,
            file_size: output.file_size,
            details: output.details,
        }
    }
}

pub fn download_url(job_id: &str, file: &str) -> String {
    format!("/api/v1/download/{}/{}", job_id, file)
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub success: bool,
    pub info: MediaProbe,
}

// ============================================================================
// Request bodies
// ============================================================================

/// Primary video fields accepted by single-video operations.
#[derive(Debug, Default, Deserialize)]
pub struct VideoFields {
    pub video_url: Option<String>,
    pub video_job_id: Option<String>,
    pub video_base64: Option<String>,
}

impl VideoFields {
    fn descriptor(&self) -> Result<SourceDescriptor, JobError> {
        SourceDescriptor::from_fields(
            "video",
            self.video_url.as_deref(),
            self.video_job_id.as_deref(),
            self.video_base64.as_deref(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MergeBody {
    #[serde(flatten)]
    pub video: VideoFields,
    pub audio_url: Option<String>,
    pub audio_base64: Option<String>,
    pub volume: Option<f64>,
}

impl MergeBody {
    pub fn into_request(self) -> Result<MergeRequest, JobError> {
        Ok(MergeRequest {
            video: self.video.descriptor()?,
            audio: SourceDescriptor::from_fields(
                "audio",
                self.audio_url.as_deref(),
                None,
                self.audio_base64.as_deref(),
            )?,
            volume: self.volume.unwrap_or(1.0),
        })
    }
}

/// One entry of `videos[]` in a concat request.
#[derive(Debug, Default, Deserialize)]
pub struct ClipFields {
    pub url: Option<String>,
    pub job_id: Option<String>,
    pub base64: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConcatBody {
    #[serde(default)]
    pub videos: Vec<ClipFields>,
    pub transition: Option<String>,
    pub transition_duration: Option<f64>,
}

impl ConcatBody {
    pub fn into_request(self) -> Result<ConcatRequest, JobError> {
        let clips = self
            .videos
            .iter()
            .enumerate()
            .map(|(i, clip)| {
                SourceDescriptor::from_fields(
                    &format!("video at index {}", i),
                    clip.url.as_deref(),
                    clip.job_id.as_deref(),
                    clip.base64.as_deref(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ConcatRequest {
            clips,
            transition: parse_or(self.transition.as_deref(), Transition::None)?,
            transition_duration: self.transition_duration.unwrap_or(0.5),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubtitlesBody {
    #[serde(flatten)]
    pub video: VideoFields,
    pub subtitles: Option<String>,
    pub subtitles_url: Option<String>,
    pub style: Option<String>,
    pub font_size: Option<u32>,
    pub font_color: Option<String>,
    pub outline_color: Option<String>,
    pub position: Option<String>,
}

impl SubtitlesBody {
    pub fn into_request(self) -> Result<SubtitleRequest, JobError> {
        let defaults = SubtitleStyle::default();
        Ok(SubtitleRequest {
            video: self.video.descriptor()?,
            subtitles: SubtitleSource::from_fields(
                self.subtitles.as_deref(),
                self.subtitles_url.as_deref(),
            )?,
            mode: parse_or(self.style.as_deref(), SubtitleMode::Hardcoded)?,
            style: SubtitleStyle {
                font_size: self.font_size.unwrap_or(defaults.font_size),
                primary_color: parse_or::<Color>(
                    self.font_color.as_deref(),
                    defaults.primary_color,
                )?,
                outline_color: parse_or::<Color>(
                    self.outline_color.as_deref(),
                    defaults.outline_color,
                )?,
                position: parse_or::<SubtitlePosition>(
                    self.position.as_deref(),
                    defaults.position,
                )?,
            },
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MusicBody {
    #[serde(flatten)]
    pub video: VideoFields,
    pub music_url: Option<String>,
    pub music_base64: Option<String>,
    pub music_volume: Option<f64>,
    pub voice_volume: Option<f64>,
    pub loop_music: Option<bool>,
    pub fade_out: Option<f64>,
}

impl MusicBody {
    pub fn into_request(self) -> Result<MusicRequest, JobError> {
        Ok(MusicRequest {
            video: self.video.descriptor()?,
            music: SourceDescriptor::from_fields(
                "music",
                self.music_url.as_deref(),
                None,
                self.music_base64.as_deref(),
            )?,
            music_volume: self.music_volume.unwrap_or(0.15),
            voice_volume: self.voice_volume.unwrap_or(1.0),
            loop_music: self.loop_music.unwrap_or(true),
            fade_out: self.fade_out.unwrap_or(2.0),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResizeBody {
    #[serde(flatten)]
    pub video: VideoFields,
    pub preset: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub fit: Option<String>,
    pub background_color: Option<String>,
}

impl ResizeBody {
    pub fn into_request(self) -> Result<ResizeRequest, JobError> {
        let preset = self
            .preset
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::parse::<PlatformPreset>)
            .transpose()?;
        Ok(ResizeRequest {
            video: self.video.descriptor()?,
            preset,
            dimensions: Dimensions::from_signed(
                self.width.unwrap_or(1920),
                self.height.unwrap_or(1080),
            )?,
            fit: parse_or(self.fit.as_deref(), FitMode::Contain)?,
            fill: match self.background_color.as_deref() {
                Some(color) => FillColor::parse(color)?,
                None => FillColor::black(),
            },
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractAudioBody {
    #[serde(flatten)]
    pub video: VideoFields,
    pub format: Option<String>,
}

impl ExtractAudioBody {
    pub fn into_request(self) -> Result<ExtractAudioRequest, JobError> {
        Ok(ExtractAudioRequest {
            video: self.video.descriptor()?,
            format: parse_or(self.format.as_deref(), AudioFormat::Mp3)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ThumbnailBody {
    #[serde(flatten)]
    pub video: VideoFields,
    pub timestamp: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl ThumbnailBody {
    pub fn into_request(self) -> Result<ThumbnailRequest, JobError> {
        Ok(ThumbnailRequest {
            video: self.video.descriptor()?,
            timestamp: self.timestamp.unwrap_or(5.0),
            size: Dimensions::from_signed(self.width.unwrap_or(1280), self.height.unwrap_or(720))?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TrimBody {
    #[serde(flatten)]
    pub video: VideoFields,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub duration: Option<f64>,
}

impl TrimBody {
    pub fn into_request(self) -> Result<TrimRequest, JobError> {
        Ok(TrimRequest {
            video: self.video.descriptor()?,
            range: TrimRange::from_bounds(self.start.unwrap_or(0.0), self.end, self.duration)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NormalizeBody {
    #[serde(flatten)]
    pub video: VideoFields,
    pub target_lufs: Option<f64>,
    pub peak_limit: Option<f64>,
}

impl NormalizeBody {
    pub fn into_request(self) -> Result<NormalizeRequest, JobError> {
        Ok(NormalizeRequest {
            video: self.video.descriptor()?,
            target_lufs: self.target_lufs.unwrap_or(-14.0),
            peak_limit: self.peak_limit.unwrap_or(-1.0),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PipelineBody {
    pub video_job_id: Option<String>,
    pub video_url: Option<String>,
    pub audio_base64: Option<String>,
    pub audio_url: Option<String>,
    #[serde(default)]
    pub narration_required: bool,
    pub subtitles: Option<String>,
    pub background_music_url: Option<String>,
    pub music_base64: Option<String>,
    pub music_volume: Option<f64>,
    pub platform: Option<String>,
    #[serde(default)]
    pub normalize: bool,
}

impl PipelineBody {
    pub fn into_request(self) -> Result<PipelineRequest, JobError> {
        let video = SourceDescriptor::from_fields(
            "video",
            self.video_url.as_deref(),
            self.video_job_id.as_deref(),
            None,
        )?;
        let mut request = PipelineRequest::new(video);
        request.narration = SourceDescriptor::optional(
            "narration",
            self.audio_url.as_deref(),
            None,
            self.audio_base64.as_deref(),
        )?;
        request.narration_required = self.narration_required;
        request.subtitles = self.subtitles.filter(|s| !s.trim().is_empty());
        request.music = SourceDescriptor::optional(
            "music",
            self.background_music_url.as_deref(),
            None,
            self.music_base64.as_deref(),
        )?;
        if let Some(volume) = self.music_volume {
            request.music_volume = volume;
        }
        request.platform = self
            .platform
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::parse::<PlatformPreset>)
            .transpose()?;
        request.normalize = self.normalize;
        Ok(request)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeBody {
    pub url: Option<String>,
    pub job_id: Option<String>,
}

impl ProbeBody {
    pub fn into_source(self) -> Result<SourceDescriptor, JobError> {
        SourceDescriptor::from_fields("media", self.url.as_deref(), self.job_id.as_deref(), None)
    }
}

/// Parses an optional enum field, using `default` when absent or blank.
fn parse_or<T>(value: Option<&str>, default: T) -> Result<T, JobError>
where
    T: std::str::FromStr<Err = JobError>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse(),
        None => Ok(default),
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn merge(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MergeBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().merge(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn concat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ConcatBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().concat(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn add_subtitles(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubtitlesBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().add_subtitles(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn add_background_music(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MusicBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state
        .service()
        .add_background_music(body.into_request()?)
        .await?;
    Ok(Json(output.into()))
}

pub async fn resize(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ResizeBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().resize(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn extract_audio(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExtractAudioBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().extract_audio(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn thumbnail(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ThumbnailBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().thumbnail(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn trim(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TrimBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().trim(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn normalize_audio(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NormalizeBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().normalize_audio(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn full_pipeline(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PipelineBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    let output = state.service().full_pipeline(body.into_request()?).await?;
    Ok(Json(output.into()))
}

pub async fn probe(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProbeBody>, JsonRejection>,
) -> ApiResult<ProbeResponse> {
    let Json(body) = body?;
    let info = state.service().probe(body.into_source()?).await?;
    Ok(Json(ProbeResponse {
        success: true,
        info,
    }))
}
