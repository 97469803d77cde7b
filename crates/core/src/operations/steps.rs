//! Builders for the engine invocations behind each operation.
//!
//! These are pure: they only assemble a [`TransformStep`] from artifacts and
//! parameters. The full pipeline reuses them for its stages.

use std::time::Duration;

use crate::engine::{AudioFormat, StepFilter, StepInput, TransformStep};
use crate::error::JobError;
use crate::filter::{
    crossfade_graph, loudnorm_chain, volume_chain, AudioMix, Dimensions, FillColor, FilterGraph,
    FitMode, MixTrack, PadLabel, SubtitleStyle, Transition,
};
use crate::job::Artifact;

use super::requests::TrimRange;

const H264: [&str; 6] = ["-c:v", "libx264", "-preset", "medium", "-crf", "23"];
const AAC_192K: [&str; 4] = ["-c:a", "aac", "-b:a", "192k"];
const FASTSTART: [&str; 2] = ["-movflags", "+faststart"];

/// Gain stage label for the narration track.
const NARRATION_PAD: &str = "a";

/// Adds every unconsumed output pad of `graph` as a `-map`.
fn map_results(mut step: TransformStep, graph: &FilterGraph) -> Result<TransformStep, JobError> {
    graph.check_wiring().map_err(JobError::invalid)?;
    for pad in graph.result_pads() {
        step = step.map_pad(pad);
    }
    Ok(step)
}

/// Puts `audio` under the picture of `video`; the shorter stream wins.
///
/// With a volume the narration goes through a gain stage, otherwise it is
/// mapped as is.
pub fn merge(
    video: &Artifact,
    audio: &Artifact,
    volume: Option<f64>,
    output: Artifact,
    timeout: Duration,
) -> Result<TransformStep, JobError> {
    let step = TransformStep::new("merge_audio", output, timeout)
        .input(StepInput::file(&video.path))
        .input(StepInput::file(&audio.path))
        .map("0:v");

    let step = match volume {
        Some(volume) => {
            let graph =
                FilterGraph::new().chain(volume_chain(1, volume, &PadLabel::new(NARRATION_PAD))?);
            let step = step.filter(StepFilter::Complex(graph.clone()));
            map_results(step, &graph)?.output_options(["-c:v", "copy"])
        }
        None => step.map("1:a").output_options(["-c:v", "copy"]),
    };

    Ok(step
        .output_options(AAC_192K)
        .output_options(["-shortest"])
        .output_options(FASTSTART))
}

/// Stream-copies the files listed in a concat-demuxer list.
pub fn concat_copy(list: &Artifact, output: Artifact, timeout: Duration) -> TransformStep {
    TransformStep::new("concat", output, timeout)
        .input(StepInput::file(&list.path).with_options(["-f", "concat", "-safe", "0"]))
        .output_options(["-c", "copy"])
        .output_options(FASTSTART)
}

/// Joins clips with `xfade` transitions. Video only, re-encoded.
pub fn concat_crossfade(
    clips: &[Artifact],
    transition: Transition,
    transition_duration: f64,
    clip_durations: &[f64],
    output: Artifact,
    timeout: Duration,
) -> Result<TransformStep, JobError> {
    let graph = crossfade_graph(clips.len(), transition, transition_duration, clip_durations)?;
    let mut step = TransformStep::new("concat_crossfade", output, timeout);
    for clip in clips {
        step = step.input(StepInput::file(&clip.path));
    }
    let step = step.filter(StepFilter::Complex(graph.clone()));
    Ok(map_results(step, &graph)?
        .output_options(H264)
        .output_options(FASTSTART))
}

/// Renders subtitles into the picture.
pub fn burn_subtitles(
    video: &Artifact,
    subtitles: &Artifact,
    style: &SubtitleStyle,
    output: Artifact,
    timeout: Duration,
) -> TransformStep {
    TransformStep::new("add_subtitles", output, timeout)
        .input(StepInput::file(&video.path))
        .filter(StepFilter::Video(style.burn_in_chain(&subtitles.path)))
        .output_options(H264)
        .output_options(["-c:a", "copy"])
        .output_options(FASTSTART)
}

/// Muxes subtitles as a soft `mov_text` track without re-encoding.
pub fn mux_subtitles(
    video: &Artifact,
    subtitles: &Artifact,
    output: Artifact,
    timeout: Duration,
) -> TransformStep {
    TransformStep::new("mux_subtitles", output, timeout)
        .input(StepInput::file(&video.path))
        .input(StepInput::file(&subtitles.path))
        .map("0:v")
        .map("0:a?")
        .map("1:0")
        .output_options(["-c:v", "copy", "-c:a", "copy", "-c:s", "mov_text"])
        .output_options(FASTSTART)
}

/// Parameters of a background-music mix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicMix {
    pub voice_volume: f64,
    pub music_volume: f64,
    pub looped: bool,
    /// Fade-out length; 0 disables it.
    pub fade_out: f64,
    /// Length of the video the music is laid under.
    pub video_duration: f64,
}

/// Mixes `music` under the audio of `video`; output length follows the video.
pub fn add_music(
    video: &Artifact,
    music: &Artifact,
    mix: MusicMix,
    output: Artifact,
    timeout: Duration,
) -> Result<TransformStep, JobError> {
    let mut track = MixTrack::new(1, mix.music_volume).looped(mix.looped);
    if mix.fade_out > 0.0 {
        track = track.fade_out(mix.fade_out);
    }
    let graph = AudioMix::new(MixTrack::new(0, mix.voice_volume), mix.video_duration)
        .with_track(track)
        .build()?;

    let step = TransformStep::new("add_music", output, timeout)
        .input(StepInput::file(&video.path))
        .input(StepInput::file(&music.path))
        .filter(StepFilter::Complex(graph.clone()))
        .map("0:v");
    Ok(map_results(step, &graph)?
        .output_options(["-c:v", "copy"])
        .output_options(AAC_192K)
        .output_options(["-shortest"])
        .output_options(FASTSTART))
}

/// Fits the picture into `target`.
pub fn resize(
    video: &Artifact,
    target: Dimensions,
    fit: FitMode,
    fill: &FillColor,
    output: Artifact,
    timeout: Duration,
) -> TransformStep {
    TransformStep::new("resize", output, timeout)
        .input(StepInput::file(&video.path))
        .filter(StepFilter::Video(fit.chain(target, fill)))
        .output_options(H264)
        .output_options(["-c:a", "copy"])
        .output_options(FASTSTART)
}

pub fn extract_audio(
    video: &Artifact,
    format: AudioFormat,
    output: Artifact,
    timeout: Duration,
) -> TransformStep {
    let step = TransformStep::new("extract_audio", output, timeout)
        .input(StepInput::file(&video.path))
        .output_options(["-vn", "-c:a", format.ffmpeg_codec()]);
    if format.is_lossless() {
        step
    } else {
        step.output_options(["-b:a", "192k"])
    }
}

/// Grabs one frame at `timestamp`, letterboxed into `size`.
pub fn thumbnail(
    video: &Artifact,
    timestamp: f64,
    size: Dimensions,
    output: Artifact,
    timeout: Duration,
) -> TransformStep {
    TransformStep::new("thumbnail", output, timeout)
        .input(StepInput::file(&video.path).with_options(["-ss".to_string(), timestamp.to_string()]))
        .filter(StepFilter::Video(
            FitMode::Contain.chain(size, &FillColor::black()),
        ))
        .output_options(["-vframes", "1", "-q:v", "2"])
}

/// Cuts `range` out of `video` without re-encoding.
pub fn trim(video: &Artifact, range: TrimRange, output: Artifact, timeout: Duration) -> TransformStep {
    let mut step = TransformStep::new("trim", output, timeout).input(
        StepInput::file(&video.path).with_options(["-ss".to_string(), range.start.to_string()]),
    );
    if let Some(duration) = range.duration {
        step = step.output_options(["-t".to_string(), duration.to_string()]);
    }
    step.output_options(["-c", "copy"]).output_options(FASTSTART)
}

/// Loudness-normalises the audio track; video is copied.
pub fn normalize(
    video: &Artifact,
    target_lufs: f64,
    peak_limit: f64,
    output: Artifact,
    timeout: Duration,
) -> Result<TransformStep, JobError> {
    Ok(TransformStep::new("normalize_audio", output, timeout)
        .input(StepInput::file(&video.path))
        .filter(StepFilter::Audio(loudnorm_chain(target_lufs, peak_limit)?))
        .output_options(["-c:v", "copy"])
        .output_options(AAC_192K)
        .output_options(FASTSTART))
}
