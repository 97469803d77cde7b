//! Crossfade chains for clip concatenation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::graph::{Filter, FilterChain, FilterGraph, PadLabel, StreamRef};
use crate::error::JobError;

/// Output pad of a crossfade graph.
pub const CROSSFADE_OUTPUT: &str = "vout";

/// How consecutive clips are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Hard cut through the concat demuxer; no re-encode of the joins.
    #[default]
    None,
    Fade,
    Dissolve,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fade => "fade",
            Self::Dissolve => "dissolve",
        }
    }
}

impl FromStr for Transition {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "fade" => Ok(Self::Fade),
            "dissolve" => Ok(Self::Dissolve),
            other => Err(JobError::invalid(format!(
                "unknown transition '{}', expected none, fade or dissolve",
                other
            ))),
        }
    }
}

/// Offset of each `xfade` stage.
///
/// The first stage starts at 0. Every later stage starts one transition
/// before the end of the chained output so far, clamped at 0. Unknown
/// durations give 0 for every stage.
pub fn crossfade_offsets(clip_count: usize, duration: f64, clip_durations: &[f64]) -> Vec<f64> {
    let stages = clip_count.saturating_sub(1);
    if clip_durations.len() != clip_count {
        return vec![0.0; stages];
    }
    let mut offsets = Vec::with_capacity(stages);
    let mut chained = 0.0;
    for i in 0..stages {
        let offset = if i == 0 {
            0.0
        } else {
            (chained - duration).max(0.0)
        };
        chained = offset + clip_durations[i + 1];
        offsets.push(offset);
    }
    offsets
}

/// Builds the video graph joining `clip_count` inputs with `xfade` stages.
pub fn crossfade_graph(
    clip_count: usize,
    transition: Transition,
    duration: f64,
    clip_durations: &[f64],
) -> Result<FilterGraph, JobError> {
    if clip_count < 2 {
        return Err(JobError::invalid("a crossfade needs at least two clips"));
    }
    if transition == Transition::None {
        return Err(JobError::invalid("crossfade requires a fade or dissolve transition"));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(JobError::invalid(format!(
            "transition_duration must be a positive number, got {}",
            duration
        )));
    }
    if clip_durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
        return Err(JobError::invalid("clip durations must be finite and non-negative"));
    }

    let mut graph = FilterGraph::new();
    let clips: Vec<PadLabel> = (0..clip_count)
        .map(|i| PadLabel::new(format!("v{}", i)))
        .collect();
    for (i, label) in clips.iter().enumerate() {
        graph.push(
            FilterChain::new()
                .input(StreamRef::video(i))
                .filter(Filter::new("setpts").arg("PTS-STARTPTS"))
                .output(label),
        );
    }

    let offsets = crossfade_offsets(clip_count, duration, clip_durations);
    let last = offsets.len() - 1;
    let mut previous = clips[0].clone();
    for (i, offset) in offsets.into_iter().enumerate() {
        let output = if i == last {
            PadLabel::new(CROSSFADE_OUTPUT)
        } else {
            PadLabel::new(format!("x{}", i))
        };
        graph.push(
            FilterChain::new()
                .input(StreamRef::pad(&previous))
                .input(StreamRef::pad(&clips[i + 1]))
                .filter(
                    Filter::new("xfade")
                        .opt("transition", transition.as_str())
                        .opt("duration", duration)
                        .opt("offset", offset),
                )
                .output(&output),
        );
        previous = output;
    }

    Ok(graph)
}

/// Body of a concat-demuxer list file.
pub fn concat_list(paths: &[std::path::PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', r"'\''")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_two_clip_render() {
        let graph = crossfade_graph(2, Transition::Fade, 0.5, &[]).unwrap();
        assert_eq!(
            graph.render(),
            "[0:v]setpts=PTS-STARTPTS[v0];[1:v]setpts=PTS-STARTPTS[v1];\
             [v0][v1]xfade=transition=fade:duration=0.5:offset=0[vout]"
        );
    }

    #[test]
    fn test_stage_structure_for_many_clips() {
        for n in 2..7 {
            let graph = crossfade_graph(n, Transition::Dissolve, 1.0, &[]).unwrap();
            assert!(graph.check_wiring().is_ok());
            assert_eq!(graph.filters_named("xfade").count(), n - 1);
            assert_eq!(graph.result_pads(), vec![&PadLabel::new(CROSSFADE_OUTPUT)]);

            let stages: Vec<&FilterChain> = graph
                .chains()
                .iter()
                .filter(|c| c.find("xfade").is_some())
                .collect();
            for i in 1..stages.len() {
                let left = stages[i].inputs()[0].label().unwrap();
                assert_eq!(left, &stages[i - 1].outputs()[0]);
                let right = stages[i].inputs()[1].label().unwrap();
                assert_eq!(right.as_str(), format!("v{}", i + 1));
            }
        }
    }

    #[test]
    fn test_chained_offsets() {
        let offsets = crossfade_offsets(3, 1.0, &[5.0, 4.0, 6.0]);
        assert_eq!(offsets, vec![0.0, 3.0]);

        let clamped = crossfade_offsets(3, 2.0, &[1.0, 1.0, 1.0]);
        assert_eq!(clamped, vec![0.0, 0.0]);

        assert_eq!(crossfade_offsets(3, 1.0, &[5.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_offsets_rendered_into_stages() {
        let graph = crossfade_graph(3, Transition::Fade, 1.0, &[5.0, 4.0, 6.0]).unwrap();
        let offsets: Vec<&str> = graph
            .filters_named("xfade")
            .filter_map(|f| f.get("offset"))
            .collect();
        assert_eq!(offsets, vec!["0", "3"]);
    }

    #[test]
    fn test_first_stage_starts_at_zero_with_known_durations() {
        let graph = crossfade_graph(3, Transition::Fade, 1.0, &[30.0, 30.0, 30.0]).unwrap();
        let rendered = graph.render();
        assert!(rendered.contains("[v0][v1]xfade=transition=fade:duration=1:offset=0[x0]"));
        assert!(rendered.contains("[x0][v2]xfade=transition=fade:duration=1:offset=29[vout]"));
    }

    #[test]
    fn test_invalid_crossfades() {
        assert!(crossfade_graph(1, Transition::Fade, 0.5, &[]).is_err());
        assert!(crossfade_graph(2, Transition::None, 0.5, &[]).is_err());
        assert!(crossfade_graph(2, Transition::Fade, 0.0, &[]).is_err());
        assert!(crossfade_graph(2, Transition::Fade, f64::NAN, &[]).is_err());
        assert!("wipe".parse::<Transition>().is_err());
    }

    #[test]
    fn test_concat_list() {
        let list = concat_list(&[PathBuf::from("/j/clip_0.mp4"), PathBuf::from("/j/clip_1.mp4")]);
        assert_eq!(list, "file '/j/clip_0.mp4'\nfile '/j/clip_1.mp4'\n");
    }
}
