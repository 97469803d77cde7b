//! Audio graphs: multi-track mixing, gain and loudness normalisation.

use super::graph::{Filter, FilterChain, FilterGraph, PadLabel, StreamRef};
use crate::error::JobError;

/// Output pad of a mix graph.
pub const MIX_OUTPUT: &str = "aout";

/// One input track of an [`AudioMix`].
#[derive(Debug, Clone, PartialEq)]
pub struct MixTrack {
    /// Input file index the track is read from.
    pub input: usize,
    pub volume: f64,
    /// Repeat the track indefinitely; the mix is still bounded by the primary.
    pub looped: bool,
    /// Fade the track out over this many seconds before the primary ends.
    pub fade_out_secs: Option<f64>,
}

impl MixTrack {
    pub fn new(input: usize, volume: f64) -> Self {
        Self {
            input,
            volume,
            looped: false,
            fade_out_secs: None,
        }
    }

    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    pub fn fade_out(mut self, secs: f64) -> Self {
        self.fade_out_secs = Some(secs);
        self
    }
}

/// Mix of N tracks where track 0 is the primary and fixes the output length.
#[derive(Debug, Clone)]
pub struct AudioMix {
    tracks: Vec<MixTrack>,
    primary_duration_secs: f64,
}

impl AudioMix {
    pub fn new(primary: MixTrack, primary_duration_secs: f64) -> Self {
        Self {
            tracks: vec![primary],
            primary_duration_secs,
        }
    }

    pub fn with_track(mut self, track: MixTrack) -> Self {
        self.tracks.push(track);
        self
    }

    /// Where a fade of `fade_secs` begins so it completes as the primary ends.
    pub fn fade_start(&self, fade_secs: f64) -> f64 {
        (self.primary_duration_secs - fade_secs).max(0.0)
    }

    pub fn build(&self) -> Result<FilterGraph, JobError> {
        if self.tracks.len() < 2 {
            return Err(JobError::invalid("an audio mix needs at least two tracks"));
        }
        ensure_finite("primary duration", self.primary_duration_secs)?;
        if self.primary_duration_secs < 0.0 {
            return Err(JobError::invalid("primary duration cannot be negative"));
        }

        let mut graph = FilterGraph::new();
        let mut mix = FilterChain::new();
        for (i, track) in self.tracks.iter().enumerate() {
            ensure_gain("volume", track.volume)?;
            let label = PadLabel::new(format!("mix{}", i));
            let mut chain = FilterChain::new()
                .input(StreamRef::audio(track.input))
                .filter(Filter::new("volume").arg(track.volume));
            if track.looped {
                chain = chain.filter(
                    Filter::new("aloop")
                        .opt("loop", -1)
                        .opt("size", "2e+09"),
                );
            }
            if let Some(fade) = track.fade_out_secs {
                ensure_gain("fade_out", fade)?;
                chain = chain.filter(
                    Filter::new("afade")
                        .opt("t", "out")
                        .opt("st", self.fade_start(fade))
                        .opt("d", fade),
                );
            }
            graph.push(chain.output(&label));
            mix = mix.input(StreamRef::pad(&label));
        }

        graph.push(
            mix.filter(
                Filter::new("amix")
                    .opt("inputs", self.tracks.len())
                    .opt("duration", "first"),
            )
            .output(&PadLabel::new(MIX_OUTPUT)),
        );
        Ok(graph)
    }
}

/// Gain adjustment on a single audio input, producing `[<label>]`.
pub fn volume_chain(input: usize, volume: f64, label: &PadLabel) -> Result<FilterChain, JobError> {
    ensure_gain("volume", volume)?;
    Ok(FilterChain::new()
        .input(StreamRef::audio(input))
        .filter(Filter::new("volume").arg(volume))
        .output(label))
}

/// EBU R128 loudness normalisation for `-af`.
pub fn loudnorm_chain(target_lufs: f64, peak_limit: f64) -> Result<FilterChain, JobError> {
    ensure_finite("target_lufs", target_lufs)?;
    ensure_finite("peak_limit", peak_limit)?;
    Ok(FilterChain::new().filter(
        Filter::new("loudnorm")
            .opt("I", target_lufs)
            .opt("TP", peak_limit)
            .opt("LRA", 11),
    ))
}

fn ensure_finite(what: &str, value: f64) -> Result<(), JobError> {
    if !value.is_finite() {
        return Err(JobError::invalid(format!("{} must be a finite number", what)));
    }
    Ok(())
}

fn ensure_gain(what: &str, value: f64) -> Result<(), JobError> {
    ensure_finite(what, value)?;
    if value < 0.0 {
        return Err(JobError::invalid(format!(
            "{} cannot be negative, got {}",
            what, value
        )));
    }
    Ok(())
}
