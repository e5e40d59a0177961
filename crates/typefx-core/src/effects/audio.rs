//! Audio side-effect hooks.
//!
//! The engine only decides *when* a sound plays. Synthesis belongs to
//! whatever implements [`AudioSink`].

use serde::{Deserialize, Serialize};

/// Sounds the balloon lifecycle triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Inflate,
    Pop,
    LoudPop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Bandpass,
    Highpass,
}

/// Shape of a filtered-noise cue for the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueProfile {
    pub duration_ms: u32,
    pub filter: FilterKind,
    pub frequency_hz: f32,
    pub peak_gain: f32,
}

impl SoundCue {
    pub fn profile(&self) -> CueProfile {
        match self {
            SoundCue::Inflate => CueProfile {
                duration_ms: 400,
                filter: FilterKind::Bandpass,
                frequency_hz: 800.0,
                peak_gain: 0.08,
            },
            SoundCue::Pop => CueProfile {
                duration_ms: 80,
                filter: FilterKind::Bandpass,
                frequency_hz: 800.0,
                peak_gain: 0.2,
            },
            SoundCue::LoudPop => CueProfile {
                duration_ms: 120,
                filter: FilterKind::Highpass,
                frequency_hz: 1200.0,
                peak_gain: 0.5,
            },
        }
    }
}

/// Receives sound cues. Only called while audio is enabled.
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Records cues in order, for tests and summaries.
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    cues: Vec<SoundCue>,
}

impl CueLog {
    pub fn cues(&self) -> &[SoundCue] {
        &self.cues
    }

    pub fn count(&self, cue: SoundCue) -> usize {
        self.cues.iter().filter(|c| **c == cue).count()
    }
}

impl AudioSink for CueLog {
    fn play(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loud_pop_is_louder_than_pop() {
        assert!(SoundCue::LoudPop.profile().peak_gain > SoundCue::Pop.profile().peak_gain);
        assert_eq!(SoundCue::LoudPop.profile().filter, FilterKind::Highpass);
    }

    #[test]
    fn cue_log_counts() {
        let mut log = CueLog::default();
        log.play(SoundCue::Inflate);
        log.play(SoundCue::Pop);
        log.play(SoundCue::Inflate);
        assert_eq!(log.count(SoundCue::Inflate), 2);
        assert_eq!(log.cues().len(), 3);
    }
}
