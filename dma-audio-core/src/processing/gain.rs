use crate::traits::audio_backend::PlaybackStream;

/// Linear output gain, owned by the session so it outlives any one stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterGain {
    value: f32,
}

impl MasterGain {
    pub fn get(&self) -> f32 {
        self.value
    }

    /// Store `value` and push it to `playback` when a stream is open.
    pub fn set<P: PlaybackStream>(&mut self, value: f32, playback: Option<&mut P>) {
        self.value = value;
        if let Some(playback) = playback {
            self.apply(playback);
        }
    }

    pub fn apply<P: PlaybackStream>(&self, playback: &mut P) {
        playback.set_gain(self.value);
    }
}

impl Default for MasterGain {
    fn default() -> Self {
        Self { value: 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::DmaError;
    use crate::models::format::ObtainedSpec;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct GainProbe {
        applied: Vec<f32>,
    }

    impl PlaybackStream for GainProbe {
        fn obtained_spec(&self) -> Result<ObtainedSpec, DmaError> {
            Err(DmaError::FormatQuery("probe".into()))
        }

        fn resume(&mut self) -> Result<(), DmaError> {
            Ok(())
        }

        fn set_gain(&mut self, gain: f32) {
            self.applied.push(gain);
        }
    }

    #[test]
    fn defaults_to_unity() {
        assert_relative_eq!(MasterGain::default().get(), 1.0);
    }

    #[test]
    fn set_without_stream_still_stores() {
        let mut gain = MasterGain::default();
        gain.set::<GainProbe>(0.25, None);
        assert_relative_eq!(gain.get(), 0.25);
    }

    #[test]
    fn set_with_stream_applies() {
        let mut gain = MasterGain::default();
        let mut probe = GainProbe::default();
        gain.set(0.5, Some(&mut probe));
        gain.apply(&mut probe);

        assert_eq!(probe.applied.len(), 2);
        assert_relative_eq!(probe.applied[0], 0.5);
        assert_relative_eq!(probe.applied[1], 0.5);
    }
}
