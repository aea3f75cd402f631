#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency: u32,
    pub duration_ms: u64,
}

pub const TONE_ON: Tone = Tone {
    frequency: 1000,
    duration_ms: 150,
};
pub const TONE_OFF: Tone = Tone {
    frequency: 500,
    duration_ms: 150,
};
pub const TONE_EXIT: Tone = Tone {
    frequency: 400,
    duration_ms: 200,
};

pub trait TonePlayer: Send + Sync {
    fn play(&self, tone: Tone);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentTonePlayer;

impl TonePlayer for SilentTonePlayer {
    fn play(&self, tone: Tone) {
        tracing::trace!(?tone, "tone muted");
    }
}

#[cfg(target_os = "windows")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioTonePlayer;

#[cfg(target_os = "windows")]
impl TonePlayer for RodioTonePlayer {
    fn play(&self, tone: Tone) {
        use rodio::source::{SineWave, Source};
        use std::time::Duration;

        // The output stream must outlive the sink, so both live on this thread.
        let spawned = std::thread::Builder::new()
            .name("ontop-tone".into())
            .spawn(move || {
                let Ok((_stream, handle)) = rodio::OutputStream::try_default() else {
                    tracing::warn!("no audio output device for tone");
                    return;
                };
                let Ok(sink) = rodio::Sink::try_new(&handle) else {
                    return;
                };
                let source = SineWave::new(tone.frequency as f32)
                    .take_duration(Duration::from_millis(tone.duration_ms))
                    .amplify(0.25);
                sink.append(source);
                sink.sleep_until_end();
            });
        if let Err(err) = spawned {
            tracing::warn!(?err, "failed to spawn tone thread");
        }
    }
}

pub fn default_player(enabled: bool) -> Box<dyn TonePlayer> {
    if !enabled {
        return Box::new(SilentTonePlayer);
    }
    #[cfg(target_os = "windows")]
    {
        Box::new(RodioTonePlayer)
    }
    #[cfg(not(target_os = "windows"))]
    {
        tracing::debug!("tones are not supported on this platform");
        Box::new(SilentTonePlayer)
    }
}
