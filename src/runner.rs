use crate::dispatch::Effect;
use crate::keybinds::KeybindStore;
use crate::relay::UiSender;
use crate::sound::TonePlayer;
use crate::window_ops::WindowOps;
use anyhow::Result;
use std::sync::{Arc, Mutex};

pub type ShutdownHook = Box<dyn FnOnce() -> Result<()> + Send>;

/// Executes dispatcher effects against the OS, the keybind file and the UI relay.
pub struct EffectRunner {
    windows: Arc<dyn WindowOps>,
    store: KeybindStore,
    ui: UiSender,
    tones: Box<dyn TonePlayer>,
    shutdown: Mutex<Option<ShutdownHook>>,
}

impl EffectRunner {
    pub fn new(
        windows: Arc<dyn WindowOps>,
        store: KeybindStore,
        ui: UiSender,
        tones: Box<dyn TonePlayer>,
    ) -> Self {
        Self {
            windows,
            store,
            ui,
            tones,
            shutdown: Mutex::new(None),
        }
    }

    /// Registers the hook-teardown run by [`Effect::StopHooks`]. It fires at most once.
    pub fn set_shutdown_hook(&self, hook: Option<ShutdownHook>) {
        if let Ok(mut guard) = self.shutdown.lock() {
            *guard = hook;
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&self, effect: Effect) {
        match effect {
            Effect::SetTopmost { window, enable } => {
                if let Err(err) = self.windows.set_topmost(window, enable) {
                    tracing::warn!("failed to change topmost state: {err:#}");
                }
            }
            Effect::RestoreTopmost(window) => {
                if !self.windows.is_window(window) {
                    tracing::debug!(?window, "window is gone; skipping restore");
                    return;
                }
                if let Err(err) = self.windows.set_topmost(window, false) {
                    tracing::warn!("failed to restore window: {err:#}");
                }
            }
            Effect::Tone(tone) => self.tones.play(tone),
            Effect::Persist(map) => {
                if let Err(err) = self.store.save(&map) {
                    tracing::error!("failed to save keybinds: {err:#}");
                }
            }
            Effect::Ui(message) => self.ui.send(message),
            Effect::StopHooks => {
                let hook = self.shutdown.lock().ok().and_then(|mut guard| guard.take());
                if let Some(hook) = hook {
                    if let Err(err) = hook() {
                        tracing::warn!("failed to stop input hooks: {err:#}");
                    }
                }
            }
        }
    }
}
