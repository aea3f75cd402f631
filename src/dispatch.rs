use crate::capture::{CaptureSession, CaptureStep, StartOutcome};
use crate::input::{
    normalize_key, normalize_mouse, InputEvent, InputState, RawButton, RawKey, ALT, CTRL,
};
use crate::keybinds::{KeybindMap, Trigger, EXIT, TOGGLE};
use crate::matcher::is_active;
use crate::relay::UiMessage;
use crate::sound::{Tone, TONE_EXIT, TONE_OFF, TONE_ON};
use crate::toggle::{ToggleController, ToggleDecision};
use crate::window_ops::{WindowHandle, WindowOps};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Key that opens the settings panel while ctrl+alt are held.
const SETTINGS_KEY: &str = "k";

pub const TOOLTIP_ON: &str = "Always On Top: ON";
pub const TOOLTIP_OFF: &str = "Always On Top: OFF";

/// Side effect requested by the dispatcher, executed by the effect runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SetTopmost { window: WindowHandle, enable: bool },
    /// Drop topmost on exit; skipped if the window no longer exists.
    RestoreTopmost(WindowHandle),
    Tone(Tone),
    Persist(KeybindMap),
    Ui(UiMessage),
    StopHooks,
}

#[derive(Debug)]
struct DispatchState {
    input: InputState,
    keybinds: KeybindMap,
    toggle: ToggleController,
    capture: CaptureSession,
}

/// Owns all mutable input state for the process lifetime.
pub struct Dispatcher {
    state: Mutex<DispatchState>,
    windows: Arc<dyn WindowOps>,
}

fn state_tooltip(topmost: bool) -> String {
    let text = if topmost { TOOLTIP_ON } else { TOOLTIP_OFF };
    text.to_string()
}

impl Dispatcher {
    pub fn new(keybinds: KeybindMap, windows: Arc<dyn WindowOps>, threshold: Duration) -> Self {
        Self {
            state: Mutex::new(DispatchState {
                input: InputState::default(),
                keybinds,
                toggle: ToggleController::new(threshold),
                capture: CaptureSession::default(),
            }),
            windows,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("dispatcher lock poisoned; continuing with inner state");
            poisoned.into_inner()
        })
    }

    pub fn keybinds(&self) -> KeybindMap {
        self.lock().keybinds.clone()
    }

    pub fn capture_action(&self) -> Option<String> {
        self.lock().capture.action().map(str::to_string)
    }

    pub fn toggled_windows(&self) -> Vec<WindowHandle> {
        self.lock().toggle.toggled_windows().copied().collect()
    }

    pub fn handle(&self, event: InputEvent, now: Instant) -> Vec<Effect> {
        let mut state = self.lock();
        match event {
            InputEvent::Key { key, pressed: true } => self.on_key_press(&mut state, key, now),
            InputEvent::Key { key, pressed: false } => {
                state.input.release_key(key);
                Vec::new()
            }
            InputEvent::Mouse { button, pressed: true } => {
                self.on_mouse_press(&mut state, button, now)
            }
            InputEvent::Mouse { button, pressed: false } => {
                state.input.release_button(button);
                Vec::new()
            }
        }
    }

    fn on_key_press(&self, state: &mut DispatchState, key: RawKey, now: Instant) -> Vec<Effect> {
        let fresh = state.input.press_key(key);
        let symbol = normalize_key(key);
        tracing::trace!(?key, ?symbol, fresh, "key pressed");

        let mut effects = Vec::new();
        if fresh && symbol.as_deref() == Some(SETTINGS_KEY) {
            let held = state.input.keys_down();
            if held.contains(CTRL) && held.contains(ALT) {
                effects.push(Effect::Ui(UiMessage::OpenSettings));
            }
        }

        match state.capture.on_key_press(symbol.as_deref()) {
            CaptureStep::NotCapturing => {}
            CaptureStep::Waiting => return effects,
            CaptureStep::Armed => {
                let mut keys = state.input.keys_down();
                let mouse = state.input.mouse_down();
                // The final key is dropped unless nothing else is held. Triggers are never empty.
                if let Some(sym) = &symbol {
                    if keys.len() > 1 || !mouse.is_empty() {
                        keys.remove(sym);
                    }
                }
                let trigger = Trigger { keys, mouse };
                effects.extend(Self::commit_capture(state, trigger));
                return effects;
            }
        }

        if fresh {
            effects.extend(self.match_bindings(state, now));
        }
        effects
    }

    fn on_mouse_press(
        &self,
        state: &mut DispatchState,
        button: RawButton,
        now: Instant,
    ) -> Vec<Effect> {
        let fresh = state.input.press_button(button);
        let symbol = normalize_mouse(button);
        tracing::trace!(?button, ?symbol, fresh, "mouse pressed");

        match state.capture.on_mouse_press(symbol) {
            CaptureStep::NotCapturing => {}
            CaptureStep::Waiting => return Vec::new(),
            CaptureStep::Armed => {
                let trigger = Trigger {
                    keys: state.input.keys_down(),
                    mouse: state.input.mouse_down(),
                };
                return Self::commit_capture(state, trigger);
            }
        }

        if !fresh {
            return Vec::new();
        }
        self.match_bindings(state, now)
    }

    fn commit_capture(state: &mut DispatchState, trigger: Trigger) -> Vec<Effect> {
        let Some(action) = state.capture.commit() else {
            return Vec::new();
        };
        tracing::info!(%action, %trigger, "keybind captured");
        let message = format!("{} updated to:\n{}", action.to_uppercase(), trigger);
        state.keybinds.set(&action, trigger);
        vec![
            Effect::Persist(state.keybinds.clone()),
            Effect::Ui(UiMessage::ShowConfirmation(message)),
        ]
    }

    fn match_bindings(&self, state: &mut DispatchState, now: Instant) -> Vec<Effect> {
        let keys = state.input.keys_down();
        let mouse = state.input.mouse_down();
        let active = |action: &str| {
            state
                .keybinds
                .get(action)
                .is_some_and(|trigger| is_active(trigger, &keys, &mouse))
        };
        let toggle_active = active(TOGGLE);
        let exit_active = active(EXIT);

        let mut effects = Vec::new();
        if toggle_active {
            tracing::debug!(?keys, ?mouse, "toggle bind active");
            effects.extend(self.toggle_under_cursor(state, now));
        }
        if exit_active {
            tracing::debug!(?keys, ?mouse, "exit bind active");
            effects.extend(Self::exit_sequence(state));
        }
        effects
    }

    fn toggle_under_cursor(&self, state: &mut DispatchState, now: Instant) -> Vec<Effect> {
        let Some(window) = self.windows.window_under_cursor() else {
            tracing::debug!("no window under cursor");
            return Vec::new();
        };
        let topmost = self.windows.is_topmost(window);
        tracing::trace!(?window, topmost, phase = ?state.toggle.phase(), "toggle activation");
        match state.toggle.on_activation(now, window, topmost) {
            ToggleDecision::Report { topmost } => {
                vec![Effect::Ui(UiMessage::ShowTooltip(state_tooltip(topmost)))]
            }
            ToggleDecision::Flip { enable } => vec![
                Effect::SetTopmost { window, enable },
                Effect::Ui(UiMessage::ShowTooltip(state_tooltip(enable))),
                Effect::Tone(if enable { TONE_ON } else { TONE_OFF }),
            ],
        }
    }

    fn exit_sequence(state: &mut DispatchState) -> Vec<Effect> {
        let mut effects: Vec<Effect> = state
            .toggle
            .take_toggled()
            .into_iter()
            .map(Effect::RestoreTopmost)
            .collect();
        effects.push(Effect::Tone(TONE_EXIT));
        effects.push(Effect::StopHooks);
        effects.push(Effect::Ui(UiMessage::Quit));
        effects
    }

    /// Arms a rebind for `action`. Ignored while another capture is running.
    pub fn start_capture(&self, action: &str) -> Vec<Effect> {
        let mut state = self.lock();
        match state.capture.start(action) {
            StartOutcome::Started => {
                tracing::info!(%action, "waiting for new keybind");
                vec![Effect::Ui(UiMessage::ShowCapturePrompt(action.to_string()))]
            }
            StartOutcome::AlreadyActive => {
                tracing::debug!(%action, "capture already in progress");
                Vec::new()
            }
        }
    }

    pub fn reset_to_default(&self) -> Vec<Effect> {
        let mut state = self.lock();
        state.keybinds = KeybindMap::default();
        tracing::info!("keybinds reset to defaults");
        vec![Effect::Persist(state.keybinds.clone())]
    }

    /// Clean exit requested outside the input hooks (tray menu).
    pub fn exit(&self) -> Vec<Effect> {
        let mut state = self.lock();
        Self::exit_sequence(&mut state)
    }
}
