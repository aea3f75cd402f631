use ontop::dispatch::{Dispatcher, Effect, TOOLTIP_OFF, TOOLTIP_ON};
use ontop::input::{vk, InputEvent, RawButton, RawKey};
use ontop::keybinds::{KeybindMap, KeybindStore, Trigger, EXIT, TOGGLE};
use ontop::relay::{ui_channel, UiMessage, UiReceiver};
use ontop::runner::EffectRunner;
use ontop::sound::{TONE_EXIT, TONE_OFF, TONE_ON};
use ontop::toggle::DEFAULT_DOUBLE_TAP_THRESHOLD;
use ontop::window_ops::{WindowHandle, WindowOps};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use fake_windows::{FakeWindows, RecordingTones};

const WIN: WindowHandle = WindowHandle(0x2a);

struct Harness {
    _dir: TempDir,
    store: KeybindStore,
    windows: Arc<FakeWindows>,
    tones: RecordingTones,
    dispatcher: Dispatcher,
    runner: EffectRunner,
    ui: UiReceiver,
    start: Instant,
}

impl Harness {
    fn new(windows: FakeWindows) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = KeybindStore::new(dir.path().join("keybinds").join("keybinds.json"));
        let windows = Arc::new(windows);
        let tones = RecordingTones::default();
        let (ui_tx, ui) = ui_channel();
        let dispatcher = Dispatcher::new(
            store.load(),
            windows.clone() as Arc<dyn WindowOps>,
            DEFAULT_DOUBLE_TAP_THRESHOLD,
        );
        let runner = EffectRunner::new(
            windows.clone(),
            store.clone(),
            ui_tx,
            Box::new(tones.clone()),
        );
        Self {
            _dir: dir,
            store,
            windows,
            tones,
            dispatcher,
            runner,
            ui,
            start: Instant::now(),
        }
    }

    fn send(&self, event: InputEvent, at_ms: u64) -> Vec<Effect> {
        let effects = self
            .dispatcher
            .handle(event, self.start + Duration::from_millis(at_ms));
        self.runner.run(effects.clone());
        effects
    }

    fn key(&self, code: u32, pressed: bool, at_ms: u64) -> Vec<Effect> {
        self.send(
            InputEvent::Key {
                key: RawKey::vk(code),
                pressed,
            },
            at_ms,
        )
    }

    fn button(&self, button: RawButton, pressed: bool, at_ms: u64) -> Vec<Effect> {
        self.send(InputEvent::Mouse { button, pressed }, at_ms)
    }

    fn hold_ctrl_alt(&self) {
        self.key(vk::LCONTROL, true, 0);
        self.key(vk::LMENU, true, 0);
    }

    /// Press and release a mouse button at `at_ms`.
    fn click(&self, button: RawButton, at_ms: u64) -> Vec<Effect> {
        let effects = self.button(button, true, at_ms);
        self.button(button, false, at_ms + 10);
        effects
    }

    fn tooltips(&self) -> Vec<String> {
        self.ui
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                UiMessage::ShowTooltip(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[test]
fn double_tap_pins_and_unpins_window() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.hold_ctrl_alt();

    h.click(RawButton::X1, 0);
    assert!(!h.windows.topmost_of(WIN), "first tap only reports");

    h.click(RawButton::X1, 200);
    assert!(h.windows.topmost_of(WIN));
    assert_eq!(h.dispatcher.toggled_windows(), vec![WIN]);

    h.click(RawButton::X1, 1000);
    h.click(RawButton::X1, 1100);
    assert!(!h.windows.topmost_of(WIN), "round trip restores the original state");
    assert!(h.dispatcher.toggled_windows().is_empty());

    assert_eq!(h.tooltips(), vec![TOOLTIP_OFF, TOOLTIP_ON, TOOLTIP_ON, TOOLTIP_OFF]);
    assert_eq!(h.tones.played(), vec![TONE_ON, TONE_OFF]);
    assert_eq!(h.windows.calls(), vec![(WIN, true), (WIN, false)]);
}

#[test]
fn slow_taps_never_flip() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.hold_ctrl_alt();
    for at in [0, 500, 1000] {
        h.click(RawButton::X1, at);
    }
    assert!(h.windows.calls().is_empty());
    assert_eq!(h.tooltips(), vec![TOOLTIP_OFF; 3]);
}

#[test]
fn trigger_without_modifiers_does_nothing() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.click(RawButton::X1, 0);
    h.click(RawButton::X1, 100);
    assert!(h.windows.calls().is_empty());
    assert!(h.ui.drain().is_empty());
}

#[test]
fn extra_mouse_button_blocks_both_bindings() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.key(vk::LCONTROL, true, 0);
    h.button(RawButton::X2, true, 0);
    h.button(RawButton::X1, true, 0);
    let effects = h.key(vk::LMENU, true, 0);
    assert!(effects.is_empty(), "mouse sets must match exactly");
    assert!(h.ui.drain().is_empty());
}

#[test]
fn capture_commits_held_modifiers_and_persists() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.runner.run(h.dispatcher.start_capture(TOGGLE));
    assert_eq!(
        h.ui.drain(),
        vec![UiMessage::ShowCapturePrompt(TOGGLE.into())]
    );

    h.hold_ctrl_alt();
    assert_eq!(h.dispatcher.capture_action().as_deref(), Some(TOGGLE));
    h.key(vk::KEY_P, true, 50);

    let expected = Trigger::new(["ctrl", "alt"], Vec::<String>::new());
    assert_eq!(h.dispatcher.keybinds().get(TOGGLE), Some(&expected));
    assert_eq!(h.dispatcher.capture_action(), None);

    let persisted = std::fs::read_to_string(h.store.path()).unwrap();
    let persisted = KeybindMap::from_json(&persisted).unwrap();
    assert_eq!(persisted.get(TOGGLE), Some(&expected));
    assert_eq!(persisted.get(EXIT), KeybindMap::default().get(EXIT));

    assert_eq!(
        h.ui.drain(),
        vec![UiMessage::ShowConfirmation(
            "TOGGLE updated to:\nctrl + alt".into()
        )]
    );
}

#[test]
fn capture_with_mouse_button_includes_it() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.runner.run(h.dispatcher.start_capture(EXIT));
    h.key(vk::LSHIFT, true, 0);
    let effects = h.button(RawButton::X1, true, 10);
    assert!(matches!(effects.first(), Some(Effect::Persist(_))));
    assert_eq!(
        h.dispatcher.keybinds().get(EXIT),
        Some(&Trigger::new(["shift"], ["x1"]))
    );
    // Input during a finalized capture does not toggle anything.
    assert!(h.windows.calls().is_empty());
}

#[test]
fn modifier_only_capture_never_finalizes() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.dispatcher.start_capture(TOGGLE);
    h.key(vk::LCONTROL, true, 0);
    h.key(vk::LCONTROL, false, 10);
    h.key(vk::LSHIFT, true, 20);
    h.button(RawButton::Left, true, 30);
    assert_eq!(h.dispatcher.capture_action().as_deref(), Some(TOGGLE));
    assert_eq!(h.dispatcher.keybinds(), KeybindMap::default());
}

#[test]
fn bindings_are_suppressed_while_capturing() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.dispatcher.start_capture(TOGGLE);
    h.hold_ctrl_alt();
    // x1 finalizes the capture instead of reaching the toggle.
    h.click(RawButton::X1, 0);
    h.click(RawButton::X1, 100);
    assert!(h.windows.calls().is_empty());
}

#[test]
fn exit_restores_pinned_windows_before_quitting() {
    let other = WindowHandle(0x99);
    let fake = FakeWindows::with_window(WIN, false);
    fake.add(other, true);
    let h = Harness::new(fake);

    let stopped = Arc::new(AtomicUsize::new(0));
    let counter = stopped.clone();
    h.runner.set_shutdown_hook(Some(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })));

    h.hold_ctrl_alt();
    h.click(RawButton::X1, 0);
    h.click(RawButton::X1, 100);
    assert!(h.windows.topmost_of(WIN));
    h.ui.drain();

    let effects = h.click(RawButton::X2, 1000);
    assert_eq!(
        effects,
        vec![
            Effect::RestoreTopmost(WIN),
            Effect::Tone(TONE_EXIT),
            Effect::StopHooks,
            Effect::Ui(UiMessage::Quit),
        ]
    );
    assert!(!h.windows.topmost_of(WIN));
    assert!(h.windows.topmost_of(other), "windows pinned elsewhere are left alone");
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
    assert_eq!(h.ui.drain(), vec![UiMessage::Quit]);

    // The teardown hook runs at most once.
    h.runner.run(h.dispatcher.exit());
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
}

#[test]
fn exit_with_nothing_pinned_still_quits() {
    let h = Harness::new(FakeWindows::default());
    assert_eq!(
        h.dispatcher.exit(),
        vec![
            Effect::Tone(TONE_EXIT),
            Effect::StopHooks,
            Effect::Ui(UiMessage::Quit),
        ]
    );
}

#[test]
fn exit_skips_windows_that_are_gone() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.hold_ctrl_alt();
    h.click(RawButton::X1, 0);
    h.click(RawButton::X1, 100);
    h.windows.close(WIN);

    h.click(RawButton::X2, 1000);
    assert_eq!(h.windows.calls(), vec![(WIN, true)]);
    assert_eq!(h.tones.played(), vec![TONE_ON, TONE_EXIT]);
}

#[test]
fn bare_key_capture_keeps_the_key() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.dispatcher.start_capture(EXIT);
    h.key(vk::KEY_P, true, 0);
    h.key(vk::KEY_P, false, 10);

    let expected = Trigger::new(["p"], Vec::<String>::new());
    assert_eq!(h.dispatcher.keybinds().get(EXIT), Some(&expected));
    h.ui.drain();

    // Unrelated clicks and keys must not quit.
    assert!(h.click(RawButton::Left, 100).is_empty());
    assert!(h.key(vk::KEY_A, true, 200).is_empty());
    h.key(vk::KEY_A, false, 210);

    let effects = h.key(vk::KEY_P, true, 300);
    assert_eq!(effects.last(), Some(&Effect::Ui(UiMessage::Quit)));
}

#[test]
fn auto_repeat_does_not_retrigger_bindings() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.runner.run(h.dispatcher.start_capture(TOGGLE));
    h.hold_ctrl_alt();
    h.key(vk::KEY_P, true, 0);
    h.key(vk::KEY_P, false, 10);
    assert_eq!(
        h.dispatcher.keybinds().get(TOGGLE),
        Some(&Trigger::new(["ctrl", "alt"], Vec::<String>::new()))
    );
    h.ui.drain();

    for at in [50, 100, 150, 200] {
        let effects = h.key(vk::LMENU, true, at);
        assert!(effects.is_empty(), "repeat at {at}ms produced {effects:?}");
    }
    assert!(h.windows.calls().is_empty());
    assert!(h.ui.drain().is_empty());
}

#[test]
fn repeat_of_a_held_key_finalizes_capture() {
    let h = Harness::new(FakeWindows::with_window(WIN, false));
    h.key(vk::KEY_A, true, 0);
    h.dispatcher.start_capture(TOGGLE);

    let effects = h.key(vk::KEY_A, true, 30);
    assert!(matches!(effects.first(), Some(Effect::Persist(_))));
    assert_eq!(h.dispatcher.capture_action(), None);
    assert_eq!(
        h.dispatcher.keybinds().get(TOGGLE),
        Some(&Trigger::new(["a"], Vec::<String>::new()))
    );
}
