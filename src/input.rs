use std::collections::{BTreeSet, HashSet};

/// Win32 virtual-key codes the normalizer cares about.
pub mod vk {
    pub const SHIFT: u32 = 0x10;
    pub const CONTROL: u32 = 0x11;
    pub const MENU: u32 = 0x12;
    pub const SPACE: u32 = 0x20;
    pub const KEY_0: u32 = 0x30;
    pub const KEY_9: u32 = 0x39;
    pub const KEY_A: u32 = 0x41;
    pub const KEY_K: u32 = 0x4B;
    pub const KEY_P: u32 = 0x50;
    pub const KEY_Z: u32 = 0x5A;
    pub const F1: u32 = 0x70;
    pub const F24: u32 = 0x87;
    pub const LSHIFT: u32 = 0xA0;
    pub const RSHIFT: u32 = 0xA1;
    pub const LCONTROL: u32 = 0xA2;
    pub const RCONTROL: u32 = 0xA3;
    pub const LMENU: u32 = 0xA4;
    pub const RMENU: u32 = 0xA5;
}

pub const CTRL: &str = "ctrl";
pub const ALT: &str = "alt";
pub const SHIFT: &str = "shift";
pub const X1: &str = "x1";
pub const X2: &str = "x2";

/// Raw key identifier as delivered by the keyboard hook.
///
/// `ch` is the character the active layout produces for `vk`, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawKey {
    pub vk: u32,
    pub ch: Option<char>,
}

impl RawKey {
    pub const fn new(vk: u32, ch: Option<char>) -> Self {
        Self { vk, ch }
    }

    /// Key without a layout character; letters and digits still resolve from `vk`.
    pub const fn vk(vk: u32) -> Self {
        Self { vk, ch: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { key: RawKey, pressed: bool },
    Mouse { button: RawButton, pressed: bool },
}

pub fn is_modifier(symbol: &str) -> bool {
    matches!(symbol, CTRL | ALT | SHIFT)
}

pub fn normalize_key(key: RawKey) -> Option<String> {
    match key.vk {
        vk::CONTROL | vk::LCONTROL | vk::RCONTROL => return Some(CTRL.into()),
        vk::MENU | vk::LMENU | vk::RMENU => return Some(ALT.into()),
        vk::SHIFT | vk::LSHIFT | vk::RSHIFT => return Some(SHIFT.into()),
        code @ vk::F1..=vk::F24 => return Some(format!("f{}", code - vk::F1 + 1)),
        _ => {}
    }

    let ch = key.ch.or_else(|| match key.vk {
        vk::KEY_0..=vk::KEY_9 | vk::KEY_A..=vk::KEY_Z => char::from_u32(key.vk),
        _ => None,
    })?;
    if ch.is_control() || ch.is_whitespace() {
        return None;
    }
    Some(ch.to_lowercase().collect())
}

pub fn normalize_mouse(button: RawButton) -> Option<&'static str> {
    match button {
        RawButton::X1 => Some(X1),
        RawButton::X2 => Some(X2),
        _ => None,
    }
}

/// Whether `symbol` belongs to the canonical vocabulary.
pub fn is_canonical_symbol(symbol: &str) -> bool {
    if is_modifier(symbol) {
        return true;
    }
    if let Some(n) = symbol.strip_prefix('f') {
        if let Ok(n) = n.parse::<u8>() {
            return (1..=24).contains(&n);
        }
    }
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            !c.is_control() && !c.is_whitespace() && c.to_lowercase().eq(std::iter::once(c))
        }
        _ => false,
    }
}

pub fn is_canonical_button(symbol: &str) -> bool {
    matches!(symbol, X1 | X2)
}

/// Physically held raw input.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys: HashSet<RawKey>,
    buttons: HashSet<RawButton>,
}

impl InputState {
    /// Records a key press. Returns `false` for auto-repeat of an already held key.
    pub fn press_key(&mut self, key: RawKey) -> bool {
        if self.keys.iter().any(|k| k.vk == key.vk) {
            return false;
        }
        self.keys.insert(key)
    }

    pub fn release_key(&mut self, key: RawKey) {
        self.keys.retain(|k| k.vk != key.vk);
    }

    pub fn press_button(&mut self, button: RawButton) -> bool {
        self.buttons.insert(button)
    }

    pub fn release_button(&mut self, button: RawButton) {
        self.buttons.remove(&button);
    }

    pub fn keys_down(&self) -> BTreeSet<String> {
        self.keys.iter().filter_map(|k| normalize_key(*k)).collect()
    }

    pub fn mouse_down(&self) -> BTreeSet<String> {
        self.buttons
            .iter()
            .filter_map(|b| normalize_mouse(*b))
            .map(str::to_string)
            .collect()
    }
}
