use crate::window_ops::WindowHandle;
use std::collections::HashSet;
use std::time::{Duration, Instant};

pub const DEFAULT_DOUBLE_TAP_THRESHOLD: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TogglePhase {
    Idle,
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDecision {
    /// First tap: report the unchanged state.
    Report { topmost: bool },
    /// Confirming tap: the window must be switched to `enable`.
    Flip { enable: bool },
}

/// Double-tap state machine plus the set of windows it has pinned.
#[derive(Debug)]
pub struct ToggleController {
    threshold: Duration,
    last_tap: Option<Instant>,
    toggled: HashSet<WindowHandle>,
}

impl Default for ToggleController {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_TAP_THRESHOLD)
    }
}

impl ToggleController {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_tap: None,
            toggled: HashSet::new(),
        }
    }

    pub fn phase(&self) -> TogglePhase {
        if self.last_tap.is_some() {
            TogglePhase::Armed
        } else {
            TogglePhase::Idle
        }
    }

    pub fn on_activation(
        &mut self,
        now: Instant,
        window: WindowHandle,
        topmost: bool,
    ) -> ToggleDecision {
        let confirming = self
            .last_tap
            .is_some_and(|last| now.saturating_duration_since(last) <= self.threshold);

        if !confirming {
            self.last_tap = Some(now);
            return ToggleDecision::Report { topmost };
        }

        self.last_tap = None;
        let enable = !topmost;
        if enable {
            self.toggled.insert(window);
        } else {
            self.toggled.remove(&window);
        }
        tracing::debug!(?window, enable, "double tap confirmed");
        ToggleDecision::Flip { enable }
    }

    pub fn toggled_windows(&self) -> impl Iterator<Item = &WindowHandle> {
        self.toggled.iter()
    }

    /// Empties the pinned set, returning every handle it held.
    pub fn take_toggled(&mut self) -> Vec<WindowHandle> {
        self.last_tap = None;
        self.toggled.drain().collect()
    }
}
