use crate::input::is_modifier;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureSession {
    #[default]
    Inactive,
    WaitingForKey { action: String },
    Armed { action: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStep {
    /// Capture is not running; the input belongs to normal bind matching.
    NotCapturing,
    /// Still waiting for a finalizing key or button.
    Waiting,
    /// A finalizing input arrived; the caller snapshots the chord and calls
    /// [`CaptureSession::commit`].
    Armed,
}

impl CaptureSession {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Inactive)
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Inactive => None,
            Self::WaitingForKey { action } | Self::Armed { action } => Some(action),
        }
    }

    pub fn start(&mut self, action: &str) -> StartOutcome {
        if self.is_active() {
            return StartOutcome::AlreadyActive;
        }
        *self = Self::WaitingForKey {
            action: action.to_string(),
        };
        StartOutcome::Started
    }

    pub fn on_key_press(&mut self, symbol: Option<&str>) -> CaptureStep {
        if !self.is_active() {
            return CaptureStep::NotCapturing;
        }
        match symbol {
            Some(sym) if !is_modifier(sym) => self.arm(),
            _ => CaptureStep::Waiting,
        }
    }

    pub fn on_mouse_press(&mut self, symbol: Option<&str>) -> CaptureStep {
        if !self.is_active() {
            return CaptureStep::NotCapturing;
        }
        match symbol {
            Some(_) => self.arm(),
            None => CaptureStep::Waiting,
        }
    }

    fn arm(&mut self) -> CaptureStep {
        if let Self::WaitingForKey { action } = self {
            let action = std::mem::take(action);
            tracing::debug!(%action, "capture armed");
            *self = Self::Armed { action };
        }
        CaptureStep::Armed
    }

    /// Ends an armed capture, returning the action whose binding is replaced.
    pub fn commit(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Armed { action } => Some(action),
            other => {
                *self = other;
                None
            }
        }
    }
}
