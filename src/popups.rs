use crate::relay::UiMessage;
use std::time::{Duration, Instant};

/// Tooltips appear this far right of and below the cursor.
pub const TOOLTIP_OFFSET: (i32, i32) = (20, 20);

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub id: u64,
    pub text: String,
    pub position: Option<(f32, f32)>,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub text: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupOutcome {
    Continue,
    Quit,
}

/// What is currently on screen. Rendering reads this; the relay drives it.
#[derive(Debug)]
pub struct Popups {
    tooltip_duration: Duration,
    confirmation_duration: Duration,
    next_id: u64,
    pub tooltips: Vec<Tooltip>,
    pub confirmation: Option<Confirmation>,
    /// Action currently being rebound.
    pub capture_prompt: Option<String>,
    pub settings_open: bool,
}

impl Popups {
    pub fn new(tooltip_duration: Duration, confirmation_duration: Duration) -> Self {
        Self {
            tooltip_duration,
            confirmation_duration,
            next_id: 0,
            tooltips: Vec::new(),
            confirmation: None,
            capture_prompt: None,
            settings_open: false,
        }
    }

    pub fn apply(
        &mut self,
        message: UiMessage,
        now: Instant,
        cursor: Option<(i32, i32)>,
    ) -> PopupOutcome {
        match message {
            UiMessage::OpenSettings => self.settings_open = true,
            UiMessage::ShowTooltip(text) => {
                tracing::debug!(%text, "tooltip");
                let position = cursor.map(|(x, y)| {
                    ((x + TOOLTIP_OFFSET.0) as f32, (y + TOOLTIP_OFFSET.1) as f32)
                });
                self.next_id += 1;
                self.tooltips.push(Tooltip {
                    id: self.next_id,
                    text,
                    position,
                    expires_at: now + self.tooltip_duration,
                });
            }
            UiMessage::ShowConfirmation(text) => {
                tracing::debug!(%text, "confirmation");
                self.capture_prompt = None;
                self.confirmation = Some(Confirmation {
                    text,
                    expires_at: now + self.confirmation_duration,
                });
            }
            UiMessage::ShowCapturePrompt(action) => self.capture_prompt = Some(action),
            UiMessage::Quit => return PopupOutcome::Quit,
        }
        PopupOutcome::Continue
    }

    /// Drops timed popups whose deadline has passed.
    pub fn expire(&mut self, now: Instant) {
        self.tooltips.retain(|t| t.expires_at > now);
        if self
            .confirmation
            .as_ref()
            .is_some_and(|c| c.expires_at <= now)
        {
            self.confirmation = None;
        }
    }

    pub fn close_settings(&mut self) {
        self.settings_open = false;
    }

    /// Earliest pending deadline, used to schedule the next repaint.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tooltips
            .iter()
            .map(|t| t.expires_at)
            .chain(self.confirmation.as_ref().map(|c| c.expires_at))
            .min()
    }
}

pub fn capture_prompt_text(action: &str) -> String {
    format!(
        "Hold modifiers then press final key for {}",
        action.to_uppercase()
    )
}
