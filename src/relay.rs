use std::sync::mpsc::{channel, Receiver, Sender};

/// Requests handed from the input threads (and the tray) to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    OpenSettings,
    ShowTooltip(String),
    ShowConfirmation(String),
    /// Capture started for the named action.
    ShowCapturePrompt(String),
    Quit,
}

#[derive(Debug, Clone)]
pub struct UiSender(Sender<UiMessage>);

#[derive(Debug)]
pub struct UiReceiver(Receiver<UiMessage>);

pub fn ui_channel() -> (UiSender, UiReceiver) {
    let (tx, rx) = channel();
    (UiSender(tx), UiReceiver(rx))
}

impl UiSender {
    pub fn send(&self, message: UiMessage) {
        if let Err(err) = self.0.send(message) {
            tracing::debug!(message = ?err.0, "ui thread is gone; dropping message");
        }
    }
}

impl UiReceiver {
    /// Everything queued since the last tick, oldest first.
    pub fn drain(&self) -> Vec<UiMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.0.try_recv() {
            messages.push(message);
        }
        messages
    }
}
