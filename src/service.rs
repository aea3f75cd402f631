use crate::dispatch::Dispatcher;
use crate::input::InputEvent;
use crate::runner::EffectRunner;
use anyhow::{Context, Result};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// Single consumer of hook events. Exits once every sender is dropped.
pub fn spawn_dispatch_worker(
    events: Receiver<InputEvent>,
    dispatcher: Arc<Dispatcher>,
    runner: Arc<EffectRunner>,
) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("ontop-dispatch".into())
        .spawn(move || {
            for event in events {
                let effects = dispatcher.handle(event, Instant::now());
                if !effects.is_empty() {
                    tracing::trace!(?effects, "running effects");
                }
                runner.run(effects);
            }
            tracing::debug!("dispatch worker finished");
        })
        .context("spawn dispatch worker")
}
