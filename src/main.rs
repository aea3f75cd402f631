#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::anyhow;
use ontop::dispatch::Dispatcher;
use ontop::gui::{native_options, OnTopApp};
use ontop::hooks::InputHooks;
use ontop::keybinds::{resolve_keybinds_path, KeybindStore};
use ontop::relay::ui_channel;
use ontop::runner::EffectRunner;
use ontop::service::spawn_dispatch_worker;
use ontop::settings::{resolve_settings_path, Settings};
use ontop::window_ops::{SystemWindows, WindowOps};
use ontop::{logging, sound};
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};

fn main() -> anyhow::Result<()> {
    let settings_path = resolve_settings_path()?;
    let (settings, settings_error) = match Settings::load(&settings_path) {
        Ok(settings) => (settings, None),
        Err(err) => (Settings::default(), Some(err)),
    };
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));
    if let Some(err) = settings_error {
        tracing::warn!("using default settings: {err:#}");
    } else if !settings_path.exists() {
        // Write the defaults out so they can be edited by hand.
        if let Err(err) = settings.save(&settings_path) {
            tracing::warn!("failed to write default settings: {err:#}");
        }
    }

    let store = KeybindStore::new(resolve_keybinds_path()?);
    let keybinds = store.load();

    let windows: Arc<dyn WindowOps> = Arc::new(SystemWindows);
    let (ui_tx, ui_rx) = ui_channel();
    let dispatcher = Arc::new(Dispatcher::new(
        keybinds,
        windows.clone(),
        settings.double_tap_threshold(),
    ));
    let runner = Arc::new(EffectRunner::new(
        windows.clone(),
        store,
        ui_tx,
        sound::default_player(settings.enable_sounds),
    ));

    let hooks = Arc::new(Mutex::new(InputHooks::default()));
    let (event_tx, event_rx) = mpsc::channel();
    hooks
        .lock()
        .map_err(|_| anyhow!("input hook lock poisoned"))?
        .install(event_tx)?;
    let hooks_for_exit = hooks.clone();
    runner.set_shutdown_hook(Some(Box::new(move || {
        hooks_for_exit
            .lock()
            .map_err(|_| anyhow!("input hook lock poisoned"))?
            .uninstall();
        Ok(())
    })));

    let worker = spawn_dispatch_worker(event_rx, dispatcher.clone(), runner.clone())?;
    tracing::info!("ontop running");

    let ui_result = eframe::run_native(
        "OnTop",
        native_options(),
        Box::new(move |_cc| {
            Box::new(OnTopApp::new(dispatcher, runner, windows, ui_rx, &settings))
        }),
    );

    // Closing the UI by other means still has to release the hooks.
    if let Ok(mut hooks) = hooks.lock() {
        if hooks.is_installed() {
            tracing::debug!("releasing input hooks after ui exit");
            hooks.uninstall();
        }
    }
    if worker.join().is_err() {
        tracing::warn!("dispatch worker panicked");
    }
    tracing::info!("ontop stopped");

    ui_result.map_err(|err| anyhow!("ui failed: {err}"))
}
