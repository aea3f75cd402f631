use crate::dispatch::Dispatcher;
use crate::keybinds::{EXIT, TOGGLE};
use crate::popups::{capture_prompt_text, PopupOutcome, Popups};
use crate::relay::{UiMessage, UiReceiver};
use crate::runner::EffectRunner;
use crate::settings::Settings;
#[cfg(target_os = "windows")]
use crate::tray::{TrayCommand, TrayHandle};
use crate::window_ops::WindowOps;
use eframe::egui;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The root viewport is never shown; popups are separate viewports.
pub const OFFSCREEN_POS: (f32, f32) = (-32000.0, -32000.0);

const TOOLTIP_BG: egui::Color32 = egui::Color32::from_rgb(0x20, 0x20, 0x20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    Rebind(&'static str),
    Reset,
    Done,
}

pub fn native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("AlwaysOnTop")
            .with_inner_size([1.0, 1.0])
            .with_position(OFFSCREEN_POS)
            .with_decorations(false)
            .with_taskbar(false),
        ..Default::default()
    }
}

pub struct OnTopApp {
    dispatcher: Arc<Dispatcher>,
    runner: Arc<EffectRunner>,
    windows: Arc<dyn WindowOps>,
    ui_rx: UiReceiver,
    popups: Popups,
    poll_interval: Duration,
    #[cfg(target_os = "windows")]
    tray: Option<TrayHandle>,
}

impl OnTopApp {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        runner: Arc<EffectRunner>,
        windows: Arc<dyn WindowOps>,
        ui_rx: UiReceiver,
        settings: &Settings,
    ) -> Self {
        #[cfg(target_os = "windows")]
        let tray = match TrayHandle::build() {
            Ok(tray) => Some(tray),
            Err(err) => {
                tracing::error!("failed to create tray icon: {err:#}");
                None
            }
        };

        Self {
            dispatcher,
            runner,
            windows,
            ui_rx,
            popups: Popups::new(settings.tooltip_duration(), settings.confirmation_duration()),
            poll_interval: settings.ui_poll_interval(),
            #[cfg(target_os = "windows")]
            tray,
        }
    }

    #[cfg(target_os = "windows")]
    fn poll_tray(&mut self) {
        let Some(tray) = &self.tray else {
            return;
        };
        for command in tray.poll() {
            match command {
                TrayCommand::OpenSettings => {
                    self.popups
                        .apply(UiMessage::OpenSettings, Instant::now(), None);
                }
                TrayCommand::Exit => {
                    tracing::info!("exit requested from tray");
                    self.runner.run(self.dispatcher.exit());
                }
            }
        }
    }

    /// Applies every queued request. Returns true once a quit was seen.
    fn drain_relay(&mut self, now: Instant) -> bool {
        let messages = self.ui_rx.drain();
        if messages.is_empty() {
            return false;
        }
        let cursor = self.windows.cursor_pos();
        messages
            .into_iter()
            .any(|message| self.popups.apply(message, now, cursor) == PopupOutcome::Quit)
    }

    fn handle_settings_action(&mut self, action: SettingsAction) {
        match action {
            SettingsAction::Rebind(name) => self.runner.run(self.dispatcher.start_capture(name)),
            SettingsAction::Reset => self.runner.run(self.dispatcher.reset_to_default()),
            SettingsAction::Done => self.popups.close_settings(),
        }
    }

    fn show_tooltips(&self, ctx: &egui::Context) {
        for tooltip in &self.popups.tooltips {
            let mut builder = egui::ViewportBuilder::default()
                .with_title("tooltip")
                .with_decorations(false)
                .with_resizable(false)
                .with_taskbar(false)
                .with_always_on_top()
                .with_inner_size([200.0, 32.0]);
            if let Some(pos) = tooltip.position {
                builder = builder.with_position(pos);
            }
            ctx.show_viewport_immediate(
                egui::ViewportId::from_hash_of(("tooltip", tooltip.id)),
                builder,
                |ctx, _class| {
                    egui::CentralPanel::default()
                        .frame(
                            egui::Frame::none()
                                .fill(TOOLTIP_BG)
                                .inner_margin(egui::Margin::symmetric(12.0, 6.0)),
                        )
                        .show(ctx, |ui| {
                            ui.label(
                                egui::RichText::new(&tooltip.text).color(egui::Color32::WHITE),
                            );
                        });
                },
            );
        }
    }

    fn show_confirmation(&mut self, ctx: &egui::Context) {
        let Some(confirmation) = &self.popups.confirmation else {
            return;
        };
        let text = confirmation.text.clone();
        let closed = ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("keybind_updated"),
            egui::ViewportBuilder::default()
                .with_title("Keybind Updated")
                .with_inner_size([320.0, 140.0])
                .with_always_on_top(),
            |ctx, _class| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.label(&text);
                    });
                });
                ctx.input(|i| i.viewport().close_requested())
            },
        );
        if closed {
            self.popups.confirmation = None;
        }
    }

    fn show_capture_prompt(&self, ctx: &egui::Context) {
        let Some(action) = &self.popups.capture_prompt else {
            return;
        };
        let text = capture_prompt_text(action);
        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("capture_prompt"),
            egui::ViewportBuilder::default()
                .with_title("Set New Keybind")
                .with_inner_size([320.0, 120.0])
                .with_always_on_top(),
            |ctx, _class| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.label(&text);
                    });
                });
            },
        );
    }

    fn show_settings(&mut self, ctx: &egui::Context) -> Option<SettingsAction> {
        if !self.popups.settings_open {
            return None;
        }
        let keybinds = self.dispatcher.keybinds();
        let describe = |action: &str| {
            keybinds
                .get(action)
                .map(ToString::to_string)
                .unwrap_or_else(|| "(none)".into())
        };
        let toggle_label = format!("Toggle: {}", describe(TOGGLE));
        let exit_label = format!("Exit: {}", describe(EXIT));

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("keybind_settings"),
            egui::ViewportBuilder::default()
                .with_title("Keybind Settings")
                .with_inner_size([360.0, 300.0])
                .with_always_on_top(),
            |ctx, _class| {
                let mut action = None;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(5.0);
                        ui.label(&toggle_label);
                        if ui.button("Change Toggle Bind").clicked() {
                            action = Some(SettingsAction::Rebind(TOGGLE));
                        }
                        ui.add_space(5.0);
                        ui.label(&exit_label);
                        if ui.button("Change Exit Bind").clicked() {
                            action = Some(SettingsAction::Rebind(EXIT));
                        }
                        ui.add_space(10.0);
                        if ui.button("Reset To Default").clicked() {
                            action = Some(SettingsAction::Reset);
                        }
                        ui.add_space(5.0);
                        if ui.button("Done").clicked() {
                            action = Some(SettingsAction::Done);
                        }
                    });
                });
                if ctx.input(|i| i.viewport().close_requested()) {
                    action = Some(SettingsAction::Done);
                }
                action
            },
        )
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let wait = self
            .popups
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
            .map_or(self.poll_interval, |until| until.min(self.poll_interval));
        ctx.request_repaint_after(wait);
    }
}

impl eframe::App for OnTopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        #[cfg(target_os = "windows")]
        self.poll_tray();

        let now = Instant::now();
        if self.drain_relay(now) {
            tracing::info!("closing ui");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }
        self.popups.expire(now);

        self.show_tooltips(ctx);
        self.show_confirmation(ctx);
        self.show_capture_prompt(ctx);
        if let Some(action) = self.show_settings(ctx) {
            self.handle_settings_action(action);
        }

        self.schedule_repaint(ctx, now);
    }
}
