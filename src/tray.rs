use image::{Rgba, RgbaImage};

pub const ICON_SIZE: u32 = 64;
const ICON_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const ICON_DOT: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Black square with a lime dot inset by a quarter on each side.
pub fn icon_image() -> RgbaImage {
    let center = ICON_SIZE as f32 / 2.0;
    let radius = ICON_SIZE as f32 / 4.0;
    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        if dx * dx + dy * dy <= radius * radius {
            ICON_DOT
        } else {
            ICON_BACKGROUND
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    OpenSettings,
    Exit,
}

#[cfg(target_os = "windows")]
pub use platform::TrayHandle;

#[cfg(target_os = "windows")]
mod platform {
    use super::{icon_image, TrayCommand, ICON_SIZE};
    use anyhow::{Context, Result};
    use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem};
    use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

    pub struct TrayHandle {
        _tray: TrayIcon,
        settings_id: MenuId,
        exit_id: MenuId,
    }

    impl TrayHandle {
        /// Must be called on the thread that runs the window event loop.
        pub fn build() -> Result<Self> {
            let menu = Menu::new();
            let settings_item = MenuItem::new("Keybind Settings", true, None);
            let exit_item = MenuItem::new("Exit", true, None);
            let settings_id = settings_item.id().clone();
            let exit_id = exit_item.id().clone();
            menu.append(&settings_item).context("add settings menu item")?;
            menu.append(&exit_item).context("add exit menu item")?;

            let icon = Icon::from_rgba(icon_image().into_raw(), ICON_SIZE, ICON_SIZE)
                .context("build tray icon")?;
            let tray = TrayIconBuilder::new()
                .with_menu(Box::new(menu))
                .with_tooltip("AlwaysOnTop")
                .with_icon(icon)
                .build()
                .context("create tray icon")?;

            Ok(Self {
                _tray: tray,
                settings_id,
                exit_id,
            })
        }

        pub fn poll(&self) -> Vec<TrayCommand> {
            let mut commands = Vec::new();
            while let Ok(event) = MenuEvent::receiver().try_recv() {
                if event.id == self.settings_id {
                    commands.push(TrayCommand::OpenSettings);
                } else if event.id == self.exit_id {
                    commands.push(TrayCommand::Exit);
                }
            }
            commands
        }
    }
}
