pub mod capture;
pub mod dispatch;
pub mod gui;
pub mod hooks;
pub mod input;
pub mod keybinds;
pub mod logging;
pub mod matcher;
pub mod popups;
pub mod relay;
pub mod runner;
pub mod service;
pub mod settings;
pub mod sound;
pub mod toggle;
pub mod tray;
pub mod window_ops;
