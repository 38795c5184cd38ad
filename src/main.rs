// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32`      – Win32 / WinAPI FFI
//   • `editor::edit_control` – native EDIT control hosting
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
// Only the Win32 front end drives the controller outside tests.
#![cfg_attr(not(windows), allow(dead_code))]

mod app;
mod config;
mod controller;
mod editor;
mod error;
mod fileio;
mod overlay;
mod platform;
mod settings;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("{} {} starting", app::APP_TITLE, env!("CARGO_PKG_VERSION"));

    #[cfg(windows)]
    if let Err(e) = platform::win32::window::run() {
        // Startup failed before or during the message loop.
        // A modal dialog is the only output a GUI-subsystem process has.
        log::error!("fatal: {e}");
        platform::win32::window::show_error_dialog(&e.to_string());
        std::process::exit(1);
    }

    #[cfg(not(windows))]
    {
        log::error!("{} needs the Win32 desktop; nothing to run on this platform", app::APP_TITLE);
        std::process::exit(1);
    }
}
