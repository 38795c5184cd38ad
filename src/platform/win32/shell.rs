// ── Win32 shell port ──────────────────────────────────────────────────────────
//
// Implements the controller's `Shell` port on top of the main window: title,
// timers, the overlay popup, common dialogs and the idle-screen menu check.

#![allow(unsafe_code)]

use std::path::PathBuf;

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{COLORREF, FALSE, HINSTANCE, HWND, LPARAM, TRUE, WPARAM},
        Graphics::Gdi::InvalidateRect,
        UI::{
            Input::KeyboardAndMouse::SetFocus,
            WindowsAndMessaging::{
                CheckMenuRadioItem, DestroyWindow, GetMenu, KillTimer, PostMessageW, SetTimer,
                SetWindowTextW, ShowCursor, MF_BYCOMMAND, WM_CLOSE,
            },
        },
    },
};

use super::{
    dialogs,
    overlay_window,
    window::{IDM_IDLE_INTERACTIVE, IDM_IDLE_SIMPLE},
};
use crate::{
    controller::{SaveChoice, Shell, TimerId},
    overlay::{OverlayProfile, Size},
    settings::{FontDescriptor, Rgb},
};

pub(super) struct Win32Shell {
    hwnd: HWND,
    hinstance: HINSTANCE,
    overlay: Option<HWND>,
    /// Custom colour row of the colour dialog, kept across invocations.
    custom_colors: [COLORREF; 16],
}

impl Win32Shell {
    pub(super) fn new(hwnd: HWND, hinstance: HINSTANCE) -> Self {
        Self { hwnd, hinstance, overlay: None, custom_colors: [COLORREF(0x00FF_FFFF); 16] }
    }
}

impl Shell for Win32Shell {
    fn set_title(&mut self, title: &str) {
        let wide = dialogs::wide(title);
        // SAFETY: wide is null-terminated and outlives the call.
        if let Err(e) = unsafe { SetWindowTextW(self.hwnd, PCWSTR(wide.as_ptr())) } {
            log::warn!("title not updated: {e}");
        }
    }

    fn start_timer(&mut self, id: TimerId, interval_ms: u32) {
        // SAFETY: self.hwnd is the live main window; no callback is used,
        // so expiry arrives as WM_TIMER.  Re-using an id resets that timer.
        let ok = unsafe { SetTimer(self.hwnd, id as usize, interval_ms, None) };
        if ok == 0 {
            log::warn!("SetTimer({id:?}) failed");
        }
    }

    fn stop_timer(&mut self, id: TimerId) {
        // SAFETY: killing a timer that is not running is a harmless error.
        let _ = unsafe { KillTimer(self.hwnd, id as usize) };
    }

    fn show_overlay(&mut self) -> Option<Size> {
        let hwnd = match self.overlay {
            Some(hwnd) => hwnd,
            None => match overlay_window::create(self.hwnd, self.hinstance) {
                Ok(hwnd) => hwnd,
                Err(e) => {
                    log::error!("overlay window not created: {e}");
                    return None;
                }
            },
        };
        self.overlay = Some(hwnd);
        // SAFETY: hwnd is the live overlay window owned by this thread.
        // Each ShowCursor(FALSE) here is balanced in hide_overlay.
        unsafe {
            ShowCursor(FALSE);
            let _ = SetFocus(hwnd);
        }
        overlay_window::client_size(hwnd)
    }

    fn hide_overlay(&mut self) {
        if let Some(hwnd) = self.overlay.take() {
            // SAFETY: hwnd is the overlay created by show_overlay and not yet
            // destroyed.
            unsafe {
                let _ = DestroyWindow(hwnd);
                ShowCursor(TRUE);
            }
        }
    }

    fn redraw_overlay(&mut self) {
        if let Some(hwnd) = self.overlay {
            // SAFETY: hwnd is live; the overlay paints its full client area,
            // so no erase is requested.
            unsafe {
                let _ = InvalidateRect(hwnd, None, FALSE);
            }
        }
    }

    fn confirm_save(&mut self, name: &str) -> SaveChoice {
        dialogs::confirm_save(self.hwnd, name)
    }

    fn choose_open_path(&mut self) -> Option<PathBuf> {
        dialogs::show_open_dialog(self.hwnd)
    }

    fn choose_save_path(&mut self, suggested: &str) -> Option<PathBuf> {
        dialogs::show_save_dialog(self.hwnd, suggested)
    }

    fn choose_font(&mut self, current: &FontDescriptor) -> Option<FontDescriptor> {
        dialogs::choose_font(self.hwnd, current)
    }

    fn choose_color(&mut self, current: Rgb) -> Option<Rgb> {
        dialogs::choose_color(self.hwnd, current, &mut self.custom_colors)
    }

    fn show_error(&mut self, message: &str) {
        log::error!("{message}");
        dialogs::show_error(self.hwnd, message);
    }

    fn show_about(&mut self) {
        dialogs::show_about(self.hwnd);
    }

    fn close_window(&mut self) {
        // Posted so the close gate runs after the current command returns.
        // SAFETY: self.hwnd is the live main window.
        if let Err(e) = unsafe { PostMessageW(self.hwnd, WM_CLOSE, WPARAM(0), LPARAM(0)) } {
            log::error!("close request not posted: {e}");
        }
    }

    fn check_overlay_profile(&mut self, profile: OverlayProfile) {
        let id = match profile {
            OverlayProfile::Simple => IDM_IDLE_SIMPLE,
            OverlayProfile::Interactive => IDM_IDLE_INTERACTIVE,
        };
        // SAFETY: self.hwnd is the live main window; both ids exist in its
        // menu and form one radio group.
        unsafe {
            let menu = GetMenu(self.hwnd);
            let _ = CheckMenuRadioItem(
                menu,
                IDM_IDLE_SIMPLE as u32,
                IDM_IDLE_INTERACTIVE as u32,
                id as u32,
                MF_BYCOMMAND.0,
            );
        }
    }
}

impl Drop for Win32Shell {
    fn drop(&mut self) {
        self.hide_overlay();
    }
}
