// ── Native EDIT control hosting ───────────────────────────────────────────────
//
// This is one of exactly two modules where `unsafe` is permitted.
// Every `unsafe` block MUST carry a `// SAFETY:` comment.
//
// ── Resource ownership ────────────────────────────────────────────────────────
//
// `EditControl` owns the font selected into the control and the brush handed
// back from WM_CTLCOLOREDIT.  The child `HWND` itself is destroyed by Windows
// together with its parent.
//
// The parent answers WM_CTLCOLOREDIT even while the controller is busy inside
// a modal dialog, so the current colours are mirrored into a thread-local
// `PALETTE` that `ctl_color` reads without touching the controller.

#![allow(unsafe_code)]

pub mod messages;

use std::cell::Cell;

use messages::{
    EM_GETMODIFY, EM_SETLIMITTEXT, EM_SETMODIFY, ES_AUTOHSCROLL, ES_AUTOVSCROLL, ES_MULTILINE,
    ES_NOHIDESEL, WM_COPY, WM_CUT, WM_PASTE,
};

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, TRUE, WPARAM},
        Graphics::Gdi::{InvalidateRect, SetBkColor, SetTextColor, HBRUSH, HDC},
        UI::{
            Input::KeyboardAndMouse::SetFocus,
            WindowsAndMessaging::{
                CreateWindowExW, GetWindowTextLengthW, GetWindowTextW, MoveWindow, PostMessageW,
                SendMessageW, SetWindowTextW, HMENU, WINDOW_STYLE, WM_KEYDOWN, WM_SETFONT,
                WS_CHILD, WS_EX_CLIENTEDGE, WS_HSCROLL, WS_VISIBLE, WS_VSCROLL,
            },
        },
    },
};

use crate::{
    editor::TextSurface,
    error::Result,
    overlay::KeyStroke,
    platform::win32::gdi::{colorref, Brush, Font},
    settings::{ColorPair, FontDescriptor},
};

// ── Palette ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Palette {
    text: COLORREF,
    background: COLORREF,
    brush: HBRUSH,
}

thread_local! {
    static PALETTE: Cell<Option<Palette>> = const { Cell::new(None) };
}

/// Prepare `hdc` for drawing the edit control and return the background
/// brush.  `None` until colours have been set; the caller then falls back to
/// default processing.
pub(crate) fn ctl_color(hdc: HDC) -> Option<HBRUSH> {
    let palette = PALETTE.with(Cell::get)?;
    // SAFETY: hdc is the device context passed with WM_CTLCOLOREDIT and is
    // valid for the duration of that message.
    unsafe {
        SetTextColor(hdc, palette.text);
        SetBkColor(hdc, palette.background);
    }
    Some(palette.brush)
}

// ── EditControl ───────────────────────────────────────────────────────────────

/// The multi-line EDIT child window that holds the document text.
pub(crate) struct EditControl {
    hwnd: HWND,
    font: Option<Font>,
    brush: Option<Brush>,
}

impl EditControl {
    /// Create the EDIT control inside `hwnd_parent`, zero-sized; the first
    /// WM_SIZE lays it out.
    pub(crate) fn create(hwnd_parent: HWND, hinstance: HINSTANCE) -> Result<Self> {
        let style = WS_CHILD
            | WS_VISIBLE
            | WS_VSCROLL
            | WS_HSCROLL
            | WINDOW_STYLE(ES_MULTILINE | ES_AUTOVSCROLL | ES_AUTOHSCROLL | ES_NOHIDESEL);

        // SAFETY: "EDIT" is a system class; hwnd_parent and hinstance are
        // valid handles from the parent's WM_CREATE.
        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_CLIENTEDGE,
                w!("EDIT"),
                PCWSTR::null(),
                style,
                0,
                0,
                0,
                0,
                hwnd_parent,
                HMENU::default(),
                hinstance,
                None,
            )
        }?;

        // SAFETY: hwnd is the control just created.  A zero limit raises the
        // text limit to the control's maximum.
        unsafe {
            let _ = SendMessageW(hwnd, EM_SETLIMITTEXT, WPARAM(0), LPARAM(0));
        }

        Ok(Self { hwnd, font: None, brush: None })
    }

    /// The control's window handle.  Valid until the parent is destroyed.
    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    fn send(&self, msg: u32, wparam: usize, lparam: isize) -> isize {
        // SAFETY: self.hwnd is a live EDIT control; every message routed here
        // is a documented EDIT message taking integer parameters.
        unsafe { SendMessageW(self.hwnd, msg, WPARAM(wparam), LPARAM(lparam)).0 }
    }
}

impl TextSurface for EditControl {
    fn set_text(&mut self, text: &str) {
        let wide: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
        // SAFETY: wide is null-terminated UTF-16 that outlives the call.
        if let Err(e) = unsafe { SetWindowTextW(self.hwnd, PCWSTR(wide.as_ptr())) } {
            log::error!("SetWindowTextW on edit control failed: {e}");
        }
        self.set_unmodified();
    }

    fn text(&self) -> String {
        // SAFETY: read-only length query on a live window.
        let len = unsafe { GetWindowTextLengthW(self.hwnd) }.max(0) as usize;
        let mut buf = vec![0u16; len + 1];
        // SAFETY: buf holds len + 1 units; GetWindowTextW writes at most that
        // many including the terminator.
        let copied = unsafe { GetWindowTextW(self.hwnd, &mut buf) }.max(0) as usize;
        String::from_utf16_lossy(&buf[..copied.min(len)])
    }

    fn cut(&mut self) {
        self.send(WM_CUT, 0, 0);
    }

    fn copy(&mut self) {
        self.send(WM_COPY, 0, 0);
    }

    fn paste(&mut self) {
        self.send(WM_PASTE, 0, 0);
    }

    fn set_font(&mut self, font: &FontDescriptor) -> Result<()> {
        // Deselect and release the old font before creating its replacement.
        if let Some(old) = self.font.take() {
            self.send(WM_SETFONT, 0, 0);
            drop(old);
        }
        let new = Font::create(font)?;
        self.send(WM_SETFONT, new.handle().0 as usize, 1);
        self.font = Some(new);
        log::debug!("font {} {} applied", font.face, font.height);
        Ok(())
    }

    fn set_colors(&mut self, colors: ColorPair) {
        let brush = match Brush::solid(colors.background) {
            Ok(brush) => brush,
            Err(e) => {
                log::warn!("background brush not created: {e}");
                return;
            }
        };
        PALETTE.with(|p| {
            p.set(Some(Palette {
                text: colorref(colors.foreground),
                background: colorref(colors.background),
                brush: brush.handle(),
            }))
        });
        // The old brush is released only after the palette stops naming it.
        self.brush = Some(brush);
        // SAFETY: self.hwnd is live; None invalidates the whole client area.
        unsafe {
            let _ = InvalidateRect(self.hwnd, None, TRUE);
        }
    }

    fn resize(&mut self, width: i32, height: i32) {
        // SAFETY: self.hwnd is a live child window.
        if let Err(e) = unsafe { MoveWindow(self.hwnd, 0, 0, width, height, TRUE) } {
            log::warn!("MoveWindow on edit control failed: {e}");
        }
    }

    fn is_modified(&self) -> bool {
        self.send(EM_GETMODIFY, 0, 0) != 0
    }

    fn set_unmodified(&mut self) {
        self.send(EM_SETMODIFY, 0, 0);
    }

    fn focus(&mut self) {
        // SAFETY: self.hwnd is a live window owned by this thread.
        unsafe {
            let _ = SetFocus(self.hwnd);
        }
    }

    fn replay_key(&mut self, key: KeyStroke) {
        // Posted rather than sent so TranslateMessage in the message loop
        // produces the matching WM_CHAR.
        // SAFETY: self.hwnd is live; WM_KEYDOWN carries plain integers.
        let posted = unsafe {
            PostMessageW(self.hwnd, WM_KEYDOWN, WPARAM(key.vk as usize), LPARAM(key.flags))
        };
        if let Err(e) = posted {
            log::warn!("key replay failed: {e}");
        }
    }
}

impl Drop for EditControl {
    fn drop(&mut self) {
        PALETTE.with(|p| p.set(None));
        if self.font.is_some() {
            self.send(WM_SETFONT, 0, 0);
        }
    }
}
