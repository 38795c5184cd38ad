// ── Common dialogs ─────────────────────────────────────────────────────────────
//
// Thin wrappers around the Win32 common-dialog and message-box APIs.  Each
// chooser returns `Some(value)` on user confirmation and `None` on cancel or
// error.
//
// This is inside `platform::win32` so `unsafe` is permitted per crate policy.

#![allow(unsafe_code)]

use std::path::PathBuf;

use windows::{
    core::{PCWSTR, PWSTR},
    Win32::{
        Foundation::{COLORREF, HWND},
        UI::{
            Controls::Dialogs::{
                ChooseColorW, ChooseFontW, GetOpenFileNameW, GetSaveFileNameW, CC_FULLOPEN,
                CC_RGBINIT, CF_EFFECTS, CF_INITTOLOGFONTSTRUCT, CF_SCREENFONTS, CHOOSECOLORW,
                CHOOSEFONTW, OFN_FILEMUSTEXIST, OFN_HIDEREADONLY, OFN_OVERWRITEPROMPT,
                OFN_PATHMUSTEXIST, OPENFILENAMEW,
            },
            WindowsAndMessaging::{
                MessageBoxW, IDNO, IDYES, MB_ICONERROR, MB_ICONINFORMATION, MB_ICONWARNING,
                MB_OK, MB_YESNOCANCEL,
            },
        },
    },
};

use super::gdi;
use crate::{
    app::APP_TITLE,
    controller::SaveChoice,
    settings::{FontDescriptor, Rgb},
};

// ── Buffer size ───────────────────────────────────────────────────────────────

/// Maximum path length in `WCHAR`s, including the null terminator.
/// `MAX_PATH` (260) is too short for modern Windows paths; use 32 768 which
/// is the documented maximum for `\\?\` extended paths.
const PATH_BUF_LEN: usize = 32_768;

/// Null-separated display/pattern pairs ending with a double null.
const FILTER: &str = "Text Files (*.txt)\0*.txt\0All Files (*.*)\0*.*\0\0";

// ── Open dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Open File" dialog.
///
/// Returns the chosen path, or `None` if the user cancelled.
pub(crate) fn show_open_dialog(hwnd_owner: HWND) -> Option<PathBuf> {
    let mut buf = vec![0u16; PATH_BUF_LEN];
    let filter: Vec<u16> = FILTER.encode_utf16().collect();

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd_owner,
        lpstrFilter: PCWSTR(filter.as_ptr()),
        lpstrFile: PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        Flags: OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST | OFN_HIDEREADONLY,
        ..Default::default()
    };

    // SAFETY: `ofn` is fully initialised; `buf` and `filter` outlive this
    // call.  GetOpenFileNameW reads and writes only within the buffers we
    // provided.  The function is called on the UI thread (required for modal
    // dialogs).
    let ok = unsafe { GetOpenFileNameW(&mut ofn) };

    ok.as_bool().then(|| path_from_buf(&buf))
}

// ── Save dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Save As" dialog.
///
/// `default_name` pre-populates the filename field (pass an empty string or
/// the current filename).  Returns the chosen path, or `None` if cancelled.
pub(crate) fn show_save_dialog(hwnd_owner: HWND, default_name: &str) -> Option<PathBuf> {
    let mut buf: Vec<u16> = default_name
        .encode_utf16()
        .chain(std::iter::repeat(0).take(PATH_BUF_LEN))
        .take(PATH_BUF_LEN)
        .collect();
    // Always leave a terminator even if the default name filled the buffer.
    buf[PATH_BUF_LEN - 1] = 0;

    let filter: Vec<u16> = FILTER.encode_utf16().collect();
    let def_ext: Vec<u16> = "txt\0".encode_utf16().collect();

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd_owner,
        lpstrFilter: PCWSTR(filter.as_ptr()),
        lpstrFile: PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        lpstrDefExt: PCWSTR(def_ext.as_ptr()),
        Flags: OFN_OVERWRITEPROMPT | OFN_PATHMUSTEXIST,
        ..Default::default()
    };

    // SAFETY: same invariants as show_open_dialog above; def_ext also
    // outlives the call.
    let ok = unsafe { GetSaveFileNameW(&mut ofn) };

    ok.as_bool().then(|| path_from_buf(&buf))
}

// ── Font dialog ───────────────────────────────────────────────────────────────

/// Show the font picker initialised to `current`.
pub(crate) fn choose_font(hwnd_owner: HWND, current: &FontDescriptor) -> Option<FontDescriptor> {
    let mut lf = gdi::log_font(current);

    let mut cf = CHOOSEFONTW {
        lStructSize: std::mem::size_of::<CHOOSEFONTW>() as u32,
        hwndOwner: hwnd_owner,
        lpLogFont: &mut lf,
        Flags: CF_SCREENFONTS | CF_EFFECTS | CF_INITTOLOGFONTSTRUCT,
        ..Default::default()
    };

    // SAFETY: cf is initialised and points at lf, which outlives the call.
    // The dialog writes the selection back into lf.
    let ok = unsafe { ChooseFontW(&mut cf) };

    ok.as_bool().then(|| gdi::font_descriptor(&lf))
}

// ── Colour dialog ─────────────────────────────────────────────────────────────

/// Show the colour picker initialised to `current`.
///
/// `custom` is the 16-slot custom colour row; the dialog updates it in place
/// so user-defined colours survive between invocations.
pub(crate) fn choose_color(
    hwnd_owner: HWND,
    current: Rgb,
    custom: &mut [COLORREF; 16],
) -> Option<Rgb> {
    let mut cc = CHOOSECOLORW {
        lStructSize: std::mem::size_of::<CHOOSECOLORW>() as u32,
        hwndOwner: hwnd_owner,
        rgbResult: gdi::colorref(current),
        lpCustColors: custom.as_mut_ptr(),
        Flags: CC_RGBINIT | CC_FULLOPEN,
        ..Default::default()
    };

    // SAFETY: cc is initialised; lpCustColors points at exactly 16 COLORREFs
    // borrowed mutably for the duration of the call.
    let ok = unsafe { ChooseColorW(&mut cc) };

    ok.as_bool().then(|| Rgb(cc.rgbResult.0 & 0x00FF_FFFF))
}

// ── Message boxes ─────────────────────────────────────────────────────────────

/// Ask whether to save changes to `name` before continuing.
pub(crate) fn confirm_save(hwnd_owner: HWND, name: &str) -> SaveChoice {
    let text = wide(&format!("Do you want to save changes to {name}?"));
    let caption = wide(APP_TITLE);
    // SAFETY: text and caption are null-terminated and outlive the call.
    let answer = unsafe {
        MessageBoxW(
            hwnd_owner,
            PCWSTR(text.as_ptr()),
            PCWSTR(caption.as_ptr()),
            MB_YESNOCANCEL | MB_ICONWARNING,
        )
    };
    match answer {
        IDYES => SaveChoice::Yes,
        IDNO => SaveChoice::No,
        _ => SaveChoice::Cancel,
    }
}

/// Show a modal error message owned by `hwnd_owner`.
pub(crate) fn show_error(hwnd_owner: HWND, message: &str) {
    message_box(hwnd_owner, message, APP_TITLE, true);
}

/// Display the "About" dialog.
pub(crate) fn show_about(hwnd_owner: HWND) {
    let body = concat!(
        "Slate 0.1.0\n\n",
        "A plain-text editor for Windows with an idle screen.\n\n",
        "Licensed under MIT OR Apache-2.0.",
    );
    message_box(hwnd_owner, body, &format!("About {APP_TITLE}"), false);
}

fn message_box(hwnd_owner: HWND, text: &str, caption: &str, error: bool) {
    let text = wide(text);
    let caption = wide(caption);
    let icon = if error { MB_ICONERROR } else { MB_ICONINFORMATION };
    // SAFETY: text and caption are null-terminated and outlive the call.
    // The return value (button pressed) is unused for an OK-only box.
    unsafe {
        let _ = MessageBoxW(hwnd_owner, PCWSTR(text.as_ptr()), PCWSTR(caption.as_ptr()), MB_OK | icon);
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Encode `s` as null-terminated UTF-16.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Convert a null-terminated UTF-16 buffer to a `PathBuf`.
fn path_from_buf(buf: &[u16]) -> PathBuf {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    PathBuf::from(String::from_utf16_lossy(&buf[..len]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_from_buf_stops_at_null() {
        let mut buf = wide("C:\\notes\\todo.txt");
        buf.extend_from_slice(&[b'x' as u16; 4]);
        assert_eq!(path_from_buf(&buf), PathBuf::from("C:\\notes\\todo.txt"));
    }

    #[test]
    fn wide_is_null_terminated() {
        assert_eq!(wide("ab"), vec![b'a' as u16, b'b' as u16, 0]);
    }
}
