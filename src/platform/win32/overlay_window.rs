// ── Idle overlay window ───────────────────────────────────────────────────────
//
// A borderless topmost popup laid exactly over the main window.  It paints
// a black field with a white disc at the sprite position and turns raw input
// into `overlay::Input` for the controller.  The window carries no state of
// its own; the sprite lives in the controller's `IdleOverlay`.

#![allow(unsafe_code)]

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{
            BeginPaint, Ellipse, EndPaint, FillRect, GetStockObject, SelectObject, BLACK_BRUSH,
            HBRUSH, NULL_PEN, PAINTSTRUCT, WHITE_BRUSH,
        },
        UI::WindowsAndMessaging::{
            CreateWindowExW, DefWindowProcW, GetClientRect, GetWindowRect, LoadCursorW,
            RegisterClassExW, HMENU, IDC_ARROW, WA_INACTIVE, WM_ACTIVATE, WM_CLOSE,
            WM_ERASEBKGND, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN, WM_MBUTTONDOWN, WM_MOUSEMOVE,
            WM_PAINT, WM_RBUTTONDOWN, WM_SYSKEYDOWN, WM_SYSKEYUP, WNDCLASSEXW, WS_EX_TOOLWINDOW,
            WS_EX_TOPMOST, WS_POPUP, WS_VISIBLE,
        },
    },
};

use super::window::{last_error, with_state};
use crate::{
    error::Result,
    overlay::{Input, KeyStroke, Point, Size, SPRITE_RADIUS},
};

const CLASS_NAME: PCWSTR = w!("SlateIdleOverlay");

// ── Class and creation ────────────────────────────────────────────────────────

pub(super) fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: LoadCursorW with IDC_ARROW loads a built-in system cursor.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }?;
    // SAFETY: GetStockObject(BLACK_BRUSH) returns a shared stock object
    // that never needs deleting.
    let background = unsafe { HBRUSH(GetStockObject(BLACK_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        lpfnWndProc: Some(overlay_proc),
        hInstance: hinstance,
        hCursor: cursor,
        hbrBackground: background,
        lpszClassName: CLASS_NAME,
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised; CLASS_NAME is a static literal.
    if unsafe { RegisterClassExW(&wndclass) } == 0 {
        return Err(last_error("RegisterClassExW (overlay)"));
    }
    Ok(())
}

/// Create the overlay over `owner`'s current window rectangle.
pub(super) fn create(owner: HWND, hinstance: HINSTANCE) -> Result<HWND> {
    let mut rc = RECT::default();
    // SAFETY: owner is the live main window; rc is a valid out-pointer.
    unsafe { GetWindowRect(owner, &mut rc) }?;

    // SAFETY: CLASS_NAME was registered by register_class; owner and
    // hinstance are valid.  A popup with a parent handle is owned, not
    // a child, so it stays above the main window.
    let hwnd = unsafe {
        CreateWindowExW(
            WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
            CLASS_NAME,
            PCWSTR::null(),
            WS_POPUP | WS_VISIBLE,
            rc.left,
            rc.top,
            rc.right - rc.left,
            rc.bottom - rc.top,
            owner,
            HMENU::default(),
            hinstance,
            None,
        )
    }?;
    Ok(hwnd)
}

pub(super) fn client_size(hwnd: HWND) -> Option<Size> {
    let mut rc = RECT::default();
    // SAFETY: hwnd is the live overlay window; rc is a valid out-pointer.
    unsafe { GetClientRect(hwnd, &mut rc) }.ok()?;
    Some(Size { width: rc.right - rc.left, height: rc.bottom - rc.top })
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: registered as lpfnWndProc for CLASS_NAME; Windows guarantees the
// parameters are valid for the duration of the call.
unsafe extern "system" fn overlay_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_ERASEBKGND => return LRESULT(1),
        WM_PAINT => {
            paint(hwnd);
            return LRESULT(0);
        }
        _ => {}
    }

    let Some(input) = input_for(msg, wparam, lparam) else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };
    if with_state(|s| s.controller.on_overlay_input(input)).is_none() {
        log::trace!("overlay input {input:?} dropped while busy");
    }
    LRESULT(0)
}

/// Translate a raw overlay message into controller input.
fn input_for(msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<Input> {
    Some(match msg {
        WM_MOUSEMOVE => Input::PointerMove(Point {
            x: (lparam.0 & 0xFFFF) as i16 as i32,
            y: ((lparam.0 >> 16) & 0xFFFF) as i16 as i32,
        }),
        WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN => Input::PointerButton,
        // Alt and F10 arrive as system keys.
        WM_KEYDOWN | WM_SYSKEYDOWN => {
            Input::KeyDown(KeyStroke { vk: wparam.0 as u32, flags: lparam.0 })
        }
        WM_KEYUP | WM_SYSKEYUP => Input::KeyUp(wparam.0 as u32),
        // Losing activation or a close request ends the idle screen like a
        // click would.
        WM_ACTIVATE if (wparam.0 & 0xFFFF) as u32 == WA_INACTIVE => Input::PointerButton,
        WM_CLOSE => Input::PointerButton,
        _ => return None,
    })
}

fn paint(hwnd: HWND) {
    let sprite = with_state(|s| {
        let overlay = s.controller.overlay();
        overlay.is_active().then(|| overlay.position())
    })
    .flatten();

    let mut ps = PAINTSTRUCT::default();
    // SAFETY: hwnd is the overlay window receiving WM_PAINT; ps is a valid
    // out-pointer and EndPaint is always called with it.  Stock objects are
    // shared and never deleted; the previous selections are restored before
    // EndPaint.
    unsafe {
        let hdc = BeginPaint(hwnd, &mut ps);
        let mut rc = RECT::default();
        if GetClientRect(hwnd, &mut rc).is_ok() {
            FillRect(hdc, &rc, HBRUSH(GetStockObject(BLACK_BRUSH).0));
        }
        if let Some(at) = sprite {
            let old_brush = SelectObject(hdc, GetStockObject(WHITE_BRUSH));
            let old_pen = SelectObject(hdc, GetStockObject(NULL_PEN));
            let _ = Ellipse(
                hdc,
                at.x - SPRITE_RADIUS,
                at.y - SPRITE_RADIUS,
                at.x + SPRITE_RADIUS,
                at.y + SPRITE_RADIUS,
            );
            SelectObject(hdc, old_pen);
            SelectObject(hdc, old_brush);
        }
        let _ = EndPaint(hwnd, &ps);
    }
}

#[cfg(test)]
mod tests {
    use windows::Win32::UI::WindowsAndMessaging::{WA_ACTIVE, WM_TIMER};

    use super::*;

    const VK_MENU: usize = 0x12;
    const VK_F10: usize = 0x79;

    #[test]
    fn system_keys_count_as_key_presses() {
        for vk in [VK_MENU, VK_F10] {
            let down = input_for(WM_SYSKEYDOWN, WPARAM(vk), LPARAM(0x2000_0001));
            assert_eq!(down, Some(Input::KeyDown(KeyStroke { vk: vk as u32, flags: 0x2000_0001 })));
            assert_eq!(input_for(WM_SYSKEYUP, WPARAM(vk), LPARAM(0)), Some(Input::KeyUp(vk as u32)));
        }
    }

    #[test]
    fn pointer_coordinates_are_signed() {
        let lparam = LPARAM(((-5i16 as u16 as isize) << 16) | 40);
        assert_eq!(
            input_for(WM_MOUSEMOVE, WPARAM(0), lparam),
            Some(Input::PointerMove(Point { x: 40, y: -5 }))
        );
    }

    #[test]
    fn deactivation_dismisses_but_activation_does_not() {
        let inactive = WPARAM(WA_INACTIVE as usize);
        assert_eq!(input_for(WM_ACTIVATE, inactive, LPARAM(0)), Some(Input::PointerButton));
        assert_eq!(input_for(WM_ACTIVATE, WPARAM(WA_ACTIVE as usize), LPARAM(0)), None);
        assert_eq!(input_for(WM_TIMER, WPARAM(0), LPARAM(0)), None);
    }
}
