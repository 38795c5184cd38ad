// ── Main window ───────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the main window class and create the top-level window.
//   • Build the menu bar and keyboard accelerators.
//   • Own the per-thread `WindowState` and hand messages to the controller.
//   • Run the Win32 message loop, reporting user input as activity.
//   • Expose a safe error-dialog helper for use by main().
//
// ── Re-entrancy ───────────────────────────────────────────────────────────────
//
// The controller lives in a thread-local `RefCell` and is borrowed for the
// duration of each handler.  Handlers that open modal dialogs or send
// messages to child windows re-enter `wnd_proc` while that borrow is held;
// `with_state` then returns `None` and the message gets default processing.
// An EN_CHANGE that arrives that way is re-posted as WM_APP_TEXT_CHANGED.

#![allow(unsafe_code)]

use std::cell::RefCell;

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        Graphics::Gdi::{GetStockObject, UpdateWindow, HBRUSH, HDC, WHITE_BRUSH},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            AppendMenuW, CreateAcceleratorTableW, CreateMenu, CreateWindowExW, DefWindowProcW,
            DestroyAcceleratorTable, DestroyWindow, DispatchMessageW, GetMessageW, LoadCursorW,
            LoadIconW, MessageBoxW, PostMessageW, PostQuitMessage, RegisterClassExW, SetMenu,
            ShowWindow, TranslateAcceleratorW, TranslateMessage, ACCEL, CREATESTRUCTW,
            CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, FCONTROL, FSHIFT, FVIRTKEY, HACCEL, HMENU,
            IDC_ARROW, IDI_APPLICATION, MB_ICONERROR, MB_OK, MF_POPUP, MF_SEPARATOR, MF_STRING,
            MSG, SW_SHOW, WINDOW_EX_STYLE, WM_APP, WM_CLOSE, WM_COMMAND, WM_CREATE,
            WM_CTLCOLOREDIT, WM_DESTROY, WM_KEYFIRST, WM_KEYLAST, WM_MOUSEFIRST, WM_MOUSELAST,
            WM_MOUSEMOVE, WM_QUERYENDSESSION, WM_SETFOCUS, WM_SIZE, WM_TIMER, WNDCLASSEXW,
            WS_OVERLAPPEDWINDOW,
        },
    },
};

use super::{dpi, overlay_window, shell::Win32Shell};
use crate::{
    app::APP_TITLE,
    config::{self, Config},
    controller::{Command, Controller, TimerId},
    editor::edit_control::{self, messages::EN_CHANGE, EditControl},
    error::{EditorError, Result},
    fileio::FileService,
    overlay::OverlayProfile,
    settings::{self, SettingsStore},
};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register (and later find) the main window class.
const CLASS_NAME: PCWSTR = w!("SlateMainWindow");

/// Default window width at 96 DPI.
const DEFAULT_WIDTH: i32 = 800;

/// Default window height at 96 DPI.
const DEFAULT_HEIGHT: i32 = 600;

/// Posted when a text change arrived while the controller was busy.
const WM_APP_TEXT_CHANGED: u32 = WM_APP + 1;

// ── Menu command IDs ──────────────────────────────────────────────────────────

const IDM_FILE_NEW: usize = 1001;
const IDM_FILE_OPEN: usize = 1002;
const IDM_FILE_SAVE: usize = 1003;
const IDM_FILE_SAVE_AS: usize = 1004;
const IDM_FILE_EXIT: usize = 1005;

const IDM_EDIT_CUT: usize = 2001;
const IDM_EDIT_COPY: usize = 2002;
const IDM_EDIT_PASTE: usize = 2003;

const IDM_SETTINGS_FONT: usize = 3001;
const IDM_SETTINGS_TEXT_COLOR: usize = 3002;
const IDM_SETTINGS_BACKGROUND_COLOR: usize = 3003;
pub(super) const IDM_IDLE_SIMPLE: usize = 3011;
pub(super) const IDM_IDLE_INTERACTIVE: usize = 3012;

const IDM_HELP_ABOUT: usize = 9001;

fn command_for(id: usize) -> Option<Command> {
    Some(match id {
        IDM_FILE_NEW => Command::New,
        IDM_FILE_OPEN => Command::Open,
        IDM_FILE_SAVE => Command::Save,
        IDM_FILE_SAVE_AS => Command::SaveAs,
        IDM_FILE_EXIT => Command::Exit,
        IDM_EDIT_CUT => Command::Cut,
        IDM_EDIT_COPY => Command::Copy,
        IDM_EDIT_PASTE => Command::Paste,
        IDM_SETTINGS_FONT => Command::Font,
        IDM_SETTINGS_TEXT_COLOR => Command::TextColor,
        IDM_SETTINGS_BACKGROUND_COLOR => Command::BackgroundColor,
        IDM_IDLE_SIMPLE => Command::OverlayProfile(OverlayProfile::Simple),
        IDM_IDLE_INTERACTIVE => Command::OverlayProfile(OverlayProfile::Interactive),
        IDM_HELP_ABOUT => Command::About,
        _ => return None,
    })
}

// ── Per-thread state ──────────────────────────────────────────────────────────

pub(super) struct WindowState {
    pub(super) controller: Controller,
    /// The EDIT child, to recognise its notifications.
    edit: HWND,
}

thread_local! {
    static STATE: RefCell<Option<WindowState>> = const { RefCell::new(None) };
}

/// Run `f` against the window state.  `None` if the state does not exist or
/// is already borrowed further up the stack.
pub(super) fn with_state<R>(f: impl FnOnce(&mut WindowState) -> R) -> Option<R> {
    STATE.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

fn is_busy() -> bool {
    STATE.with(|cell| cell.try_borrow_mut().is_err())
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Register the window classes, create the main window, and drive the
/// message loop until the user closes the application.
///
/// Logs elapsed startup time (debug builds only) once the window is first
/// shown on screen.
pub(crate) fn run() -> Result<()> {
    #[cfg(debug_assertions)]
    let t0 = std::time::Instant::now();

    dpi::init();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime.
    let hmodule = unsafe { GetModuleHandleW(None) }?;
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance)?;
    overlay_window::register_class(hinstance)?;
    let hwnd = create_window(hinstance)?;

    // SAFETY: hwnd was just returned by CreateWindowExW and is valid.
    // ShowWindow returns the previous visibility state; UpdateWindow returns
    // a success BOOL; both are intentionally ignored here.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }

    if with_state(|s| s.controller.start()).is_none() {
        return Err(EditorError::Win32 { function: "WM_CREATE", code: 0 });
    }

    #[cfg(debug_assertions)]
    log::debug!("window visible in {:.1} ms", t0.elapsed().as_secs_f64() * 1000.0);

    let accel = build_accelerators()?;
    let result = message_loop(hwnd, accel);
    // SAFETY: accel was created by build_accelerators and is destroyed once.
    unsafe {
        let _ = DestroyAcceleratorTable(accel);
    }
    result
}

/// Show a modal error dialog with the given message.
///
/// Safe to call from any context; performs the UTF-16 conversion internally.
/// Used by `main()` when `run()` returns an error.
pub(crate) fn show_error_dialog(message: &str) {
    let msg_wide: Vec<u16> = message.encode_utf16().chain(std::iter::once(0)).collect();
    let title_wide: Vec<u16> = format!("{APP_TITLE}: Fatal Error")
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();

    // SAFETY: msg_wide and title_wide are valid null-terminated UTF-16 strings
    // that remain allocated for the duration of the MessageBoxW call.
    // HWND::default() (null) means the dialog has no owner window.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            PCWSTR(title_wide.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: LoadIconW with IDI_APPLICATION loads the built-in application
    // icon resource, which exists on all Windows versions.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }?;

    // SAFETY: LoadCursorW with IDC_ARROW loads a built-in system cursor.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }?;

    // SAFETY: GetStockObject with WHITE_BRUSH always returns a valid HGDIOBJ.
    // Casting to HBRUSH is correct: stock brush objects are compatible types.
    let bg_brush = unsafe { HBRUSH(GetStockObject(WHITE_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        hbrBackground: bg_brush,
        lpszMenuName: PCWSTR::null(),
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }

    Ok(())
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE) -> Result<HWND> {
    let dpi = dpi::get_system_dpi();
    let title = super::dialogs::wide(APP_TITLE);
    let menu = build_menu()?;

    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module;
    // title outlives the call.  WM_CREATE runs inside this call and builds
    // the window state; if it fails, creation fails.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            PCWSTR(title.as_ptr()),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            dpi::scale(DEFAULT_WIDTH, dpi),
            dpi::scale(DEFAULT_HEIGHT, dpi),
            HWND::default(),
            HMENU::default(),
            hinstance,
            None,
        )
    }?;

    // SAFETY: hwnd and menu are valid handles.
    unsafe { SetMenu(hwnd, menu) }?;

    Ok(hwnd)
}

// ── Menu construction ─────────────────────────────────────────────────────────

fn build_menu() -> Result<HMENU> {
    // SAFETY: CreateMenu has no preconditions; string literals are static.
    unsafe {
        let bar = CreateMenu()?;

        // ── File ──────────────────────────────────────────────────────────────
        let file = CreateMenu()?;
        AppendMenuW(file, MF_STRING, IDM_FILE_NEW, w!("&New\tCtrl+N"))?;
        AppendMenuW(file, MF_STRING, IDM_FILE_OPEN, w!("&Open...\tCtrl+O"))?;
        AppendMenuW(file, MF_STRING, IDM_FILE_SAVE, w!("&Save\tCtrl+S"))?;
        AppendMenuW(file, MF_STRING, IDM_FILE_SAVE_AS, w!("Save &As...\tCtrl+Shift+S"))?;
        AppendMenuW(file, MF_SEPARATOR, 0, PCWSTR::null())?;
        AppendMenuW(file, MF_STRING, IDM_FILE_EXIT, w!("E&xit\tAlt+F4"))?;

        // ── Edit ──────────────────────────────────────────────────────────────
        // The EDIT control handles Ctrl+X/C/V itself; the labels are hints.
        let edit = CreateMenu()?;
        AppendMenuW(edit, MF_STRING, IDM_EDIT_CUT, w!("Cu&t\tCtrl+X"))?;
        AppendMenuW(edit, MF_STRING, IDM_EDIT_COPY, w!("&Copy\tCtrl+C"))?;
        AppendMenuW(edit, MF_STRING, IDM_EDIT_PASTE, w!("&Paste\tCtrl+V"))?;

        // ── Settings ──────────────────────────────────────────────────────────
        let idle = CreateMenu()?;
        AppendMenuW(idle, MF_STRING, IDM_IDLE_SIMPLE, w!("&Simple"))?;
        AppendMenuW(idle, MF_STRING, IDM_IDLE_INTERACTIVE, w!("&Interactive"))?;

        let settings = CreateMenu()?;
        AppendMenuW(settings, MF_STRING, IDM_SETTINGS_FONT, w!("&Font..."))?;
        AppendMenuW(settings, MF_STRING, IDM_SETTINGS_TEXT_COLOR, w!("&Text Colour..."))?;
        AppendMenuW(
            settings,
            MF_STRING,
            IDM_SETTINGS_BACKGROUND_COLOR,
            w!("&Background Colour..."),
        )?;
        AppendMenuW(settings, MF_SEPARATOR, 0, PCWSTR::null())?;
        AppendMenuW(settings, MF_POPUP, idle.0 as usize, w!("&Idle Screen"))?;

        // ── Help ──────────────────────────────────────────────────────────────
        let help = CreateMenu()?;
        AppendMenuW(help, MF_STRING, IDM_HELP_ABOUT, w!("&About Slate..."))?;

        // The uIDNewItem parameter for MF_POPUP is the child HMENU cast to usize.
        AppendMenuW(bar, MF_POPUP, file.0 as usize, w!("&File"))?;
        AppendMenuW(bar, MF_POPUP, edit.0 as usize, w!("&Edit"))?;
        AppendMenuW(bar, MF_POPUP, settings.0 as usize, w!("&Settings"))?;
        AppendMenuW(bar, MF_POPUP, help.0 as usize, w!("&Help"))?;

        Ok(bar)
    }
}

fn build_accelerators() -> Result<HACCEL> {
    const VK_N: u16 = 0x4E;
    const VK_O: u16 = 0x4F;
    const VK_S: u16 = 0x53;
    let ctrl = FVIRTKEY | FCONTROL;
    let table = [
        ACCEL { fVirt: ctrl, key: VK_N, cmd: IDM_FILE_NEW as u16 },
        ACCEL { fVirt: ctrl, key: VK_O, cmd: IDM_FILE_OPEN as u16 },
        ACCEL { fVirt: ctrl, key: VK_S, cmd: IDM_FILE_SAVE as u16 },
        ACCEL { fVirt: ctrl | FSHIFT, key: VK_S, cmd: IDM_FILE_SAVE_AS as u16 },
    ];
    // SAFETY: table is a live slice of initialised ACCEL entries; the
    // system copies it.
    Ok(unsafe { CreateAcceleratorTableW(&table) }?)
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn is_user_input(msg: u32) -> bool {
    (WM_KEYFIRST..=WM_KEYLAST).contains(&msg) || (WM_MOUSEFIRST..=WM_MOUSELAST).contains(&msg)
}

fn message_loop(hwnd: HWND, accel: HACCEL) -> Result<()> {
    let mut msg = MSG::default();
    // Windows re-sends WM_MOUSEMOVE for a stationary pointer; only real
    // movement counts as activity.
    let mut last_pointer = None;

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
        // messages for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            -1 => return Err(last_error("GetMessageW")),
            0 => break,
            _ => {
                if is_user_input(msg.message) {
                    let pointer = (msg.pt.x, msg.pt.y);
                    let moved = msg.message != WM_MOUSEMOVE || last_pointer != Some(pointer);
                    last_pointer = Some(pointer);
                    if moved {
                        with_state(|s| s.controller.on_activity());
                    }
                }
                // SAFETY: msg was populated by a successful GetMessageW call;
                // hwnd and accel are live for the whole loop.
                unsafe {
                    if TranslateAcceleratorW(hwnd, accel, &msg) == 0 {
                        let _ = TranslateMessage(&msg);
                        let _ = DispatchMessageW(&msg);
                    }
                }
            }
        }
    }

    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

fn create_state(hwnd: HWND, hinstance: HINSTANCE) -> Result<WindowState> {
    let edit = EditControl::create(hwnd, hinstance)?;
    let edit_hwnd = edit.hwnd();

    let config_file = config::config_path();
    let config = config_file.as_deref().map(Config::load_from).unwrap_or_default();

    let controller = Controller::new(
        Box::new(edit),
        Box::new(Win32Shell::new(hwnd, hinstance)),
        FileService::for_host(),
        SettingsStore::new(settings::host_backend()),
        config,
    )
    .with_config_file(config_file);

    Ok(WindowState { controller, edit: edit_hwnd })
}

/// A text change from the EDIT control.  Deferred if the controller is busy.
fn text_changed(hwnd: HWND) {
    if with_state(|s| s.controller.on_text_changed()).is_none() && is_busy() {
        // SAFETY: hwnd is the live main window.
        let _ = unsafe { PostMessageW(hwnd, WM_APP_TEXT_CHANGED, WPARAM(0), LPARAM(0)) };
    }
}

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        // ── Lifecycle ─────────────────────────────────────────────────────────
        WM_CREATE => {
            // SAFETY: for WM_CREATE, lparam points at the CREATESTRUCTW
            // describing this window.
            let cs = &*(lparam.0 as *const CREATESTRUCTW);
            match create_state(hwnd, cs.hInstance) {
                Ok(state) => {
                    STATE.with(|cell| match cell.try_borrow_mut() {
                        Ok(mut slot) => {
                            *slot = Some(state);
                            LRESULT(0)
                        }
                        Err(_) => LRESULT(-1),
                    })
                }
                Err(e) => {
                    log::error!("main window setup failed: {e}");
                    LRESULT(-1)
                }
            }
        }

        WM_CLOSE => {
            match with_state(|s| s.controller.on_close_requested()) {
                Some(false) => {}
                // A close request while a dialog is up waits for the user.
                None if is_busy() => {}
                _ => {
                    let _ = DestroyWindow(hwnd);
                }
            }
            LRESULT(0)
        }

        WM_QUERYENDSESSION => {
            let allow = with_state(|s| s.controller.on_session_end()).unwrap_or(!is_busy());
            LRESULT(isize::from(allow))
        }

        WM_DESTROY => {
            // Drop the controller (and with it the edit control's font and
            // brush and any overlay window) before the message loop ends.
            let state = STATE.with(|cell| cell.try_borrow_mut().ok().and_then(|mut s| s.take()));
            drop(state);
            PostQuitMessage(0);
            LRESULT(0)
        }

        // ── Layout and focus ──────────────────────────────────────────────────
        WM_SIZE => {
            // lparam low word = new client width, high word = new client height.
            let width = (lparam.0 & 0xFFFF) as i32;
            let height = ((lparam.0 >> 16) & 0xFFFF) as i32;
            with_state(|s| s.controller.on_resize(width, height));
            LRESULT(0)
        }

        WM_SETFOCUS => {
            with_state(|s| s.controller.on_focus());
            LRESULT(0)
        }

        WM_CTLCOLOREDIT => match edit_control::ctl_color(HDC(wparam.0 as _)) {
            Some(brush) => LRESULT(brush.0 as isize),
            None => DefWindowProcW(hwnd, msg, wparam, lparam),
        },

        // ── Timers ────────────────────────────────────────────────────────────
        WM_TIMER => {
            if let Some(id) = TimerId::from_raw(wparam.0) {
                with_state(|s| s.controller.on_timer(id));
            }
            LRESULT(0)
        }

        // ── Commands ──────────────────────────────────────────────────────────
        WM_COMMAND => {
            // Low word of WPARAM is the command or control id, high word the
            // notification code; LPARAM is the control's HWND, if any.
            let id = wparam.0 & 0xFFFF;
            let code = ((wparam.0 >> 16) & 0xFFFF) as u32;

            if lparam.0 != 0 {
                let from_edit = with_state(|s| s.edit.0 as isize == lparam.0);
                if code == EN_CHANGE && from_edit != Some(false) {
                    text_changed(hwnd);
                }
                return LRESULT(0);
            }

            match command_for(id) {
                Some(cmd) => {
                    if with_state(|s| s.controller.on_command(cmd)).is_none() {
                        log::debug!("command {cmd:?} ignored while busy");
                    }
                    LRESULT(0)
                }
                None => DefWindowProcW(hwnd, msg, wparam, lparam),
            }
        }

        WM_APP_TEXT_CHANGED => {
            text_changed(hwnd);
            LRESULT(0)
        }

        // Default processing for all unhandled messages.
        // SAFETY: hwnd and message parameters are valid; provided by Windows.
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in an `EditorError`.
///
/// Call immediately after a Win32 function that signals failure; `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
pub(super) fn last_error(function: &'static str) -> EditorError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    let code = unsafe { GetLastError() };
    EditorError::Win32 { function, code: code.0 }
}
