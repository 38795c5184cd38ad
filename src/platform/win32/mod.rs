// ── Win32 platform implementation ─────────────────────────────────────────────
//
// This is one of exactly two modules in the codebase where `unsafe` code is
// permitted (the other is `editor::edit_control`).  Every `unsafe` block MUST
// carry a `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub mod window; // main window, WndProc, message loop

pub(crate) mod codepage; // CP_ACP conversions for the file service
pub(crate) mod dialogs; // open/save/font/colour dialogs, message boxes
pub(crate) mod dpi; // per-monitor DPI v2 helpers
pub(crate) mod gdi; // owned fonts and brushes
pub(crate) mod registry; // HKCU settings backend

mod overlay_window; // idle-screen popup
mod shell; // controller `Shell` port
