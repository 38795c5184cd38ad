// ── EDIT control constants ────────────────────────────────────────────────────
//
// Source of truth: WinUser.h.  Sent via SendMessageW(hwnd_edit, EM_*, …).

// ── Styles ────────────────────────────────────────────────────────────────────

pub(super) const ES_MULTILINE: u32 = 0x0004;
pub(super) const ES_AUTOVSCROLL: u32 = 0x0040;
pub(super) const ES_AUTOHSCROLL: u32 = 0x0080;
/// Keep the selection visible while the control is unfocused.
pub(super) const ES_NOHIDESEL: u32 = 0x0100;

// ── Messages ──────────────────────────────────────────────────────────────────

/// Return non-zero if the user has edited the text since the flag was cleared.
pub(super) const EM_GETMODIFY: u32 = 0x00B8;
/// Set or clear the modify flag.  WPARAM = new value.
pub(super) const EM_SETMODIFY: u32 = 0x00B9;
/// Set the text limit.  WPARAM = 0 lifts the 32 KiB default.
pub(super) const EM_SETLIMITTEXT: u32 = 0x00C5;

/// Cut selection to clipboard.
pub(super) const WM_CUT: u32 = 0x0300;
/// Copy selection to clipboard.
pub(super) const WM_COPY: u32 = 0x0301;
/// Paste from clipboard.
pub(super) const WM_PASTE: u32 = 0x0302;

// ── Notifications: pub(crate) for WM_COMMAND dispatch in window.rs ──────────

/// The text may have changed (sent after the screen is updated).
pub(crate) const EN_CHANGE: u32 = 0x0300;
