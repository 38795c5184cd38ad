// ── Platform abstraction layer ────────────────────────────────────────────────
//
// All Win32 FFI is confined to the `win32` sub-module and never leaks outward.
// The rest of the crate reaches it only through the `TextSurface`, `Shell`,
// `SettingsBackend` and `CodePage` seams, so it builds and tests on any host.

#[cfg(windows)]
pub mod win32;
