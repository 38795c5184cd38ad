// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in Slate return `error::Result<T>`.  No panics in
// production paths; file errors surface as message boxes raised by the
// controller, startup errors as the fatal dialog shown by `main()`.

use std::path::PathBuf;

use thiserror::Error;

/// Every error that Slate can produce.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The file could not be opened or read.
    #[error("cannot open \"{}\": {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be created, truncated or written.
    #[error("cannot write \"{}\": {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings store could not be opened, or a value could not be read
    /// back in the expected shape.  Never fatal: callers fall back to defaults.
    #[error("settings store unavailable: {0}")]
    SettingsUnavailable(String),

    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// Any other I/O error (config file, directory creation, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Convert a windows-crate error (HRESULT) directly into an EditorError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for EditorError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EditorError>;
