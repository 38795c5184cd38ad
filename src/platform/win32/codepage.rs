// ── System ANSI code page ─────────────────────────────────────────────────────

#![allow(unsafe_code)]

use windows::{
    core::PCSTR,
    Win32::Globalization::{
        GetACP, MultiByteToWideChar, WideCharToMultiByte, CP_ACP, MB_ERR_INVALID_CHARS,
    },
};

use crate::fileio::codepage::CodePage;

/// Conversions through `CP_ACP`, the active ANSI code page.
pub(crate) struct AnsiCodePage {
    name: String,
}

impl AnsiCodePage {
    pub(crate) fn new() -> Self {
        // SAFETY: GetACP takes no arguments and cannot fail.
        let acp = unsafe { GetACP() };
        Self { name: format!("CP{acp}") }
    }
}

impl CodePage for AnsiCodePage {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        if bytes.is_empty() {
            return Some(String::new());
        }
        // SAFETY: sizing call; no output buffer is written.
        let len = unsafe { MultiByteToWideChar(CP_ACP, MB_ERR_INVALID_CHARS, bytes, None) };
        if len <= 0 {
            return None;
        }
        let mut wide = vec![0u16; len as usize];
        // SAFETY: wide holds exactly the `len` units the sizing call reported.
        let written =
            unsafe { MultiByteToWideChar(CP_ACP, MB_ERR_INVALID_CHARS, bytes, Some(&mut wide)) };
        if written <= 0 {
            return None;
        }
        wide.truncate(written as usize);
        Some(String::from_utf16_lossy(&wide))
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let wide: Vec<u16> = text.encode_utf16().collect();
        if wide.is_empty() {
            return Vec::new();
        }
        // SAFETY: sizing call; PCSTR::null() selects the system default char
        // for unmappable characters.
        let len = unsafe { WideCharToMultiByte(CP_ACP, 0, &wide, None, PCSTR::null(), None) };
        if len <= 0 {
            log::warn!("{} cannot encode the document", self.name);
            return Vec::new();
        }
        let mut bytes = vec![0u8; len as usize];
        // SAFETY: bytes holds exactly the `len` bytes the sizing call reported.
        let written = unsafe {
            WideCharToMultiByte(CP_ACP, 0, &wide, Some(&mut bytes), PCSTR::null(), None)
        };
        bytes.truncate(written.max(0) as usize);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        let cp = AnsiCodePage::new();
        assert!(cp.name().starts_with("CP"));
        assert_eq!(cp.decode(b"plain text").as_deref(), Some("plain text"));
        assert_eq!(cp.encode("plain text"), b"plain text");
    }

    #[test]
    fn empty_input() {
        let cp = AnsiCodePage::new();
        assert_eq!(cp.decode(b"").as_deref(), Some(""));
        assert!(cp.encode("").is_empty());
    }
}
