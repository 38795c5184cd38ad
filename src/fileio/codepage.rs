// ── Single-byte code pages ────────────────────────────────────────────────────
//
// Text without a BOM that is not valid UTF-8 is decoded with the system ANSI
// code page, and as a last resort with a fixed Latin-1 table that accepts
// every byte.  The system code page lives behind a trait because only the
// Win32 layer can reach `MultiByteToWideChar(CP_ACP, …)`.

/// A legacy byte ↔ text conversion.
pub(crate) trait CodePage {
    /// Short display name, used in log output.
    fn name(&self) -> &str;

    /// Decode `bytes`, or `None` when they are not valid in this code page.
    fn decode(&self, bytes: &[u8]) -> Option<String>;

    /// Encode `text`; characters the code page cannot represent become `?`.
    fn encode(&self, text: &str) -> Vec<u8>;
}

/// ISO-8859-1: byte `n` is code point `U+00nn`.  Decoding never fails.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Latin1;

impl CodePage for Latin1 {
    fn name(&self) -> &str {
        "ISO-8859-1"
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        Some(bytes.iter().map(|&b| char::from(b)).collect())
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect()
    }
}

/// The code page used for "system" conversions on this host.
///
/// Windows asks the OS for the active ANSI code page; elsewhere there is no
/// such thing, so Latin-1 stands in.
pub(crate) fn system() -> Box<dyn CodePage> {
    #[cfg(windows)]
    {
        Box::new(crate::platform::win32::codepage::AnsiCodePage::new())
    }
    #[cfg(not(windows))]
    {
        Box::new(Latin1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_maps_every_byte() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let text = Latin1.decode(&bytes).expect("latin-1 never fails");
        assert_eq!(text.chars().count(), 256);
        assert_eq!(text.chars().nth(0xE9), Some('é'));
        assert_eq!(Latin1.encode(&text), bytes);
    }

    #[test]
    fn latin1_replaces_unrepresentable() {
        assert_eq!(Latin1.encode("a€b"), b"a?b");
    }
}
