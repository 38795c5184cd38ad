// ── File content service ──────────────────────────────────────────────────────
//
// Reads a whole file into a `String`, sniffing the encoding, and writes a
// `String` back using an encoding chosen from the file extension.  The EDIT
// control wants CRLF line endings, so the helpers at the bottom translate
// between the file's own EOL style and CRLF.

pub(crate) mod codepage;

use std::{
    fs,
    io::{Read, Write},
    path::Path,
};

use crate::error::{EditorError, Result};

use codepage::{CodePage, Latin1};

// ── Encoding ──────────────────────────────────────────────────────────────────

/// The encoding a file was decoded from, or will be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    /// UTF-8 without BOM.
    Utf8,
    /// UTF-8 with a leading `EF BB BF`.
    Utf8Bom,
    /// UTF-16 Little-Endian with BOM.
    Utf16Le,
    /// UTF-16 Big-Endian with BOM.
    Utf16Be,
    /// The system ANSI code page.
    SystemCodePage,
    /// Fixed Latin-1 fallback; used when nothing else decodes.
    Latin1,
}

impl Encoding {
    /// Short display string used in log output.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf8Bom => "UTF-8 BOM",
            Self::Utf16Le => "UTF-16 LE",
            Self::Utf16Be => "UTF-16 BE",
            Self::SystemCodePage => "ANSI",
            Self::Latin1 => "Latin-1",
        }
    }
}

// ── EOL mode ──────────────────────────────────────────────────────────────────

/// The end-of-line convention used by a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EolMode {
    /// Windows-style `\r\n`.
    #[default]
    Crlf,
    /// Unix-style `\n`.
    Lf,
    /// Old Mac-style `\r`.
    Cr,
}

impl EolMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Crlf => "\r\n",
            Self::Lf => "\n",
            Self::Cr => "\r",
        }
    }
}

// ── Extension allow-list ──────────────────────────────────────────────────────

/// Extensions written as UTF-8.  Everything else goes out in the system code
/// page.  Compared case-insensitively.
const UTF8_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "markdown", "log", "ini", "cfg", "conf", "json", "xml", "html", "htm",
    "css", "js", "ts", "jsx", "tsx", "rs", "c", "h", "cpp", "hpp", "cc", "cs", "java", "py", "rb",
    "go", "php", "sh", "bat", "cmd", "ps1", "sql", "yaml", "yml", "toml", "csv",
];

/// The encoding `write` will use for `path`.
pub(crate) fn write_encoding_for(path: &Path) -> Encoding {
    let utf8 = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| UTF8_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)));
    if utf8 {
        Encoding::Utf8
    } else {
        Encoding::SystemCodePage
    }
}

// ── Decoded text ──────────────────────────────────────────────────────────────

/// Result of decoding a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decoded {
    /// Text with any BOM stripped.  Line endings are left as found.
    pub(crate) text: String,
    /// Where the text came from.
    pub(crate) encoding: Encoding,
}

// ── FileService ───────────────────────────────────────────────────────────────

/// Opens and saves a single text buffer.
pub(crate) struct FileService {
    system: Box<dyn CodePage>,
}

impl FileService {
    /// A service that uses `system` for ANSI conversions.
    pub(crate) fn new(system: Box<dyn CodePage>) -> Self {
        Self { system }
    }

    /// A service bound to this host's system code page.
    pub(crate) fn for_host() -> Self {
        Self::new(codepage::system())
    }

    /// Read and decode the whole file at `path`.
    ///
    /// Fails with `FileOpen` when the file cannot be opened or read.  If the
    /// size of an opened file cannot be queried the content is empty.
    pub(crate) fn read(&self, path: &Path) -> Result<Decoded> {
        let open_err = |source| EditorError::FileOpen { path: path.to_path_buf(), source };

        let mut file = fs::File::open(path).map_err(open_err)?;
        let size = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::warn!("size query failed for {}: {e}", path.display());
                return Ok(Decoded { text: String::new(), encoding: Encoding::Utf8 });
            }
        };

        let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
        file.read_to_end(&mut bytes).map_err(open_err)?;

        let decoded = self.decode(&bytes);
        log::info!(
            "read {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            decoded.encoding.as_str()
        );
        Ok(decoded)
    }

    /// Detect the encoding of `bytes` and decode them.
    ///
    /// Detection order:
    /// 1. UTF-8 BOM (`EF BB BF`), stripped
    /// 2. UTF-16 LE BOM (`FF FE`)
    /// 3. UTF-16 BE BOM (`FE FF`)
    /// 4. Strict UTF-8
    /// 5. System code page
    /// 6. Latin-1, which accepts anything
    pub(crate) fn decode(&self, bytes: &[u8]) -> Decoded {
        if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
            let text = String::from_utf8_lossy(rest).into_owned();
            return Decoded { text, encoding: Encoding::Utf8Bom };
        }

        if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            let text = String::from_utf16_lossy(&units);
            return Decoded { text, encoding: Encoding::Utf16Le };
        }

        if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
            // Swap each pair and carry on as little-endian.
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[1], c[0]]))
                .collect();
            let text = String::from_utf16_lossy(&units);
            return Decoded { text, encoding: Encoding::Utf16Be };
        }

        if let Ok(text) = std::str::from_utf8(bytes) {
            return Decoded { text: text.to_owned(), encoding: Encoding::Utf8 };
        }

        if let Some(text) = self.system.decode(bytes) {
            log::warn!("not valid UTF-8; decoded with system code page {}", self.system.name());
            return Decoded { text, encoding: Encoding::SystemCodePage };
        }

        log::warn!("system code page {} rejected the file; falling back to Latin-1", self.system.name());
        let text = Latin1.decode(bytes).unwrap_or_default();
        Decoded { text, encoding: Encoding::Latin1 }
    }

    /// Encode `text` for `path` and overwrite the file (create or truncate).
    ///
    /// Returns the encoding used.  Fails with `FileWrite`; the file may be
    /// left truncated but the caller's in-memory state is untouched.
    pub(crate) fn write(&self, path: &Path, text: &str) -> Result<Encoding> {
        let write_err = |source| EditorError::FileWrite { path: path.to_path_buf(), source };

        let (encoding, bytes) = self.encode(path, text);
        let mut file = fs::File::create(path).map_err(write_err)?;
        file.write_all(&bytes).map_err(write_err)?;
        file.flush().map_err(write_err)?;

        log::info!("wrote {} ({} bytes, {})", path.display(), bytes.len(), encoding.as_str());
        Ok(encoding)
    }

    /// Convert `text` to the bytes `write` would put on disk for `path`.
    pub(crate) fn encode(&self, path: &Path, text: &str) -> (Encoding, Vec<u8>) {
        match write_encoding_for(path) {
            Encoding::Utf8 => (Encoding::Utf8, text.as_bytes().to_vec()),
            _ => (Encoding::SystemCodePage, self.system.encode(text)),
        }
    }
}

// ── Line endings ──────────────────────────────────────────────────────────────

/// Detect the dominant EOL style.
///
/// Counts `\r\n`, lone `\r` and lone `\n` and returns whichever appears most.
/// Falls back to `EolMode::Crlf` when no line endings are present.
pub(crate) fn detect_eol(text: &str) -> EolMode {
    let bytes = text.as_bytes();
    let mut crlf = 0usize;
    let mut lf = 0usize;
    let mut cr = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                crlf += 1;
                i += 2;
            }
            b'\r' => {
                cr += 1;
                i += 1;
            }
            b'\n' => {
                lf += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    if crlf >= lf && crlf >= cr {
        EolMode::Crlf
    } else if lf >= cr {
        EolMode::Lf
    } else {
        EolMode::Cr
    }
}

/// Rewrite every line break (`\r\n`, `\r`, `\n`) as `eol`.
pub(crate) fn convert_eols(text: &str, eol: EolMode) -> String {
    let target = eol.as_str();
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(target);
            }
            '\n' => out.push_str(target),
            _ => out.push(c),
        }
    }
    out
}

/// Every line break in `text`, in order, when the breaks are not all the
/// same style.  Empty for uniform (or absent) line endings.
pub(crate) fn mixed_line_breaks(text: &str) -> Vec<EolMode> {
    let mut breaks = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                breaks.push(EolMode::Crlf);
            }
            '\r' => breaks.push(EolMode::Cr),
            '\n' => breaks.push(EolMode::Lf),
            _ => {}
        }
    }
    match breaks.first() {
        Some(&first) if breaks.iter().any(|&b| b != first) => breaks,
        _ => Vec::new(),
    }
}

/// Rewrite the line breaks of `text` with `breaks`, one per break in order.
/// `None` if `text` does not have exactly `breaks.len()` line breaks.
pub(crate) fn restore_line_breaks(text: &str, breaks: &[EolMode]) -> Option<String> {
    let mut out = String::with_capacity(text.len() + breaks.len());
    let mut next = breaks.iter();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(next.next()?.as_str());
            }
            _ => out.push(c),
        }
    }
    next.next().is_none().then_some(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A system code page that accepts nothing, to exercise the last fallback.
    struct Rejecting;

    impl CodePage for Rejecting {
        fn name(&self) -> &str {
            "rejecting"
        }
        fn decode(&self, _bytes: &[u8]) -> Option<String> {
            None
        }
        fn encode(&self, text: &str) -> Vec<u8> {
            text.bytes().map(|b| if b.is_ascii() { b } else { b'?' }).collect()
        }
    }

    fn service() -> FileService {
        FileService::new(Box::new(Latin1))
    }

    #[test]
    fn bom_variants_recover_the_text() {
        let original = "héllo\r\nwörld";
        let mut utf8 = vec![0xEF, 0xBB, 0xBF];
        utf8.extend_from_slice(original.as_bytes());

        let mut le = vec![0xFF, 0xFE];
        let mut be = vec![0xFE, 0xFF];
        for unit in original.encode_utf16() {
            le.extend_from_slice(&unit.to_le_bytes());
            be.extend_from_slice(&unit.to_be_bytes());
        }

        for (bytes, expected) in [
            (utf8, Encoding::Utf8Bom),
            (le, Encoding::Utf16Le),
            (be, Encoding::Utf16Be),
        ] {
            let decoded = service().decode(&bytes);
            assert_eq!(decoded.encoding, expected);
            assert_eq!(decoded.text, original);
        }
    }

    #[test]
    fn plain_utf8_is_detected() {
        let decoded = service().decode("grüße".as_bytes());
        assert_eq!(decoded.encoding, Encoding::Utf8);
        assert_eq!(decoded.text, "grüße");
    }

    #[test]
    fn invalid_utf8_uses_system_code_page() {
        let decoded = service().decode(b"caf\xE9");
        assert_eq!(decoded.encoding, Encoding::SystemCodePage);
        assert_eq!(decoded.text, "café");
    }

    #[test]
    fn rejected_by_system_falls_back_to_latin1() {
        let svc = FileService::new(Box::new(Rejecting));
        let decoded = svc.decode(b"\x80\xE9");
        assert_eq!(decoded.encoding, Encoding::Latin1);
        assert_eq!(decoded.text, "\u{80}é");
    }

    #[test]
    fn odd_trailing_utf16_byte_is_dropped() {
        let decoded = service().decode(b"\xFF\xFEh\x00i\x00!");
        assert_eq!(decoded.text, "hi");
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert_eq!(write_encoding_for(Path::new("a/notes.TXT")), Encoding::Utf8);
        assert_eq!(write_encoding_for(Path::new("main.rs")), Encoding::Utf8);
        assert_eq!(write_encoding_for(Path::new("data.bin")), Encoding::SystemCodePage);
        assert_eq!(write_encoding_for(Path::new("README")), Encoding::SystemCodePage);
    }

    #[test]
    fn utf8_file_round_trips_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        let original = "line one\nлиния два\n".as_bytes();
        fs::write(&path, original).expect("seed");

        let svc = service();
        let decoded = svc.read(&path).expect("read");
        assert_eq!(svc.write(&path, &decoded.text).expect("write"), Encoding::Utf8);
        assert_eq!(fs::read(&path).expect("reread"), original);
    }

    #[test]
    fn bom_is_not_written_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"\xEF\xBB\xBFh\xC3\xA9llo").expect("seed");

        let svc = service();
        let decoded = svc.read(&path).expect("read");
        assert_eq!(decoded.text, "héllo");
        assert_eq!(decoded.text.chars().count(), 5);
        svc.write(&path, &decoded.text).expect("write");
        assert_eq!(fs::read(&path).expect("reread"), "héllo".as_bytes());
    }

    #[test]
    fn unlisted_extension_uses_system_code_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("legacy.dat");
        let svc = service();
        assert_eq!(svc.write(&path, "café").expect("write"), Encoding::SystemCodePage);
        assert_eq!(fs::read(&path).expect("reread"), b"caf\xE9");
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = service().read(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, EditorError::FileOpen { .. }));
    }

    #[test]
    fn unwritable_path_is_a_write_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("out.txt");
        let err = service().write(&path, "x").unwrap_err();
        assert!(matches!(err, EditorError::FileWrite { .. }));
    }

    #[test]
    fn detect_eol_crlf_dominant() {
        assert_eq!(detect_eol("a\r\nb\r\nc\n"), EolMode::Crlf);
    }

    #[test]
    fn detect_eol_lf_dominant() {
        assert_eq!(detect_eol("a\nb\nc\n"), EolMode::Lf);
    }

    #[test]
    fn detect_eol_no_newlines_defaults_crlf() {
        assert_eq!(detect_eol("no newlines here"), EolMode::Crlf);
    }

    #[test]
    fn convert_eols_normalises_mixed_input() {
        assert_eq!(convert_eols("a\nb\r\nc\rd", EolMode::Crlf), "a\r\nb\r\nc\r\nd");
        assert_eq!(convert_eols("a\r\nb\r\n", EolMode::Lf), "a\nb\n");
        assert_eq!(convert_eols("a\r\nb", EolMode::Cr), "a\rb");
    }

    #[test]
    fn mixed_breaks_are_recorded_and_restored() {
        let original = "a\r\nb\nc\rd";
        let breaks = mixed_line_breaks(original);
        assert_eq!(breaks, vec![EolMode::Crlf, EolMode::Lf, EolMode::Cr]);

        let shown = convert_eols(original, EolMode::Crlf);
        assert_eq!(restore_line_breaks(&shown, &breaks).as_deref(), Some(original));
    }

    #[test]
    fn uniform_breaks_record_nothing() {
        assert!(mixed_line_breaks("a\nb\nc").is_empty());
        assert!(mixed_line_breaks("no breaks").is_empty());
    }

    #[test]
    fn restore_refuses_a_different_line_count() {
        let breaks = [EolMode::Crlf, EolMode::Lf];
        assert_eq!(restore_line_breaks("a\r\nb", &breaks), None);
        assert_eq!(restore_line_breaks("a\r\nb\r\nc\r\nd", &breaks), None);
    }
}
