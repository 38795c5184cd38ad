// ── Document state ────────────────────────────────────────────────────────────
//
// One `Document` exists for the lifetime of the main window; "New" and "Open"
// replace it.  The text itself lives in the editing surface; this struct
// holds what the surface does not know: where the text came from, how it was
// encoded, and whether it differs from what is on disk.

use std::path::{Path, PathBuf};

use crate::fileio::{self, Decoded, Encoding, EolMode};

/// Title bar text when no file is associated.
pub(crate) const APP_TITLE: &str = "Slate";

/// Per-document state for the currently open file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Document {
    /// Path of the file on disk, or `None` for an untitled buffer.
    pub(crate) path: Option<PathBuf>,
    /// `true` when the buffer contains changes not yet saved to disk.
    pub(crate) modified: bool,
    /// The EOL convention of the file; restored on save.
    pub(crate) eol: EolMode,
    /// Per-line breaks of a file with mixed line endings, restored on save
    /// while the line count is unchanged.  Empty for uniform files.
    pub(crate) breaks: Vec<EolMode>,
    /// The encoding the file was read from, or last written with.
    pub(crate) encoding: Encoding,
}

impl Document {
    /// A fresh, untitled, unmodified document.
    pub(crate) fn new_untitled() -> Self {
        Self {
            path: None,
            modified: false,
            eol: EolMode::Crlf,
            breaks: Vec::new(),
            encoding: Encoding::Utf8,
        }
    }

    /// A document for text just read from `path`.
    pub(crate) fn loaded(path: PathBuf, decoded: &Decoded) -> Self {
        Self {
            path: Some(path),
            modified: false,
            eol: fileio::detect_eol(&decoded.text),
            breaks: fileio::mixed_line_breaks(&decoded.text),
            encoding: decoded.encoding,
        }
    }

    /// Text as it should go to disk: the file's own line breaks where they
    /// can still be matched line for line, otherwise its dominant style.
    pub(crate) fn disk_text(&self, shown: &str) -> String {
        if !self.breaks.is_empty() {
            if let Some(text) = fileio::restore_line_breaks(shown, &self.breaks) {
                return text;
            }
            log::info!("line count changed; saving with {:?} line endings", self.eol);
        }
        fileio::convert_eols(shown, self.eol)
    }

    /// Record a successful write of `written` to `path`.
    pub(crate) fn saved(&mut self, path: &Path, encoding: Encoding, written: &str) {
        self.breaks = fileio::mixed_line_breaks(written);
        self.path = Some(path.to_path_buf());
        self.encoding = encoding;
        self.modified = false;
    }

    /// The bare file name component, if a file is associated.
    pub(crate) fn short_name(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Compute the title string for the main window.
    ///
    /// | State | Title |
    /// |---|---|
    /// | No path, clean | `"Slate"` |
    /// | Path set, clean | `"notes.txt - Slate"` |
    /// | Path set, modified | `"notes.txt* - Slate"` |
    /// | No path, modified | `"Untitled* - Slate"` |
    pub(crate) fn window_title(&self) -> String {
        let marker = if self.modified { "*" } else { "" };
        match self.short_name() {
            Some(name) => format!("{name}{marker} - {APP_TITLE}"),
            None if self.modified => format!("Untitled{marker} - {APP_TITLE}"),
            None => APP_TITLE.to_owned(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_clean_untitled() {
        assert_eq!(Document::new_untitled().window_title(), "Slate");
    }

    #[test]
    fn title_clean_with_path() {
        let mut doc = Document::new_untitled();
        doc.path = Some(PathBuf::from("notes").join("todo.txt"));
        assert_eq!(doc.window_title(), "todo.txt - Slate");
    }

    #[test]
    fn title_modified_with_path() {
        let mut doc = Document::new_untitled();
        doc.path = Some(PathBuf::from("todo.txt"));
        doc.modified = true;
        assert_eq!(doc.window_title(), "todo.txt* - Slate");
    }

    #[test]
    fn title_modified_untitled() {
        let mut doc = Document::new_untitled();
        doc.modified = true;
        assert_eq!(doc.window_title(), "Untitled* - Slate");
    }

    #[test]
    fn loaded_document_is_clean_and_remembers_eol() {
        let decoded = Decoded { text: "a\nb\n".into(), encoding: Encoding::Utf8Bom };
        let doc = Document::loaded(PathBuf::from("notes.txt"), &decoded);
        assert!(!doc.modified);
        assert_eq!(doc.eol, EolMode::Lf);
        assert_eq!(doc.encoding, Encoding::Utf8Bom);
        assert_eq!(doc.short_name().as_deref(), Some("notes.txt"));
    }

    #[test]
    fn saved_clears_modified_and_sets_path() {
        let mut doc = Document::new_untitled();
        doc.modified = true;
        doc.saved(Path::new("out.txt"), Encoding::Utf8, "x\r\n");
        assert!(!doc.modified);
        assert!(doc.breaks.is_empty());
        assert_eq!(doc.window_title(), "out.txt - Slate");
    }

    #[test]
    fn disk_text_keeps_mixed_breaks_until_lines_change() {
        let decoded = Decoded { text: "a\r\nb\nc".into(), encoding: Encoding::Utf8 };
        let doc = Document::loaded(PathBuf::from("mixed.txt"), &decoded);
        assert_eq!(doc.breaks, vec![EolMode::Crlf, EolMode::Lf]);

        assert_eq!(doc.disk_text("a\r\nB\r\nc"), "a\r\nB\nc");
        // A third line no longer matches the recorded breaks; the dominant
        // style (CRLF on a tie) is used throughout.
        assert_eq!(doc.disk_text("a\r\nb\r\nc\r\nd"), "a\r\nb\r\nc\r\nd");
    }
}
