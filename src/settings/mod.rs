// ── Settings store ────────────────────────────────────────────────────────────
//
// User preferences are flat named values under one fixed key
// (`HKCU\SOFTWARE\TextEditor\Settings` on Windows).  `SettingsStore` maps the
// typed preferences onto those values; the backend only knows strings and
// DWORDs.  Every load yields a usable value: absent entries and an unopenable
// store both fall back to the hardcoded defaults and are reported through
// `Loaded::complete`.

use crate::error::Result;

// ── Value names ───────────────────────────────────────────────────────────────

pub(crate) const FONT_NAME: &str = "FontName";
pub(crate) const FONT_SIZE: &str = "FontSize";
pub(crate) const FONT_STYLE: &str = "FontStyle";
pub(crate) const TEXT_COLOR: &str = "TextColor";
pub(crate) const BACKGROUND_COLOR: &str = "BackgroundColor";
pub(crate) const LAST_FILE: &str = "LastFile";
pub(crate) const LAST_FILE_STATE: &str = "LastFileState";

// FontStyle bitmask.
const STYLE_BOLD: u32 = 0x1;
const STYLE_ITALIC: u32 = 0x2;
const STYLE_UNDERLINE: u32 = 0x4;
const STYLE_STRIKEOUT: u32 = 0x8;

// ── Value types ───────────────────────────────────────────────────────────────

/// A packed `0x00BBGGRR` colour, bit-compatible with Win32 `COLORREF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rgb(pub(crate) u32);

impl Rgb {
    pub(crate) const BLACK: Self = Self::new(0, 0, 0);
    pub(crate) const WHITE: Self = Self::new(255, 255, 255);

    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r as u32 | (g as u32) << 8 | (b as u32) << 16)
    }
}

/// Text and background colours of the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColorPair {
    pub(crate) foreground: Rgb,
    pub(crate) background: Rgb,
}

impl Default for ColorPair {
    fn default() -> Self {
        Self { foreground: Rgb::BLACK, background: Rgb::WHITE }
    }
}

/// Font choice for the editing surface.
///
/// `height` is a logical height as used by `LOGFONTW::lfHeight`: positive for
/// cell height, negative for character height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FontDescriptor {
    pub(crate) face: String,
    pub(crate) height: i32,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) underline: bool,
    pub(crate) strikeout: bool,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            face: "Consolas".to_owned(),
            height: 16,
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
        }
    }
}

impl FontDescriptor {
    /// The persisted `FontStyle` bitmask.
    pub(crate) fn style_bits(&self) -> u32 {
        let mut bits = 0;
        if self.bold {
            bits |= STYLE_BOLD;
        }
        if self.italic {
            bits |= STYLE_ITALIC;
        }
        if self.underline {
            bits |= STYLE_UNDERLINE;
        }
        if self.strikeout {
            bits |= STYLE_STRIKEOUT;
        }
        bits
    }

    fn apply_style_bits(&mut self, bits: u32) {
        self.bold = bits & STYLE_BOLD != 0;
        self.italic = bits & STYLE_ITALIC != 0;
        self.underline = bits & STYLE_UNDERLINE != 0;
        self.strikeout = bits & STYLE_STRIKEOUT != 0;
    }
}

/// Everything round-tripped to the store in one go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) font: FontDescriptor,
    pub(crate) colors: ColorPair,
    pub(crate) last_file: String,
    pub(crate) last_file_open: bool,
}

/// A loaded value plus whether every underlying entry was present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Loaded<T> {
    pub(crate) value: T,
    pub(crate) complete: bool,
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// Raw named-value persistence.
///
/// `Ok(None)` means the value is absent; `Err` means the store itself could
/// not be opened (`EditorError::SettingsUnavailable`).
pub(crate) trait SettingsBackend {
    fn get_string(&self, name: &str) -> Result<Option<String>>;
    fn get_u32(&self, name: &str) -> Result<Option<u32>>;
    fn set_string(&mut self, name: &str, value: &str) -> Result<()>;
    fn set_u32(&mut self, name: &str, value: u32) -> Result<()>;
}

/// In-process backend used when no persistent store exists on the host, and
/// by tests.
#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    strings: std::collections::HashMap<String, String>,
    numbers: std::collections::HashMap<String, u32>,
}

impl SettingsBackend for MemoryBackend {
    fn get_string(&self, name: &str) -> Result<Option<String>> {
        Ok(self.strings.get(name).cloned())
    }

    fn get_u32(&self, name: &str) -> Result<Option<u32>> {
        Ok(self.numbers.get(name).copied())
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.strings.insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn set_u32(&mut self, name: &str, value: u32) -> Result<()> {
        self.numbers.insert(name.to_owned(), value);
        Ok(())
    }
}

/// The persistent backend for this host.
pub(crate) fn host_backend() -> Box<dyn SettingsBackend> {
    #[cfg(windows)]
    {
        Box::new(crate::platform::win32::registry::RegistryBackend::new())
    }
    #[cfg(not(windows))]
    {
        Box::new(MemoryBackend::default())
    }
}

// ── SettingsStore ─────────────────────────────────────────────────────────────

/// Typed `save_*` / `load_*` pairs over a `SettingsBackend`.
pub(crate) struct SettingsStore {
    backend: Box<dyn SettingsBackend>,
}

impl SettingsStore {
    pub(crate) fn new(backend: Box<dyn SettingsBackend>) -> Self {
        Self { backend }
    }

    // ── Font ──────────────────────────────────────────────────────────────────

    pub(crate) fn save_font(&mut self, font: &FontDescriptor) -> Result<()> {
        self.backend.set_string(FONT_NAME, &font.face)?;
        // Negative heights survive the DWORD round trip bit-for-bit.
        self.backend.set_u32(FONT_SIZE, font.height as u32)?;
        self.backend.set_u32(FONT_STYLE, font.style_bits())
    }

    /// Load the font; each missing entry keeps its default independently.
    pub(crate) fn load_font(&self) -> Loaded<FontDescriptor> {
        let mut font = FontDescriptor::default();
        let mut complete = true;

        match self.string(FONT_NAME) {
            Some(face) if !face.is_empty() => font.face = face,
            _ => complete = false,
        }
        match self.number(FONT_SIZE) {
            Some(height) if height != 0 => font.height = height as i32,
            _ => complete = false,
        }
        match self.number(FONT_STYLE) {
            Some(bits) => font.apply_style_bits(bits),
            None => complete = false,
        }

        Loaded { value: font, complete }
    }

    // ── Colours ───────────────────────────────────────────────────────────────

    pub(crate) fn save_text_color(&mut self, color: Rgb) -> Result<()> {
        self.backend.set_u32(TEXT_COLOR, color.0)
    }

    pub(crate) fn load_text_color(&self) -> Loaded<Rgb> {
        self.color(TEXT_COLOR, ColorPair::default().foreground)
    }

    pub(crate) fn save_background_color(&mut self, color: Rgb) -> Result<()> {
        self.backend.set_u32(BACKGROUND_COLOR, color.0)
    }

    pub(crate) fn load_background_color(&self) -> Loaded<Rgb> {
        self.color(BACKGROUND_COLOR, ColorPair::default().background)
    }

    // ── Last file ─────────────────────────────────────────────────────────────

    pub(crate) fn save_last_file(&mut self, path: &str) -> Result<()> {
        self.backend.set_string(LAST_FILE, path)
    }

    pub(crate) fn load_last_file(&self) -> Loaded<String> {
        match self.string(LAST_FILE) {
            Some(path) => Loaded { value: path, complete: true },
            None => Loaded { value: String::new(), complete: false },
        }
    }

    pub(crate) fn save_last_file_state(&mut self, open: bool) -> Result<()> {
        self.backend.set_u32(LAST_FILE_STATE, u32::from(open))
    }

    pub(crate) fn load_last_file_state(&self) -> Loaded<bool> {
        match self.number(LAST_FILE_STATE) {
            Some(state) => Loaded { value: state != 0, complete: true },
            None => Loaded { value: false, complete: false },
        }
    }

    // ── Snapshot ──────────────────────────────────────────────────────────────

    /// Load every preference, logging which ones fell back to defaults.
    pub(crate) fn load(&self) -> Settings {
        let font = self.load_font();
        let text = self.load_text_color();
        let background = self.load_background_color();
        let last_file = self.load_last_file();
        let last_file_open = self.load_last_file_state();

        for (name, complete) in [
            ("font", font.complete),
            ("text colour", text.complete),
            ("background colour", background.complete),
            ("last file", last_file.complete),
            ("last file state", last_file_open.complete),
        ] {
            if !complete {
                log::warn!("{name} not found in settings store; using default");
            }
        }

        Settings {
            font: font.value,
            colors: ColorPair { foreground: text.value, background: background.value },
            last_file: last_file.value,
            last_file_open: last_file_open.value,
        }
    }

    /// Write every preference.  Stops at the first failure.
    pub(crate) fn save(&mut self, settings: &Settings) -> Result<()> {
        self.save_font(&settings.font)?;
        self.save_text_color(settings.colors.foreground)?;
        self.save_background_color(settings.colors.background)?;
        self.save_last_file(&settings.last_file)?;
        self.save_last_file_state(settings.last_file_open)
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn color(&self, name: &str, default: Rgb) -> Loaded<Rgb> {
        match self.number(name) {
            Some(raw) => Loaded { value: Rgb(raw & 0x00FF_FFFF), complete: true },
            None => Loaded { value: default, complete: false },
        }
    }

    fn string(&self, name: &str) -> Option<String> {
        self.backend.get_string(name).unwrap_or_else(|e| {
            log::debug!("reading {name}: {e}");
            None
        })
    }

    fn number(&self, name: &str) -> Option<u32> {
        self.backend.get_u32(name).unwrap_or_else(|e| {
            log::debug!("reading {name}: {e}");
            None
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;

    /// A backend whose key can never be opened.
    struct Unavailable;

    impl SettingsBackend for Unavailable {
        fn get_string(&self, _: &str) -> Result<Option<String>> {
            Err(EditorError::SettingsUnavailable("no key".into()))
        }
        fn get_u32(&self, _: &str) -> Result<Option<u32>> {
            Err(EditorError::SettingsUnavailable("no key".into()))
        }
        fn set_string(&mut self, _: &str, _: &str) -> Result<()> {
            Err(EditorError::SettingsUnavailable("no key".into()))
        }
        fn set_u32(&mut self, _: &str, _: u32) -> Result<()> {
            Err(EditorError::SettingsUnavailable("no key".into()))
        }
    }

    fn memory_store() -> SettingsStore {
        SettingsStore::new(Box::new(MemoryBackend::default()))
    }

    #[test]
    fn rgb_packs_like_colorref() {
        assert_eq!(Rgb::new(0x12, 0x34, 0x56).0, 0x0056_3412);
        assert_eq!(Rgb::WHITE.0, 0x00FF_FFFF);
    }

    #[test]
    fn style_bits_match_persisted_layout() {
        let font = FontDescriptor { bold: true, strikeout: true, ..FontDescriptor::default() };
        assert_eq!(font.style_bits(), 0x9);

        let mut decoded = FontDescriptor::default();
        decoded.apply_style_bits(0x6);
        assert!(!decoded.bold && decoded.italic && decoded.underline && !decoded.strikeout);
    }

    #[test]
    fn empty_store_yields_defaults_and_reports_it() {
        let store = memory_store();
        let font = store.load_font();
        assert!(!font.complete);
        assert_eq!(font.value, FontDescriptor::default());
        assert_eq!(store.load_text_color(), Loaded { value: Rgb::BLACK, complete: false });
        assert_eq!(store.load_background_color(), Loaded { value: Rgb::WHITE, complete: false });
        assert!(!store.load_last_file_state().value);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn snapshot_round_trips() {
        let mut store = memory_store();
        let settings = Settings {
            font: FontDescriptor {
                face: "Cascadia Mono".into(),
                height: -19,
                bold: false,
                italic: true,
                underline: false,
                strikeout: false,
            },
            colors: ColorPair { foreground: Rgb::new(200, 200, 200), background: Rgb::new(30, 30, 30) },
            last_file: r"C:\notes\todo.txt".into(),
            last_file_open: true,
        };
        store.save(&settings).expect("save");
        assert_eq!(store.load(), settings);
        assert!(store.load_font().complete);
    }

    #[test]
    fn partial_font_keeps_other_defaults() {
        let mut backend = MemoryBackend::default();
        backend.set_u32(FONT_SIZE, 24).expect("seed");
        let store = SettingsStore::new(Box::new(backend));
        let font = store.load_font();
        assert!(!font.complete);
        assert_eq!(font.value.height, 24);
        assert_eq!(font.value.face, "Consolas");
    }

    #[test]
    fn unavailable_store_is_never_fatal() {
        let mut store = SettingsStore::new(Box::new(Unavailable));
        assert_eq!(store.load(), Settings::default());
        assert!(matches!(
            store.save_text_color(Rgb::BLACK),
            Err(EditorError::SettingsUnavailable(_))
        ));
    }
}
