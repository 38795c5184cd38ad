// ── Main window controller ────────────────────────────────────────────────────
//
// Owns every piece of application state and is the single dispatch interface
// the window procedure calls into.  The controller never touches Win32
// directly: the editing area is reached through `TextSurface` and everything
// else the window provides (title, timers, overlay window, dialogs) through
// `Shell`.  Both are fakes in the tests at the bottom of this file.
//
// Idle-screen invariant: while the overlay is active the animation timer runs
// and the idle timer does not; while it is inactive the idle timer runs.

use std::path::{Path, PathBuf};

use crate::{
    app::Document,
    config::Config,
    editor::TextSurface,
    error::EditorError,
    fileio::{self, EolMode, FileService},
    overlay::{IdleOverlay, Input, KeyStroke, OverlayProfile, Reaction, Size},
    settings::{FontDescriptor, Rgb, Settings, SettingsStore},
};

// ── Ports ─────────────────────────────────────────────────────────────────────

/// The two logical timers.  Values are the Win32 timer ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TimerId {
    Idle = 1,
    Animation = 2,
}

impl TimerId {
    pub(crate) fn from_raw(id: usize) -> Option<Self> {
        match id {
            1 => Some(Self::Idle),
            2 => Some(Self::Animation),
            _ => None,
        }
    }
}

/// Answer to "save changes?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveChoice {
    Yes,
    No,
    Cancel,
}

/// Outcome of the unsaved-changes gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    /// Nothing to save, or the save succeeded.
    Continue,
    /// The user chose to throw the changes away.
    Discard,
    /// Cancelled, or the save failed.  The pending operation must not run.
    Abort,
}

impl Gate {
    pub(crate) fn proceeds(self) -> bool {
        self != Self::Abort
    }
}

/// Everything the controller needs from the hosting window.
pub(crate) trait Shell {
    fn set_title(&mut self, title: &str);

    /// Start `id`, or restart it if already running.
    fn start_timer(&mut self, id: TimerId, interval_ms: u32);
    fn stop_timer(&mut self, id: TimerId);

    /// Cover the main window with the overlay, hide the cursor and capture
    /// input.  Returns the overlay's client size, or `None` if it could not
    /// be shown.
    fn show_overlay(&mut self) -> Option<Size>;
    /// Remove the overlay and restore the cursor.
    fn hide_overlay(&mut self);
    fn redraw_overlay(&mut self);

    /// Ask whether to save changes to the document named `name`.
    fn confirm_save(&mut self, name: &str) -> SaveChoice;
    fn choose_open_path(&mut self) -> Option<PathBuf>;
    fn choose_save_path(&mut self, suggested: &str) -> Option<PathBuf>;
    fn choose_font(&mut self, current: &FontDescriptor) -> Option<FontDescriptor>;
    fn choose_color(&mut self, current: Rgb) -> Option<Rgb>;

    fn show_error(&mut self, message: &str);
    fn show_about(&mut self);

    /// Ask the window to close.  The request comes back as
    /// `Controller::on_close_requested`.
    fn close_window(&mut self);

    /// Reflect the selected idle-screen profile in the menu.
    fn check_overlay_profile(&mut self, profile: OverlayProfile);
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Menu commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    New,
    Open,
    Save,
    SaveAs,
    Exit,
    Cut,
    Copy,
    Paste,
    Font,
    TextColor,
    BackgroundColor,
    OverlayProfile(OverlayProfile),
    About,
}

// ── Controller ────────────────────────────────────────────────────────────────

pub(crate) struct Controller {
    doc: Document,
    settings: Settings,
    config: Config,
    /// Where `config` is written back; `None` keeps it in memory only.
    config_file: Option<PathBuf>,
    overlay: IdleOverlay,
    files: FileService,
    store: SettingsStore,
    surface: Box<dyn TextSurface>,
    shell: Box<dyn Shell>,
}

impl Controller {
    pub(crate) fn new(
        surface: Box<dyn TextSurface>,
        shell: Box<dyn Shell>,
        files: FileService,
        store: SettingsStore,
        config: Config,
    ) -> Self {
        Self {
            doc: Document::new_untitled(),
            settings: Settings::default(),
            overlay: IdleOverlay::new(config.overlay_profile),
            config,
            config_file: None,
            files,
            store,
            surface,
            shell,
        }
    }

    /// Persist config changes to `path`.
    pub(crate) fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Apply stored preferences, reopen the last file if it was open at exit,
    /// and arm the idle timer.
    pub(crate) fn start(&mut self) {
        self.settings = self.store.load();

        if let Err(e) = self.surface.set_font(&self.settings.font) {
            log::warn!("stored font not applied: {e}");
        }
        self.surface.set_colors(self.settings.colors);
        self.shell.check_overlay_profile(self.overlay.profile());

        if self.settings.last_file_open && !self.settings.last_file.is_empty() {
            let last = PathBuf::from(&self.settings.last_file);
            if last.is_file() {
                if let Err(e) = self.load(&last) {
                    log::warn!("last file not restored: {e}");
                }
            } else {
                log::info!("last file {} no longer exists", last.display());
            }
        }

        self.refresh_title();
        self.arm_idle_timer();
        self.surface.focus();
    }

    /// Gate for closing the main window.  `true` means the window may be
    /// destroyed; preferences have then been written.
    pub(crate) fn on_close_requested(&mut self) -> bool {
        if !self.prompt_save_if_modified().proceeds() {
            return false;
        }
        self.persist();
        true
    }

    /// Gate for the user logging off or the system shutting down.
    pub(crate) fn on_session_end(&mut self) -> bool {
        self.on_close_requested()
    }

    /// Write preferences and the last-file record.
    fn persist(&mut self) {
        self.settings.last_file = self
            .doc
            .path
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.settings.last_file_open = self.doc.path.is_some();

        match self.store.save(&self.settings) {
            Ok(()) => log::info!("settings saved"),
            Err(e) => log::warn!("settings not saved: {e}"),
        }
        self.save_config();
    }

    fn save_config(&self) {
        if let Some(path) = &self.config_file {
            if let Err(e) = self.config.save_to(path) {
                log::warn!("config not saved to {}: {e}", path.display());
            }
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub(crate) fn overlay(&self) -> &IdleOverlay {
        &self.overlay
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    pub(crate) fn on_command(&mut self, cmd: Command) {
        log::debug!("command {cmd:?}");
        match cmd {
            Command::New => self.new_document(),
            Command::Open => self.open(),
            Command::Save => {
                self.save();
            }
            Command::SaveAs => {
                self.save_as();
            }
            Command::Exit => self.shell.close_window(),
            Command::Cut => self.surface.cut(),
            Command::Copy => self.surface.copy(),
            Command::Paste => self.surface.paste(),
            Command::Font => self.choose_font(),
            Command::TextColor => self.choose_text_color(),
            Command::BackgroundColor => self.choose_background_color(),
            Command::OverlayProfile(profile) => self.select_overlay_profile(profile),
            Command::About => self.shell.show_about(),
        }
        // A modal dialog swallows input without it counting as activity.
        self.arm_idle_timer();
    }

    fn new_document(&mut self) {
        if !self.prompt_save_if_modified().proceeds() {
            return;
        }
        self.surface.set_text("");
        self.doc = Document::new_untitled();
        self.refresh_title();
    }

    fn open(&mut self) {
        if !self.prompt_save_if_modified().proceeds() {
            return;
        }
        let Some(path) = self.shell.choose_open_path() else {
            return;
        };
        if let Err(e) = self.load(&path) {
            self.shell.show_error(&e.to_string());
        }
        self.refresh_title();
    }

    /// Read `path` into the surface.  On failure nothing changes.
    fn load(&mut self, path: &Path) -> crate::error::Result<()> {
        let decoded = self.files.read(path)?;
        self.surface.set_text(&fileio::convert_eols(&decoded.text, EolMode::Crlf));
        self.doc = Document::loaded(path.to_path_buf(), &decoded);
        Ok(())
    }

    /// Save to the current path, or ask for one.  Returns `true` on success.
    pub(crate) fn save(&mut self) -> bool {
        match self.doc.path.clone() {
            Some(path) => self.write_to(&path),
            None => self.save_as(),
        }
    }

    /// Ask for a path and save there.  Returns `true` on success.
    pub(crate) fn save_as(&mut self) -> bool {
        let suggested = self.doc.short_name().unwrap_or_default();
        match self.shell.choose_save_path(&suggested) {
            Some(path) => self.write_to(&path),
            None => false,
        }
    }

    fn write_to(&mut self, path: &Path) -> bool {
        let text = self.doc.disk_text(&self.surface.text());
        match self.files.write(path, &text) {
            Ok(encoding) => {
                self.doc.saved(path, encoding, &text);
                self.surface.set_unmodified();
                self.refresh_title();
                true
            }
            Err(e) => {
                self.shell.show_error(&e.to_string());
                false
            }
        }
    }

    /// Run the unsaved-changes gate.  Shows nothing when the document is
    /// clean.
    pub(crate) fn prompt_save_if_modified(&mut self) -> Gate {
        self.sync_modified();
        if !self.doc.modified {
            return Gate::Continue;
        }
        let name = self.doc.short_name().unwrap_or_else(|| "Untitled".to_owned());
        match self.shell.confirm_save(&name) {
            SaveChoice::Yes if self.save() => Gate::Continue,
            SaveChoice::Yes | SaveChoice::Cancel => Gate::Abort,
            SaveChoice::No => Gate::Discard,
        }
    }

    fn choose_font(&mut self) {
        let Some(font) = self.shell.choose_font(&self.settings.font) else {
            return;
        };
        if let Err(e) = self.surface.set_font(&font) {
            self.shell.show_error(&e.to_string());
            // The surface released its previous font; put it back.
            if let Err(e) = self.surface.set_font(&self.settings.font) {
                log::warn!("previous font not restored: {e}");
            }
            return;
        }
        if let Err(e) = self.store.save_font(&font) {
            self.report_unsaved("font", &e);
        }
        self.settings.font = font;
    }

    fn choose_text_color(&mut self) {
        let Some(color) = self.shell.choose_color(self.settings.colors.foreground) else {
            return;
        };
        self.settings.colors.foreground = color;
        self.surface.set_colors(self.settings.colors);
        if let Err(e) = self.store.save_text_color(color) {
            self.report_unsaved("text colour", &e);
        }
    }

    fn choose_background_color(&mut self) {
        let Some(color) = self.shell.choose_color(self.settings.colors.background) else {
            return;
        };
        self.settings.colors.background = color;
        self.surface.set_colors(self.settings.colors);
        if let Err(e) = self.store.save_background_color(color) {
            self.report_unsaved("background colour", &e);
        }
    }

    /// A preference chosen from a dialog could not be stored.  It stays in
    /// effect for this session.
    fn report_unsaved(&mut self, what: &str, e: &EditorError) {
        log::warn!("{what} not saved: {e}");
        self.shell.show_error(&format!("The {what} setting could not be saved.\n\n{e}"));
    }

    fn select_overlay_profile(&mut self, profile: OverlayProfile) {
        self.overlay.set_profile(profile);
        self.config.overlay_profile = profile;
        self.shell.check_overlay_profile(profile);
        self.save_config();
    }

    // ── Notifications ─────────────────────────────────────────────────────────

    /// The surface reported a content change.
    pub(crate) fn on_text_changed(&mut self) {
        self.sync_modified();
    }

    pub(crate) fn on_resize(&mut self, width: i32, height: i32) {
        self.surface.resize(width, height);
    }

    /// The main window gained focus.
    pub(crate) fn on_focus(&mut self) {
        if !self.overlay.is_active() {
            self.surface.focus();
        }
    }

    /// Keyboard or pointer input reached the main window.
    pub(crate) fn on_activity(&mut self) {
        self.arm_idle_timer();
    }

    pub(crate) fn on_timer(&mut self, id: TimerId) {
        match id {
            TimerId::Idle => self.enter_overlay(),
            TimerId::Animation => {
                if self.overlay.is_active() {
                    self.overlay.tick();
                    self.shell.redraw_overlay();
                }
            }
        }
    }

    /// Input delivered to the overlay window.
    pub(crate) fn on_overlay_input(&mut self, input: Input) {
        if let Reaction::Dismissed { forward } = self.overlay.handle_input(input) {
            self.leave_overlay(forward);
        }
    }

    // ── Idle screen ───────────────────────────────────────────────────────────

    fn enter_overlay(&mut self) {
        if self.overlay.is_active() {
            return;
        }
        self.shell.stop_timer(TimerId::Idle);
        let Some(bounds) = self.shell.show_overlay() else {
            log::warn!("idle overlay could not be shown");
            self.arm_idle_timer();
            return;
        };
        self.overlay.activate(bounds);
        self.shell.start_timer(TimerId::Animation, self.config.animation_interval_ms);
    }

    fn leave_overlay(&mut self, forward: Option<KeyStroke>) {
        self.shell.stop_timer(TimerId::Animation);
        self.shell.hide_overlay();
        self.surface.focus();
        if let Some(key) = forward {
            self.surface.replay_key(key);
        }
        self.arm_idle_timer();
    }

    fn arm_idle_timer(&mut self) {
        if !self.overlay.is_active() {
            self.shell.start_timer(TimerId::Idle, self.config.idle_timeout_ms);
        }
    }

    // ── Title ─────────────────────────────────────────────────────────────────

    /// Pull the surface's modify flag into the document; retitle on change.
    fn sync_modified(&mut self) {
        let modified = self.surface.is_modified();
        if modified != self.doc.modified {
            self.doc.modified = modified;
            self.refresh_title();
        }
    }

    fn refresh_title(&mut self) {
        let title = self.doc.window_title();
        self.shell.set_title(&title);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
