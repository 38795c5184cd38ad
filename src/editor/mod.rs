// ── Text surface ──────────────────────────────────────────────────────────────
//
// The controller talks to the editing area only through `TextSurface`.  On
// Windows the implementation is the native multi-line EDIT control in
// `edit_control`; tests substitute an in-memory buffer.
//
// Text crossing this boundary uses CRLF line endings, which is what the
// native control stores.

#[cfg(windows)]
pub(crate) mod edit_control;

use crate::{
    error::Result,
    overlay::KeyStroke,
    settings::{ColorPair, FontDescriptor},
};

/// Operations the controller needs from the editing area.
pub(crate) trait TextSurface {
    /// Replace the whole buffer.  Clears the surface's modify flag.
    fn set_text(&mut self, text: &str);

    /// Return the whole buffer.
    fn text(&self) -> String;

    fn cut(&mut self);
    fn copy(&mut self);
    fn paste(&mut self);

    /// Install a new font.  Any previously created font resource is released
    /// before the new one is created.
    fn set_font(&mut self, font: &FontDescriptor) -> Result<()>;

    /// Change the text and background colours.
    fn set_colors(&mut self, colors: ColorPair);

    /// Fill a parent client area of `width` x `height` pixels.
    fn resize(&mut self, width: i32, height: i32);

    /// `true` when the user has edited the buffer since the last
    /// `set_text` / `set_unmodified`.
    fn is_modified(&self) -> bool;

    /// Mark the current content as matching disk.
    fn set_unmodified(&mut self);

    /// Give keyboard focus to the surface.
    fn focus(&mut self);

    /// Deliver `key` to the surface as if it had been typed there.
    fn replay_key(&mut self, key: KeyStroke);
}
