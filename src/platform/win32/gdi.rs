// ── GDI resources ─────────────────────────────────────────────────────────────
//
// RAII owners for the two GDI objects the editor creates (the text font and
// the background brush) plus `LOGFONTW` conversions shared with the font
// dialog.

#![allow(unsafe_code)]

use windows::Win32::{
    Foundation::COLORREF,
    Graphics::Gdi::{
        CreateFontIndirectW, CreateSolidBrush, DeleteObject, DEFAULT_CHARSET, HBRUSH, HFONT,
        HGDIOBJ, LOGFONTW,
    },
};

use crate::{
    error::{EditorError, Result},
    settings::{FontDescriptor, Rgb},
};

const FW_NORMAL: i32 = 400;
const FW_BOLD: i32 = 700;
/// Weights at or above this count as bold when read back from a dialog.
const FW_SEMIBOLD: i32 = 600;

pub(crate) fn colorref(rgb: Rgb) -> COLORREF {
    COLORREF(rgb.0)
}

// ── Font ──────────────────────────────────────────────────────────────────────

/// An owned `HFONT`, deleted on drop.
pub(crate) struct Font(HFONT);

impl Font {
    pub(crate) fn create(desc: &FontDescriptor) -> Result<Self> {
        let lf = log_font(desc);
        // SAFETY: lf is a fully initialised LOGFONTW on the stack.
        let font = unsafe { CreateFontIndirectW(&lf) };
        if font.is_invalid() {
            return Err(EditorError::Win32 { function: "CreateFontIndirectW", code: 0 });
        }
        Ok(Self(font))
    }

    pub(crate) fn handle(&self) -> HFONT {
        self.0
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        // SAFETY: self.0 came from CreateFontIndirectW and is deleted once.
        // Callers deselect it from the control before dropping.
        unsafe {
            let _ = DeleteObject(HGDIOBJ(self.0 .0));
        }
    }
}

// ── Brush ─────────────────────────────────────────────────────────────────────

/// An owned solid `HBRUSH`, deleted on drop.
pub(crate) struct Brush(HBRUSH);

impl Brush {
    pub(crate) fn solid(color: Rgb) -> Result<Self> {
        // SAFETY: CreateSolidBrush has no pointer arguments.
        let brush = unsafe { CreateSolidBrush(colorref(color)) };
        if brush.is_invalid() {
            return Err(EditorError::Win32 { function: "CreateSolidBrush", code: 0 });
        }
        Ok(Self(brush))
    }

    pub(crate) fn handle(&self) -> HBRUSH {
        self.0
    }
}

impl Drop for Brush {
    fn drop(&mut self) {
        // SAFETY: self.0 came from CreateSolidBrush and is deleted once.
        unsafe {
            let _ = DeleteObject(HGDIOBJ(self.0 .0));
        }
    }
}

// ── LOGFONTW conversions ──────────────────────────────────────────────────────

pub(crate) fn log_font(desc: &FontDescriptor) -> LOGFONTW {
    let mut lf = LOGFONTW {
        lfHeight: desc.height,
        lfWeight: if desc.bold { FW_BOLD } else { FW_NORMAL },
        lfItalic: u8::from(desc.italic),
        lfUnderline: u8::from(desc.underline),
        lfStrikeOut: u8::from(desc.strikeout),
        lfCharSet: DEFAULT_CHARSET,
        ..Default::default()
    };
    // Leave room for the terminating null.
    let max = lf.lfFaceName.len() - 1;
    for (dst, src) in lf.lfFaceName.iter_mut().zip(desc.face.encode_utf16().take(max)) {
        *dst = src;
    }
    lf
}

pub(crate) fn font_descriptor(lf: &LOGFONTW) -> FontDescriptor {
    let len = lf.lfFaceName.iter().position(|&c| c == 0).unwrap_or(lf.lfFaceName.len());
    FontDescriptor {
        face: String::from_utf16_lossy(&lf.lfFaceName[..len]),
        height: lf.lfHeight,
        bold: lf.lfWeight >= FW_SEMIBOLD,
        italic: lf.lfItalic != 0,
        underline: lf.lfUnderline != 0,
        strikeout: lf.lfStrikeOut != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logfont_round_trips_descriptor() {
        let desc = FontDescriptor {
            face: "Lucida Console".into(),
            height: -13,
            bold: true,
            italic: false,
            underline: true,
            strikeout: true,
        };
        assert_eq!(font_descriptor(&log_font(&desc)), desc);
    }

    #[test]
    fn overlong_face_is_truncated_and_terminated() {
        let desc = FontDescriptor { face: "X".repeat(64), ..FontDescriptor::default() };
        let lf = log_font(&desc);
        assert_eq!(lf.lfFaceName[31], 0);
        assert_eq!(font_descriptor(&lf).face.len(), 31);
    }
}
