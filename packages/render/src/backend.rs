//! Drawing backend guard.
//!
//! The bitmap backend renders text through fonts registered at runtime;
//! on hosts with no usable font every text call errors and would abort
//! the whole render. [`GuardedBackend`] wraps any [`DrawingBackend`] so
//! font failures degrade to skipped text layers while geometry still
//! draws, and text measurement falls back to a rough estimate so chart
//! layout keeps working.

use std::panic;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use plotters::style::FontStyle;
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};

/// Environment variable naming a `.ttf` file to use for map text.
pub const FONT_ENV: &str = "QUAKE_MAP_FONT";

/// Well-known font locations tried after [`FONT_ENV`].
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
];

/// Registers a `sans-serif` font for map text, once per process.
///
/// Tries [`FONT_ENV`] first, then the well-known locations. When nothing
/// usable is found the renderer still works; text layers are skipped by
/// [`GuardedBackend`].
pub fn ensure_fonts() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        let configured = std::env::var(FONT_ENV).ok();
        let candidates = configured
            .iter()
            .map(String::as_str)
            .chain(FONT_CANDIDATES.iter().copied());

        for path in candidates {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            // The font registry wants 'static bytes; one leak per process.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if plotters::style::register_font("sans-serif", FontStyle::Normal, bytes).is_ok() {
                log::info!("Registered map font from {path}");
                return;
            }
            log::warn!("Font file {path} was not usable");
        }

        log::warn!("No map font found; set {FONT_ENV} to a .ttf path to enable text layers");
    });
}

fn warn_text_skipped(reason: &str) {
    static WARNED: AtomicBool = AtomicBool::new(false);
    if !WARNED.swap(true, Ordering::Relaxed) {
        log::warn!("Text rendering unavailable, drawing geometry only: {reason}");
    }
}

/// Delegating [`DrawingBackend`] that turns font failures into skipped
/// text instead of render errors.
pub struct GuardedBackend<DB> {
    inner: DB,
}

impl<DB> GuardedBackend<DB> {
    /// Wraps a backend.
    pub const fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for GuardedBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let attempt = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.draw_text(text, style, pos)
        }));
        match attempt {
            Ok(Ok(())) => Ok(()),
            Ok(Err(DrawingErrorKind::FontError(error))) => {
                warn_text_skipped(&error.to_string());
                Ok(())
            }
            Ok(Err(other)) => Err(other),
            Err(_) => {
                warn_text_skipped("text backend panicked");
                Ok(())
            }
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )] // layout estimate only
    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match self.inner.estimate_text_size(text, style) {
            Ok(size) => Ok(size),
            Err(DrawingErrorKind::FontError(_)) => {
                // Rough fixed-pitch estimate so label areas still reserve
                // sensible space without a font.
                let glyph_width = (style.size() * 0.6).max(1.0);
                let width = (glyph_width * text.chars().count() as f64).ceil() as u32;
                let height = style.size().ceil().max(1.0) as u32;
                Ok((width.max(1), height))
            }
            Err(other) => Err(other),
        }
    }
}
