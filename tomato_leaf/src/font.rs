use ab_glyph::{FontRef, FontVec, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;

static EMBEDDED_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// Font used to draw detection labels.
///
/// `TrueType` holds a font read from disk. `Embedded` is DejaVu Sans,
/// compiled into the binary, so label drawing never depends on the host.
pub enum LabelFont {
    TrueType(FontVec),
    Embedded(FontRef<'static>),
}

impl LabelFont {
    pub fn embedded() -> Result<Self, InvalidFont> {
        FontRef::try_from_slice(EMBEDDED_FONT).map(Self::Embedded)
    }

    /// Loads the preferred font when it is available, otherwise the embedded one.
    pub fn load(preferred: Option<&Path>) -> Result<Self, InvalidFont> {
        let Some(path) = preferred else {
            tracing::info!("No label font configured, using embedded font");
            return Self::embedded();
        };

        match std::fs::read(path) {
            Ok(bytes) => match Self::from_bytes(bytes) {
                Some(font) => {
                    tracing::info!("Loaded label font from {}", path.display());
                    Ok(font)
                }
                None => {
                    tracing::warn!(
                        "{} is not a usable font, using embedded font",
                        path.display()
                    );
                    Self::embedded()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Label font {} unavailable ({}), using embedded font",
                    path.display(),
                    e
                );
                Self::embedded()
            }
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        FontVec::try_from_vec(bytes).ok().map(Self::TrueType)
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    /// Rendered `(width, height)` of `text` at a pixel height of `px`.
    pub fn text_size(&self, px: f32, text: &str) -> (u32, u32) {
        let scale = PxScale::from(px);
        match self {
            Self::TrueType(font) => text_size(scale, font, text),
            Self::Embedded(font) => text_size(scale, font, text),
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`. Pixels outside the
    /// canvas are clipped.
    pub fn draw_text(
        &self,
        canvas: &mut RgbImage,
        color: Rgb<u8>,
        x: i32,
        y: i32,
        px: f32,
        text: &str,
    ) {
        let scale = PxScale::from(px);
        match self {
            Self::TrueType(font) => draw_text_mut(canvas, color, x, y, scale, font, text),
            Self::Embedded(font) => draw_text_mut(canvas, color, x, y, scale, font, text),
        }
    }
}
