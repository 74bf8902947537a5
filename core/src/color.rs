use std::str::FromStr;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::vm::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub const DEFAULT_BACKGROUND_COLOR: Color = Color::new(0, 0, 0);
pub const DEFAULT_FOREGROUND_COLOR: Color = Color::new(255, 255, 255);

/// One RGBX8888 pixel, laid out for direct SDL texture upload.
///
/// This lives on the presentation side only: the machine's framebuffer is
/// strictly boolean and color is attached when a frame is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct Color {
    padding: u8,
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, padding: 0 }
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parse a `RRGGBB` hex triplet, with or without a `0x` prefix.
    fn from_str(mut s: &str) -> Result<Color, ParseColorError> {
        if let Some(stripped) = s.strip_prefix("0x") {
            s = stripped;
        }

        if s.len() != 6 || s.chars().any(|c| !c.is_ascii_hexdigit()) {
            return Err(ParseColorError);
        }

        let r = u8::from_str_radix(&s[0..2], 16).map_err(|_| ParseColorError)?;
        let g = u8::from_str_radix(&s[2..4], 16).map_err(|_| ParseColorError)?;
        let b = u8::from_str_radix(&s[4..6], 16).map_err(|_| ParseColorError)?;

        Ok(Color::new(r, g, b))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a hex color like 0xRRGGBB")]
pub struct ParseColorError;

/// Expands the boolean framebuffer into an RGBX pixel buffer a renderer can
/// upload as one 64x32 texture.
pub struct Surface {
    pixels: Vec<Color>,
    foreground: Color,
    background: Color,
}

impl Surface {
    pub fn new(foreground: Color, background: Color) -> Surface {
        Surface {
            pixels: vec![background; SCREEN_WIDTH * SCREEN_HEIGHT],
            foreground,
            background,
        }
    }

    /// Repaint from a 64x32 cell grid, on cells in the foreground color.
    pub fn update(&mut self, framebuffer: &[bool]) {
        for (pixel, &on) in self.pixels.iter_mut().zip(framebuffer) {
            *pixel = if on { self.foreground } else { self.background };
        }
    }

    /// The raw pixel bytes, `4 * 64 * 32` of them, row-major.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels[..])
    }

    /// Length in bytes of one pixel row.
    pub fn pitch(&self) -> usize {
        SCREEN_WIDTH * std::mem::size_of::<Color>()
    }
}
