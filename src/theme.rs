//! # Theme
//!
//! The colours cells are painted with. The host passes the active theme in;
//! light and dark presets are provided.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

/// An sRGB colour, serialized as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// An opaque colour from its `0xRRGGBB` value.
    pub const fn rgb(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
            a: 0xff,
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let Some(hex) = s.strip_prefix('#') else {
            bail!("colour must start with '#': {s}");
        };
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            bail!("colour must be #RRGGBB or #RRGGBBAA: {s}");
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| anyhow!("invalid colour {s}: {e}"))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 0xff },
        })
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

/// Colours used by timeline cells.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Theme {
    /// Accent colour.
    pub tint_color: Color,

    /// Background of headers and summary cards.
    pub header_background_color: Color,

    /// Primary text.
    pub text_primary_color: Color,

    /// De-emphasised text and icons.
    pub text_tertiary_color: Color,
}

impl Theme {
    /// Light preset.
    pub const fn light() -> Self {
        Self {
            tint_color: Color::rgb(0x0D_BD8B),
            header_background_color: Color::rgb(0xF3_F8FD),
            text_primary_color: Color::rgb(0x17_191C),
            text_tertiary_color: Color::rgb(0x8D_99A5),
        }
    }

    /// Dark preset.
    pub const fn dark() -> Self {
        Self {
            tint_color: Color::rgb(0x0D_BD8B),
            header_background_color: Color::rgb(0x21_262C),
            text_primary_color: Color::rgb(0xFF_FFFF),
            text_tertiary_color: Color::rgb(0x8E_99A4),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
