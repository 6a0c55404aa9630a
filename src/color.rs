use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// 8-bit RGBA colour, written in config files as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scales the alpha channel by `opacity`, truncating toward zero the same
    /// way a canvas hex alpha suffix does (`floor(opacity * 255)` for opaque
    /// colours).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * opacity).floor() as u8,
            ..self
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl FromStr for Rgba {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| FieldError::Color(format!("`{s}` must start with '#'")))?;
        if !digits.is_ascii() || !matches!(digits.len(), 6 | 8) {
            return Err(FieldError::Color(format!(
                "`{s}` must be #rrggbb or #rrggbbaa"
            )));
        }

        let channel = |index: usize| {
            u8::from_str_radix(&digits[index * 2..index * 2 + 2], 16)
                .map_err(|err| FieldError::Color(format!("`{s}`: {err}")))
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(1)?,
            b: channel(2)?,
            a: if digits.len() == 8 { channel(3)? } else { 0xff },
        })
    }
}

impl TryFrom<String> for Rgba {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Rgba;

    #[test]
    fn parses_short_and_alpha_forms() {
        assert_eq!("#ff8000".parse::<Rgba>().unwrap(), Rgba::rgb(255, 128, 0));
        assert_eq!(
            "#ff800040".parse::<Rgba>().unwrap(),
            Rgba::rgba(255, 128, 0, 0x40)
        );
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!("ffffff".parse::<Rgba>().is_err());
        assert!("#fff".parse::<Rgba>().is_err());
        assert!("#gg0000".parse::<Rgba>().is_err());
    }

    #[test]
    fn opacity_truncates_like_canvas_alpha() {
        assert_eq!(Rgba::WHITE.with_opacity(1.0).a, 255);
        assert_eq!(Rgba::WHITE.with_opacity(0.5).a, 127);
        assert_eq!(Rgba::WHITE.with_opacity(0.0).a, 0);
    }

    #[test]
    fn display_omits_opaque_alpha() {
        assert_eq!(Rgba::rgb(1, 2, 3).to_string(), "#010203");
        assert_eq!(Rgba::rgba(1, 2, 3, 4).to_string(), "#01020304");
    }
}
