use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A theme color as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Ansi256(u8),
    Hex { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepth {
    #[default]
    TrueColor,
    Color256,
    Color16,
}

#[derive(Debug, Error)]
#[error("invalid color value for field \"{field}\": \"{value}\"")]
pub struct ColorParseError {
    pub field: String,
    pub value: String,
}

impl Color {
    /// Parse a color string, naming `field` in the error.
    ///
    /// Accepts `"0"`..`"255"` (ANSI-256 index) and `"#RRGGBB"` / `"#RGB"`.
    ///
    /// # Errors
    ///
    /// Returns `ColorParseError` if the string is not a valid color.
    pub fn parse(s: &str, field: &str) -> Result<Self, ColorParseError> {
        let make_err = || ColorParseError {
            field: field.to_owned(),
            value: s.to_owned(),
        };

        let Some(hex) = s.strip_prefix('#') else {
            let n: u16 = s.parse().map_err(|_| make_err())?;
            return u8::try_from(n).map(Color::Ansi256).map_err(|_| make_err());
        };

        if !hex.is_ascii() {
            return Err(make_err());
        }
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(make_err)
        };
        match hex.len() {
            6 => Ok(Color::Hex {
                r: channel(0..2)?,
                g: channel(2..4)?,
                b: channel(4..6)?,
            }),
            3 => Ok(Color::Hex {
                r: channel(0..1)? * 17,
                g: channel(1..2)? * 17,
                b: channel(2..3)? * 17,
            }),
            _ => Err(make_err()),
        }
    }

    /// Mix this color over `background`, keeping `opacity` (0.0..=1.0) of it.
    ///
    /// Terminals have no alpha channel, so faded matrix cells are drawn with
    /// the pre-blended color instead.
    pub fn blend(self, background: Color, opacity: f32) -> Color {
        let alpha = opacity.clamp(0.0, 1.0);
        if alpha >= 1.0 {
            return self;
        }
        let (fr, fg, fb) = self.to_rgb();
        let (br, bg, bb) = background.to_rgb();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mix = |front: u8, back: u8| -> u8 {
            (f32::from(back) + (f32::from(front) - f32::from(back)) * alpha)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Color::Hex {
            r: mix(fr, br),
            g: mix(fg, bg),
            b: mix(fb, bb),
        }
    }

    /// Convert to a `crossterm::style::Color` at the given terminal color depth.
    ///
    /// ANSI indices 0–15 map to crossterm's named variants so the terminal
    /// renders them through its configured 16-color palette.
    pub fn to_crossterm_color(self, depth: ColorDepth) -> crossterm::style::Color {
        match (depth, self) {
            (ColorDepth::TrueColor, Color::Hex { r, g, b }) => {
                crossterm::style::Color::Rgb { r, g, b }
            }
            (ColorDepth::TrueColor | ColorDepth::Color256, Color::Ansi256(n)) => {
                ansi_to_crossterm(n)
            }
            (ColorDepth::Color256, Color::Hex { r, g, b }) => {
                crossterm::style::Color::AnsiValue(approximate_ansi256(r, g, b))
            }
            (ColorDepth::Color16, color) => {
                let (r, g, b) = color.to_rgb();
                ansi_to_crossterm(approximate_ansi16(r, g, b))
            }
        }
    }

    /// Return the RGB representation of this color.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Hex { r, g, b } => (r, g, b),
            Color::Ansi256(n) => ansi256_to_rgb(n),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Ansi256(n) => write!(f, "{n}"),
            Color::Hex { r, g, b } => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s, "<unknown>")
    }
}

impl ColorDepth {
    /// Detect terminal color depth from `COLORTERM` / `TERM`.
    pub fn detect() -> Self {
        if let Ok(ct) = std::env::var("COLORTERM")
            && (ct == "truecolor" || ct == "24bit")
        {
            return ColorDepth::TrueColor;
        }
        if let Ok(term) = std::env::var("TERM")
            && term.contains("256color")
        {
            return ColorDepth::Color256;
        }
        ColorDepth::Color16
    }
}

fn ansi_to_crossterm(n: u8) -> crossterm::style::Color {
    use crossterm::style::Color;
    match n {
        0 => Color::Black,
        1 => Color::DarkRed,
        2 => Color::DarkGreen,
        3 => Color::DarkYellow,
        4 => Color::DarkBlue,
        5 => Color::DarkMagenta,
        6 => Color::DarkCyan,
        7 => Color::Grey,
        8 => Color::DarkGrey,
        9 => Color::Red,
        10 => Color::Green,
        11 => Color::Yellow,
        12 => Color::Blue,
        13 => Color::Magenta,
        14 => Color::Cyan,
        15 => Color::White,
        _ => Color::AnsiValue(n),
    }
}

const BASE16_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

fn ansi256_to_rgb(n: u8) -> (u8, u8, u8) {
    match n {
        0..=15 => BASE16_RGB[usize::from(n)],
        16..=231 => {
            let idx = n - 16;
            let level = |i: u8| if i == 0 { 0 } else { 55 + 40 * i };
            (level(idx / 36), level((idx / 6) % 6), level(idx % 6))
        }
        232..=255 => {
            let v = 8 + 10 * (n - 232);
            (v, v, v)
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn approximate_ansi256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        return match r {
            0..=7 => 16,
            249..=255 => 231,
            _ => 232 + ((u16::from(r) - 8) / 10).min(23) as u8,
        };
    }
    let level = |v: u8| -> u8 {
        match v {
            0..=47 => 0,
            48..=114 => 1,
            _ => ((u16::from(v) - 35) / 40).min(5) as u8,
        }
    };
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

fn approximate_ansi16(r: u8, g: u8, b: u8) -> u8 {
    let bright = (u16::from(r) + u16::from(g) + u16::from(b)) / 3 > 128;
    let base = u8::from(r > 128) | (u8::from(g > 128) << 1) | (u8::from(b > 128) << 2);
    if bright { base + 8 } else { base }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_full_opacity_is_identity() {
        let c = Color::Hex { r: 10, g: 200, b: 30 };
        assert_eq!(c.blend(Color::Ansi256(0), 1.0), c);
    }

    #[test]
    fn blend_zero_opacity_is_background() {
        let c = Color::Hex { r: 10, g: 200, b: 30 };
        let bg = Color::Hex { r: 0, g: 0, b: 0 };
        assert_eq!(c.blend(bg, 0.0), bg);
    }

    #[test]
    fn blend_halfway_between() {
        let c = Color::Hex { r: 200, g: 100, b: 0 };
        let bg = Color::Hex { r: 0, g: 0, b: 0 };
        assert_eq!(c.blend(bg, 0.5), Color::Hex { r: 100, g: 50, b: 0 });
    }

    #[test]
    fn ansi16_approximation_keeps_primaries() {
        assert_eq!(approximate_ansi16(255, 0, 0), 1);
        assert_eq!(approximate_ansi16(0, 0, 0), 0);
        assert_eq!(approximate_ansi16(255, 255, 255), 15);
    }
}
