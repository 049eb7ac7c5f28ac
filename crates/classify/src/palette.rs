use std::fmt;
use std::str::FromStr;

use rgb::RGB8;
use serde::{Deserialize, Serialize};

/// Number of classes every palette provides.
pub const PALETTE_LEN: usize = 5;

/// Named sequential color schemes by Cynthia Brewer (5 classes).
///
/// Light colors are used for low data values, dark colors for high ones.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Palette {
    #[default]
    Blues,
    Greens,
    Oranges,
    Purples,
    Reds,
    YlGnBu,
    YlOrRd,
    RdPu,
}

const fn c(r: u8, g: u8, b: u8) -> RGB8 {
    RGB8 { r, g, b }
}

const BLUES: [RGB8; PALETTE_LEN] = [
    c(0xef, 0xf3, 0xff),
    c(0xbd, 0xd7, 0xe7),
    c(0x6b, 0xae, 0xd6),
    c(0x31, 0x82, 0xbd),
    c(0x08, 0x51, 0x9c),
];
const GREENS: [RGB8; PALETTE_LEN] = [
    c(0xed, 0xf8, 0xe9),
    c(0xba, 0xe4, 0xb3),
    c(0x74, 0xc4, 0x76),
    c(0x31, 0xa3, 0x54),
    c(0x00, 0x6d, 0x2c),
];
const ORANGES: [RGB8; PALETTE_LEN] = [
    c(0xfe, 0xed, 0xde),
    c(0xfd, 0xbe, 0x85),
    c(0xfd, 0x8d, 0x3c),
    c(0xe6, 0x55, 0x0d),
    c(0xa6, 0x36, 0x03),
];
const PURPLES: [RGB8; PALETTE_LEN] = [
    c(0xf2, 0xf0, 0xf7),
    c(0xcb, 0xc9, 0xe2),
    c(0x9e, 0x9a, 0xc8),
    c(0x75, 0x6b, 0xb1),
    c(0x54, 0x27, 0x8f),
];
const REDS: [RGB8; PALETTE_LEN] = [
    c(0xfe, 0xe5, 0xd9),
    c(0xfc, 0xae, 0x91),
    c(0xfb, 0x6a, 0x4a),
    c(0xde, 0x2d, 0x26),
    c(0xa5, 0x0f, 0x15),
];
const YLGNBU: [RGB8; PALETTE_LEN] = [
    c(0xff, 0xff, 0xcc),
    c(0xa1, 0xda, 0xb4),
    c(0x41, 0xb6, 0xc4),
    c(0x2c, 0x7f, 0xb8),
    c(0x25, 0x34, 0x94),
];
const YLORRD: [RGB8; PALETTE_LEN] = [
    c(0xff, 0xff, 0xb2),
    c(0xfe, 0xcc, 0x5c),
    c(0xfd, 0x8d, 0x3c),
    c(0xf0, 0x3b, 0x20),
    c(0xbd, 0x00, 0x26),
];
const RDPU: [RGB8; PALETTE_LEN] = [
    c(0xfe, 0xeb, 0xe2),
    c(0xfb, 0xb4, 0xb9),
    c(0xf7, 0x68, 0xa1),
    c(0xc5, 0x1b, 0x8a),
    c(0x7a, 0x01, 0x77),
];

impl Palette {
    pub const ALL: [Palette; 8] = [
        Palette::Blues,
        Palette::Greens,
        Palette::Oranges,
        Palette::Purples,
        Palette::Reds,
        Palette::YlGnBu,
        Palette::YlOrRd,
        Palette::RdPu,
    ];

    /// Colors ordered from the lowest to the highest class.
    pub fn colors(self) -> &'static [RGB8; PALETTE_LEN] {
        match self {
            Palette::Blues => &BLUES,
            Palette::Greens => &GREENS,
            Palette::Oranges => &ORANGES,
            Palette::Purples => &PURPLES,
            Palette::Reds => &REDS,
            Palette::YlGnBu => &YLGNBU,
            Palette::YlOrRd => &YLORRD,
            Palette::RdPu => &RDPU,
        }
    }

    pub fn first(self) -> RGB8 {
        self.colors()[0]
    }

    pub fn name(self) -> &'static str {
        match self {
            Palette::Blues => "Blues",
            Palette::Greens => "Greens",
            Palette::Oranges => "Oranges",
            Palette::Purples => "Purples",
            Palette::Reds => "Reds",
            Palette::YlGnBu => "YlGnBu",
            Palette::YlOrRd => "YlOrRd",
            Palette::RdPu => "RdPu",
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPalette(pub String);

impl fmt::Display for UnknownPalette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown palette: {:?}", self.0)
    }
}

impl std::error::Error for UnknownPalette {}

impl FromStr for Palette {
    type Err = UnknownPalette;

    /// Case-insensitive lookup by scheme name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Palette::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPalette(s.to_string()))
    }
}

/// Formats a color as `#rrggbb`.
pub fn hex(color: RGB8) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::{PALETTE_LEN, Palette, hex};

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("ylgnbu".parse::<Palette>().unwrap(), Palette::YlGnBu);
        assert_eq!("Reds".parse::<Palette>().unwrap(), Palette::Reds);
        assert!("viridis".parse::<Palette>().is_err());
    }

    #[test]
    fn palettes_darken_towards_the_top_class() {
        for p in Palette::ALL {
            let colors = p.colors();
            assert_eq!(colors.len(), PALETTE_LEN);
            let lum = |c: &rgb::RGB8| c.r as u32 * 299 + c.g as u32 * 587 + c.b as u32 * 114;
            assert!(lum(&colors[0]) > lum(&colors[PALETTE_LEN - 1]), "{p}");
        }
    }

    #[test]
    fn formats_hex() {
        assert_eq!(hex(Palette::Blues.first()), "#eff3ff");
    }
}
