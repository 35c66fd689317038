//! Output font configuration.
//!
//! The restyler only ever receives a [`FontSpec`], and a `FontSpec` can only
//! be built from one of the six supported fonts and a size in `8..=72`. Bad
//! input is rejected here, before any document is touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One of the fonts the converter offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontChoice {
    #[default]
    #[serde(rename = "Twinkl Cursive Looped")]
    TwinklCursiveLooped,
    #[serde(rename = "Twinkl Cursive Unlooped")]
    TwinklCursiveUnlooped,
    #[serde(rename = "Arial")]
    Arial,
    #[serde(rename = "Calibri")]
    Calibri,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    #[serde(rename = "Comic Sans MS")]
    ComicSansMs,
}

impl FontChoice {
    /// All choices, in the order they are offered. The first is the default.
    pub const ALL: [FontChoice; 6] = [
        FontChoice::TwinklCursiveLooped,
        FontChoice::TwinklCursiveUnlooped,
        FontChoice::Arial,
        FontChoice::Calibri,
        FontChoice::TimesNewRoman,
        FontChoice::ComicSansMs,
    ];

    /// The font family name written into the document.
    pub fn name(&self) -> &'static str {
        match self {
            FontChoice::TwinklCursiveLooped => "Twinkl Cursive Looped",
            FontChoice::TwinklCursiveUnlooped => "Twinkl Cursive Unlooped",
            FontChoice::Arial => "Arial",
            FontChoice::Calibri => "Calibri",
            FontChoice::TimesNewRoman => "Times New Roman",
            FontChoice::ComicSansMs => "Comic Sans MS",
        }
    }

    /// Kebab-case identifier, handy on the command line.
    pub fn slug(&self) -> String {
        self.name().to_ascii_lowercase().replace(' ', "-")
    }
}

impl fmt::Display for FontChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FontChoice {
    type Err = Error;

    /// Accepts the display name or the slug, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        FontChoice::ALL
            .into_iter()
            .find(|choice| {
                choice.name().eq_ignore_ascii_case(wanted) || choice.slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| Error::UnsupportedFont(wanted.to_string()))
    }
}

/// Font size in whole points, always within `8..=72`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct FontSize(u8);

impl FontSize {
    /// Smallest accepted size.
    pub const MIN: u8 = 8;
    /// Largest accepted size.
    pub const MAX: u8 = 72;
    /// Size used when none is given.
    pub const DEFAULT: FontSize = FontSize(12);

    /// Validate a size in points.
    pub fn new(points: i64) -> Result<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&points) {
            Ok(Self(points as u8))
        } else {
            Err(Error::FontSizeOutOfRange(points))
        }
    }

    /// Size in points.
    pub fn points(&self) -> u8 {
        self.0
    }

    /// Size in half-points, the unit of `w:sz`.
    pub fn half_points(&self) -> u32 {
        u32::from(self.0) * 2
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for FontSize {
    type Error = Error;

    fn try_from(points: i64) -> Result<Self> {
        Self::new(points)
    }
}

impl From<FontSize> for u8 {
    fn from(size: FontSize) -> Self {
        size.0
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FontSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let points: i64 = s
            .parse()
            .map_err(|_| Error::Other(format!("Invalid font size: {}", s)))?;
        Self::new(points)
    }
}

/// The font applied to a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontSpec {
    /// Font family
    pub font: FontChoice,
    /// Font size
    pub size: FontSize,
}

impl FontSpec {
    /// Create a font specification.
    pub fn new(font: FontChoice, size: FontSize) -> Self {
        Self { font, size }
    }

    /// Parse a font name and a size, rejecting anything unsupported.
    pub fn parse(font: &str, size: &str) -> Result<Self> {
        Ok(Self {
            font: font.parse()?,
            size: size.parse()?,
        })
    }

    /// Font family name.
    pub fn name(&self) -> &'static str {
        self.font.name()
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}pt", self.font, self.size)
    }
}
