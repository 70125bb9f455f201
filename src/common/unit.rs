//! Unit conversion utilities.
//!
//! This module converts the length units found in WordprocessingML packages
//! (points, twentieths of a point, EMUs and the metric/imperial units used in
//! style strings) to screen pixels.
//!
//! All conversions go through points: a pixel is `dpi / 72` points, so at the
//! default 96 DPI `72pt == 96px`.

use crate::common::error::{Error, Result};
use fast_float2::parse_partial;
use std::fmt;
use std::str::FromStr;

pub const EMUS_PER_PT: f64 = 12_700.0;
pub const DXA_PER_PT: f64 = 20.0;
pub const PT_PER_INCH: f64 = 72.0;
pub const PT_PER_PICA: f64 = 12.0;
pub const CM_PER_INCH: f64 = 2.54;
pub const DEFAULT_DPI: f64 = 96.0;

/// Supported length units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    /// Point (1/72 inch)
    Point,
    /// Pixel
    Pixel,
    /// English Metric Unit (914400 per inch)
    Emu,
    /// Twentieth of a point (also called twip)
    Dxa,
    /// Centimeter
    Centimeter,
    /// Millimeter
    Millimeter,
    /// Inch
    Inch,
    /// Foot
    Foot,
    /// Pica (12 points)
    Pica,
}

impl LengthUnit {
    /// Get the unit abbreviation
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "pt",
            Self::Pixel => "px",
            Self::Emu => "emu",
            Self::Dxa => "dxa",
            Self::Centimeter => "cm",
            Self::Millimeter => "mm",
            Self::Inch => "in",
            Self::Foot => "ft",
            Self::Pica => "pc",
        }
    }

    /// Parse unit from its suffix
    fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "pt" => Some(Self::Point),
            "px" => Some(Self::Pixel),
            "emu" => Some(Self::Emu),
            "dxa" | "twip" => Some(Self::Dxa),
            "cm" => Some(Self::Centimeter),
            "mm" => Some(Self::Millimeter),
            "in" => Some(Self::Inch),
            "ft" => Some(Self::Foot),
            "pc" => Some(Self::Pica),
            _ => None,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Length value with an optional unit
///
/// A length without a recognized unit suffix keeps only its numeric value and
/// converts to pixels unchanged.
///
/// # Examples
///
/// ```
/// use litchi_layout::common::unit::{Length, LengthUnit, Units};
///
/// let length = "2.54cm".parse::<Length>().unwrap();
/// assert_eq!(length.unit(), Some(LengthUnit::Centimeter));
/// assert!((length.to_pixels(&Units::default()) - 96.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    value: f64,
    unit: Option<LengthUnit>,
}

impl Length {
    /// Create a new length measurement
    #[inline]
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self {
            value,
            unit: Some(unit),
        }
    }

    /// Get the numeric value
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Get the unit, if one was recognized
    #[inline]
    pub fn unit(&self) -> Option<LengthUnit> {
        self.unit
    }

    /// Convert to pixels with the given unit helper
    pub fn to_pixels(&self, units: &Units) -> f64 {
        match self.unit {
            None | Some(LengthUnit::Pixel) => self.value,
            Some(LengthUnit::Point) => units.pt_to_px(self.value),
            Some(LengthUnit::Emu) => units.emu_to_px(self.value),
            Some(LengthUnit::Dxa) => units.dxa_to_px(self.value),
            Some(LengthUnit::Centimeter) => units.cm_to_px(self.value),
            Some(LengthUnit::Millimeter) => units.mm_to_px(self.value),
            Some(LengthUnit::Inch) => units.in_to_px(self.value),
            Some(LengthUnit::Foot) => units.ft_to_px(self.value),
            Some(LengthUnit::Pica) => units.pt_to_px(self.value * PT_PER_PICA),
        }
    }
}

impl FromStr for Length {
    type Err = Error;

    /// Parse a length from its leading number and trailing unit suffix
    /// (e.g., "2.5cm", "10pt", "12700emu", "42").
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (value, consumed) = parse_partial::<f64, _>(s)
            .map_err(|_| Error::InvalidLength(format!("No numeric value found in '{}'", s)))?;
        let suffix = s[consumed..].trim().to_ascii_lowercase();

        Ok(Self {
            value,
            unit: LengthUnit::from_suffix(&suffix),
        })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{}{}", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Length conversions for a fixed output resolution.
///
/// Registered by the base stage as the `units` capability so later stages
/// convert with the DPI configured for the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    /// Output resolution in pixels per inch
    pub dpi: f64,
}

impl Default for Units {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl Units {
    pub fn new(dpi: f64) -> Self {
        Self { dpi }
    }

    #[inline]
    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi / PT_PER_INCH
    }

    #[inline]
    pub fn emu_to_px(&self, emu: f64) -> f64 {
        self.pt_to_px(emu / EMUS_PER_PT)
    }

    #[inline]
    pub fn dxa_to_px(&self, dxa: f64) -> f64 {
        self.pt_to_px(dxa / DXA_PER_PT)
    }

    #[inline]
    pub fn in_to_px(&self, inches: f64) -> f64 {
        self.pt_to_px(inches * PT_PER_INCH)
    }

    #[inline]
    pub fn cm_to_px(&self, cm: f64) -> f64 {
        self.in_to_px(cm / CM_PER_INCH)
    }

    #[inline]
    pub fn mm_to_px(&self, mm: f64) -> f64 {
        self.cm_to_px(mm / 10.0)
    }

    #[inline]
    pub fn ft_to_px(&self, ft: f64) -> f64 {
        self.in_to_px(ft * 12.0)
    }

    /// Convert a length string to pixels.
    pub fn length_to_px(&self, value: &str) -> Result<f64> {
        Ok(value.parse::<Length>()?.to_pixels(self))
    }
}

/// Points to pixels at 96 DPI.
#[inline]
pub fn pt_to_px(pt: f64) -> f64 {
    Units::default().pt_to_px(pt)
}

/// EMUs to pixels at 96 DPI.
#[inline]
pub fn emu_to_px(emu: f64) -> f64 {
    Units::default().emu_to_px(emu)
}

/// Twentieths of a point to pixels at 96 DPI.
#[inline]
pub fn dxa_to_px(dxa: f64) -> f64 {
    Units::default().dxa_to_px(dxa)
}

#[inline]
pub fn cm_to_px(cm: f64) -> f64 {
    Units::default().cm_to_px(cm)
}

#[inline]
pub fn mm_to_px(mm: f64) -> f64 {
    Units::default().mm_to_px(mm)
}

#[inline]
pub fn in_to_px(inches: f64) -> f64 {
    Units::default().in_to_px(inches)
}

#[inline]
pub fn ft_to_px(ft: f64) -> f64 {
    Units::default().ft_to_px(ft)
}

/// Convert a length string to pixels at 96 DPI, dispatching on its suffix.
pub fn length_to_px(value: &str) -> Result<f64> {
    Units::default().length_to_px(value)
}

/// Parse a whole attribute value as a number.
///
/// Fails with [`Error::InvalidLength`] on anything but a complete number.
pub fn parse_measure(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    match parse_partial::<f64, _>(trimmed) {
        Ok((number, consumed)) if consumed == trimmed.len() => Ok(number),
        _ => Err(Error::InvalidLength(format!("'{}' is not a number", value))),
    }
}
