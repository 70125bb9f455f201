use phf::phf_map;
use std::fmt;

/// Output for empty, `auto` and unrecognized colors.
pub const DEFAULT_COLOR: &str = "#000000";

/// Named colors accepted by `w:highlight` and similar attributes.
static NAMED_COLORS: phf::Map<&'static str, RGBColor> = phf_map! {
    "black" => RGBColor::new(0x00, 0x00, 0x00),
    "blue" => RGBColor::new(0x00, 0x00, 0xFF),
    "cyan" => RGBColor::new(0x00, 0xFF, 0xFF),
    "green" => RGBColor::new(0x00, 0xFF, 0x00),
    "magenta" => RGBColor::new(0xFF, 0x00, 0xFF),
    "red" => RGBColor::new(0xFF, 0x00, 0x00),
    "yellow" => RGBColor::new(0xFF, 0xFF, 0x00),
    "white" => RGBColor::new(0xFF, 0xFF, 0xFF),
    "darkBlue" => RGBColor::new(0x00, 0x00, 0x80),
    "darkCyan" => RGBColor::new(0x00, 0x80, 0x80),
    "darkGreen" => RGBColor::new(0x00, 0x80, 0x00),
    "darkMagenta" => RGBColor::new(0x80, 0x00, 0x80),
    "darkRed" => RGBColor::new(0x80, 0x00, 0x00),
    "darkYellow" => RGBColor::new(0x80, 0x80, 0x00),
    "darkGray" => RGBColor::new(0x80, 0x80, 0x80),
    "lightGray" => RGBColor::new(0xC0, 0xC0, 0xC0),
};

/// RGB color representation.
///
/// Represents a color using red, green, and blue components, each in the range 0-255.
///
/// # Examples
///
/// ```rust
/// use litchi_layout::common::RGBColor;
///
/// let blue = RGBColor::from_hex("0000FF").unwrap();
/// assert_eq!(blue.to_string(), "#0000FF");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RGBColor {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
}

impl RGBColor {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create an RGB color from a hex string.
    ///
    /// Accepts six digits with or without a leading `#` (`FF0000`, `#FF0000`)
    /// and the `#F00` shorthand.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let (hex, prefixed) = match hex.strip_prefix('#') {
            Some(rest) => (rest, true),
            None => (hex, false),
        };
        if !hex.is_ascii() {
            return None;
        }

        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            },
            3 if prefixed => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
                Some(Self::new(digit(0)?, digit(1)?, digit(2)?))
            },
            _ => None,
        }
    }

    /// Look up a named highlight color such as `yellow` or `darkBlue`.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_COLORS.get(name).copied()
    }

    /// Convert to hex string (without # prefix).
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Apply a DrawingML-style color transform.
    ///
    /// Order: tint, luminance modulation, luminance offset, shade.
    pub fn transform(&self, transform: &ColorTransform) -> Self {
        let mut channels = [self.r as f64, self.g as f64, self.b as f64];

        if let Some(tint) = transform.tint {
            for c in &mut channels {
                *c += (255.0 - *c) * (1.0 - tint);
            }
        }

        if transform.lum_mod.is_some() || transform.lum_off.is_some() {
            let (h, s, mut l) = rgb_to_hsl(channels);
            if let Some(lum_mod) = transform.lum_mod {
                l *= lum_mod;
            }
            if let Some(lum_off) = transform.lum_off {
                l += lum_off;
            }
            channels = hsl_to_rgb(h, s, l.clamp(0.0, 1.0));
        }

        if let Some(shade) = transform.shade {
            for c in &mut channels {
                *c *= shade;
            }
        }

        let [r, g, b] = channels.map(|c| c.round().clamp(0.0, 255.0) as u8);
        Self::new(r, g, b)
    }
}

impl fmt::Display for RGBColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// Color modifiers as fractions (e.g. `lum_mod: Some(0.75)` for `lumMod val="75000"`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorTransform {
    /// Lighten toward white; 1.0 leaves the color unchanged
    pub tint: Option<f64>,
    /// Scale HSL luminance
    pub lum_mod: Option<f64>,
    /// Offset HSL luminance
    pub lum_off: Option<f64>,
    /// Scale every channel toward black
    pub shade: Option<f64>,
}

impl ColorTransform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Resolve a color attribute value to `#RRGGBB`.
///
/// Empty input and `auto` give [`DEFAULT_COLOR`]. Only the first whitespace
/// separated token is considered; it may be a hex triple or a highlight name.
/// Anything else also gives [`DEFAULT_COLOR`].
///
/// # Examples
///
/// ```
/// use litchi_layout::common::style::color::resolve_color;
///
/// assert_eq!(resolve_color("", None), "#000000");
/// assert_eq!(resolve_color("auto", None), "#000000");
/// assert_eq!(resolve_color("ff0000", None), "#FF0000");
/// ```
pub fn resolve_color(input: &str, transform: Option<&ColorTransform>) -> String {
    let token = match input.split_whitespace().next() {
        Some(token) if !token.eq_ignore_ascii_case("auto") => token,
        _ => return DEFAULT_COLOR.to_string(),
    };

    let color = match RGBColor::from_hex(token).or_else(|| RGBColor::from_name(token)) {
        Some(color) => color,
        None => return DEFAULT_COLOR.to_string(),
    };

    match transform {
        Some(t) if !t.is_identity() => color.transform(t).to_string(),
        _ => color.to_string(),
    }
}

fn rgb_to_hsl([r, g, b]: [f64; 3]) -> (f64, f64, f64) {
    let (r, g, b) = (r / 255.0, g / 255.0, b / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [f64; 3] {
    if s == 0.0 {
        return [l * 255.0; 3];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = |mut t: f64| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    [hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0)].map(|c| c * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(resolve_color("", None), "#000000");
        assert_eq!(resolve_color("auto", None), "#000000");
        assert_eq!(resolve_color("   ", None), "#000000");
        assert_eq!(resolve_color("not-a-color", None), "#000000");
    }

    #[test]
    fn test_hex_forms() {
        assert_eq!(resolve_color("FF0000", None), "#FF0000");
        assert_eq!(resolve_color("#00ff7f", None), "#00FF7F");
        assert_eq!(resolve_color("#f80", None), "#FF8800");
        assert_eq!(resolve_color("bad", None), "#000000");
        assert_eq!(resolve_color("4472C4 extra tokens", None), "#4472C4");
    }

    #[test]
    fn test_named() {
        assert_eq!(resolve_color("yellow", None), "#FFFF00");
        assert_eq!(resolve_color("darkBlue", None), "#000080");
    }

    #[test]
    fn test_tint_and_shade() {
        let half_tint = ColorTransform {
            tint: Some(0.5),
            ..Default::default()
        };
        assert_eq!(resolve_color("000000", Some(&half_tint)), "#808080");

        let half_shade = ColorTransform {
            shade: Some(0.5),
            ..Default::default()
        };
        assert_eq!(resolve_color("FFFFFF", Some(&half_shade)), "#808080");
    }

    #[test]
    fn test_luminance() {
        // Luminance 1.0 halved, then raised by a quarter.
        let transform = ColorTransform {
            lum_mod: Some(0.5),
            lum_off: Some(0.25),
            ..Default::default()
        };
        assert_eq!(resolve_color("FFFFFF", Some(&transform)), "#BFBFBF");

        let identity = ColorTransform::default();
        assert_eq!(resolve_color("4472C4", Some(&identity)), "#4472C4");
    }

    #[test]
    fn test_combined_transform_order() {
        // 0x80 tinted to 191.5, luminance 0.751 * 0.5 + 0.2, then halved.
        let transform = ColorTransform {
            tint: Some(0.5),
            lum_mod: Some(0.5),
            lum_off: Some(0.2),
            shade: Some(0.5),
        };
        assert_eq!(resolve_color("808080", Some(&transform)), "#494949");
    }

    #[test]
    fn test_hsl_round_trip() {
        let color = RGBColor::new(0x44, 0x72, 0xC4);
        let (h, s, l) = rgb_to_hsl([color.r as f64, color.g as f64, color.b as f64]);
        let [r, g, b] = hsl_to_rgb(h, s, l).map(|c| c.round() as u8);
        assert_eq!(RGBColor::new(r, g, b), color);
    }
}
