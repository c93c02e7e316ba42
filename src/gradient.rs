use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;

use crate::data::semantic::PriorityTier;
use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0x00, g: 0x00, b: 0x00 };
    pub const WHITE: Rgb = Rgb { r: 0xff, g: 0xff, b: 0xff };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub const fn gray(value: u8) -> Self {
        Rgb { r: value, g: value, b: value }
    }
}

fn color_token() -> &'static Regex {
    static COLOR_TOKEN: OnceLock<Regex> = OnceLock::new();
    COLOR_TOKEN.get_or_init(|| {
        Regex::new(r"^#?(?<hex>[0-9a-fA-F]{1,3}|[0-9a-fA-F]{6})$").expect("color token pattern is valid")
    })
}

/// Accepts `#rrggbb`, `rrggbb`, `#rgb`, `rgb` and one or two digit grayscale (`7b` is `#7b7b7b`).
impl FromStr for Rgb {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let captures = color_token()
            .captures(token.trim())
            .ok_or_else(|| Error::color_format(token))?;
        let hex = &captures["hex"];
        let byte = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| Error::color_format(token));

        match hex.len() {
            6 => Ok(Rgb::new(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
            3 => {
                let doubled = |i: usize| byte(hex[i..i + 1].repeat(2).as_str());
                Ok(Rgb::new(doubled(0)?, doubled(1)?, doubled(2)?))
            },
            _ => Ok(Rgb::gray(byte(hex)?)),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub color: Rgb,
    /// Normalized position in `[0, 1]`.
    pub position: f64,
}

/// Linear two-stop gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub from: ColorStop,
    pub to: ColorStop,
}

impl Gradient {
    pub fn new(from: Rgb, to: Rgb) -> Self {
        Gradient {
            from: ColorStop { color: from, position: 0.0 },
            to: ColorStop { color: to, position: 1.0 },
        }
    }

    /// Color at `position`, each channel interpolated on its own and rounded to the nearest
    /// integer. Positions outside the stops are pinned to the nearest stop.
    pub fn color_at(&self, position: f64) -> Rgb {
        let span = self.to.position - self.from.position;
        let t = if span == 0.0 { 0.0 } else { ((position - self.from.position) / span).clamp(0.0, 1.0) };
        let (from, to) = (self.from.color, self.to.color);
        Rgb::new(
            lerp_channel(from.r, to.r, t),
            lerp_channel(from.g, to.g, t),
            lerp_channel(from.b, to.b, t),
        )
    }
}

fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    let value = from as f64 + (to as f64 - from as f64) * t;
    value.round().clamp(0.0, 255.0) as u8
}

/// Stroke width as a linear function of tier rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeScale {
    pub min_width: f64,
    pub max_width: f64,
}

impl StrokeScale {
    pub fn width_at(&self, rank: f64) -> f64 {
        self.min_width + (self.max_width - self.min_width) * rank.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadStyle {
    pub color: Rgb,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientResolver {
    gradient: Gradient,
    stroke: StrokeScale,
    reversed: bool,
}

impl GradientResolver {
    /// `from` colors the least important roads and `to` the most important, unless
    /// `reversed` swaps the direction. Stroke width always grows with importance.
    pub fn new(gradient: Gradient, stroke: StrokeScale, reversed: bool) -> Self {
        GradientResolver { gradient, stroke, reversed }
    }

    pub fn resolve(&self, tier: PriorityTier) -> RoadStyle {
        let rank = tier.rank();
        let position = if self.reversed { 1.0 - rank } else { rank };
        RoadStyle {
            color: self.gradient.color_at(position),
            stroke_width: self.stroke.width_at(rank),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn resolver(from: Rgb, to: Rgb, reversed: bool) -> GradientResolver {
        GradientResolver::new(
            Gradient::new(from, to),
            StrokeScale { min_width: 0.5, max_width: 4.0 },
            reversed,
        )
    }

    #[test]
    fn equivalent_tokens_parse_alike() {
        for token in ["#ffffff", "ffffff", "#fff", "fff", "FFF", "ff", "#ff"] {
            assert_eq!(token.parse::<Rgb>().unwrap(), Rgb::WHITE, "{}", token);
        }
        assert_eq!("#1a2b3c".parse::<Rgb>().unwrap(), Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!("abc".parse::<Rgb>().unwrap(), Rgb::new(0xaa, 0xbb, 0xcc));
        assert_eq!("7b".parse::<Rgb>().unwrap(), Rgb::gray(0x7b));
        assert_eq!("#7".parse::<Rgb>().unwrap(), Rgb::gray(0x07));
    }

    #[test]
    fn malformed_tokens_name_the_token() {
        for token in ["", "#", "#12345", "ggg", "#1234567", "red", "##fff"] {
            let err = token.parse::<Rgb>().unwrap_err();
            assert_eq!(err.kind, ErrorKind::ColorFormat);
            assert!(err.message.contains(&format!("'{}'", token)), "{}", err.message);
        }
    }

    #[test]
    fn displays_as_lowercase_hex() {
        assert_eq!(Rgb::new(0x0a, 0xb0, 0xff).to_string(), "#0ab0ff");
        assert_eq!("#ABC".parse::<Rgb>().unwrap().to_string(), "#aabbcc");
    }

    #[test]
    fn endpoints_are_exact() {
        let gradient = Gradient::new(Rgb::new(16, 200, 3), Rgb::new(123, 7, 255));
        assert_eq!(gradient.color_at(0.0), Rgb::new(16, 200, 3));
        assert_eq!(gradient.color_at(1.0), Rgb::new(123, 7, 255));
        assert_eq!(gradient.color_at(-1.0), Rgb::new(16, 200, 3));
        assert_eq!(gradient.color_at(2.0), Rgb::new(123, 7, 255));
    }

    #[test]
    fn interpolation_rounds_to_nearest() {
        let gradient = Gradient::new(Rgb::BLACK, Rgb::WHITE);
        assert_eq!(gradient.color_at(0.5), Rgb::gray(128));
        assert_eq!(gradient.color_at(0.25), Rgb::gray(64));
    }

    #[test]
    fn tiers_move_monotonically_between_endpoints() {
        let resolver = resolver(Rgb::new(200, 10, 90), Rgb::new(20, 250, 90), false);
        let styles: Vec<_> = PriorityTier::ALL.iter().map(|&tier| resolver.resolve(tier)).collect();
        assert_eq!(styles[0].color, Rgb::new(200, 10, 90));
        assert_eq!(styles[4].color, Rgb::new(20, 250, 90));
        for pair in styles.windows(2) {
            assert!(pair[0].color.r >= pair[1].color.r);
            assert!(pair[0].color.g <= pair[1].color.g);
            assert_eq!(pair[1].color.b, 90);
            assert!(pair[0].stroke_width <= pair[1].stroke_width);
        }
        assert_eq!(styles[0].stroke_width, 0.5);
        assert_eq!(styles[4].stroke_width, 4.0);
    }

    #[test]
    fn reversed_gradient_swaps_colors_not_widths() {
        let resolver = resolver(Rgb::BLACK, Rgb::WHITE, true);
        let highest = resolver.resolve(PriorityTier::Highest);
        assert_eq!(highest.color, Rgb::BLACK);
        assert_eq!(highest.stroke_width, 4.0);
        assert_eq!(resolver.resolve(PriorityTier::Lowest).color, Rgb::WHITE);
    }
}
