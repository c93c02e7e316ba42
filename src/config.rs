use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::gradient::{Gradient, GradientResolver, Rgb, StrokeScale};

pub const DEFAULT_WIDTH: u32 = 2000;
/// Percentile trimmed from each edge when outlier clipping is asked for without a value.
pub const DEFAULT_CLIP_PERCENTILE: f64 = 2.0;
pub const DEFAULT_FROM_COLOR: Rgb = Rgb::gray(0xaa);
pub const DEFAULT_TO_COLOR: Rgb = Rgb::gray(0x1a);
pub const DEFAULT_PADDING: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientPreset {
    /// White minor roads fading to black major roads.
    BlackToWhite,
    /// Black minor roads fading to white major roads.
    WhiteToBlack,
}

impl GradientPreset {
    pub fn colors(self) -> (Rgb, Rgb) {
        match self {
            GradientPreset::BlackToWhite => (Rgb::WHITE, Rgb::BLACK),
            GradientPreset::WhiteToBlack => (Rgb::BLACK, Rgb::WHITE),
        }
    }
}

/// Everything the pipeline needs to know about one conversion. Built once at the process
/// boundary and handed down by reference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: u32,
    /// `None` derives the height from the map's aspect ratio.
    pub height: Option<u32>,
    #[serde(deserialize_with = "serialize_color::deserialize_option")]
    pub background: Option<Rgb>,
    /// Percent of coordinates ignored at each edge when fitting the canvas. 0 disables clipping.
    pub clip_percentile: f64,
    #[serde(deserialize_with = "serialize_color::deserialize")]
    pub from_color: Rgb,
    #[serde(deserialize_with = "serialize_color::deserialize")]
    pub to_color: Rgb,
    pub preset: Option<GradientPreset>,
    pub reverse_gradient: bool,
    pub min_stroke_width: f64,
    pub max_stroke_width: f64,
    pub padding: f64,
    pub max_nodes: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: DEFAULT_WIDTH,
            height: None,
            background: None,
            clip_percentile: 0.0,
            from_color: DEFAULT_FROM_COLOR,
            to_color: DEFAULT_TO_COLOR,
            preset: None,
            reverse_gradient: false,
            min_stroke_width: 0.5,
            max_stroke_width: 4.0,
            padding: DEFAULT_PADDING,
            max_nodes: None,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(Error::config("Width must be positive"));
        }
        if self.height == Some(0) {
            return Err(Error::config("Height must be positive"));
        }
        if !(0.0..50.0).contains(&self.clip_percentile) {
            return Err(Error::config(format!(
                "Clip percentile must be in [0, 50), got {}",
                self.clip_percentile
            )));
        }
        if !(self.min_stroke_width >= 0.0 && self.min_stroke_width <= self.max_stroke_width) {
            return Err(Error::config(format!(
                "Stroke widths must satisfy 0 <= min <= max, got {} and {}",
                self.min_stroke_width, self.max_stroke_width
            )));
        }
        if !(self.padding >= 0.0) {
            return Err(Error::config("Padding must not be negative"));
        }
        let shortest_side = self.height.map_or(self.width, |height| height.min(self.width));
        if 2.0 * self.padding >= shortest_side as f64 {
            return Err(Error::config(format!(
                "Padding {} leaves no room to draw on a {}px canvas side",
                self.padding, shortest_side
            )));
        }
        Ok(())
    }

    /// Colors for the least and most important roads, preset taking precedence.
    pub fn gradient_endpoints(&self) -> (Rgb, Rgb) {
        self.preset
            .map(GradientPreset::colors)
            .unwrap_or((self.from_color, self.to_color))
    }

    pub fn resolver(&self) -> GradientResolver {
        let (from, to) = self.gradient_endpoints();
        GradientResolver::new(
            Gradient::new(from, to),
            StrokeScale {
                min_width: self.min_stroke_width,
                max_width: self.max_stroke_width,
            },
            self.reverse_gradient,
        )
    }
}

/// A whole conversion job as read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub render: RenderConfig,
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path).map_err(|err| {
        Error::config(format!("Could not open config file {}: {}", path.display(), err))
    })?;
    let config: UserConfig = serde_json::from_reader(BufReader::new(file))?;
    config.render.validate()?;
    Ok(config)
}

/// Finds the export on disk, trying the `.xml` and `.osm` extensions when the path as
/// given does not exist.
pub fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    let mut candidates = vec![path.to_path_buf()];
    for ext in ["xml", "osm"] {
        let mut with_ext = path.as_os_str().to_owned();
        with_ext.push(".");
        with_ext.push(ext);
        candidates.push(PathBuf::from(with_ext));
    }
    candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Error::config(format!("Map file '{}' not found", path.display())))
}

/// `road_map_<stem>.svg` in the working directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_else(|| "map".into());
    // `foo.osm.xz` should give `road_map_foo.svg`
    let stem = stem.strip_suffix(".osm").or_else(|| stem.strip_suffix(".xml")).unwrap_or(&*stem);
    PathBuf::from(format!("road_map_{}.svg", stem))
}

mod serialize_color {
    use serde::{de, Deserializer};
    use serde::de::Visitor;

    use crate::gradient::Rgb;

    struct ColorVisitor;

    impl<'de> Visitor<'de> for ColorVisitor {
        type Value = Rgb;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(formatter, "a color such as \"#101010\", \"abc\" or \"7b\"")
        }

        fn visit_str<E>(self, string: &str) -> Result<Self::Value, E> where E: de::Error {
            string.parse().map_err(|err: crate::errors::Error| de::Error::custom(err.message))
        }
    }

    struct OptionalColorVisitor;

    impl<'de> Visitor<'de> for OptionalColorVisitor {
        type Value = Option<Rgb>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(formatter, "a color or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> where E: de::Error {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> where E: de::Error {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where D: Deserializer<'de> {
            Ok(Some(deserializer.deserialize_str(ColorVisitor)?))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Rgb, D::Error>
        where D: Deserializer<'de> {
        deserializer.deserialize_str(ColorVisitor)
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Rgb>, D::Error>
        where D: Deserializer<'de> {
        deserializer.deserialize_option(OptionalColorVisitor)
    }
}
