use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::Path;

use crate::error::{MapError, Result};
use crate::tiles::{
    Overlay, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, DEFAULT_RENDER_HEIGHT, DEFAULT_RENDER_WIDTH,
    DEFAULT_RETRY_BUDGET,
};

/// Sampling region expressed as fractions of the map extent.
///
/// `left`/`right` are fractions of the width, `bottom`/`top` of the height,
/// measured from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Padding {
    /// The whole map
    pub const FULL: Padding = Padding::new(0.0, 1.0, 0.0, 1.0);

    pub const fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Convert to half-open tile ranges for a map of `size`.
    ///
    /// Fractions are clamped to `[0, 1]` and un-crossed; each bound is
    /// `floor(fraction * (dim - 1))`, and an empty interval is widened by one
    /// tile so sampling always has somewhere to land.
    pub fn region(&self, size: UVec2) -> SampleRegion {
        SampleRegion {
            x: padding_bounds(self.left, self.right, size.x),
            y: padding_bounds(self.bottom, self.top, size.y),
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Padding::FULL
    }
}

fn padding_bounds(low: f32, high: f32, dim: u32) -> Range<u32> {
    if dim == 0 {
        return 0..0;
    }
    let clamp = |f: f32| if f.is_nan() { 0.0 } else { f.clamp(0.0, 1.0) };
    let (mut low, mut high) = (clamp(low), clamp(high));
    if low > high {
        std::mem::swap(&mut low, &mut high);
    }

    let last = (dim - 1) as f32;
    let mut lo = (low * last).floor() as u32;
    let mut hi = (high * last).floor() as u32;
    if lo == hi {
        if hi < dim - 1 {
            hi += 1;
        } else if lo > 0 {
            lo -= 1;
        } else {
            hi = lo + 1;
        }
    }
    lo..hi
}

/// Half-open tile ranges to sample from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRegion {
    pub x: Range<u32>,
    pub y: Range<u32>,
}

impl SampleRegion {
    pub fn width(&self) -> u32 {
        self.x.end - self.x.start
    }

    pub fn height(&self) -> u32 {
        self.y.end - self.y.start
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }
}

/// What a scatter rule does to the tile it lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Set `overlay`; lands on solid tiles when `requires_solid`, else on air
    Overlay {
        overlay: Overlay,
        requires_solid: bool,
    },
    /// Hollow out a solid tile, keeping its underlay
    AirPocket,
}

impl Placement {
    pub const fn ore(overlay: Overlay) -> Self {
        Placement::Overlay {
            overlay,
            requires_solid: true,
        }
    }

    pub const fn decoration(overlay: Overlay) -> Self {
        Placement::Overlay {
            overlay,
            requires_solid: false,
        }
    }

    /// Whether this placement wants a solid (non-air) target
    pub const fn requires_solid(&self) -> bool {
        match self {
            Placement::Overlay { requires_solid, .. } => *requires_solid,
            Placement::AirPocket => true,
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Overlay { overlay, .. } => write!(f, "{:?}", overlay),
            Placement::AirPocket => write!(f, "AirPocket"),
        }
    }
}

/// One row of the scatter table: what to place, how many, and where
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterRule {
    pub placement: Placement,
    pub count: u32,
    #[serde(default)]
    pub padding: Padding,
}

impl ScatterRule {
    pub const fn new(placement: Placement, count: u32, padding: Padding) -> Self {
        Self {
            placement,
            count,
            padding,
        }
    }
}

/// The default scatter table, in placement priority order:
/// common ores, uncommon, rare, air pockets, then decorations.
pub fn default_scatter_rules() -> Vec<ScatterRule> {
    vec![
        ScatterRule::new(
            Placement::ore(Overlay::Copper),
            60,
            Padding::new(0.0, 1.0, 0.35, 0.85),
        ),
        ScatterRule::new(
            Placement::ore(Overlay::Iron),
            40,
            Padding::new(0.0, 1.0, 0.2, 0.7),
        ),
        ScatterRule::new(
            Placement::ore(Overlay::Gold),
            20,
            Padding::new(0.0, 1.0, 0.05, 0.45),
        ),
        ScatterRule::new(
            Placement::ore(Overlay::Diamond),
            8,
            Padding::new(0.0, 1.0, 0.0, 0.2),
        ),
        ScatterRule::new(
            Placement::AirPocket,
            30,
            Padding::new(0.0, 1.0, 0.1, 0.8),
        ),
        ScatterRule::new(
            Placement::decoration(Overlay::Cloud),
            12,
            Padding::new(0.0, 1.0, 0.9, 1.0),
        ),
    ]
}

/// Procedural generation knobs.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it changes.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub map_width: u32,
    pub map_height: u32,
    /// Number of depth bands
    pub layer_count: u32,
    /// Rows per depth band; the last band absorbs the remainder
    pub layer_size: u32,
    pub cave_count: u32,
    pub cave_length: u32,
    pub cave_height: u32,
    pub cave_padding: Padding,
    pub scatter: Vec<ScatterRule>,
    /// Consecutive rejections tolerated before a scatter rule gives up
    pub retry_budget: u32,
    pub seed: u64,
}

impl GenerationConfig {
    pub fn map_size(&self) -> UVec2 {
        UVec2::new(self.map_width, self.map_height)
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON document from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| MapError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
            layer_count: 6,
            layer_size: 20,
            cave_count: 12,
            cave_length: 8,
            cave_height: 4,
            cave_padding: Padding::new(0.0, 1.0, 0.0, 0.75),
            scatter: default_scatter_rules(),
            retry_budget: DEFAULT_RETRY_BUDGET,
            seed: 0x0D16_D0E5,
        }
    }
}

/// Size of the on-screen render pool, in tiles
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub render_width: u32,
    pub render_height: u32,
}

impl ViewportConfig {
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.render_width, self.render_height)
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
            render_height: DEFAULT_RENDER_HEIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_region_full_map() {
        let region = Padding::FULL.region(UVec2::new(30, 120));
        assert_eq!(region.x, 0..29);
        assert_eq!(region.y, 0..119);
    }

    #[test]
    fn test_padding_region_clamps_and_uncrosses() {
        let region = Padding::new(1.5, -0.5, 0.75, 0.25).region(UVec2::new(11, 21));
        assert_eq!(region.x, 0..10);
        assert_eq!(region.y, 5..15);
    }

    #[test]
    fn test_padding_region_never_empty() {
        // left == right in the middle
        let region = Padding::new(0.5, 0.5, 0.5, 0.5).region(UVec2::new(11, 11));
        assert_eq!(region.x, 5..6);

        // both at the far edge
        let region = Padding::new(1.0, 1.0, 1.0, 1.0).region(UVec2::new(11, 11));
        assert_eq!(region.x, 9..10);

        // single-tile map
        let region = Padding::new(0.3, 0.3, 0.0, 1.0).region(UVec2::new(1, 1));
        assert_eq!(region.x, 0..1);
        assert_eq!(region.y, 0..1);
        assert!(!region.is_empty());
    }

    #[test]
    fn test_placement_targets() {
        assert!(Placement::ore(Overlay::Gold).requires_solid());
        assert!(Placement::AirPocket.requires_solid());
        assert!(!Placement::decoration(Overlay::Cloud).requires_solid());
        assert_eq!(Placement::ore(Overlay::Iron).to_string(), "Iron");
    }

    #[test]
    fn test_config_json_defaults() {
        let config = GenerationConfig::from_json_str(r#"{ "map_width": 30, "seed": 7 }"#).unwrap();
        assert_eq!(config.map_width, 30);
        assert_eq!(config.seed, 7);
        assert_eq!(config.map_height, DEFAULT_MAP_HEIGHT);
        assert_eq!(config.scatter, default_scatter_rules());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = GenerationConfig {
            cave_padding: Padding::new(0.1, 0.9, 0.0, 0.5),
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(GenerationConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_config_json_invalid() {
        let err = GenerationConfig::from_json_str("{ map_width: }").unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));

        let err = GenerationConfig::load(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));
    }
}
