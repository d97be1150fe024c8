pub mod config;
pub mod coords;
pub mod generator;
pub mod manager;

// Re-export commonly used items
pub use config::{GenerationConfig, Padding, Placement, ScatterRule, ViewportConfig};
pub use coords::CoordinateMapper;
pub use generator::{GeneratedWorld, GenerationReport, WorldGenerator};
pub use manager::{MapStats, Terrain, WorldMap};
