use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::{GenerationConfig, Placement, ScatterRule};
use crate::error::{MapError, Result};
use crate::tiles::{TileCatalog, TileGrid, TileInstance, TileKind, Underlay};

/// How one scatter rule went
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterSummary {
    pub placement: Placement,
    pub requested: u32,
    pub placed: u32,
}

/// Everything that happened during generation.
///
/// Failed steps are recorded here instead of aborting the whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    pub caves_carved: u32,
    pub scatter: Vec<ScatterSummary>,
    pub errors: Vec<MapError>,
}

impl GenerationReport {
    /// True when every step ran to completion
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A freshly generated grid and its report
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    pub grid: TileGrid,
    pub report: GenerationReport,
}

/// Procedural world generator.
///
/// Output depends only on the config (including its seed) and the catalog.
#[derive(Debug, Clone, Default)]
pub struct WorldGenerator {
    config: GenerationConfig,
}

impl WorldGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run terrain banding, cave carving and scattering in that order
    pub fn generate(&self, catalog: &TileCatalog) -> GeneratedWorld {
        let config = &self.config;
        let mut grid = TileGrid::new(config.map_size());
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut report = GenerationReport::default();

        if let Err(e) = layer_terrain(&mut grid, config, catalog) {
            error!("Terrain banding aborted: {}", e);
            report.errors.push(e);
        }

        match carve_caves(&mut grid, &mut rng, config) {
            Ok(carved) => report.caves_carved = carved,
            Err(e) => {
                error!("Cave carving aborted: {}", e);
                report.errors.push(e);
            }
        }

        for rule in &config.scatter {
            let placed = match scatter(&mut grid, &mut rng, rule, config.retry_budget) {
                Ok(placed) => placed,
                Err(e) => {
                    error!("Scattering stopped early: {}", e);
                    let placed = match &e {
                        MapError::RetryBudgetExhausted { placed, .. } => *placed,
                        _ => 0,
                    };
                    report.errors.push(e);
                    placed
                }
            };
            report.scatter.push(ScatterSummary {
                placement: rule.placement,
                requested: rule.count,
                placed,
            });
        }

        info!(
            "Generated {}x{} world (seed {}): {} caves, {} errors, checksum {:08x}",
            grid.width(),
            grid.height(),
            config.seed,
            report.caves_carved,
            report.errors.len(),
            grid.checksum()
        );

        GeneratedWorld { grid, report }
    }
}

/// Fill the grid with horizontal depth bands.
///
/// Depth 0 is the top row. Band `b` covers `layer_size` rows (the last band
/// takes the remainder) and uses tile id `b * 2`; the last row of every band
/// but the final one is the transition tile `b * 2 + 1`. Each row's underlay
/// is its band. Nothing is written if the configuration is unusable.
pub fn layer_terrain(
    grid: &mut TileGrid,
    config: &GenerationConfig,
    catalog: &TileCatalog,
) -> Result<()> {
    if config.layer_size == 0 || config.layer_count == 0 {
        return Err(MapError::Configuration(format!(
            "{} layers of {} rows cannot cover the map",
            config.layer_count, config.layer_size
        )));
    }

    let last_band = config.layer_count - 1;
    let mut bands = Vec::with_capacity(config.layer_count as usize);
    for band in 0..config.layer_count {
        let resolve = |id: u32| -> Result<TileKind> {
            let id = u16::try_from(id).map_err(|_| MapError::UnknownTileType(u16::MAX))?;
            catalog.lookup(id)?;
            TileKind::try_from(id)
        };
        let primary = resolve(band * 2);
        // the last band has no transition row
        let transition = if band < last_band {
            resolve(band * 2 + 1).map(Some)
        } else {
            Ok(None)
        };
        let underlay = Underlay::from_band(band as usize).ok_or(MapError::UnknownTileType(
            u16::try_from(band).unwrap_or(u16::MAX),
        ));

        match (primary, transition, underlay) {
            (Ok(primary), Ok(transition), Ok(underlay)) => {
                bands.push((primary, transition, underlay))
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                return Err(MapError::Configuration(format!(
                    "band {} of {} has no tile type or underlay: {}",
                    band, config.layer_count, e
                )));
            }
        }
    }

    let height = grid.height();
    for depth in 0..height {
        let band = (depth / config.layer_size).min(last_band);
        let (primary, transition, underlay) = bands[band as usize];
        let kind = match transition {
            Some(transition) if (depth + 1) % config.layer_size == 0 => transition,
            _ => primary,
        };
        grid.fill_row(height - 1 - depth, catalog.instance(kind, underlay))?;
    }
    Ok(())
}

/// Carve `cave_count` rectangular caves inside the cave padding region.
///
/// Carved cells become air but keep their underlay, so the background band
/// shows through. Fails before touching the grid if a cave cannot fit.
pub fn carve_caves<R: Rng + ?Sized>(
    grid: &mut TileGrid,
    rng: &mut R,
    config: &GenerationConfig,
) -> Result<u32> {
    if config.cave_count == 0 {
        return Ok(0);
    }

    let (length, height) = (config.cave_length, config.cave_height);
    let region = config.cave_padding.region(grid.size());
    if length == 0 || height == 0 || length > region.width() || height > region.height() {
        return Err(MapError::Configuration(format!(
            "{}x{} cave does not fit in padded region x {:?}, y {:?}",
            length, height, region.x, region.y
        )));
    }

    for _ in 0..config.cave_count {
        let x0 = rng.gen_range(region.x.start..=region.x.end - length);
        let y0 = rng.gen_range(region.y.start..=region.y.end - height);
        for y in y0..y0 + height {
            for x in x0..x0 + length {
                let tile = grid.get(x, y)?;
                grid.set(x, y, TileInstance::air(tile.underlay))?;
            }
        }
    }
    Ok(config.cave_count)
}

/// Apply one scatter rule by rejection sampling inside its padding region.
///
/// A sample is rejected when the tile is air and the rule wants a solid
/// target, or the other way round. After `retry_budget` consecutive
/// rejections the rule gives up with [`MapError::RetryBudgetExhausted`];
/// placements made so far are kept.
pub fn scatter<R: Rng + ?Sized>(
    grid: &mut TileGrid,
    rng: &mut R,
    rule: &ScatterRule,
    retry_budget: u32,
) -> Result<u32> {
    if rule.count == 0 {
        return Ok(0);
    }
    let region = rule.padding.region(grid.size());
    if region.is_empty() {
        return Err(MapError::Configuration(format!(
            "{} has nowhere to land on an empty map",
            rule.placement
        )));
    }

    let wants_solid = rule.placement.requires_solid();
    let mut placed = 0;
    let mut rejections = 0;
    while placed < rule.count {
        let x = rng.gen_range(region.x.clone());
        let y = rng.gen_range(region.y.clone());
        let tile = grid.get(x, y)?;

        if tile.is_air() == wants_solid {
            rejections += 1;
            if rejections >= retry_budget {
                return Err(MapError::RetryBudgetExhausted {
                    rule: rule.placement.to_string(),
                    placed,
                    requested: rule.count,
                });
            }
            continue;
        }
        rejections = 0;

        match rule.placement {
            Placement::Overlay { overlay, .. } => grid.set_overlay(x, y, overlay)?,
            Placement::AirPocket => grid.set(x, y, TileInstance::air(tile.underlay))?,
        }
        placed += 1;
    }
    Ok(placed)
}
