use bevy::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use super::slot::{SpriteLookup, TileSlot, TileVisual};
use crate::error::{MapError, Result};
use crate::tiles::*;
use crate::world::{GenerationConfig, ViewportConfig, WorldMap};

/// Where the host looks for generation overrides
pub const GENERATION_CONFIG_PATH: &str = "assets/worldgen.json";

const SPRITE_ASSETS: [(SpriteId, &str); 23] = [
    (SPRITE_GRASS, "tiles/grass.png"),
    (SPRITE_DIRT, "tiles/dirt.png"),
    (SPRITE_DIRT_STONE, "tiles/dirt_stone.png"),
    (SPRITE_STONE, "tiles/stone.png"),
    (SPRITE_STONE_SLATE, "tiles/stone_slate.png"),
    (SPRITE_SLATE, "tiles/slate.png"),
    (SPRITE_SLATE_BASALT, "tiles/slate_basalt.png"),
    (SPRITE_BASALT, "tiles/basalt.png"),
    (SPRITE_BASALT_MAGMA, "tiles/basalt_magma.png"),
    (SPRITE_MAGMA, "tiles/magma.png"),
    (SPRITE_MAGMA_BEDROCK, "tiles/magma_bedrock.png"),
    (SPRITE_BEDROCK, "tiles/bedrock.png"),
    (SPRITE_ORE_COPPER, "overlays/copper.png"),
    (SPRITE_ORE_IRON, "overlays/iron.png"),
    (SPRITE_ORE_GOLD, "overlays/gold.png"),
    (SPRITE_ORE_DIAMOND, "overlays/diamond.png"),
    (SPRITE_CLOUD, "overlays/cloud.png"),
    (SPRITE_UNDERLAY_SKY, "underlays/sky.png"),
    (SPRITE_UNDERLAY_DIRT, "underlays/dirt.png"),
    (SPRITE_UNDERLAY_STONE, "underlays/stone.png"),
    (SPRITE_UNDERLAY_SLATE, "underlays/slate.png"),
    (SPRITE_UNDERLAY_BASALT, "underlays/basalt.png"),
    (SPRITE_UNDERLAY_LAVA, "underlays/lava.png"),
];

/// Image handles for every sprite id
#[derive(Resource, Default, Clone)]
pub struct TileSprites {
    handles: HashMap<SpriteId, Handle<Image>>,
}

impl TileSprites {
    /// Start loading every tile, overlay and underlay image
    pub fn load(assets: &AssetServer) -> Self {
        let mut sprites = Self::default();
        for (id, path) in SPRITE_ASSETS {
            sprites.insert(id, assets.load(path));
        }
        sprites
    }

    pub fn insert(&mut self, id: SpriteId, handle: Handle<Image>) {
        self.handles.insert(id, handle);
    }
}

impl SpriteLookup for TileSprites {
    type Sprite = Handle<Image>;

    fn sprite(&self, id: SpriteId) -> Result<Handle<Image>> {
        self.handles
            .get(&id)
            .cloned()
            .ok_or(MapError::SpriteNotFound(id))
    }
}

/// Marks one sprite layer of a render slot
#[derive(Component, Debug, Clone, Copy)]
pub struct TileLayer {
    pub layer: usize,
}

/// A render slot: one sprite entity per layer plus the visual waiting to be
/// pushed to them by [`apply_slot_visuals`]
#[derive(Debug)]
pub struct SlotEntities {
    pub entities: [Entity; NUM_LAYERS],
    pending: Option<TileVisual<Handle<Image>>>,
}

impl SlotEntities {
    /// Spawn the hidden layer entities for a new slot
    pub fn spawn(commands: &mut Commands) -> Self {
        let entities = std::array::from_fn(|layer| {
            commands
                .spawn((
                    TileLayer { layer },
                    Sprite {
                        custom_size: Some(Vec2::splat(TILE_DISPLAY_SIZE)),
                        ..default()
                    },
                    Transform::from_xyz(0.0, 0.0, layer_z_position(layer)),
                    Visibility::Hidden,
                ))
                .id()
        });
        Self {
            entities,
            pending: None,
        }
    }

    pub fn despawn(self, commands: &mut Commands) {
        for entity in self.entities {
            commands.entity(entity).despawn();
        }
    }
}

impl TileSlot<Handle<Image>> for SlotEntities {
    fn configure(&mut self, visual: &TileVisual<Handle<Image>>) {
        self.pending = Some(visual.clone());
    }
}

/// The tile world as used by the host
#[derive(Resource, Deref, DerefMut)]
pub struct DigMap(pub WorldMap<SlotEntities>);

/// Load generation overrides from [`GENERATION_CONFIG_PATH`], falling back
/// to the defaults
pub fn load_generation_config(mut commands: Commands) {
    let path = Path::new(GENERATION_CONFIG_PATH);
    let config = if path.exists() {
        match GenerationConfig::load(path) {
            Ok(config) => {
                info!("Loaded generation config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load generation config: {}, using defaults", e);
                GenerationConfig::default()
            }
        }
    } else {
        GenerationConfig::default()
    };
    commands.insert_resource(config);
}

/// Generate the world, spawn the camera over the surface and build the
/// render pool around it
pub fn setup_world(
    mut commands: Commands,
    assets: Res<AssetServer>,
    config: Res<GenerationConfig>,
    viewport: Res<ViewportConfig>,
) {
    let sprites = TileSprites::load(&assets);
    let (mut map, report) = WorldMap::generate(config.clone(), TileCatalog::standard(), TILE_SIZE);
    if !report.is_complete() {
        warn!("World generated with {} failed steps", report.errors.len());
    }
    map.move_map(Vec2::ZERO);

    // start centred just under the surface
    let map_size = map.grid().size();
    let start = UVec2::new(map_size.x / 2, map_size.y.saturating_sub(viewport.render_height / 2));
    let camera_pos = map.grid_to_world(start);
    commands.spawn((
        Camera2d,
        Transform::from_xyz(camera_pos.x, camera_pos.y, 999.0),
    ));

    let mut map = DigMap(map);
    resize_pool(&mut commands, &mut map, viewport.size(), &sprites);
    if let Err(e) = map.focus_on(camera_pos, &sprites) {
        error!("Failed to focus the viewport: {}", e);
    }
    if let Err(e) = map.rerender_all(&sprites) {
        error!("Failed to render the viewport: {}", e);
    }

    info!("World ready: {}", map.stats());
    commands.insert_resource(sprites);
    commands.insert_resource(map);
}

/// Resize the render pool to `size` (clamped to the map), despawning the
/// slots that no longer fit
fn resize_pool(commands: &mut Commands, map: &mut DigMap, size: UVec2, sprites: &TileSprites) {
    let map_size = map.grid().size();
    let clamped = size.min(map_size);
    if clamped != size {
        warn!("Render window {} clamped to map {}", size, map_size);
    }

    match map.configure_viewport(clamped, |_| SlotEntities::spawn(commands)) {
        Ok(retired) => {
            for slot in retired {
                slot.despawn(commands);
            }
        }
        Err(e) => {
            error!("Failed to configure render pool: {}", e);
            return;
        }
    }
    if let Err(e) = map.rerender_all(sprites) {
        error!("Failed to render the viewport: {}", e);
    }
}

/// Tiles needed to cover `visible` pixels at zoom `scale`, plus the margin
pub fn viewport_tiles(visible: Vec2, scale: f32) -> UVec2 {
    let tiles = (visible * scale / TILE_SIZE).ceil().as_uvec2();
    tiles + UVec2::splat(VIEWPORT_MARGIN_TILES)
}

/// Size the render window to cover the visible area at the current zoom
pub fn fit_viewport_to_window(
    camera_query: Query<&Projection, With<Camera2d>>,
    window_query: Query<&Window>,
    mut viewport: ResMut<ViewportConfig>,
) {
    let Ok(projection) = camera_query.single() else {
        return;
    };
    let Ok(window) = window_query.single() else {
        return;
    };
    let Projection::Orthographic(ortho) = projection else {
        return;
    };

    let tiles = viewport_tiles(Vec2::new(window.width(), window.height()), ortho.scale);
    viewport.set_if_neq(ViewportConfig {
        render_width: tiles.x,
        render_height: tiles.y,
    });
}

/// Rebuild the render pool when the viewport size changes
pub fn resize_viewport(
    mut commands: Commands,
    viewport: Res<ViewportConfig>,
    mut map: ResMut<DigMap>,
    sprites: Res<TileSprites>,
) {
    if !viewport.is_changed() {
        return;
    }
    if viewport.size().min(map.grid().size()) == map.window().size() {
        return;
    }
    resize_pool(&mut commands, &mut map, viewport.size(), &sprites);
    info!("Render window resized: {}", map.stats());
}

/// Keep the render window centred on the camera
pub fn update_viewport_from_camera(
    camera_query: Query<&Transform, (With<Camera2d>, Changed<Transform>)>,
    mut map: ResMut<DigMap>,
    sprites: Res<TileSprites>,
) {
    if let Ok(camera_transform) = camera_query.single() {
        let camera_pos = camera_transform.translation.truncate();
        if let Err(e) = map.focus_on(camera_pos, &*sprites) {
            error!("Viewport update failed: {}", e);
        }
    }
}

/// Redraw on-screen cells edited since the last frame
pub fn flush_tile_changes(mut map: ResMut<DigMap>, sprites: Res<TileSprites>) {
    if map.pending_changes() == 0 {
        return;
    }
    match map.flush_changes(&*sprites) {
        Ok(refreshed) => debug!("Refreshed {} edited tiles", refreshed),
        Err(e) => error!("Failed to refresh edited tiles: {}", e),
    }
}

/// Push pending slot visuals to their sprite entities
pub fn apply_slot_visuals(
    mut map: ResMut<DigMap>,
    mut layers: Query<(&mut Sprite, &mut Transform, &mut Visibility), With<TileLayer>>,
) {
    for slot in map.bypass_change_detection().window_mut().slots_mut() {
        let Some(visual) = slot.pending.take() else {
            continue;
        };

        let mut images: [Option<Handle<Image>>; NUM_LAYERS] = Default::default();
        images[LAYER_UNDERLAY] = Some(visual.underlay);
        images[LAYER_BASE] = visual.base;
        images[LAYER_OVERLAY] = visual.overlay;

        // sprites are centre-anchored, cells are addressed by their corner
        let center = visual.position + Vec2::splat(TILE_SIZE * 0.5);
        for (layer, image) in images.into_iter().enumerate() {
            let entity = slot.entities[layer];
            let Ok((mut sprite, mut transform, mut visibility)) = layers.get_mut(entity) else {
                warn!("Slot layer entity {:?} is missing", entity);
                continue;
            };
            transform.translation = center.extend(layer_z_position(layer));
            match image {
                Some(image) => {
                    sprite.image = image;
                    *visibility = Visibility::Visible;
                }
                None => *visibility = Visibility::Hidden,
            }
        }
    }
}

/// Log map statistics whenever the window moves
pub fn log_viewport(map: Res<DigMap>, mut last_corner: Local<Option<UVec2>>) {
    let corner = map.window().corner();
    if *last_corner == Some(corner) {
        return;
    }
    *last_corner = Some(corner);

    debug!("Map stats: {}", map.stats());
    #[cfg(feature = "debug_viewport")]
    info!("\n{}", map.window_preview());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_table_covers_every_tile() {
        let catalog = TileCatalog::standard();
        let ids: Vec<SpriteId> = SPRITE_ASSETS.iter().map(|(id, _)| *id).collect();

        for kind in TileKind::ALL {
            if let Some(id) = catalog.get(kind).sprite_id {
                assert!(ids.contains(&id), "{:?} has no image", kind);
            }
        }
        for underlay in Underlay::ALL {
            assert!(ids.contains(&underlay.sprite_id()));
        }
        for overlay in [
            Overlay::Copper,
            Overlay::Iron,
            Overlay::Gold,
            Overlay::Diamond,
            Overlay::Cloud,
        ] {
            assert!(ids.contains(&overlay.sprite_id().unwrap()));
        }
    }

    #[test]
    fn test_tile_sprites_lookup() {
        let mut sprites = TileSprites::default();
        sprites.insert(SPRITE_STONE, Handle::default());
        assert!(sprites.sprite(SPRITE_STONE).is_ok());
        assert_eq!(
            sprites.sprite(SPRITE_BEDROCK).unwrap_err(),
            MapError::SpriteNotFound(SPRITE_BEDROCK)
        );
    }

    #[test]
    fn test_setup_world_builds_pool() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .insert_resource(GenerationConfig {
                map_width: 40,
                map_height: 60,
                ..Default::default()
            })
            .insert_resource(ViewportConfig {
                render_width: 10,
                render_height: 6,
            })
            .add_systems(Startup, setup_world)
            .add_systems(Update, apply_slot_visuals);
        app.update();

        let map = app.world().resource::<DigMap>();
        assert_eq!(map.window().size(), UVec2::new(10, 6));
        assert_eq!(map.window().bound_cells().count(), 60);

        let mut layers = app.world_mut().query::<&TileLayer>();
        assert_eq!(layers.iter(app.world()).count(), 60 * NUM_LAYERS);
        let mut cameras = app.world_mut().query::<&Camera2d>();
        assert_eq!(cameras.iter(app.world()).count(), 1);
    }

    #[test]
    fn test_resize_viewport_despawns_retired_slots() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .insert_resource(GenerationConfig {
                map_width: 40,
                map_height: 60,
                ..Default::default()
            })
            .insert_resource(ViewportConfig {
                render_width: 10,
                render_height: 6,
            })
            .add_systems(Startup, setup_world)
            .add_systems(Update, resize_viewport);
        app.update();

        app.world_mut().resource_mut::<ViewportConfig>().render_width = 4;
        app.update();

        let map = app.world().resource::<DigMap>();
        assert_eq!(map.window().size(), UVec2::new(4, 6));
        let mut layers = app.world_mut().query::<&TileLayer>();
        assert_eq!(layers.iter(app.world()).count(), 24 * NUM_LAYERS);
    }

    fn shrink_on_first_frame(mut viewport: ResMut<ViewportConfig>, mut done: Local<bool>) {
        if !*done {
            viewport.render_width = 4;
            *done = true;
        }
    }

    #[test]
    fn test_first_frame_viewport_change_resizes_pool() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .insert_resource(GenerationConfig {
                map_width: 40,
                map_height: 60,
                ..Default::default()
            })
            .insert_resource(ViewportConfig {
                render_width: 10,
                render_height: 6,
            })
            .add_systems(Startup, setup_world)
            .add_systems(Update, (shrink_on_first_frame, resize_viewport).chain());
        app.update();

        let map = app.world().resource::<DigMap>();
        assert_eq!(map.window().size(), UVec2::new(4, 6));
        let mut layers = app.world_mut().query::<&TileLayer>();
        assert_eq!(layers.iter(app.world()).count(), 24 * NUM_LAYERS);
    }

    #[test]
    fn test_viewport_tiles_matches_default_render_window() {
        assert_eq!(
            viewport_tiles(Vec2::new(320.0, 176.0), 1.0),
            UVec2::new(DEFAULT_RENDER_WIDTH, DEFAULT_RENDER_HEIGHT)
        );
        // partial tiles round up
        assert_eq!(viewport_tiles(Vec2::new(1280.0, 720.0), 0.25), UVec2::new(42, 25));
    }

    fn zoom_in(mut cameras: Query<&mut Projection, With<Camera2d>>) {
        for mut projection in &mut cameras {
            *projection = Projection::Orthographic(OrthographicProjection {
                scale: 0.25,
                ..OrthographicProjection::default_2d()
            });
        }
    }

    #[test]
    fn test_fit_viewport_to_window_on_first_frame() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .insert_resource(GenerationConfig {
                map_width: 60,
                map_height: 60,
                ..Default::default()
            })
            .insert_resource(ViewportConfig {
                render_width: 10,
                render_height: 6,
            })
            .add_systems(Startup, setup_world)
            .add_systems(PostStartup, zoom_in)
            .add_systems(Update, (fit_viewport_to_window, resize_viewport).chain());
        // 1280x720 logical pixels
        app.world_mut().spawn(Window::default());
        app.update();

        let viewport = *app.world().resource::<ViewportConfig>();
        assert_eq!(viewport.size(), UVec2::new(42, 25));
        let map = app.world().resource::<DigMap>();
        assert_eq!(map.window().size(), UVec2::new(42, 25));
        assert_eq!(map.window().bound_cells().count(), 42 * 25);
    }
}
