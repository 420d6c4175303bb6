//! Arena - a top-down chase demo
//!
//! Runs headless: a scripted platform steers the player with seeded random
//! key presses while enemies chase it. Enemies that reach the player burst
//! into particles and are removed. Pass a `.toml` or `.ron` path to
//! override the defaults in [`config::ArenaConfig`].

mod behaviors;
mod config;

use behaviors::{Enemy, Player};
use config::ArenaConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprite_engine::foundation::logging;
use sprite_engine::prelude::*;
use sprite_engine::render::{HeadlessRecorder, IndexBufferId, MaterialId, VertexBufferId};

const ARENA_SCENE: &str = r#"{
    "name": "arena",
    "tile_size": 32.0,
    "layers": [{ "name": "floor", "layer": -10, "groups": [
        { "material": "floor", "columns": 4, "rows": 4, "tiles": [
            { "x": -2, "y": -2, "index": 0 }, { "x": -1, "y": -2, "index": 1 },
            { "x": 0, "y": -2, "index": 2 }, { "x": 1, "y": -2, "index": 3 },
            { "x": -2, "y": 1, "index": 4 }, { "x": -1, "y": 1, "index": 5 },
            { "x": 0, "y": 1, "index": 6 }, { "x": 1, "y": 1, "index": 7 }
        ]}
    ]}],
    "entities": [{ "name": "enemy", "system": "enemies", "metadata": { "size": 20.0 },
        "instances": [
            { "x": -220.0, "y": 140.0 }, { "x": 230.0, "y": 150.0 },
            { "x": -210.0, "y": -160.0 }, { "x": 240.0, "y": -120.0, "metadata": { "size": 28.0 } },
            { "x": 0.0, "y": 220.0 }
        ]
    }]
}"#;

/// Quad plus material for one kind of sprite
#[derive(Debug, Clone, Copy)]
struct SpriteKit {
    material: MaterialId,
    vertex_buffer: VertexBufferId,
    index_buffer: IndexBufferId,
}

impl SpriteKit {
    fn sprite(self) -> SpriteDesc {
        SpriteDesc::new(self.material, self.vertex_buffer, self.index_buffer)
    }

    fn emitter(self) -> EmitterDesc {
        EmitterDesc::new(self.material, self.vertex_buffer, self.index_buffer)
    }
}

/// Arena game
struct Arena {
    config: ArenaConfig,
    player: Option<EntityKey>,
    ticks: u64,
}

impl Arena {
    fn new(config: ArenaConfig) -> Self {
        Self {
            config,
            player: None,
            ticks: 0,
        }
    }

    fn kit(renderer: &mut Renderer, material: MaterialId) -> Result<SpriteKit, AppError> {
        let (vertex_buffer, index_buffer) = renderer.create_quad()?;
        Ok(SpriteKit {
            material,
            vertex_buffer,
            index_buffer,
        })
    }
}

impl Application for Arena {
    fn initialize(&mut self, ctx: &mut AppContext<'_>) -> Result<(), AppError> {
        let renderer = &mut *ctx.renderer;
        let sheet = renderer.create_texture_2d(&TextureDesc {
            name: "sheet".into(),
            path: "textures/sheet.png".into(),
            width: 128,
            height: 128,
        })?;
        renderer.create_material(&MaterialDesc::sheet("floor", sheet, 4, 4))?;
        let enemy_material = renderer.create_material(&MaterialDesc::sheet("enemy", sheet, 4, 4))?;
        let player_material = renderer.create_material(&MaterialDesc::flat("player", Vec4::new(0.3, 0.6, 1.0, 1.0)))?;
        let spark_material = renderer.create_material(&MaterialDesc::flat("spark", Vec4::new(1.0, 0.7, 0.2, 1.0)))?;

        let player_kit = Self::kit(renderer, player_material)?;
        let enemy_kit = Self::kit(renderer, enemy_material)?;
        let spark_kit = Self::kit(renderer, spark_material)?;

        let scene = &mut *ctx.scene;
        let players = scene.add_system("players");
        let enemies = scene.add_system("enemies");
        let effects = scene.add_system("effects");

        let player = scene
            .spawn(
                players,
                Player {
                    speed: self.config.player_speed,
                    hits: 0,
                },
            )?
            .attach_transform(Transform::at(0.0, 0.0).with_scale(Vec2::new(24.0, 24.0)))?
            .attach_collider(
                BodyDesc::new(Shape::circle(12.0))
                    .with_fixed_rotation()
                    .with_layers(LayerFilter::new(CollisionLayers::PLAYER, CollisionLayers::ENEMY)),
            )?
            .attach_sprite(&player_kit.sprite().with_layer(2))?
            .build();
        let player_key = EntityKey::new(players, player);
        let target = scene
            .system(players)
            .and_then(|s| s.find_collider(player))
            .map(sprite_engine::ecs::components::Collider::body)
            .ok_or_else(|| AppError::GameLogic("player has no body".into()))?;
        self.player = Some(player_key);

        let mut factories = EntityFactories::new();
        let enemy_speed = self.config.enemy_speed;
        let explosion_time = self.config.explosion_time;
        factories.register("enemy", move |scene, _renderer, spawn| {
            let size = spawn.metadata_f32("size").unwrap_or(20.0);
            let walk = Animator::default().with_animation("walk", Animation::new(0, 4, 1, 8.0));
            let id = scene
                .spawn(
                    spawn.system,
                    Enemy {
                        target,
                        player_system: players,
                        speed: enemy_speed,
                        effects,
                        explosion: spark_kit.emitter().with_pool(24, 0.4).with_speed(120.0),
                        explosion_time,
                    },
                )?
                .attach_transform(
                    Transform::at(spawn.position.x, spawn.position.y)
                        .with_rotation(spawn.rotation)
                        .with_scale(Vec2::new(size, size)),
                )?
                .attach_collider(
                    BodyDesc::new(Shape::rect(size, size))
                        .with_fixed_rotation()
                        .with_layers(LayerFilter::new(CollisionLayers::ENEMY, CollisionLayers::PLAYER)),
                )?
                .attach_sprite(&enemy_kit.sprite().with_tile_scale(Vec2::new(0.25, 0.25)).with_layer(1))?
                .attach_animator(walk)?
                .build();
            scene
                .system_mut(spawn.system)
                .ok_or(SceneError::UnknownSystem(spawn.system))?
                .set_animation(id, "walk", false)?;
            Ok(EntityKey::new(spawn.system, id))
        });

        let definition = SceneDefinition::from_json(ARENA_SCENE)?;
        let report = scene.populate(&definition, &factories, renderer)?;
        log::info!(
            "Arena ready: player {player_key}, {} enemies ({} spawned), {} floor tiles",
            scene.system(enemies).map_or(0, sprite_engine::ecs::EntitySystem::len),
            report.entities.len(),
            report.tiles
        );
        Ok(())
    }

    fn update(&mut self, ctx: &mut AppContext<'_>, _delta_time: f32) -> Result<(), AppError> {
        self.ticks += 1;
        if let Some(position) = self
            .player
            .and_then(|key| ctx.scene.system(key.system)?.find_transform(key.entity))
            .map(Transform::position_2d)
        {
            if let Some(camera) = ctx.scene.cameras_mut().active_mut() {
                camera.position = position;
            }
        }
        Ok(())
    }

    fn cleanup(&mut self, ctx: &mut AppContext<'_>) {
        let enemies_left = ctx
            .scene
            .system_by_name("enemies")
            .and_then(|id| ctx.scene.system(id))
            .map_or(0, sprite_engine::ecs::EntitySystem::len);
        let hits = self
            .player
            .and_then(|key| ctx.scene.system(key.system)?.behavior::<Player>(key.entity))
            .map_or(0, |player| player.hits);
        log::info!(
            "Arena finished after {} ticks: {enemies_left} enemies left, player touched {hits}",
            self.ticks
        );
    }
}

/// Headless platform pressing random direction keys
struct ScriptedPlatform {
    frames_left: u32,
    rng: StdRng,
    held: Option<KeyCode>,
    frame_time: f32,
}

impl ScriptedPlatform {
    const DIRECTIONS: [KeyCode; 4] = [KeyCode::W, KeyCode::A, KeyCode::S, KeyCode::D];

    fn new(frames: u32, seed: u64, frame_time: f32) -> Self {
        Self {
            frames_left: frames,
            rng: StdRng::seed_from_u64(seed),
            held: None,
            frame_time,
        }
    }
}

impl Platform for ScriptedPlatform {
    fn poll_events(&mut self, input: &mut InputState) -> PlatformEvents {
        if self.frames_left == 0 {
            return PlatformEvents {
                close_requested: true,
                ..PlatformEvents::default()
            };
        }
        if self.frames_left % 30 == 0 {
            if let Some(key) = self.held.take() {
                input.handle_key(key, false);
            }
            let key = Self::DIRECTIONS[self.rng.gen_range(0..Self::DIRECTIONS.len())];
            input.handle_key(key, true);
            self.held = Some(key);
        }
        self.frames_left -= 1;
        PlatformEvents {
            frame_time: Some(self.frame_time),
            ..PlatformEvents::default()
        }
    }
}

fn load_config() -> Result<ArenaConfig, AppError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading arena configuration from {path}");
            Ok(ArenaConfig::load_from_file(&path)?)
        }
        None => Ok(ArenaConfig::default()),
    }
}

fn run() -> Result<HeadlessRecorder, Box<dyn std::error::Error>> {
    let config = load_config()?;
    let backend = HeadlessBackend::new(config.engine.window.width, config.engine.window.height);
    let recorder = backend.recorder();
    let mut platform = ScriptedPlatform::new(config.frames, config.seed, config.engine.simulation.fixed_tick);
    let mut engine = Engine::new(config.engine.clone(), backend)?;
    engine.run(&mut platform, &mut Arena::new(config))?;

    let stats = engine.stats();
    log::info!(
        "Frames: {} ({} dropped), ticks: {}, collisions: {}, removals: {}",
        stats.frames,
        stats.dropped_frames,
        stats.ticks,
        stats.collisions,
        stats.removed
    );
    Ok(recorder)
}

fn main() {
    logging::init();
    match run() {
        Ok(recorder) => {
            let log = recorder.log();
            log::info!("Presented {} frames with {} draw calls", log.presents, log.draws.len());
        }
        Err(e) => {
            log::error!("Arena failed: {e}");
            std::process::exit(1);
        }
    }
}
