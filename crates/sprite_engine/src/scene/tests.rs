//! End-to-end scene scenarios

use super::*;
use crate::ecs::components::{Animation, Animator, EmitterDesc, Mover, SpriteDesc, Transform};
use crate::ecs::{CollisionContext, EntityId, UpdateContext};
use crate::foundation::math::{Vec2, Vec4};
use crate::physics::{BodyDesc, BodyType, Shape};
use crate::render::{FrameStatus, HeadlessBackend, HeadlessRecorder, MaterialDesc, VertexBufferId};
use crate::config::RendererConfig;
use std::any::Any;

#[derive(Default)]
struct Recorder {
    hits: Vec<EntityKey>,
    updates: u32,
    despawn_on_hit: bool,
}

impl EntityBehavior for Recorder {
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {
        self.updates += 1;
    }

    fn on_collision(&mut self, ctx: &mut CollisionContext<'_>, other: EntityKey) {
        self.hits.push(other);
        if self.despawn_on_hit {
            ctx.despawn_self();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Harness {
    scene: Scene,
    renderer: Renderer,
    recorder: HeadlessRecorder,
    input: InputState,
    sprite: SpriteDesc,
}

impl Harness {
    fn new() -> Self {
        let config = EngineConfig::default();
        let backend = HeadlessBackend::new(config.window.width, config.window.height);
        let recorder = backend.recorder();
        let mut renderer = Renderer::new(backend, &RendererConfig::default());
        let material = renderer
            .create_material(&MaterialDesc::flat("white", Vec4::new(1.0, 1.0, 1.0, 1.0)))
            .unwrap();
        let (vertex_buffer, index_buffer) = renderer.create_quad().unwrap();
        Self {
            scene: Scene::new(&config),
            renderer,
            recorder,
            input: InputState::new(),
            sprite: SpriteDesc::new(material, vertex_buffer, index_buffer),
        }
    }

    /// Sprite with its own quad so its draws can be told apart
    fn unique_sprite(&mut self) -> SpriteDesc {
        let (vertex_buffer, index_buffer) = self.renderer.create_quad().unwrap();
        SpriteDesc::new(self.sprite.material, vertex_buffer, index_buffer)
    }

    fn spawn_body(&mut self, system: SystemId, at: Vec2, desc: BodyDesc, behavior: Recorder) -> EntityId {
        self.scene
            .spawn(system, behavior)
            .unwrap()
            .attach_transform(Transform::at(at.x, at.y))
            .unwrap()
            .attach_collider(desc)
            .unwrap()
            .build()
    }

    fn frame(&mut self) -> TickStats {
        let stats = self.scene.do_update(&self.input, &mut self.renderer).unwrap();
        assert_eq!(self.renderer.render().unwrap(), FrameStatus::Presented);
        stats
    }

    fn last_frame_draws_vertex_buffer(&self, vertex_buffer: VertexBufferId) -> bool {
        let log = self.recorder.log();
        let frame = log.presents - 1;
        let found = log.draws_in_frame(frame).any(|d| d.vertex_buffer == vertex_buffer);
        found
    }
}

fn hits(scene: &Scene, key: EntityKey) -> Vec<EntityKey> {
    scene
        .system(key.system)
        .and_then(|s| s.behavior::<Recorder>(key.entity))
        .map(|r| r.hits.clone())
        .unwrap_or_default()
}

fn sensor() -> BodyDesc {
    BodyDesc::new(Shape::circle(8.0)).as_sensor()
}

fn solid() -> BodyDesc {
    BodyDesc::new(Shape::rect(16.0, 16.0))
}

#[test]
fn test_keys_unique_across_systems() {
    let mut h = Harness::new();
    let players = h.scene.add_system("players");
    let enemies = h.scene.add_system("enemies");
    let a = h.scene.spawn(players, ()).unwrap().build();
    let b = h.scene.spawn(enemies, ()).unwrap().build();
    assert_ne!(EntityKey::new(players, a), EntityKey::new(enemies, b));
    assert_eq!(h.scene.system_by_name("enemies"), Some(enemies));
    assert_eq!(h.scene.entity_count(), 2);
}

#[test]
fn test_spawn_into_unknown_system_fails() {
    let mut h = Harness::new();
    assert!(matches!(
        h.scene.spawn(SystemId(3), ()),
        Err(SceneError::UnknownSystem(SystemId(3)))
    ));
}

#[test]
fn test_collision_dispatched_once_to_each_side() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let a = h.spawn_body(system, Vec2::new(0.0, 0.0), sensor(), Recorder::default());
    let b = h.spawn_body(system, Vec2::new(4.0, 0.0), solid(), Recorder::default());
    let key_a = EntityKey::new(system, a);
    let key_b = EntityKey::new(system, b);

    let stats = h.frame();
    assert_eq!(stats.collisions, 1);
    for _ in 0..5 {
        h.frame();
    }

    assert_eq!(hits(&h.scene, key_a), vec![key_b]);
    assert_eq!(hits(&h.scene, key_b), vec![key_a]);
}

#[test]
fn test_despawn_in_collision_is_deferred() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let bullet = h.spawn_body(
        system,
        Vec2::new(0.0, 0.0),
        sensor(),
        Recorder {
            despawn_on_hit: true,
            ..Recorder::default()
        },
    );
    let target = h.spawn_body(system, Vec2::new(4.0, 0.0), solid(), Recorder::default());
    assert_eq!(h.scene.physics().body_count(), 2);

    let stats = h.frame();
    assert_eq!(stats.removed, 1);
    assert!(!h.scene.contains(EntityKey::new(system, bullet)));
    assert_eq!(h.scene.physics().body_count(), 1);
    // The survivor still saw the contact even though the bullet asked to go
    assert_eq!(hits(&h.scene, EntityKey::new(system, target)), vec![EntityKey::new(system, bullet)]);

    // Further ticks never reference the removed entity
    for _ in 0..3 {
        assert_eq!(h.frame().collisions, 0);
    }
}

#[test]
fn test_despawn_command_removes_entity_and_its_draws() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let sprite = h.unique_sprite();
    let id = h
        .scene
        .spawn(system, ())
        .unwrap()
        .attach_transform(Transform::at(10.0, 10.0))
        .unwrap()
        .attach_sprite(&sprite)
        .unwrap()
        .attach_collider(solid())
        .unwrap()
        .build();
    let key = EntityKey::new(system, id);

    h.frame();
    assert!(h.last_frame_draws_vertex_buffer(sprite.vertex_buffer));

    h.scene.commands_mut().despawn(key);
    // Still alive until the next tick applies the queue
    assert!(h.scene.contains(key));
    h.frame();
    assert!(!h.scene.contains(key));
    assert!(!h.last_frame_draws_vertex_buffer(sprite.vertex_buffer));
    assert!(h.scene.system(system).unwrap().managers().render.resources_for(id).is_none());
    assert_eq!(h.scene.physics().body_count(), 0);
}

#[test]
fn test_commands_for_missing_targets_are_ignored() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let ghost = EntityKey::new(system, EntityId::from_raw(99));
    h.scene.commands_mut().despawn(ghost);
    h.scene.commands_mut().apply_impulse(ghost, Vec2::new(1.0, 0.0));
    h.scene.commands_mut().teleport(ghost, Vec2::new(1.0, 0.0));
    assert_eq!(h.frame().commands, 3);
}

#[test]
fn test_spawn_command_runs_with_scene_access() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    h.scene.commands_mut().spawn(move |scene: &mut Scene| {
        scene.spawn(system, ())?.attach_transform(Transform::at(1.0, 2.0))?.build();
        Ok(())
    });
    h.frame();
    assert_eq!(h.scene.system(system).unwrap().len(), 1);
}

#[test]
fn test_teleport_resyncs_transform_from_body() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let id = h.spawn_body(
        system,
        Vec2::new(0.0, 0.0),
        solid().with_body_type(BodyType::Kinematic),
        Recorder::default(),
    );
    h.scene
        .commands_mut()
        .teleport(EntityKey::new(system, id), Vec2::new(64.0, 32.0));
    h.frame();
    // The body moved when the command was applied; the resync later in the
    // same tick copies it back into the transform
    let position = h.scene.system(system).unwrap().find_transform(id).unwrap().position_2d();
    assert!((position - Vec2::new(64.0, 32.0)).norm() < 1e-3);
}

#[test]
fn test_resting_body_does_not_touch_transform() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let id = h.spawn_body(
        system,
        Vec2::new(0.0, 0.0),
        solid().with_body_type(BodyType::Fixed),
        Recorder::default(),
    );
    h.frame();
    let version = h.scene.system(system).unwrap().find_transform(id).unwrap().version();
    for _ in 0..3 {
        assert_eq!(h.frame().synced, 0);
    }
    assert_eq!(
        h.scene.system(system).unwrap().find_transform(id).unwrap().version(),
        version
    );
}

#[test]
fn test_single_play_animation_completes_on_scene_ticks() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let id = h
        .scene
        .spawn(system, ())
        .unwrap()
        .attach_transform(Transform::at(0.0, 0.0))
        .unwrap()
        .attach_sprite(&h.sprite.clone().with_tile_scale(Vec2::new(0.25, 1.0)))
        .unwrap()
        .attach_animator(Animator::default().with_animation("explode", Animation::new(0, 4, 0, 60.0)))
        .unwrap()
        .build();
    h.scene.system_mut(system).unwrap().set_animation(id, "explode", true).unwrap();

    for _ in 0..3 {
        h.frame();
    }
    let system_ref = h.scene.system(system).unwrap();
    assert_eq!(system_ref.find_animator(id).unwrap().frame(), 3);
    assert!(!system_ref.find_animator(id).unwrap().is_complete());

    for _ in 0..3 {
        h.frame();
    }
    let system_ref = h.scene.system(system).unwrap();
    let animator = system_ref.find_animator(id).unwrap();
    assert!(animator.is_complete());
    assert_eq!(animator.frame(), 3);
    assert_eq!(system_ref.find_sprite(id).unwrap().tile_offset(), Vec2::new(3.0, 0.0));
}

#[test]
fn test_looping_animation_wraps_to_first_frame() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let id = h
        .scene
        .spawn(system, ())
        .unwrap()
        .attach_transform(Transform::at(0.0, 0.0))
        .unwrap()
        .attach_sprite(&h.sprite.clone())
        .unwrap()
        .attach_animator(Animator::default().with_animation("walk", Animation::new(0, 3, 0, 60.0)))
        .unwrap()
        .build();
    h.scene.system_mut(system).unwrap().set_animation(id, "walk", false).unwrap();

    let mut frames = Vec::new();
    for _ in 0..4 {
        h.frame();
        frames.push(h.scene.system(system).unwrap().find_animator(id).unwrap().frame());
    }
    assert_eq!(frames, vec![1, 2, 0, 1]);
}

#[test]
fn test_mover_and_emitter_run_each_tick() {
    let mut h = Harness::new();
    let system = h.scene.add_system("effects");
    let sprite = h.sprite.clone();
    let id = h
        .scene
        .spawn(system, ())
        .unwrap()
        .attach_transform(Transform::at(0.0, 0.0))
        .unwrap()
        .attach_mover(Mover::with_velocity(Vec2::new(60.0, 0.0)))
        .unwrap()
        .attach_emitter(
            EmitterDesc::new(sprite.material, sprite.vertex_buffer, sprite.index_buffer).with_pool(8, 1.0),
        )
        .unwrap()
        .build();

    for _ in 0..60 {
        h.scene.simulate(&h.input).unwrap();
    }
    let x = h.scene.system(system).unwrap().find_transform(id).unwrap().position().x;
    assert!((x - 60.0).abs() < 1e-2);

    assert!(h.scene.submit(&mut h.renderer) > 0);
}

#[test]
fn test_mover_and_body_advance_together() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let velocity = Vec2::new(60.0, 0.0);
    let walker = h
        .scene
        .spawn(system, ())
        .unwrap()
        .attach_transform(Transform::at(0.0, 0.0))
        .unwrap()
        .attach_mover(Mover::with_velocity(velocity))
        .unwrap()
        .build();
    let body = h.spawn_body(system, Vec2::new(0.0, 100.0), solid().with_fixed_rotation(), Recorder::default());
    let handle = h.scene.system(system).unwrap().find_collider(body).unwrap().body();
    h.scene.physics_mut().set_linear_velocity(handle, velocity);

    for _ in 0..31 {
        h.scene.simulate(&h.input).unwrap();
    }
    let system = h.scene.system(system).unwrap();
    let walker_x = system.find_transform(walker).unwrap().position().x;
    let body_x = system.find_transform(body).unwrap().position().x;
    assert!((walker_x - 31.0).abs() < 1e-2);
    assert!((walker_x - body_x).abs() < 1e-2, "mover {walker_x} body {body_x}");
}

#[test]
fn test_updates_skip_entities_marked_for_removal() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    let id = h.scene.spawn(system, Recorder::default()).unwrap().build();
    h.frame();
    assert_eq!(h.scene.system(system).unwrap().behavior::<Recorder>(id).unwrap().updates, 1);

    h.scene.system_mut(system).unwrap().mark_for_removal(id);
    let stats = h.frame();
    assert_eq!(stats.updated, 0);
    assert_eq!(stats.removed, 1);
}

#[test]
fn test_same_inputs_give_same_world() {
    let run = || {
        let mut h = Harness::new();
        let system = h.scene.add_system("actors");
        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(h.spawn_body(system, Vec2::new(i as f32 * 12.0, 0.0), solid(), Recorder::default()));
        }
        for _ in 0..30 {
            h.scene.simulate(&h.input).unwrap();
        }
        let system = h.scene.system(system).unwrap();
        ids.iter()
            .map(|&id| system.find_transform(id).unwrap().position_2d())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
#[should_panic(expected = "no longer exists")]
fn test_collision_with_missing_entity_is_fatal() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    h.spawn_body(system, Vec2::new(0.0, 0.0), solid(), Recorder::default());
    let ghost = EntityKey::new(system, EntityId::from_raw(999));
    h.scene
        .physics_mut()
        .create_body(&sensor(), Vec2::new(2.0, 0.0), 0.0, ghost)
        .unwrap();
    let input = InputState::new();
    let _ = h.scene.simulate(&input);
}

#[test]
fn test_populate_from_definition() {
    let mut h = Harness::new();
    let json = r#"{
        "name": "arena",
        "tile_size": 16.0,
        "layers": [{ "name": "floor", "layer": -5, "groups": [
            { "material": "white", "columns": 2, "rows": 2,
              "tiles": [{ "x": 0, "y": 0, "index": 0 }, { "x": 1, "y": 0, "index": 3 }] }
        ]}],
        "entities": [{ "name": "crate", "metadata": { "size": 10.0 },
            "instances": [{ "x": 5.0, "y": 6.0 }, { "x": 50.0, "y": 6.0, "metadata": { "size": 20.0 } }] }]
    }"#;
    let definition = SceneDefinition::from_json(json).unwrap();
    assert_eq!(definition.instance_count(), 2);

    let mut factories = EntityFactories::new();
    let sprite = h.sprite.clone();
    factories.register("crate", move |scene, _renderer, spawn| {
        let size = spawn.metadata_f32("size").unwrap_or(1.0);
        let id = scene
            .spawn(spawn.system, ())?
            .attach_transform(Transform::at(spawn.position.x, spawn.position.y).with_scale(Vec2::new(size, size)))?
            .attach_sprite(&sprite)?
            .build();
        Ok(EntityKey::new(spawn.system, id))
    });

    let report = h.scene.populate(&definition, &factories, &mut h.renderer).unwrap();
    assert_eq!(report.tiles, 2);
    assert_eq!(report.entities.len(), 2);
    let crates = h.scene.system_by_name("crate").unwrap();
    let second = h.scene.system(crates).unwrap().find_transform(report.entities[1].entity).unwrap();
    assert_eq!(second.scale(), Vec2::new(20.0, 20.0));

    // Two tiles and two crates
    assert_eq!(h.scene.submit(&mut h.renderer), 4);
}

#[test]
fn test_populate_rejects_unknown_factory_before_spawning() {
    let mut h = Harness::new();
    let definition = SceneDefinition::from_json(
        r#"{ "name": "x", "entities": [{ "name": "dragon", "instances": [{ "x": 0.0, "y": 0.0 }] }] }"#,
    )
    .unwrap();
    let result = h.scene.populate(&definition, &EntityFactories::new(), &mut h.renderer);
    assert!(matches!(result, Err(SceneError::UnknownFactory(name)) if name == "dragon"));
    assert_eq!(h.scene.entity_count(), 0);
}

#[test]
fn test_malformed_definition_is_an_error() {
    assert!(matches!(
        SceneDefinition::from_json("{ \"name\": 3 }"),
        Err(SceneError::Definition(_))
    ));
}

#[test]
fn test_active_camera_reaches_renderer() {
    let mut h = Harness::new();
    let id = h
        .scene
        .cameras_mut()
        .add("far", Camera2D::new(100.0, 100.0).with_position(Vec2::new(500.0, 0.0)));
    h.scene.cameras_mut().set_active(id);
    h.scene.submit(&mut h.renderer);
    let expected = h.scene.cameras().active().unwrap().view_projection();
    assert_eq!(h.renderer.view_projection(), &expected);
}

#[test]
fn test_clear_empties_scene() {
    let mut h = Harness::new();
    let system = h.scene.add_system("actors");
    h.spawn_body(system, Vec2::new(0.0, 0.0), solid(), Recorder::default());
    h.scene.commands_mut().despawn(EntityKey::new(system, EntityId::from_raw(1)));
    h.scene.clear();
    assert_eq!(h.scene.entity_count(), 0);
    assert_eq!(h.scene.physics().body_count(), 0);
    assert!(h.scene.commands_mut().is_empty());
}
