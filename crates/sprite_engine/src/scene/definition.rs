//! Scene descriptions
//!
//! A scene file is JSON: tile layers plus entity types with placed
//! instances. Entity types are turned into entities by factories registered
//! under the type name, so the file never needs to know about behaviors.
//!
//! ```json
//! {
//!   "name": "arena",
//!   "tile_size": 32.0,
//!   "layers": [{ "name": "floor", "layer": -10, "groups": [
//!     { "material": "tiles", "columns": 8, "rows": 8,
//!       "tiles": [{ "x": 0, "y": 0, "index": 3 }] }
//!   ]}],
//!   "entities": [{ "name": "enemy", "metadata": { "speed": 40.0 },
//!     "instances": [{ "x": 100.0, "y": 50.0 }] }]
//! }
//! ```

use super::{Scene, SceneError, Tile, TileGroup, TileLayer, Tilemap};
use crate::ecs::{EntityKey, SystemId};
use crate::foundation::math::Vec2;
use crate::render::Renderer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn default_tile_size() -> f32 {
    32.0
}

/// Parsed scene file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDefinition {
    /// Scene name
    pub name: String,
    /// Tile edge in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// Tile layers, drawn in file order within equal draw layers
    #[serde(default)]
    pub layers: Vec<LayerDefinition>,
    /// Entity types and their placements
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

/// Tile layer entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDefinition {
    /// Layer name
    pub name: String,
    /// Draw layer
    #[serde(default)]
    pub layer: i32,
    /// Tile groups
    #[serde(default)]
    pub groups: Vec<TileGroupDefinition>,
}

/// Tiles sharing one sprite-sheet material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGroupDefinition {
    /// Material name, as registered with the renderer
    pub material: String,
    /// Sheet columns
    pub columns: u32,
    /// Sheet rows
    pub rows: u32,
    /// Tiles
    #[serde(default)]
    pub tiles: Vec<Tile>,
}

/// Entity type entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Factory name
    pub name: String,
    /// Entity system to spawn into; defaults to the factory name
    #[serde(default)]
    pub system: Option<String>,
    /// Values shared by every instance
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Placements
    #[serde(default)]
    pub instances: Vec<InstanceDefinition>,
}

/// One placed entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDefinition {
    /// World x
    pub x: f32,
    /// World y
    pub y: f32,
    /// Rotation in radians
    #[serde(default)]
    pub rotation: f32,
    /// Per-instance overrides of the type metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SceneDefinition {
    /// Parse a scene from JSON text
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize back to pretty JSON
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total placed instances
    pub fn instance_count(&self) -> usize {
        self.entities.iter().map(|e| e.instances.len()).sum()
    }
}

/// Everything a factory knows about the instance it is spawning
#[derive(Debug, Clone, Copy)]
pub struct EntitySpawn<'a> {
    /// Entity type name
    pub name: &'a str,
    /// System to spawn into
    pub system: SystemId,
    /// World position
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    type_metadata: &'a Map<String, Value>,
    instance_metadata: &'a Map<String, Value>,
}

impl<'a> EntitySpawn<'a> {
    /// Metadata value; instance values shadow type values
    pub fn metadata(&self, key: &str) -> Option<&'a Value> {
        self.instance_metadata.get(key).or_else(|| self.type_metadata.get(key))
    }

    /// Numeric metadata value
    pub fn metadata_f32(&self, key: &str) -> Option<f32> {
        self.metadata(key).and_then(Value::as_f64).map(|v| v as f32)
    }

    /// String metadata value
    pub fn metadata_str(&self, key: &str) -> Option<&'a str> {
        self.metadata(key).and_then(Value::as_str)
    }
}

/// Builds one entity from a placement
pub type EntityFactory = Box<dyn Fn(&mut Scene, &mut Renderer, &EntitySpawn<'_>) -> Result<EntityKey, SceneError>>;

/// Factories by entity type name
#[derive(Default)]
pub struct EntityFactories {
    factories: HashMap<String, EntityFactory>,
}

impl std::fmt::Debug for EntityFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("EntityFactories").field("names", &names).finish()
    }
}

impl EntityFactories {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one of that name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&mut Scene, &mut Renderer, &EntitySpawn<'_>) -> Result<EntityKey, SceneError> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Whether a factory exists for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    fn get(&self, name: &str) -> Result<&EntityFactory, SceneError> {
        self.factories
            .get(name)
            .ok_or_else(|| SceneError::UnknownFactory(name.to_string()))
    }
}

/// What [`Scene::populate`] created
#[derive(Debug, Clone, Default)]
pub struct PopulateReport {
    /// Index of the created tilemap, if the definition had layers
    pub tilemap: Option<usize>,
    /// Tiles placed
    pub tiles: usize,
    /// Entities spawned, in file order
    pub entities: Vec<EntityKey>,
}

impl Scene {
    /// Build tilemap and entities from a definition
    ///
    /// Materials named by tile groups must already be registered with the
    /// renderer. Every entity type is checked for a factory before anything
    /// is spawned.
    pub fn populate(
        &mut self,
        definition: &SceneDefinition,
        factories: &EntityFactories,
        renderer: &mut Renderer,
    ) -> Result<PopulateReport, SceneError> {
        for entity in &definition.entities {
            factories.get(&entity.name)?;
        }

        let mut report = PopulateReport::default();
        if !definition.layers.is_empty() {
            let (vertex_buffer, index_buffer) = renderer.create_quad()?;
            let mut tilemap = Tilemap::new(definition.name.clone(), definition.tile_size);
            for layer in &definition.layers {
                let mut groups = Vec::with_capacity(layer.groups.len());
                for group in &layer.groups {
                    groups.push(TileGroup {
                        material: renderer.material(&group.material)?,
                        vertex_buffer,
                        index_buffer,
                        columns: group.columns,
                        rows: group.rows,
                        tiles: group.tiles.clone(),
                    });
                }
                tilemap.add_layer(TileLayer {
                    name: layer.name.clone(),
                    layer: layer.layer,
                    groups,
                });
            }
            report.tiles = tilemap.tile_count();
            report.tilemap = Some(self.add_tilemap(tilemap));
        }

        for entity in &definition.entities {
            let factory = factories.get(&entity.name)?;
            let system_name = entity.system.as_deref().unwrap_or(&entity.name);
            let system = match self.system_by_name(system_name) {
                Some(id) => id,
                None => self.add_system(system_name),
            };
            for instance in &entity.instances {
                let spawn = EntitySpawn {
                    name: &entity.name,
                    system,
                    position: Vec2::new(instance.x, instance.y),
                    rotation: instance.rotation,
                    type_metadata: &entity.metadata,
                    instance_metadata: &instance.metadata,
                };
                report.entities.push(factory(self, renderer, &spawn)?);
            }
        }

        log::info!(
            "Scene '{}' populated: {} tiles, {} entities",
            definition.name,
            report.tiles,
            report.entities.len()
        );
        Ok(report)
    }
}
