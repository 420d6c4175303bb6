//! Tilemaps
//!
//! Static grids of sprite-sheet tiles. A map has layers, a layer has groups
//! of tiles that share a material. Tile drawables never change, so they are
//! built once when a layer is added and re-queued every frame.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::{Drawable, IndexBufferId, MaterialId, Renderer, SpriteUniform, VertexBufferId};
use serde::{Deserialize, Serialize};

/// One tile: grid cell plus sprite-sheet index (row-major)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Grid column
    pub x: i32,
    /// Grid row
    pub y: i32,
    /// Index into the sprite sheet
    pub index: u32,
}

/// Tiles sharing a material
#[derive(Debug, Clone)]
pub struct TileGroup {
    /// Sprite-sheet material
    pub material: MaterialId,
    /// Quad vertex buffer
    pub vertex_buffer: VertexBufferId,
    /// Quad index buffer
    pub index_buffer: IndexBufferId,
    /// Sheet columns
    pub columns: u32,
    /// Sheet rows
    pub rows: u32,
    /// Tiles
    pub tiles: Vec<Tile>,
}

/// Named layer of tile groups
#[derive(Debug, Clone)]
pub struct TileLayer {
    /// Layer name
    pub name: String,
    /// Draw layer; lower draws first
    pub layer: i32,
    /// Groups
    pub groups: Vec<TileGroup>,
}

/// Tilemap
#[derive(Debug, Clone)]
pub struct Tilemap {
    name: String,
    tile_size: f32,
    origin: Vec2,
    layers: Vec<TileLayer>,
    drawables: Vec<Drawable>,
    /// Hidden maps are not submitted
    pub visible: bool,
}

impl Tilemap {
    /// Empty map with square tiles of `tile_size` pixels
    pub fn new(name: impl Into<String>, tile_size: f32) -> Self {
        Self {
            name: name.into(),
            tile_size,
            origin: Vec2::zeros(),
            layers: Vec::new(),
            drawables: Vec::new(),
            visible: true,
        }
    }

    /// Builder pattern: world position of the grid's (0, 0) corner
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Map name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tile size in pixels
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Layers
    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    /// Add a layer and build its drawables
    pub fn add_layer(&mut self, layer: TileLayer) {
        for group in &layer.groups {
            let columns = group.columns.max(1);
            let tile_scale = Vec2::new(1.0 / columns as f32, 1.0 / group.rows.max(1) as f32);
            for tile in &group.tiles {
                let center = self.cell_center(tile.x, tile.y);
                let model = Mat4::new_translation(&Vec3::new(center.x, center.y, 0.0))
                    * Mat4::new_nonuniform_scaling(&Vec3::new(self.tile_size, self.tile_size, 1.0));
                let cell = Vec2::new((tile.index % columns) as f32, (tile.index / columns) as f32);
                self.drawables.push(Drawable {
                    material: group.material,
                    vertex_buffer: group.vertex_buffer,
                    index_buffer: group.index_buffer,
                    index_count: 6,
                    uniform: SpriteUniform::new(
                        &model,
                        Vec4::new(1.0, 1.0, 1.0, 1.0),
                        cell.component_mul(&tile_scale),
                        tile_scale,
                    ),
                    layer: layer.layer,
                });
            }
        }
        log::debug!("Tilemap '{}': layer '{}' added", self.name, layer.name);
        self.layers.push(layer);
    }

    /// Total tiles across all layers
    pub fn tile_count(&self) -> usize {
        self.drawables.len()
    }

    /// World-space centre of grid cell (x, y)
    pub fn cell_center(&self, x: i32, y: i32) -> Vec2 {
        self.origin + Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * self.tile_size
    }

    /// Grid cell containing a world position
    pub fn world_to_cell(&self, position: Vec2) -> (i32, i32) {
        let local = (position - self.origin) / self.tile_size;
        (local.x.floor() as i32, local.y.floor() as i32)
    }

    /// Tile at a grid cell in the named layer
    pub fn tile_at(&self, layer: &str, x: i32, y: i32) -> Option<&Tile> {
        self.layers
            .iter()
            .filter(|l| l.name == layer)
            .flat_map(|l| l.groups.iter())
            .flat_map(|g| g.tiles.iter())
            .find(|t| t.x == x && t.y == y)
    }

    /// Queue every tile
    pub fn submit(&self, renderer: &mut Renderer) -> usize {
        if !self.visible {
            return 0;
        }
        for drawable in &self.drawables {
            renderer.submit_sprite(*drawable);
        }
        self.drawables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn group(tiles: Vec<Tile>) -> TileGroup {
        let mut materials: SlotMap<MaterialId, ()> = SlotMap::with_key();
        let mut vbs: SlotMap<VertexBufferId, ()> = SlotMap::with_key();
        let mut ibs: SlotMap<IndexBufferId, ()> = SlotMap::with_key();
        TileGroup {
            material: materials.insert(()),
            vertex_buffer: vbs.insert(()),
            index_buffer: ibs.insert(()),
            columns: 4,
            rows: 2,
            tiles,
        }
    }

    #[test]
    fn test_tile_drawables_use_sheet_cell() {
        let mut map = Tilemap::new("level", 32.0);
        map.add_layer(TileLayer {
            name: "ground".into(),
            layer: -1,
            groups: vec![group(vec![Tile { x: 1, y: 2, index: 5 }])],
        });
        assert_eq!(map.tile_count(), 1);
        let uniform = map.drawables[0].uniform;
        // index 5 on a 4x2 sheet is column 1, row 1
        assert_eq!(uniform.tile_offset, [0.25, 0.5]);
        assert_eq!(uniform.model[3][0], 48.0);
        assert_eq!(uniform.model[3][1], 80.0);
    }

    #[test]
    fn test_cell_lookup() {
        let mut map = Tilemap::new("level", 16.0).with_origin(Vec2::new(-32.0, 0.0));
        map.add_layer(TileLayer {
            name: "walls".into(),
            layer: 0,
            groups: vec![group(vec![Tile { x: 0, y: 0, index: 1 }])],
        });
        assert_eq!(map.world_to_cell(Vec2::new(-31.0, 1.0)), (0, 0));
        assert_eq!(map.world_to_cell(Vec2::new(-33.0, 1.0)), (-1, 0));
        assert_eq!(map.tile_at("walls", 0, 0).map(|t| t.index), Some(1));
        assert!(map.tile_at("ground", 0, 0).is_none());
    }
}
