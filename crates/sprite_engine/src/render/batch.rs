//! Sprite batching
//!
//! Groups every batched sprite sharing a material and a layer into one
//! instanced draw. Each batch owns a vertex buffer sized for its sprite
//! count. The buffer is rebuilt only when that count changes; a frame where
//! sprites merely moved re-uploads the per-instance uniforms and nothing else.

use super::{DrawCall, Drawable, IndexBufferId, MaterialId, RenderBackend, RenderResult, SpriteUniform, Vertex, VertexBufferId};
use std::collections::{BTreeSet, HashMap};

/// Batcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Vertex buffer rebuilds
    pub rebuilds: u64,
    /// Instance buffer uploads
    pub instance_updates: u64,
    /// Instanced draws issued
    pub draw_calls: u64,
}

#[derive(Debug, Default)]
struct Batch {
    buffers: Option<(VertexBufferId, IndexBufferId)>,
    built_count: usize,
    pending: Vec<SpriteUniform>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BatchKey {
    layer: i32,
    material: MaterialId,
}

/// Per-(layer, material) instanced sprite batcher
#[derive(Debug, Default)]
pub struct SpriteBatcher {
    batches: HashMap<BatchKey, Batch>,
    order: Vec<BatchKey>,
    stats: BatchStats,
}

impl SpriteBatcher {
    /// Create an empty batcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sprite to this frame's batch for its material and layer
    pub fn add(&mut self, drawable: &Drawable) {
        let key = BatchKey {
            layer: drawable.layer,
            material: drawable.material,
        };
        let batch = self.batches.entry(key).or_insert_with(|| {
            self.order.push(key);
            Batch::default()
        });
        batch.pending.push(drawable.uniform);
    }

    /// Sprites queued this frame
    pub fn pending(&self) -> usize {
        self.batches.values().map(|batch| batch.pending.len()).sum()
    }

    /// Counters
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Vertex buffer currently backing the batch of `material` on `layer`
    pub fn vertex_buffer(&self, material: MaterialId, layer: i32) -> Option<VertexBufferId> {
        self.batches.get(&BatchKey { layer, material })?.buffers.map(|(vb, _)| vb)
    }

    /// Layers that have a batch, ascending
    ///
    /// Includes batches emptied this frame so their buffers get released.
    pub fn layers(&self) -> BTreeSet<i32> {
        self.order.iter().map(|key| key.layer).collect()
    }

    /// Upload and draw every batch, lowest layer first
    pub fn flush(&mut self, backend: &mut dyn RenderBackend) -> RenderResult<usize> {
        let mut draws = 0;
        for layer in self.layers() {
            draws += self.flush_layer(backend, layer)?;
        }
        Ok(draws)
    }

    /// Upload and draw the batches on `layer`
    pub fn flush_layer(&mut self, backend: &mut dyn RenderBackend, layer: i32) -> RenderResult<usize> {
        let mut draws = 0;
        for key in self.order.iter().filter(|key| key.layer == layer) {
            let Some(batch) = self.batches.get_mut(key) else {
                continue;
            };
            let material = key.material;
            let count = batch.pending.len();
            if count != batch.built_count {
                if let Some((vb, ib)) = batch.buffers.take() {
                    backend.destroy_vertex_buffer(vb);
                    backend.destroy_index_buffer(ib);
                }
                if count > 0 {
                    batch.buffers = Some(build_buffers(backend, count)?);
                }
                log::trace!("Rebuilt batch for {material:?}: {} -> {count} sprites", batch.built_count);
                batch.built_count = count;
                self.stats.rebuilds += 1;
            }
            let Some((vertex_buffer, index_buffer)) = batch.buffers else {
                continue;
            };
            backend.update_instance_buffer(vertex_buffer, &batch.pending)?;
            self.stats.instance_updates += 1;
            backend.draw(&DrawCall {
                material,
                vertex_buffer,
                index_buffer,
                index_count: 6,
                instance_count: u32::try_from(count).unwrap_or(u32::MAX),
                uniforms: &[],
            })?;
            self.stats.draw_calls += 1;
            draws += 1;
        }
        Ok(draws)
    }

    /// Forget this frame's sprites, keeping the built buffers
    pub fn clear_frame(&mut self) {
        for batch in self.batches.values_mut() {
            batch.pending.clear();
        }
    }

    /// Destroy every buffer the batcher owns
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        for batch in self.batches.values_mut() {
            if let Some((vb, ib)) = batch.buffers.take() {
                backend.destroy_vertex_buffer(vb);
                backend.destroy_index_buffer(ib);
            }
            batch.built_count = 0;
        }
    }
}

fn build_buffers(backend: &mut dyn RenderBackend, count: usize) -> RenderResult<(VertexBufferId, IndexBufferId)> {
    let (quad_vertices, quad_indices) = Vertex::quad();
    let mut vertices = Vec::with_capacity(count * quad_vertices.len());
    let mut indices = Vec::with_capacity(count * quad_indices.len());
    for sprite in 0..count {
        let base = u32::try_from(sprite * quad_vertices.len()).unwrap_or(u32::MAX);
        vertices.extend_from_slice(&quad_vertices);
        indices.extend(quad_indices.iter().map(|index| base + index));
    }
    Ok((backend.create_vertex_buffer(&vertices)?, backend.create_index_buffer(&indices)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use crate::render::{HeadlessBackend, MaterialDesc};

    fn sprite(material: MaterialId, backend: &mut HeadlessBackend) -> Drawable {
        let (vertices, indices) = Vertex::quad();
        Drawable {
            material,
            vertex_buffer: backend.create_vertex_buffer(&vertices).unwrap(),
            index_buffer: backend.create_index_buffer(&indices).unwrap(),
            index_count: 6,
            uniform: SpriteUniform::default(),
            layer: 0,
        }
    }

    #[test]
    fn test_rebuild_only_when_count_changes() {
        let mut backend = HeadlessBackend::new(64, 64);
        let material = backend
            .create_material(&MaterialDesc::flat("rock", Vec4::new(1.0, 1.0, 1.0, 1.0)))
            .unwrap();
        let sprites: Vec<Drawable> = (0..3).map(|_| sprite(material, &mut backend)).collect();
        let mut batcher = SpriteBatcher::new();

        // Three frames with the same three sprites: one rebuild
        for _ in 0..3 {
            for drawable in &sprites {
                batcher.add(drawable);
            }
            assert_eq!(batcher.flush(&mut backend).unwrap(), 1);
            batcher.clear_frame();
        }
        assert_eq!(batcher.stats().rebuilds, 1);
        assert_eq!(batcher.stats().instance_updates, 3);

        // One sprite removed: rebuild
        for drawable in &sprites[..2] {
            batcher.add(drawable);
        }
        batcher.flush(&mut backend).unwrap();
        assert_eq!(batcher.stats().rebuilds, 2);
    }

    #[test]
    fn test_one_draw_per_material() {
        let mut backend = HeadlessBackend::new(64, 64);
        let recorder = backend.recorder();
        let red = backend
            .create_material(&MaterialDesc::flat("red", Vec4::new(1.0, 0.0, 0.0, 1.0)))
            .unwrap();
        let blue = backend
            .create_material(&MaterialDesc::flat("blue", Vec4::new(0.0, 0.0, 1.0, 1.0)))
            .unwrap();
        let mut batcher = SpriteBatcher::new();
        for _ in 0..10 {
            let drawable = sprite(red, &mut backend);
            batcher.add(&drawable);
        }
        for _ in 0..5 {
            let drawable = sprite(blue, &mut backend);
            batcher.add(&drawable);
        }

        assert_eq!(batcher.flush(&mut backend).unwrap(), 2);
        let log = recorder.log();
        assert_eq!(log.draws.len(), 2);
        assert_eq!(log.draws[0].instance_count, 10);
        assert_eq!(log.draws[1].instance_count, 5);
    }

    #[test]
    fn test_emptied_batch_releases_buffers() {
        let mut backend = HeadlessBackend::new(64, 64);
        let material = backend
            .create_material(&MaterialDesc::flat("rock", Vec4::new(1.0, 1.0, 1.0, 1.0)))
            .unwrap();
        let drawable = sprite(material, &mut backend);
        let mut batcher = SpriteBatcher::new();

        batcher.add(&drawable);
        batcher.flush(&mut backend).unwrap();
        batcher.clear_frame();
        assert!(batcher.vertex_buffer(material, 0).is_some());

        assert_eq!(batcher.flush(&mut backend).unwrap(), 0);
        assert!(batcher.vertex_buffer(material, 0).is_none());
    }

    #[test]
    fn test_layers_split_a_material_and_draw_in_order() {
        let mut backend = HeadlessBackend::new(64, 64);
        let recorder = backend.recorder();
        let rock = backend
            .create_material(&MaterialDesc::flat("rock", Vec4::new(1.0, 1.0, 1.0, 1.0)))
            .unwrap();
        let mut batcher = SpriteBatcher::new();
        let top = Drawable {
            layer: 4,
            ..sprite(rock, &mut backend)
        };
        batcher.add(&top);
        batcher.add(&top);
        batcher.add(&sprite(rock, &mut backend));

        assert_eq!(batcher.flush(&mut backend).unwrap(), 2);
        let log = recorder.log();
        assert_eq!(log.draws[0].instance_count, 1);
        assert_eq!(log.draws[1].instance_count, 2);
        assert_eq!(Some(log.draws[1].vertex_buffer), batcher.vertex_buffer(rock, 4));
    }
}
