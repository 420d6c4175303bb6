//! Per-(material, vertex buffer) draw queues

use super::{DrawCall, Drawable, MaterialId, RenderBackend, RenderResult, VertexBufferId};
use crate::foundation::logging::fatal;

/// Identity of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Material every queued drawable uses
    pub material: MaterialId,
    /// Vertex buffer every queued drawable uses
    pub vertex_buffer: VertexBufferId,
}

impl PipelineKey {
    /// Key a drawable belongs under
    pub fn of(drawable: &Drawable) -> Self {
        Self {
            material: drawable.material,
            vertex_buffer: drawable.vertex_buffer,
        }
    }
}

/// Draw queue for drawables sharing one material and vertex buffer
///
/// The queue accumulates during the frame and is flushed once when the
/// renderer presents. It is cleared only after the frame reached the
/// screen, so a frame that has to be retried redraws the same content.
#[derive(Debug)]
pub struct Pipeline {
    key: PipelineKey,
    queue: Vec<Drawable>,
    sorted: bool,
    flushes: u64,
}

impl Pipeline {
    /// Empty pipeline for `key`
    pub fn new(key: PipelineKey) -> Self {
        Self {
            key,
            queue: Vec::new(),
            sorted: true,
            flushes: 0,
        }
    }

    /// Pipeline identity
    pub fn key(&self) -> PipelineKey {
        self.key
    }

    /// Queue a drawable
    ///
    /// A drawable whose material or vertex buffer differs from the
    /// pipeline's is a renderer bug and terminates the process.
    pub fn enqueue(&mut self, drawable: Drawable) {
        if PipelineKey::of(&drawable) != self.key {
            fatal(format!(
                "drawable for {:?} queued on pipeline {:?}",
                PipelineKey::of(&drawable),
                self.key
            ));
        }
        self.queue.push(drawable);
        self.sorted = false;
    }

    /// Drawables queued this frame
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Times the pipeline has been flushed
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// Layers with at least one queued drawable, ascending
    pub fn layers(&mut self) -> impl Iterator<Item = i32> + '_ {
        self.sort();
        let mut last = None;
        self.queue.iter().filter_map(move |drawable| {
            if last == Some(drawable.layer) {
                return None;
            }
            last = Some(drawable.layer);
            last
        })
    }

    /// Record a draw for every queued drawable on `layer`, in submission order
    pub fn draw_layer(&mut self, backend: &mut dyn RenderBackend, layer: i32) -> RenderResult<usize> {
        self.sort();
        let start = self.queue.partition_point(|drawable| drawable.layer < layer);
        let end = self.queue.partition_point(|drawable| drawable.layer <= layer);
        for drawable in &self.queue[start..end] {
            backend.draw(&DrawCall {
                material: drawable.material,
                vertex_buffer: drawable.vertex_buffer,
                index_buffer: drawable.index_buffer,
                index_count: drawable.index_count,
                instance_count: 1,
                uniforms: std::slice::from_ref(&drawable.uniform),
            })?;
        }
        Ok(end - start)
    }

    /// Count a completed flush of this frame's queue
    pub fn mark_flushed(&mut self) {
        self.flushes += 1;
    }

    /// Record a draw for every queued drawable, lowest layer first
    pub fn flush(&mut self, backend: &mut dyn RenderBackend) -> RenderResult<usize> {
        let layers: Vec<i32> = self.layers().collect();
        let mut drawn = 0;
        for layer in layers {
            drawn += self.draw_layer(backend, layer)?;
        }
        self.mark_flushed();
        Ok(drawn)
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.queue.sort_by_key(|drawable| drawable.layer);
            self.sorted = true;
        }
    }

    /// Drop the queue once its frame has been presented or abandoned
    pub fn clear(&mut self) {
        self.queue.clear();
        self.sorted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessBackend, IndexBufferId, MaterialDesc, SpriteUniform, Vertex};
    use crate::foundation::math::Vec4;

    fn drawable(backend: &mut HeadlessBackend) -> Drawable {
        let (vertices, indices) = Vertex::quad();
        Drawable {
            material: backend
                .create_material(&MaterialDesc::flat("m", Vec4::new(1.0, 1.0, 1.0, 1.0)))
                .unwrap(),
            vertex_buffer: backend.create_vertex_buffer(&vertices).unwrap(),
            index_buffer: backend.create_index_buffer(&indices).unwrap(),
            index_count: 6,
            uniform: SpriteUniform::default(),
            layer: 0,
        }
    }

    #[test]
    fn test_flush_draws_each_queued_drawable() {
        let mut backend = HeadlessBackend::new(64, 64);
        let recorder = backend.recorder();
        let first = drawable(&mut backend);
        let mut pipeline = Pipeline::new(PipelineKey::of(&first));
        pipeline.enqueue(first);
        pipeline.enqueue(Drawable { layer: -1, ..first });

        assert_eq!(pipeline.flush(&mut backend).unwrap(), 2);
        pipeline.clear();
        assert_eq!(pipeline.queued(), 0);
        assert_eq!(pipeline.flush_count(), 1);
        assert_eq!(recorder.log().draws.len(), 2);
    }

    #[test]
    fn test_draw_layer_keeps_submission_order() {
        let mut backend = HeadlessBackend::new(64, 64);
        let recorder = backend.recorder();
        let first = drawable(&mut backend);
        let (_, indices) = Vertex::quad();
        let second = backend.create_index_buffer(&indices).unwrap();
        let third = backend.create_index_buffer(&indices).unwrap();
        let mut pipeline = Pipeline::new(PipelineKey::of(&first));
        pipeline.enqueue(Drawable { layer: 3, ..first });
        pipeline.enqueue(Drawable { index_buffer: second, ..first });
        pipeline.enqueue(Drawable { layer: 3, index_buffer: third, ..first });

        assert_eq!(pipeline.layers().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(pipeline.draw_layer(&mut backend, 3).unwrap(), 2);
        assert_eq!(pipeline.draw_layer(&mut backend, 1).unwrap(), 0);
        let drawn: Vec<IndexBufferId> = recorder.log().draws.iter().map(|draw| draw.index_buffer).collect();
        assert_eq!(drawn, vec![first.index_buffer, third]);
    }

    #[test]
    #[should_panic(expected = "queued on pipeline")]
    fn test_identity_mismatch_is_fatal() {
        let mut backend = HeadlessBackend::new(64, 64);
        let first = drawable(&mut backend);
        let other = drawable(&mut backend);
        let mut pipeline = Pipeline::new(PipelineKey::of(&first));
        pipeline.enqueue(other);
    }
}
