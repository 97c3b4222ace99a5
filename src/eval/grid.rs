// eval/grid.rs - Square vertex grid and its flat position buffer
//
// A grid of `(resolution + 1)²` vertices covers a square of side `width`
// centred on the origin. Vertex (i, j) lives at buffer offset
// `(i * (resolution + 1) + j) * 3` as an (x, y, z) triple of f32, the layout
// the renderer's Float32Array expects.

use serde::{Deserialize, Serialize};

/// Grid shape: vertex count per side is `resolution + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub resolution: u32,
    pub width: f64,
}

impl GridSpec {
    pub fn new(resolution: u32, width: f64) -> Self {
        Self { resolution, width }
    }

    /// Vertices per side.
    #[inline]
    pub fn side(&self) -> usize {
        self.resolution as usize + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.side() * self.side()
    }

    /// Length of the matching position buffer (three floats per vertex).
    pub fn buffer_len(&self) -> usize {
        self.vertex_count() * 3
    }

    /// Distance between neighbouring vertices. Zero for a degenerate grid.
    #[inline]
    pub fn spacing(&self) -> f64 {
        if self.resolution == 0 {
            0.0
        } else {
            self.width / self.resolution as f64
        }
    }

    /// World coordinate of grid index `i` along either axis.
    #[inline]
    pub fn coord(&self, i: usize) -> f64 {
        (i as f64 - self.resolution as f64 / 2.0) * self.spacing()
    }

    /// World (x, z) of vertex (i, j).
    #[inline]
    pub fn position(&self, i: usize, j: usize) -> (f64, f64) {
        (self.coord(i), self.coord(j))
    }

    /// Offset of vertex (i, j)'s x component in the position buffer.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        (i * self.side() + j) * 3
    }

    /// Build a flat buffer with x/z filled in and every height at zero.
    pub fn build_buffer(&self) -> Vec<f32> {
        let side = self.side();
        let mut buffer = Vec::with_capacity(self.buffer_len());
        for i in 0..side {
            let x = self.coord(i) as f32;
            for j in 0..side {
                buffer.push(x);
                buffer.push(0.0);
                buffer.push(self.coord(j) as f32);
            }
        }
        buffer
    }
}

/// Min/max over the y components of a position buffer.
///
/// Returns `(0.0, 0.0)` for an empty buffer.
pub fn height_range(buffer: &[f32]) -> (f32, f32) {
    let mut min_val = f32::MAX;
    let mut max_val = f32::MIN;
    for vertex in buffer.chunks_exact(3) {
        min_val = min_val.min(vertex[1]);
        max_val = max_val.max(vertex[1]);
    }
    if min_val > max_val {
        (0.0, 0.0)
    } else {
        (min_val, max_val)
    }
}

/// Copy out the y components in buffer order.
pub fn heights(buffer: &[f32]) -> Vec<f32> {
    buffer.chunks_exact(3).map(|v| v[1]).collect()
}
