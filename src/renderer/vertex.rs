//! Vertex types for textured sprite quads

use bytemuck::{Pod, Zeroable};

/// One corner of a sprite quad, in screen pixels with normalized texture
/// coordinates
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    /// Index into `Graphics::images`, the texture to sample
    pub image: u32,
}

impl SpriteVertex {
    pub const fn new(position: [f32; 2], uv: [f32; 2], image: u32) -> Self {
        Self {
            position,
            uv,
            image,
        }
    }
}

/// Triangle-list indices for `quads` quads of four vertices each
/// (top-left, top-right, bottom-right, bottom-left)
pub fn quad_indices(quads: usize) -> Vec<u32> {
    (0..quads as u32)
        .flat_map(|quad| {
            let base = quad * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect()
}
