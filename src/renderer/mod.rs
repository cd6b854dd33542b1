//! Render boundary
//!
//! The simulation never draws. Each frame it hands out a list of
//! `RenderDescriptor`s sorted by `(depth, id)`; this module turns that list
//! into textured quads that an external renderer can upload as-is.

pub mod vertex;

pub use vertex::{SpriteVertex, quad_indices};

use glam::Vec2;

use crate::sim::collision::Owner;
use crate::sim::fixed::Fixed;
use crate::sim::graphics::Graphics;
use crate::sim::point::Point;

/// What to draw for one object this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDescriptor {
    /// Index into `Graphics::sprites`
    pub sprite: usize,
    /// World position of the sprite's top-left corner
    pub position: Point,
    pub depth: i32,
    /// 0 for the world plane; positive values scroll slower than the camera
    pub parallax: Fixed,
    /// Tie-breaker for equal depths, stable across frames
    pub id: usize,
    pub owner: Owner,
}

impl RenderDescriptor {
    /// Top-left corner on screen for a camera at `camera`.
    ///
    /// A parallax layer follows the camera by `1 - parallax`.
    pub fn screen_position(&self, camera: Point) -> Point {
        self.position - camera + camera * self.parallax
    }
}

/// Vertices and indices for a sorted descriptor list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
}

/// Four vertices per descriptor, in list order.
///
/// Descriptors whose sprite or image is missing are skipped, as are quads
/// entirely outside the `screen` rectangle anchored at the origin.
pub fn build_quads(
    graphics: &Graphics,
    list: &[RenderDescriptor],
    camera: Point,
    screen: Vec2,
) -> QuadBatch {
    let mut vertices = Vec::with_capacity(list.len() * 4);
    for descriptor in list {
        let Some(sprite) = graphics.sprite(descriptor.sprite) else {
            continue;
        };
        let Some(image) = graphics.images.get(sprite.image) else {
            continue;
        };
        if image.width <= 0 || image.height <= 0 {
            continue;
        }

        let origin = descriptor.screen_position(camera).to_vec2();
        let size = Vec2::new(sprite.rect.width() as f32, sprite.rect.height() as f32);
        let end = origin + size;
        if end.x <= 0.0 || end.y <= 0.0 || origin.x >= screen.x || origin.y >= screen.y {
            continue;
        }
        let texture = Vec2::new(image.width as f32, image.height as f32);
        let uv_min = Vec2::new(sprite.rect.min.x as f32, sprite.rect.min.y as f32) / texture;
        let uv_max = Vec2::new(sprite.rect.max.x as f32, sprite.rect.max.y as f32) / texture;

        let corners = [
            (Vec2::ZERO, uv_min),
            (Vec2::new(size.x, 0.0), Vec2::new(uv_max.x, uv_min.y)),
            (size, uv_max),
            (Vec2::new(0.0, size.y), Vec2::new(uv_min.x, uv_max.y)),
        ];
        vertices.extend(corners.into_iter().map(|(offset, uv)| {
            SpriteVertex::new((origin + offset).to_array(), uv.to_array(), sprite.image as u32)
        }));
    }

    let indices = quad_indices(vertices.len() / 4);
    QuadBatch { vertices, indices }
}
