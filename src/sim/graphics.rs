//! Animation and sprite tables
//!
//! Content produced by an external loader. Everything is addressed by index:
//! a frame names a sprite, a sprite names an image, an object type names a
//! `GraphicData` set. Indices are resolved at lookup time, so the tables can
//! be shared freely and never hold references into each other.

use serde::{Deserialize, Serialize};

use super::collision::{CollisionMask, Mask, NUMBER_SPOTS, Spot};
use super::point::{IPoint, IRect, Point};
use crate::consts::*;

/// One texel with its collision categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub rgba: [u8; 4],
    /// Category bit set, indexed by `Mask` discriminant (24 bits used)
    pub masks: u32,
    pub depth: u8,
}

impl Pixel {
    pub fn has(&self, mask: Mask) -> bool {
        self.masks & mask.bit() != 0
    }

    /// Takes part in the broad phase (visible or categorized)
    pub fn is_solid(&self) -> bool {
        self.rgba[3] != 0 || self.masks & PIXEL_MASK_BITS != 0
    }
}

/// Row-major pixel buffer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub width: i32,
    pub height: i32,
    /// Pixels per row in `content`
    pub stride: i32,
    pub content: Vec<Pixel>,
}

impl Image {
    pub fn pixel(&self, x: i32, y: i32) -> Option<&Pixel> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.content.get((x + y * self.stride) as usize)
    }
}

/// Rectangle of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub image: usize,
    pub rect: IRect,
}

impl Sprite {
    /// Whether the sprite-local point `coor` lies on a pixel of category `mask`
    pub fn contains(&self, images: &[Image], coor: Point, mask: Mask) -> bool {
        if coor.re.is_negative() || coor.im.is_negative() {
            return false;
        }
        let texel = coor.to_ipoint() + self.rect.min;
        if !self.rect.inside(texel) {
            return false;
        }
        images
            .get(self.image)
            .and_then(|image| image.pixel(texel.x, texel.y))
            .is_some_and(|pixel| pixel.has(mask))
    }

    /// Bitmask of solid pixels, clipped to `MASK_WIDTH` square.
    ///
    /// `Level::validate` rejects sprites the clip would cut.
    fn collision_mask(&self, images: &[Image]) -> CollisionMask {
        let mut mask = CollisionMask::EMPTY;
        let Some(image) = images.get(self.image) else {
            return mask;
        };
        let width = self.rect.width().clamp(0, MASK_WIDTH as i32);
        let height = self.rect.height().clamp(0, MASK_WIDTH as i32);
        for y in 0..height {
            for x in 0..width {
                let solid = image
                    .pixel(self.rect.min.x + x, self.rect.min.y + y)
                    .is_some_and(Pixel::is_solid);
                if solid {
                    mask.set(x as usize, y as usize);
                }
            }
        }
        mask
    }
}

/// One animation frame: sprite plus anchor points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameData {
    pub sprite: usize,
    /// Sprite-local anchor per `Spot`, `None` when the frame lacks it
    #[serde(default)]
    pub spots: [Option<Point>; NUMBER_SPOTS],
}

impl FrameData {
    pub fn new(sprite: usize) -> Self {
        Self {
            sprite,
            spots: [None; NUMBER_SPOTS],
        }
    }

    pub fn with_spot(mut self, spot: Spot, at: Point) -> Self {
        self.spots[spot as usize] = Some(at);
        self
    }

    pub fn spot(&self, spot: Spot) -> Option<Point> {
        self.spots[spot as usize]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationData {
    pub frames: Vec<FrameData>,
    #[serde(default)]
    pub looped: bool,
}

impl AnimationData {
    /// Frame shown at `timestamp`: cycles when looped, else holds the last one
    pub fn get(&self, timestamp: u32) -> Option<&FrameData> {
        let len = self.frames.len();
        if len == 0 {
            return None;
        }
        let index = timestamp as usize;
        if self.looped || index < len {
            self.frames.get(index % len)
        } else {
            self.frames.last()
        }
    }
}

/// Animation set of one object type, indexed by animation id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicData {
    pub animations: Vec<AnimationData>,
}

impl GraphicData {
    pub fn animation(&self, id: u8) -> Option<&AnimationData> {
        self.animations.get(id as usize)
    }

    /// Frame `state_no` of animation `state`
    pub fn frame(&self, state: u8, state_no: u8) -> Option<&FrameData> {
        self.animation(state)?.get(state_no as u32)
    }
}

/// Serialized form of the graphics tables; masks are derived on load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphicsDef {
    pub images: Vec<Image>,
    pub sprites: Vec<Sprite>,
    pub sets: Vec<GraphicData>,
}

/// All graphics content of a level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GraphicsDef", into = "GraphicsDef")]
pub struct Graphics {
    pub images: Vec<Image>,
    pub sprites: Vec<Sprite>,
    pub sets: Vec<GraphicData>,
    /// Broad-phase mask per sprite
    masks: Vec<CollisionMask>,
}

impl Graphics {
    pub fn new(images: Vec<Image>, sprites: Vec<Sprite>, sets: Vec<GraphicData>) -> Self {
        let masks = sprites
            .iter()
            .map(|sprite| sprite.collision_mask(&images))
            .collect();
        Self {
            images,
            sprites,
            sets,
            masks,
        }
    }

    pub fn sprite(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    pub fn mask(&self, sprite: usize) -> Option<&CollisionMask> {
        self.masks.get(sprite)
    }

    pub fn set(&self, index: usize) -> Option<&GraphicData> {
        self.sets.get(index)
    }

    /// Sprite-local test of `coor` against category `mask`
    pub fn sprite_contains(&self, sprite: usize, coor: Point, mask: Mask) -> bool {
        self.sprite(sprite)
            .is_some_and(|s| s.contains(&self.images, coor, mask))
    }
}

impl From<GraphicsDef> for Graphics {
    fn from(def: GraphicsDef) -> Self {
        Graphics::new(def.images, def.sprites, def.sets)
    }
}

impl From<Graphics> for GraphicsDef {
    fn from(graphics: Graphics) -> Self {
        GraphicsDef {
            images: graphics.images,
            sprites: graphics.sprites,
            sets: graphics.sets,
        }
    }
}

/// Square image filled with one pixel value
pub fn solid_image(size: i32, pixel: Pixel) -> Image {
    Image {
        width: size,
        height: size,
        stride: size,
        content: vec![pixel; (size * size) as usize],
    }
}

/// Sprite covering a whole `size` × `size` image
pub fn full_sprite(image: usize, size: i32) -> Sprite {
    Sprite {
        image,
        rect: IRect::new(IPoint::new(0, 0), IPoint::new(size, size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground_pixel() -> Pixel {
        Pixel {
            rgba: [255, 255, 255, 255],
            masks: Mask::Ground.bit(),
            depth: 0,
        }
    }

    #[test]
    fn test_sprite_contains_uses_local_coordinates() {
        let mut image = solid_image(8, Pixel::default());
        image.content[3 + 2 * 8] = ground_pixel();
        let sprite = Sprite {
            image: 0,
            rect: IRect::new(IPoint::new(2, 1), IPoint::new(6, 5)),
        };
        let images = [image];
        assert!(sprite.contains(&images, Point::from_ints(1, 1), Mask::Ground));
        assert!(!sprite.contains(&images, Point::from_ints(1, 1), Mask::Wall));
        assert!(!sprite.contains(&images, Point::from_ints(0, 0), Mask::Ground));
        // Outside the rectangle even though the image has room
        assert!(!sprite.contains(&images, Point::from_ints(5, 1), Mask::Ground));
        assert!(!sprite.contains(&images, Point::from_ints(-1, 1), Mask::Ground));
    }

    #[test]
    fn test_animation_get_loops_or_holds() {
        let frames = vec![FrameData::new(0), FrameData::new(1), FrameData::new(2)];
        let looped = AnimationData {
            frames: frames.clone(),
            looped: true,
        };
        let once = AnimationData {
            frames,
            looped: false,
        };
        assert_eq!(looped.get(4).map(|f| f.sprite), Some(1));
        assert_eq!(once.get(1).map(|f| f.sprite), Some(1));
        assert_eq!(once.get(40).map(|f| f.sprite), Some(2));
        assert!(AnimationData::default().get(0).is_none());
    }

    #[test]
    fn test_masks_derived_from_pixels() {
        let images = vec![solid_image(4, ground_pixel())];
        let graphics = Graphics::new(images, vec![full_sprite(0, 4)], Vec::new());
        let mask = graphics.mask(0).unwrap();
        assert!(mask.get(0, 0));
        assert!(mask.get(3, 3));
        assert!(!mask.get(4, 0));
        assert!(!mask.get(0, 4));
    }

    #[test]
    fn test_frame_spots() {
        let frame = FrameData::new(0).with_spot(Spot::Feet, Point::from_ints(4, 8));
        assert_eq!(frame.spot(Spot::Feet), Some(Point::from_ints(4, 8)));
        assert_eq!(frame.spot(Spot::Hold), None);
    }
}
