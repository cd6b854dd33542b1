//! Spot/mask collision pipeline
//!
//! Two phases, run once per frame before any behaviour executes:
//! 1. Broad phase (`colliding`): sort instances by x and sweep a window one
//!    sprite wide, testing candidate pairs with the bitmask narrow phase.
//! 2. Spot/mask tests on the surviving pairs: a named anchor point of one
//!    object (a `Spot`) against a named pixel category of another (a `Mask`).
//!
//! The resulting `CollisionEvt` list is the only thing behaviours see of the
//! geometry.

use serde::{Deserialize, Serialize};

use super::graphics::{FrameData, Graphics};
use super::fixed::FRAC_BITS;
use super::point::{IPoint, Point};
use crate::consts::*;

/// Anchor points of a frame
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Spot {
    Spawn = 0,
    Hold = 1,
    Feet = 2,
    GrabHold = 3,
    Holds = 4,
    FallLeft = 5,
    FallRight = 6,
    WallLeft = 7,
    WallRight = 8,
}

pub const NUMBER_SPOTS: usize = 9;

impl Spot {
    pub const ALL: [Spot; NUMBER_SPOTS] = [
        Spot::Spawn,
        Spot::Hold,
        Spot::Feet,
        Spot::GrabHold,
        Spot::Holds,
        Spot::FallLeft,
        Spot::FallRight,
        Spot::WallLeft,
        Spot::WallRight,
    ];
}

/// Pixel categories; the discriminant is the bit index in `Pixel::masks`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mask {
    Wall = 9,
    Ground = 10,
    Target = 11,
    Attack = 12,
    Ladder = 13,
    Shield = 14,
    Portal = 15,
    Destroy = 16,
    Unspawn = 17,
}

pub const NUMBER_MASKS: usize = 18;

const _: () = assert!(NUMBER_MASKS <= 24);

impl Mask {
    pub const ALL: [Mask; NUMBER_MASKS - NUMBER_SPOTS] = [
        Mask::Wall,
        Mask::Ground,
        Mask::Target,
        Mask::Attack,
        Mask::Ladder,
        Mask::Shield,
        Mask::Portal,
        Mask::Destroy,
        Mask::Unspawn,
    ];

    #[inline]
    pub const fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// Who carries the mask of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// Live object in the pool
    Slot(usize),
    /// Entry of `Level::static_objects`
    Static(usize),
    /// Background cell grid
    Map,
}

impl Owner {
    pub fn slot(self) -> Option<usize> {
        match self {
            Owner::Slot(slot) => Some(slot),
            _ => None,
        }
    }
}

/// Spot of object `spot_obj` lies on a `mask` pixel owned by `mask_owner`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollisionEvt {
    pub spot_obj: usize,
    pub spot: Spot,
    pub mask: Mask,
    pub mask_owner: Owner,
}

/// Whether `slot`'s `spot` touches any `mask`
pub fn touching(evts: &[CollisionEvt], slot: usize, spot: Spot, mask: Mask) -> bool {
    evts.iter()
        .any(|e| e.spot_obj == slot && e.spot == spot && e.mask == mask)
}

/// Events where `slot`'s `spot` touches `mask`
pub fn touches<'a>(
    evts: &'a [CollisionEvt],
    slot: usize,
    spot: Spot,
    mask: Mask,
) -> impl Iterator<Item = &'a CollisionEvt> + 'a {
    evts.iter()
        .filter(move |e| e.spot_obj == slot && e.spot == spot && e.mask == mask)
}

/// 64 × 64 occupancy bitmask; the most significant bit is the leftmost column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionMask {
    pub rows: [u64; MASK_WIDTH],
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl CollisionMask {
    pub const EMPTY: CollisionMask = CollisionMask {
        rows: [0; MASK_WIDTH],
    };
    pub const FULL: CollisionMask = CollisionMask {
        rows: [u64::MAX; MASK_WIDTH],
    };

    #[inline]
    fn column_bit(x: usize) -> u64 {
        1u64 << (MASK_WIDTH - 1 - x)
    }

    pub fn set(&mut self, x: usize, y: usize) {
        if x < MASK_WIDTH && y < MASK_WIDTH {
            self.rows[y] |= Self::column_bit(x);
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < MASK_WIDTH && y < MASK_WIDTH && self.rows[y] & Self::column_bit(x) != 0
    }

    /// Copy moved `dx` columns right and `dy` rows down; bits pushed past the
    /// last column or row are lost
    pub fn shifted(&self, dx: usize, dy: usize) -> CollisionMask {
        let mut mask = Self::EMPTY;
        if dx >= MASK_WIDTH || dy >= MASK_WIDTH {
            return mask;
        }
        for y in 0..MASK_WIDTH - dy {
            mask.rows[y + dy] = self.rows[y] >> dx;
        }
        mask
    }

    /// Copy with the anchor points of `frame` marked as occupied, and the
    /// sprite-local position of the copy's top-left corner.
    ///
    /// Anchors left of or above the sprite move that corner so they still
    /// land in the mask; the corner is never right of or below the sprite.
    pub fn with_spots(&self, frame: &FrameData) -> (CollisionMask, IPoint) {
        let cell = |spot: &Point| {
            IPoint::new(spot.re.raw() >> FRAC_BITS, spot.im.raw() >> FRAC_BITS)
        };
        let origin = frame
            .spots
            .iter()
            .flatten()
            .map(cell)
            .fold(IPoint::new(0, 0), |o, c| IPoint::new(o.x.min(c.x), o.y.min(c.y)));

        let mut mask = self.shifted((-origin.x) as usize, (-origin.y) as usize);
        for c in frame.spots.iter().flatten().map(cell) {
            mask.set((c.x - origin.x) as usize, (c.y - origin.y) as usize);
        }
        (mask, origin)
    }
}

/// Narrow phase: do the masks overlap when placed at `offset1` / `offset2`?
///
/// Symmetric in its two operands. Offsets one mask width apart or more never
/// collide.
pub fn collides_with(
    mask1: &CollisionMask,
    offset1: Point,
    mask2: &CollisionMask,
    offset2: Point,
) -> bool {
    let offset = offset2 - offset1;
    if offset.re.is_negative() {
        return collides_with(mask2, offset2, mask1, offset1);
    }

    let width = MASK_WIDTH as i64;
    let xoffset = offset.re.roundin();
    let yoffset = offset.im.roundin();
    if xoffset >= width || yoffset >= width || yoffset <= -width {
        return false;
    }

    let min_y = yoffset.max(0);
    let max_y = width.min(width + yoffset);
    (min_y..max_y).any(|y| {
        let row1 = mask1.rows[y as usize];
        let row2 = mask2.rows[(y - yoffset) as usize];
        row1 & (row2 >> xoffset) != 0
    })
}

/// Broad-phase entry
#[derive(Debug, Clone, Copy)]
pub struct MaskInstance<'a> {
    pub mask: &'a CollisionMask,
    pub coor: Point,
    pub id: usize,
    /// Two background instances never collide with each other
    pub background: bool,
}

/// Broad phase: candidate pairs `(a.id, b.id)` among instances accepted by
/// `predicate` whose masks overlap.
///
/// Only the horizontal coordinate is used for sorting and pruning.
pub fn colliding<'a>(
    instances: &[MaskInstance<'a>],
    predicate: impl Fn(&MaskInstance<'a>) -> bool,
) -> Vec<(usize, usize)> {
    let mut restricted: Vec<MaskInstance<'a>> =
        instances.iter().filter(|i| predicate(i)).copied().collect();
    restricted.sort_by(|a, b| a.coor.re.cmp(&b.coor.re));

    let mut result = Vec::new();
    for (index, first) in restricted.iter().enumerate() {
        for second in &restricted[index + 1..] {
            if second.coor.re - first.coor.re >= SPRITE_WIDTH {
                break;
            }
            if first.background && second.background {
                continue;
            }
            if collides_with(first.mask, first.coor, second.mask, second.coor) {
                result.push((first.id, second.id));
            }
        }
    }
    result
}

/// An object placed in the world for spot/mask tests
#[derive(Debug, Clone, Copy)]
pub struct SpriteInstance<'a> {
    pub frame: &'a FrameData,
    pub coor: Point,
    pub owner: Owner,
    /// Decorative parallax layers are exempt from collisions
    pub has_parallax: bool,
}

impl SpriteInstance<'_> {
    /// Whether `other`'s `spot` lies on a `mask` pixel of this instance
    pub fn contains(
        &self,
        graphics: &Graphics,
        mask: Mask,
        other: &SpriteInstance<'_>,
        spot: Spot,
    ) -> bool {
        if self.has_parallax || other.has_parallax {
            return false;
        }
        let Some(anchor) = other.frame.spot(spot) else {
            return false;
        };
        let position = other.coor + anchor - self.coor;
        graphics.sprite_contains(self.frame.sprite, position, mask)
    }
}

/// Background grid of animated cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub cell_width: i32,
    pub cell_height: i32,
    /// Grid size in cells
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    /// `GraphicData` set the cell animations come from
    pub graphics: usize,
    /// Animation id per cell, `None` for empty cells
    pub cells: Vec<Option<u8>>,
}

impl Map {
    /// Position inside the cell containing `pos`, with the cell's animation
    pub fn get(&self, pos: Point) -> Option<(Point, u8)> {
        if pos.re.is_negative() || pos.im.is_negative() {
            return None;
        }
        if self.cell_width <= 0 || self.cell_height <= 0 {
            return None;
        }
        let x = (pos.re / self.cell_width).roundin() as i32;
        let y = (pos.im / self.cell_height).roundin() as i32;
        if x >= self.width || y >= self.height {
            return None;
        }
        let cell = (*self.cells.get((x + self.stride * y) as usize)?)?;
        let in_cell = Point::new(pos.re - x * self.cell_width, pos.im - y * self.cell_height);
        Some((in_cell, cell))
    }

    /// Whether `other`'s `spot` lies on a `mask` pixel of the map
    pub fn contains(
        &self,
        graphics: &Graphics,
        timestamp: u32,
        mask: Mask,
        other: &SpriteInstance<'_>,
        spot: Spot,
    ) -> bool {
        if other.has_parallax {
            return false;
        }
        let Some(anchor) = other.frame.spot(spot) else {
            return false;
        };
        let Some((in_cell, animation)) = self.get(other.coor + anchor) else {
            return false;
        };
        graphics
            .set(self.graphics)
            .and_then(|set| set.animation(animation))
            .and_then(|anim| anim.get(timestamp))
            .is_some_and(|frame| graphics.sprite_contains(frame.sprite, in_cell, mask))
    }
}
