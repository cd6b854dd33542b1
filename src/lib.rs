//! Platform Sim - deterministic simulation core of a 2D platform game
//!
//! Core modules:
//! - `sim`: Fixed-point math, object pool, behaviours, collisions, frame step
//! - `renderer`: Render descriptors and sprite quads for an external renderer
//! - `settings`: Seed, screen and physics configuration
//! - `error`: Error types for the pool, snapshots and level loading

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{LevelError, LoadError, PoolError, SnapshotError};
pub use settings::Settings;
pub use sim::{KeyStrokes, Level, State, StateObject, compute, render_list};

/// Engine constants
pub mod consts {
    use crate::sim::fixed::Fixed;

    /// Slots in the object pool
    pub const NB_SLOTS: usize = 256;
    /// Integer registers in `State::vars`
    pub const NB_VARS: usize = 256;

    /// Type tag of a free slot
    pub const FREE_KIND: u8 = 255;
    /// Source reference meaning "no creator" (all 9 bits set)
    pub const NO_SOURCE: u32 = 511;

    /// Widest sprite, in pixels; bounds the broad-phase window
    pub const SPRITE_WIDTH: i32 = 64;
    /// Rows (and bits per row) of a collision mask
    pub const MASK_WIDTH: usize = 64;
    /// Bits of `Pixel::masks` carrying collision categories
    pub const PIXEL_MASK_BITS: u32 = 0x00FF_FFFF;

    pub const DEFAULT_SEED: u64 = 0x5EED;
    pub const DEFAULT_SCREEN_WIDTH: i32 = 320;
    pub const DEFAULT_SCREEN_HEIGHT: i32 = 240;
    /// Vertical speed gained per frame, in pixels per frame
    pub const DEFAULT_GRAVITY: Fixed = Fixed::from_ratio(1, 4);
    /// Terminal falling speed
    pub const DEFAULT_MAX_FALL_SPEED: Fixed = Fixed::from_int(8);
}
