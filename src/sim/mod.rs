//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed-point arithmetic only, no floats where results are observable
//! - Seeded RNG stored in the state
//! - Stable iteration order (by phase, then by slot)
//! - No rendering or platform dependencies

pub mod actions;
pub mod arc;
pub mod collision;
pub mod fixed;
pub mod graphics;
pub mod level;
pub mod object;
pub mod path;
pub mod point;
pub mod rng;
pub mod state;
pub mod tick;

pub use actions::{Action, ActionKind, Behavior, Context};
pub use arc::Arc;
pub use collision::{CollisionEvt, CollisionMask, Map, Mask, Owner, Spot};
pub use fixed::Fixed;
pub use graphics::Graphics;
pub use level::{Level, Placement};
pub use object::Object;
pub use path::Path;
pub use point::{IPoint, IRect, Point, expj};
pub use rng::Lcg;
pub use state::{KeyStrokes, State, StateObject};
pub use tick::{compute, render_list};
