//! Behaviour strategies
//!
//! An object type is a phase-sorted list of `Action`s. Each action wraps one
//! strategy from the closed `ActionKind` set; all strategies share the
//! `Behavior` interface:
//! - `on_create`: initialise the private scratch fields of a new record
//! - `on_tick`: mutate the pool for one slot, given this frame's events
//! - `render_override`: optionally replace the default render descriptor
//!
//! The meaning of `StateObject::action` and `StateObject::mvt` is private to
//! the strategy that writes them; an object type should not combine two
//! strategies that claim the same field.

mod change_animation;
mod copy_position;
mod enemy;
mod fall;
mod follow_path;
mod hortense;
mod platform;
mod portal;
mod seek;
mod spawner;
mod walker;

pub use change_animation::ChangeAnimation;
pub use copy_position::CopyPosition;
pub use enemy::Enemy;
pub use fall::Fall;
pub use follow_path::FollowPath;
pub use hortense::{Hortense, HortenseAnimations};
pub use platform::Platform;
pub use portal::Portal;
pub use seek::Seek;
pub use spawner::Spawner;
pub use walker::{Direction, Walker};

use serde::{Deserialize, Serialize};

use super::collision::CollisionEvt;
use super::fixed::Fixed;
use super::level::Level;
use super::state::{KeyStrokes, State, StateObject};
use crate::renderer::RenderDescriptor;

/// Everything a behaviour may read during one frame
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub level: &'a Level,
    /// Events computed from the geometry at the start of the frame
    pub evts: &'a [CollisionEvt],
    /// Input of each player for this frame
    pub inputs: &'a [KeyStrokes],
}

impl Context<'_> {
    /// Keys of `player` (nothing pressed for a missing player)
    pub fn keys(&self, player: usize) -> KeyStrokes {
        self.inputs.get(player).copied().unwrap_or_default()
    }

    /// Events whose spot belongs to `slot`
    pub fn events_of(&self, slot: usize) -> impl Iterator<Item = &CollisionEvt> + '_ {
        self.evts.iter().filter(move |e| e.spot_obj == slot)
    }
}

/// Shared interface of every strategy
pub trait Behavior {
    /// Initialise a record before it is allocated
    fn on_create(&self, _level: &Level, _st: &mut State, _so: &mut StateObject) {}

    /// Advance `slot` by one frame
    fn on_tick(&self, _ctx: &Context<'_>, _st: &mut State, _slot: usize) {}

    /// Replacement for the default render descriptor
    fn render_override(
        &self,
        _level: &Level,
        _st: &State,
        _slot: usize,
    ) -> Option<RenderDescriptor> {
        None
    }

    /// Cross-reference check against the level tables
    fn check(&self, _level: &Level) -> Result<(), &'static str> {
        Ok(())
    }
}

/// The closed set of strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionKind {
    FollowPath(FollowPath),
    Walker(Walker),
    CopyPosition(CopyPosition),
    Fall(Fall),
    Seek(Seek),
    Platform(Platform),
    Enemy(Enemy),
    Hortense(Hortense),
    Spawner(Spawner),
    Portal(Portal),
    ChangeAnimation(ChangeAnimation),
}

impl ActionKind {
    fn behavior(&self) -> &dyn Behavior {
        match self {
            ActionKind::FollowPath(b) => b,
            ActionKind::Walker(b) => b,
            ActionKind::CopyPosition(b) => b,
            ActionKind::Fall(b) => b,
            ActionKind::Seek(b) => b,
            ActionKind::Platform(b) => b,
            ActionKind::Enemy(b) => b,
            ActionKind::Hortense(b) => b,
            ActionKind::Spawner(b) => b,
            ActionKind::Portal(b) => b,
            ActionKind::ChangeAnimation(b) => b,
        }
    }
}

impl Behavior for ActionKind {
    fn on_create(&self, level: &Level, st: &mut State, so: &mut StateObject) {
        self.behavior().on_create(level, st, so)
    }

    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        self.behavior().on_tick(ctx, st, slot)
    }

    fn render_override(&self, level: &Level, st: &State, slot: usize) -> Option<RenderDescriptor> {
        self.behavior().render_override(level, st, slot)
    }

    fn check(&self, level: &Level) -> Result<(), &'static str> {
        self.behavior().check(level)
    }
}

/// A named, phase-numbered behaviour unit; lower phases run first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub phase: i32,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(name: impl Into<String>, phase: i32, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            phase,
            kind,
        }
    }
}

/// One frame of gravity on a vertical speed, capped at the terminal speed
pub(crate) fn fall_speed(level: &Level, speed: Fixed, coeff: Fixed, max_speed: Fixed) -> Fixed {
    (speed + level.settings.gravity * coeff).min(max_speed)
}

/// Switch animation, restarting it only when it actually changes
pub(crate) fn set_animation(so: &mut StateObject, state: u8) {
    if so.state() != state {
        so.set_state(state);
        so.set_state_no(0);
    }
}

fn default_coeff() -> Fixed {
    Fixed::ONE
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal one-object levels for behaviour tests

    use super::*;
    use crate::settings::Settings;
    use crate::sim::object::Object;
    use crate::sim::point::Point;

    pub fn level_with(objects: Vec<Object>) -> Level {
        Level {
            objects,
            ..Level::new(Settings::default())
        }
    }

    pub fn object(name: &str, kind: u8, actions: Vec<Action>) -> Object {
        Object::new(name, kind, 0, actions)
    }

    pub fn spawn(level: &Level, st: &mut State, kind: usize, pos: Point) -> usize {
        level.objects[kind]
            .newobject(level, st, None, pos)
            .expect("pool has room")
    }

    /// Run every action of `slot` once, in phase order
    pub fn tick_slot(level: &Level, st: &mut State, slot: usize, evts: &[CollisionEvt]) {
        let ctx = Context {
            level,
            evts,
            inputs: &[],
        };
        tick_slot_with(&ctx, st, slot);
    }

    pub fn tick_slot_with(ctx: &Context<'_>, st: &mut State, slot: usize) {
        let object = &ctx.level.objects[st[slot].kind() as usize];
        for phase in object.phases() {
            object.execute(ctx, st, slot, phase);
        }
    }
}
