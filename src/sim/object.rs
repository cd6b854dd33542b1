//! Object types
//!
//! An `Object` describes a kind of thing in the level: its behaviours, how it
//! collides and how it is drawn. Live instances are `StateObject` records in
//! the pool tagged with the object's `kind`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::actions::{Action, ActionKind, Behavior, Context};
use super::collision::Owner;
use super::fixed::Fixed;
use super::graphics::{FrameData, Graphics};
use super::level::Level;
use super::point::Point;
use super::state::{State, StateObject};
use crate::renderer::RenderDescriptor;

/// Serialized form of an object type; actions are sorted on load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    pub kind: u8,
    #[serde(default)]
    pub is_platform: bool,
    #[serde(default)]
    pub is_enemy: bool,
    #[serde(default)]
    pub is_friendly: bool,
    #[serde(default)]
    pub is_hortense: bool,
    #[serde(default)]
    pub depth: i32,
    /// 0 for none
    #[serde(default)]
    pub parallax: Fixed,
    pub graphics: usize,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ObjectDef", into = "ObjectDef")]
pub struct Object {
    pub name: String,
    /// Tag stored in `StateObject::kind`; equals the index in `Level::objects`
    pub kind: u8,
    pub is_platform: bool,
    pub is_enemy: bool,
    pub is_friendly: bool,
    pub is_hortense: bool,
    /// Draw order, lower first
    pub depth: i32,
    /// Parallax coefficient, 0 for objects living in the world plane
    pub parallax: Fixed,
    /// Index into `Graphics::sets`
    pub graphics: usize,
    /// Sorted by phase; equal phases keep declaration order
    actions: Vec<Action>,
}

impl Object {
    pub fn new(name: impl Into<String>, kind: u8, graphics: usize, mut actions: Vec<Action>) -> Self {
        actions.sort_by_key(|action| action.phase);
        Self {
            name: name.into(),
            kind,
            is_platform: false,
            is_enemy: false,
            is_friendly: false,
            is_hortense: false,
            depth: 0,
            parallax: Fixed::ZERO,
            graphics,
            actions,
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn has_parallax(&self) -> bool {
        self.parallax != Fixed::ZERO
    }

    /// Player index when the type is driven by a player
    pub fn player(&self) -> Option<usize> {
        self.actions.iter().find_map(|action| match &action.kind {
            ActionKind::Hortense(hortense) => Some(hortense.player),
            _ => None,
        })
    }

    /// Distinct phases, ascending
    pub fn phases(&self) -> impl Iterator<Item = i32> + '_ {
        let mut last = None;
        self.actions.iter().filter_map(move |action| {
            if last == Some(action.phase) {
                return None;
            }
            last = Some(action.phase);
            last
        })
    }

    /// Contiguous range of actions at `phase`
    fn phase_range(&self, phase: i32) -> Range<usize> {
        let start = self.actions.partition_point(|a| a.phase < phase);
        let end = self.actions.partition_point(|a| a.phase <= phase);
        start..end
    }

    /// Create an instance: run every `on_create` in phase order, then
    /// allocate. `None` when the pool is full.
    pub fn newobject(
        &self,
        level: &Level,
        st: &mut State,
        src: Option<usize>,
        pos: Point,
    ) -> Option<usize> {
        let mut so = StateObject::new(self.kind, src, pos);
        for action in &self.actions {
            action.kind.on_create(level, st, &mut so);
        }
        let slot = st.allocate(so);
        if slot.is_none() {
            log::debug!("Pool exhausted, '{}' not created", self.name);
        }
        slot
    }

    /// Run the actions of `phase` for `slot`, stopping if the slot is freed
    pub fn execute(&self, ctx: &Context<'_>, st: &mut State, slot: usize, phase: i32) {
        for action in &self.actions[self.phase_range(phase)] {
            if st[slot].kind() != self.kind {
                break;
            }
            action.kind.on_tick(ctx, st, slot);
        }
    }

    /// Frame currently shown by `so`
    pub fn frame<'a>(&self, graphics: &'a Graphics, so: &StateObject) -> Option<&'a FrameData> {
        graphics.set(self.graphics)?.frame(so.state(), so.state_no())
    }

    /// Advance the frame counter of `so` within its animation
    pub fn animate(&self, graphics: &Graphics, so: &mut StateObject) {
        let Some(animation) = graphics
            .set(self.graphics)
            .and_then(|set| set.animation(so.state()))
        else {
            return;
        };
        let len = animation.frames.len();
        if len == 0 {
            return;
        }
        let next = so.state_no() as usize + 1;
        let next = if animation.looped {
            next % len
        } else {
            next.min(len - 1)
        };
        so.set_state_no(next as u8);
    }

    /// Descriptor for `so` showing `animation` at its current frame
    pub fn descriptor(
        &self,
        level: &Level,
        so: &StateObject,
        owner: Owner,
        animation: u8,
    ) -> Option<RenderDescriptor> {
        let frame = level
            .graphics
            .set(self.graphics)?
            .frame(animation, so.state_no())?;
        Some(RenderDescriptor {
            sprite: frame.sprite,
            position: so.pos,
            depth: self.depth,
            parallax: self.parallax,
            id: 0,
            owner,
        })
    }

    /// Render descriptor: the first action override wins, else the current
    /// animation frame
    pub fn graphic(&self, level: &Level, st: &State, slot: usize) -> Option<RenderDescriptor> {
        self.actions
            .iter()
            .find_map(|action| action.kind.render_override(level, st, slot))
            .or_else(|| {
                let so = &st[slot];
                self.descriptor(level, so, Owner::Slot(slot), so.state())
            })
    }
}

impl From<ObjectDef> for Object {
    fn from(def: ObjectDef) -> Self {
        let mut object = Object::new(def.name, def.kind, def.graphics, def.actions);
        object.is_platform = def.is_platform;
        object.is_enemy = def.is_enemy;
        object.is_friendly = def.is_friendly;
        object.is_hortense = def.is_hortense;
        object.depth = def.depth;
        object.parallax = def.parallax;
        object
    }
}

impl From<Object> for ObjectDef {
    fn from(object: Object) -> Self {
        ObjectDef {
            name: object.name,
            kind: object.kind,
            is_platform: object.is_platform,
            is_enemy: object.is_enemy,
            is_friendly: object.is_friendly,
            is_hortense: object.is_hortense,
            depth: object.depth,
            parallax: object.parallax,
            graphics: object.graphics,
            actions: object.actions,
        }
    }
}
