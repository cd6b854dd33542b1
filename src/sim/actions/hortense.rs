use serde::{Deserialize, Serialize};

use super::{Behavior, Context, default_coeff, fall_speed, set_animation};
use crate::consts::*;
use crate::sim::collision::{Mask, Owner, Spot, touching};
use crate::sim::fixed::Fixed;
use crate::sim::level::Level;
use crate::sim::point::Point;
use crate::sim::state::{KeyStrokes, State};

/// Animation ids used by the player character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HortenseAnimations {
    pub stand: u8,
    pub walk_left: u8,
    pub walk_right: u8,
    pub jump: u8,
    pub climb: u8,
}

impl Default for HortenseAnimations {
    fn default() -> Self {
        Self {
            stand: 0,
            walk_left: 1,
            walk_right: 2,
            jump: 3,
            climb: 4,
        }
    }
}

const FACING_RIGHT: u32 = 1;

/// Player character driven by one player's keys.
///
/// Walks, jumps from the ground, climbs ladders and stops at walls. Every
/// frame spent in an enemy's attack area counts one hit in `hit_var`.
///
/// Scratch: `action` bit 0 = facing right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hortense {
    /// Index into the per-frame input slice
    #[serde(default)]
    pub player: usize,
    pub speed: Fixed,
    pub jump_speed: Fixed,
    pub climb_speed: Fixed,
    #[serde(default = "default_coeff")]
    pub gravity_coeff: Fixed,
    #[serde(default)]
    pub hit_var: Option<usize>,
    #[serde(default)]
    pub animations: HortenseAnimations,
}

impl Hortense {
    fn horizontal(&self, ctx: &Context<'_>, slot: usize, keys: KeyStrokes) -> Fixed {
        let left = keys.contains(KeyStrokes::LEFT)
            && !touching(ctx.evts, slot, Spot::WallLeft, Mask::Wall);
        let right = keys.contains(KeyStrokes::RIGHT)
            && !touching(ctx.evts, slot, Spot::WallRight, Mask::Wall);
        match (left, right) {
            (true, false) => -self.speed,
            (false, true) => self.speed,
            _ => Fixed::ZERO,
        }
    }

    fn was_hit(&self, ctx: &Context<'_>, st: &State, slot: usize) -> bool {
        ctx.events_of(slot).any(|evt| match (evt.mask, evt.mask_owner) {
            (Mask::Attack, Owner::Slot(owner)) => ctx
                .level
                .object(st[owner].kind())
                .is_some_and(|object| object.is_enemy),
            _ => false,
        })
    }
}

impl Behavior for Hortense {
    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        let keys = ctx.keys(self.player);
        let on_ground = touching(ctx.evts, slot, Spot::Feet, Mask::Ground);
        let on_ladder = touching(ctx.evts, slot, Spot::Hold, Mask::Ladder);

        if self.was_hit(ctx, st, slot)
            && let Some(var) = self.hit_var
        {
            st.set_var(var, st.var(var).wrapping_add(1));
        }

        let vx = self.horizontal(ctx, slot, keys);
        let so = &mut st[slot];
        let jumping = keys.contains(KeyStrokes::JUMP) && (on_ground || on_ladder);
        let vy = if jumping {
            -self.jump_speed
        } else if on_ladder {
            match (keys.contains(KeyStrokes::UP), keys.contains(KeyStrokes::DOWN)) {
                (true, false) => -self.climb_speed,
                (false, true) => self.climb_speed,
                _ => Fixed::ZERO,
            }
        } else if on_ground && so.speed.im >= 0 {
            Fixed::ZERO
        } else {
            fall_speed(
                ctx.level,
                so.speed.im,
                self.gravity_coeff,
                ctx.level.settings.max_fall_speed,
            )
        };

        if vx > 0 {
            so.action |= FACING_RIGHT;
        } else if vx < 0 {
            so.action &= !FACING_RIGHT;
        }
        so.speed = Point::new(vx, vy);
        so.pos += so.speed;

        let anims = &self.animations;
        let animation = if on_ladder && !jumping && vy != 0 {
            anims.climb
        } else if jumping || (!on_ground && !on_ladder) {
            anims.jump
        } else if vx > 0 {
            anims.walk_right
        } else if vx < 0 {
            anims.walk_left
        } else {
            anims.stand
        };
        set_animation(so, animation);
    }

    fn check(&self, _level: &Level) -> Result<(), &'static str> {
        if self.hit_var.is_some_and(|var| var >= NB_VARS) {
            return Err("hit register out of range");
        }
        Ok(())
    }
}
