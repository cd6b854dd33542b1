use serde::{Deserialize, Serialize};

use super::{Behavior, Context, default_coeff, fall_speed};
use crate::sim::collision::{Mask, Spot, touching};
use crate::sim::fixed::Fixed;
use crate::sim::level::Level;
use crate::sim::state::{State, StateObject};

/// Initial heading of a walker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    /// Drawn from the generator at creation
    Random,
}

const RIGHT_BIT: u32 = 1;

/// Walks horizontally, turning back at walls.
///
/// Scratch: `action` bit 0 = heading right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walker {
    pub speed: Fixed,
    /// Subject to gravity; otherwise turns back at ledges instead of falling
    #[serde(default)]
    pub fall: bool,
    #[serde(default = "default_coeff")]
    pub gravity_coeff: Fixed,
    pub direction: Direction,
}

impl Behavior for Walker {
    fn on_create(&self, _level: &Level, st: &mut State, so: &mut StateObject) {
        let right = match self.direction {
            Direction::Left => false,
            Direction::Right => true,
            Direction::Random => st.rnd_below(2) == 1,
        };
        so.action = if right { RIGHT_BIT } else { 0 };
        so.speed.im = Fixed::ZERO;
    }

    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        let evts = ctx.evts;
        let so = &mut st[slot];
        let mut right = so.action & RIGHT_BIT != 0;
        let on_ground = touching(evts, slot, Spot::Feet, Mask::Ground);

        let blocked = if right {
            touching(evts, slot, Spot::WallRight, Mask::Wall)
        } else {
            touching(evts, slot, Spot::WallLeft, Mask::Wall)
        };
        let ledge = !self.fall
            && on_ground
            && !touching(
                evts,
                slot,
                if right { Spot::FallRight } else { Spot::FallLeft },
                Mask::Ground,
            );
        if blocked || ledge {
            right = !right;
        }
        so.action = (so.action & !RIGHT_BIT) | if right { RIGHT_BIT } else { 0 };

        so.speed.re = if right { self.speed } else { -self.speed };
        so.speed.im = if !self.fall || on_ground {
            Fixed::ZERO
        } else {
            fall_speed(
                ctx.level,
                so.speed.im,
                self.gravity_coeff,
                ctx.level.settings.max_fall_speed,
            )
        };
        so.pos += so.speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actions::testing::*;
    use crate::sim::actions::{Action, ActionKind};
    use crate::sim::collision::{CollisionEvt, Owner};
    use crate::sim::point::Point;

    fn level(fall: bool, direction: Direction) -> Level {
        let walker = Walker {
            speed: Fixed::ONE,
            fall,
            gravity_coeff: Fixed::ONE,
            direction,
        };
        level_with(vec![object(
            "walker",
            0,
            vec![Action::new("walk", 0, ActionKind::Walker(walker))],
        )])
    }

    fn evt(slot: usize, spot: Spot, mask: Mask) -> CollisionEvt {
        CollisionEvt {
            spot_obj: slot,
            spot,
            mask,
            mask_owner: Owner::Map,
        }
    }

    #[test]
    fn test_walks_one_unit_per_frame() {
        let level = level(false, Direction::Right);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::ZERO);
        for _ in 0..5 {
            tick_slot(&level, &mut st, slot, &[]);
        }
        assert_eq!(st[slot].pos, Point::from_ints(5, 0));
    }

    #[test]
    fn test_turns_back_at_wall() {
        let level = level(false, Direction::Right);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::ZERO);
        tick_slot(&level, &mut st, slot, &[evt(slot, Spot::WallRight, Mask::Wall)]);
        assert_eq!(st[slot].pos, Point::from_ints(-1, 0));
        // A wall on the other side does not matter when heading left
        tick_slot(&level, &mut st, slot, &[evt(slot, Spot::WallRight, Mask::Wall)]);
        assert_eq!(st[slot].pos, Point::from_ints(-2, 0));
    }

    #[test]
    fn test_turns_back_at_ledge() {
        let level = level(false, Direction::Left);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::ZERO);
        let standing = [
            evt(slot, Spot::Feet, Mask::Ground),
            evt(slot, Spot::FallRight, Mask::Ground),
        ];
        tick_slot(&level, &mut st, slot, &standing);
        assert_eq!(st[slot].pos, Point::from_ints(1, 0));
    }

    #[test]
    fn test_falls_until_ground() {
        let level = level(true, Direction::Right);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::ZERO);
        tick_slot(&level, &mut st, slot, &[]);
        tick_slot(&level, &mut st, slot, &[]);
        let gravity = level.settings.gravity;
        assert_eq!(st[slot].speed.im, gravity * 2);
        assert_eq!(st[slot].pos.im, gravity * 3);

        tick_slot(&level, &mut st, slot, &[evt(slot, Spot::Feet, Mask::Ground)]);
        assert_eq!(st[slot].speed.im, Fixed::ZERO);
        assert_eq!(st[slot].pos.re, Fixed::from_int(3));
    }

    #[test]
    fn test_random_direction_is_seeded() {
        let level = level(false, Direction::Random);
        let mut a = State::new(&level.settings);
        let mut b = State::new(&level.settings);
        for _ in 0..8 {
            let sa = spawn(&level, &mut a, 0, Point::ZERO);
            let sb = spawn(&level, &mut b, 0, Point::ZERO);
            assert_eq!(a[sa].action, b[sb].action);
        }
    }
}
