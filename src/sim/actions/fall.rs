use serde::{Deserialize, Serialize};

use super::{Behavior, Context, default_coeff, fall_speed};
use crate::sim::collision::{Mask, Spot, touching};
use crate::sim::fixed::{Fixed, ONE_RAW};
use crate::sim::level::Level;
use crate::sim::point::Point;
use crate::sim::state::{State, StateObject};

/// Ballistic fall with optional bounces on the ground.
///
/// Scratch: `action` = bounce count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fall {
    /// Terminal vertical speed
    pub max_speed: Fixed,
    /// Initial speed
    #[serde(default)]
    pub direction: Point,
    /// Amplitude of the random jitter added to the initial speed, per axis
    #[serde(default)]
    pub rnd: Point,
    #[serde(default = "default_coeff")]
    pub gravity_coeff: Fixed,
    #[serde(default)]
    pub bounce: bool,
    /// Fraction of the vertical speed lost at each bounce
    #[serde(default)]
    pub absorb: Fixed,
}

/// Uniform draw in `[-1, 1]`
fn jitter(st: &mut State) -> Fixed {
    Fixed::from_raw(st.rnd_below(2 * ONE_RAW as u32 + 1) as i32 - ONE_RAW)
}

impl Behavior for Fall {
    fn on_create(&self, _level: &Level, st: &mut State, so: &mut StateObject) {
        let dx = jitter(st);
        let dy = jitter(st);
        so.speed = self.direction + Point::new(self.rnd.re * dx, self.rnd.im * dy);
        so.action = 0;
    }

    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        let landed = touching(ctx.evts, slot, Spot::Feet, Mask::Ground);
        let so = &mut st[slot];
        so.speed.im = fall_speed(ctx.level, so.speed.im, self.gravity_coeff, self.max_speed);

        if landed && so.speed.im > 0 {
            if self.bounce {
                so.speed.im = -(so.speed.im - so.speed.im * self.absorb);
                so.action = so.action.wrapping_add(1);
            } else {
                so.speed = Point::ZERO;
            }
        }
        so.pos += so.speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actions::testing::*;
    use crate::sim::actions::{Action, ActionKind};
    use crate::sim::collision::{CollisionEvt, Owner};

    fn level(bounce: bool) -> Level {
        let fall = Fall {
            max_speed: Fixed::from_int(2),
            direction: Point::from_ints(1, -1),
            rnd: Point::ZERO,
            gravity_coeff: Fixed::ONE,
            bounce,
            absorb: Fixed::from_ratio(1, 2),
        };
        level_with(vec![object(
            "debris",
            0,
            vec![Action::new("fall", 0, ActionKind::Fall(fall))],
        )])
    }

    fn landed(slot: usize) -> [CollisionEvt; 1] {
        [CollisionEvt {
            spot_obj: slot,
            spot: Spot::Feet,
            mask: Mask::Ground,
            mask_owner: Owner::Static(0),
        }]
    }

    #[test]
    fn test_speed_capped() {
        let level = level(false);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::ZERO);
        assert_eq!(st[slot].speed, Point::from_ints(1, -1));
        for _ in 0..40 {
            tick_slot(&level, &mut st, slot, &[]);
        }
        assert_eq!(st[slot].speed.im, Fixed::from_int(2));
        assert_eq!(st[slot].speed.re, Fixed::ONE);
    }

    #[test]
    fn test_stops_on_ground() {
        let level = level(false);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::ZERO);
        st[slot].speed = Point::from_ints(1, 1);
        let before = st[slot].pos;
        tick_slot(&level, &mut st, slot, &landed(slot));
        assert_eq!(st[slot].speed, Point::ZERO);
        assert_eq!(st[slot].pos, before);
    }

    #[test]
    fn test_bounce_absorbs_and_counts() {
        let level = level(true);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::ZERO);
        st[slot].speed = Point::new(Fixed::ZERO, Fixed::from_int(1) - level.settings.gravity);
        tick_slot(&level, &mut st, slot, &landed(slot));
        assert_eq!(st[slot].speed.im, Fixed::from_ratio(-1, 2));
        assert_eq!(st[slot].action, 1);
    }

    #[test]
    fn test_jitter_in_range() {
        let mut st = State::new(&level(false).settings);
        for _ in 0..200 {
            let j = jitter(&mut st);
            assert!(j >= -1 && j <= 1);
        }
    }
}
