use serde::{Deserialize, Serialize};

use super::{Behavior, Context};
use crate::sim::fixed::Fixed;
use crate::sim::level::Level;
use crate::sim::point::Point;
use crate::sim::state::{State, StateObject};

/// Moves along a level path; position depends on elapsed path time only.
///
/// Scratch: `action` = elapsed path time (raw fixed), `mvt` = origin when
/// `relative`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowPath {
    /// Index into `Level::paths`
    pub path: usize,
    /// Path time advanced per frame
    pub speed: Fixed,
    /// Path coordinates are offsets from the creation point
    #[serde(default)]
    pub relative: bool,
}

impl FollowPath {
    fn origin(&self, so: &StateObject) -> Point {
        if self.relative {
            so.mvt_point()
        } else {
            Point::ZERO
        }
    }
}

impl Behavior for FollowPath {
    fn on_create(&self, level: &Level, _st: &mut State, so: &mut StateObject) {
        so.set_action_fixed(Fixed::ZERO);
        if self.relative {
            so.set_mvt_point(so.pos);
        }
        if let Some(path) = level.paths.get(self.path) {
            so.pos = self.origin(so) + path.at(Fixed::ZERO);
        }
    }

    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        let Some(path) = ctx.level.paths.get(self.path) else {
            return;
        };
        let so = &mut st[slot];
        let elapsed = so.action_fixed() + self.speed;
        so.set_action_fixed(elapsed);

        let next = self.origin(so) + path.at(elapsed);
        so.speed = next - so.pos;
        so.pos = next;
    }

    fn check(&self, level: &Level) -> Result<(), &'static str> {
        if self.path >= level.paths.len() {
            return Err("missing path");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actions::testing::*;
    use crate::sim::actions::{Action, ActionKind};
    use crate::sim::path::Path;

    fn level(relative: bool) -> Level {
        let mut path = Path::new(Vec::new(), false, false);
        path.add_segment_from(Point::ZERO, Point::from_ints(4, 0), Fixed::ONE);
        path.add_segment(Point::ZERO, Fixed::ONE);
        let follow = FollowPath {
            path: 0,
            speed: Fixed::ONE,
            relative,
        };
        let mut level = level_with(vec![object(
            "shuttle",
            0,
            vec![Action::new("move", 0, ActionKind::FollowPath(follow))],
        )]);
        level.paths.push(path);
        level
    }

    #[test]
    fn test_follows_and_loops() {
        let level = level(false);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::from_ints(100, 100));
        assert_eq!(st[slot].pos, Point::ZERO);

        let mut xs = Vec::new();
        for _ in 0..9 {
            tick_slot(&level, &mut st, slot, &[]);
            xs.push(st[slot].pos.re.roundin());
        }
        assert_eq!(xs, vec![1, 2, 3, 4, 3, 2, 1, 0, 1]);
        assert_eq!(st[slot].speed, Point::from_ints(1, 0));
    }

    #[test]
    fn test_relative_path_keeps_origin() {
        let level = level(true);
        let mut st = State::new(&level.settings);
        let slot = spawn(&level, &mut st, 0, Point::from_ints(100, 50));
        tick_slot(&level, &mut st, slot, &[]);
        tick_slot(&level, &mut st, slot, &[]);
        assert_eq!(st[slot].pos, Point::from_ints(102, 50));
    }
}
