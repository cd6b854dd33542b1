use serde::{Deserialize, Serialize};

use super::{Behavior, Context};
use crate::sim::fixed::{FULL_TURN, Fixed, atan2, hypot};
use crate::sim::point::{Point, expj};
use crate::sim::state::State;

/// Homing projectile: steers toward a heading or the nearest player
/// character, with a bounded turn rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seek {
    /// Fixed heading; zero means "track the nearest hortense object"
    #[serde(default)]
    pub direction: Point,
    pub acceleration: Fixed,
    pub max_speed: Fixed,
    /// Largest heading change per frame (grad400)
    pub max_rotation: Fixed,
}

/// Signed angle difference folded into `(-200, 200]`
fn angle_delta(to: Fixed, from: Fixed) -> Fixed {
    let half = FULL_TURN / 2;
    let mut delta = (to - from) % FULL_TURN;
    if delta > half {
        delta -= FULL_TURN;
    } else if delta <= -half {
        delta += FULL_TURN;
    }
    delta
}

impl Seek {
    /// Vector toward the target, `None` when there is nothing to seek
    fn target(&self, ctx: &Context<'_>, st: &State, slot: usize) -> Option<Point> {
        if self.direction != Point::ZERO {
            return Some(self.direction);
        }
        let here = st[slot].pos;
        st.live_slots()
            .filter(|&other| other != slot)
            .filter(|&other| {
                ctx.level
                    .object(st[other].kind())
                    .is_some_and(|object| object.is_hortense)
            })
            .map(|other| (hypot(st[other].pos - here), other))
            .min()
            .map(|(_, other)| st[other].pos - here)
    }
}

impl Behavior for Seek {
    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        let target = self.target(ctx, st, slot);
        let so = &mut st[slot];
        let magnitude = hypot(so.speed);

        let heading = match target {
            Some(target) if target != Point::ZERO => {
                let wanted = atan2(target);
                if magnitude == 0 {
                    wanted
                } else {
                    let current = atan2(so.speed);
                    let turn = angle_delta(wanted, current)
                        .clamp_to(-self.max_rotation, self.max_rotation);
                    current + turn
                }
            }
            _ if magnitude > 0 => atan2(so.speed),
            _ => return,
        };

        let magnitude = (magnitude + self.acceleration).min(self.max_speed);
        so.speed = expj(heading) * magnitude;
        so.pos += so.speed;
    }
}
