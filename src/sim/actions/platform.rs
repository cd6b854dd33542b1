use serde::{Deserialize, Serialize};

use super::{Behavior, Context};
use crate::sim::collision::{Mask, Owner, Spot};
use crate::sim::state::State;

/// Carries riders along: every object whose feet stand on this object's
/// ground moves by this object's displacement of the frame.
///
/// Run it in a later phase than whatever moves the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Platform {}

impl Behavior for Platform {
    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        let displacement = st[slot].speed;
        let riders = ctx.evts.iter().filter(|e| {
            e.mask_owner == Owner::Slot(slot)
                && e.mask == Mask::Ground
                && e.spot == Spot::Feet
                && e.spot_obj != slot
        });
        for rider in riders {
            if st.is_live(rider.spot_obj) {
                st[rider.spot_obj].pos += displacement;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actions::testing::*;
    use crate::sim::actions::{Action, ActionKind};
    use crate::sim::collision::CollisionEvt;
    use crate::sim::point::Point;

    #[test]
    fn test_carries_riders_only() {
        let level = level_with(vec![
            object(
                "lift",
                0,
                vec![Action::new("carry", 5, ActionKind::Platform(Platform {}))],
            ),
            object("crate", 1, Vec::new()),
        ]);
        let mut st = State::new(&level.settings);
        let lift = spawn(&level, &mut st, 0, Point::ZERO);
        let rider = spawn(&level, &mut st, 1, Point::from_ints(4, -10));
        let bystander = spawn(&level, &mut st, 1, Point::from_ints(40, -10));
        st[lift].speed = Point::from_ints(2, -1);

        let evts = [CollisionEvt {
            spot_obj: rider,
            spot: Spot::Feet,
            mask: Mask::Ground,
            mask_owner: Owner::Slot(lift),
        }];
        tick_slot(&level, &mut st, lift, &evts);
        assert_eq!(st[rider].pos, Point::from_ints(6, -11));
        assert_eq!(st[bystander].pos, Point::from_ints(40, -10));
    }
}
