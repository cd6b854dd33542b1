use serde::{Deserialize, Serialize};

use super::{Behavior, Context};
use crate::sim::collision::{Mask, Owner, Spot};
use crate::sim::level::Level;
use crate::sim::state::{KeyStrokes, State, StateObject};

/// Teleports objects whose HOLD spot lies in this object's PORTAL area to
/// the first live object of type `link`, keeping their offset to the
/// portal.
///
/// The destination latches the arrival so the traveller is not sent straight
/// back; the latch is released once the traveller has left the destination
/// area.
///
/// Scratch: `action` = latched traveller slot + 1 (0 = none),
/// `mvt[0]` = arrival timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    /// Partner portal type; `None` for an exit-only portal
    #[serde(default)]
    pub link: Option<usize>,
    /// Player characters need to press UP to go through
    #[serde(default)]
    pub is_door: bool,
    /// Send at most one traveller per frame
    #[serde(default)]
    pub one_at_a_time: bool,
}

impl Portal {
    fn latched(so: &StateObject) -> Option<usize> {
        so.action.checked_sub(1).map(|slot| slot as usize)
    }

    fn destination(&self, st: &State, slot: usize) -> Option<usize> {
        let link = self.link?;
        st.live_slots()
            .find(|&other| other != slot && st[other].kind() as usize == link)
    }

    /// Door rule: only player characters holding UP may enter
    fn may_enter(&self, ctx: &Context<'_>, st: &State, traveller: usize) -> bool {
        if !self.is_door {
            return true;
        }
        ctx.level
            .object(st[traveller].kind())
            .and_then(|object| object.player())
            .is_some_and(|player| ctx.keys(player).contains(KeyStrokes::UP))
    }
}

impl Behavior for Portal {
    fn on_create(&self, _level: &Level, _st: &mut State, so: &mut StateObject) {
        so.action = 0;
        so.mvt = [0, 0];
    }

    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        let mut travellers: Vec<usize> = ctx
            .evts
            .iter()
            .filter(|e| {
                e.mask_owner == Owner::Slot(slot)
                    && e.mask == Mask::Portal
                    && e.spot == Spot::Hold
                    && e.spot_obj != slot
            })
            .map(|e| e.spot_obj)
            .collect();
        travellers.dedup();

        // Release the latch once the arrival has walked out
        if let Some(latched) = Self::latched(&st[slot]) {
            let arrived_at = st[slot].mvt[0] as i32;
            if st.timestamp > arrived_at && !travellers.contains(&latched) {
                st[slot].action = 0;
            }
        }
        let latched = Self::latched(&st[slot]);

        let Some(dest) = self.destination(st, slot) else {
            return;
        };
        let shift = st[dest].pos - st[slot].pos;
        for traveller in travellers {
            if Some(traveller) == latched || !st.is_live(traveller) {
                continue;
            }
            if !self.may_enter(ctx, st, traveller) {
                continue;
            }
            st[traveller].pos += shift;
            st[dest].action = traveller as u32 + 1;
            st[dest].mvt[0] = st.timestamp as u32;
            log::trace!("Portal {} sent slot {} to {}", slot, traveller, dest);
            if self.one_at_a_time {
                break;
            }
        }
    }

    fn check(&self, level: &Level) -> Result<(), &'static str> {
        if self.link.is_some_and(|link| link >= level.objects.len()) {
            return Err("missing object type");
        }
        Ok(())
    }
}
