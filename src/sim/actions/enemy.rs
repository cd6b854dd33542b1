use serde::{Deserialize, Serialize};

use super::{Behavior, Context};
use crate::consts::*;
use crate::sim::collision::{CollisionEvt, Mask, Owner};
use crate::sim::level::Level;
use crate::sim::state::State;

/// Destroyed when hit by a friendly attack or a destroying area; the kill is
/// scored in a register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Register receiving the points
    pub score_var: usize,
    #[serde(default)]
    pub points: i32,
}

impl Enemy {
    fn is_lethal(&self, ctx: &Context<'_>, st: &State, evt: &CollisionEvt) -> bool {
        match evt.mask {
            Mask::Destroy => true,
            Mask::Attack => match evt.mask_owner {
                Owner::Slot(owner) => ctx
                    .level
                    .object(st[owner].kind())
                    .is_some_and(|object| object.is_friendly || object.is_hortense),
                Owner::Static(_) | Owner::Map => false,
            },
            _ => false,
        }
    }
}

impl Behavior for Enemy {
    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        let hit = ctx.events_of(slot).any(|evt| self.is_lethal(ctx, st, evt));
        if !hit {
            return;
        }
        if st.free(slot).is_ok() {
            let score = st.var(self.score_var).wrapping_add(self.points);
            st.set_var(self.score_var, score);
            log::trace!("Enemy in slot {} destroyed, score {}", slot, score);
        }
    }

    fn check(&self, _level: &Level) -> Result<(), &'static str> {
        if self.score_var >= NB_VARS {
            return Err("score register out of range");
        }
        Ok(())
    }
}
