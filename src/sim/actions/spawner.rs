use serde::{Deserialize, Serialize};

use super::{Behavior, Context};
use crate::sim::level::Level;
use crate::sim::point::Point;
use crate::sim::state::{State, StateObject};

/// Creates objects of type `obj` on a schedule.
///
/// A spawn is due at every frame listed in `timestamps`, and every `interval`
/// frames starting at `delay` when `interval > 0`. Due spawns are skipped
/// while `max_nb_elts` objects created by this spawner are alive, once
/// `max_spawn` objects have been created, or when the pool is full. Zero
/// disables either cap.
///
/// Scratch: `action` = number of objects created so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    #[serde(default)]
    pub timestamps: Vec<i32>,
    #[serde(default)]
    pub interval: i32,
    #[serde(default)]
    pub delay: i32,
    /// Object type to create
    pub obj: usize,
    #[serde(default)]
    pub max_nb_elts: usize,
    #[serde(default)]
    pub max_spawn: u32,
    /// Spawn point relative to the spawner
    #[serde(default)]
    pub offset: Point,
}

impl Spawner {
    fn is_due(&self, timestamp: i32) -> bool {
        self.timestamps.contains(&timestamp)
            || (self.interval > 0
                && timestamp >= self.delay
                && (timestamp - self.delay) % self.interval == 0)
    }

    /// Live objects of type `obj` created by `slot`
    fn population(&self, st: &State, slot: usize) -> usize {
        st.live_slots()
            .filter(|&i| st[i].kind() as usize == self.obj && st[i].src() == Some(slot))
            .count()
    }
}

impl Behavior for Spawner {
    fn on_create(&self, _level: &Level, _st: &mut State, so: &mut StateObject) {
        so.action = 0;
    }

    fn on_tick(&self, ctx: &Context<'_>, st: &mut State, slot: usize) {
        if !self.is_due(st.timestamp) {
            return;
        }
        if self.max_spawn > 0 && st[slot].action >= self.max_spawn {
            return;
        }
        if self.max_nb_elts > 0 && self.population(st, slot) >= self.max_nb_elts {
            log::trace!("Spawner {} at population cap", slot);
            return;
        }
        let Some(object) = ctx.level.objects.get(self.obj) else {
            return;
        };
        let pos = st[slot].pos + self.offset;
        if object.newobject(ctx.level, st, Some(slot), pos).is_some() {
            st[slot].action += 1;
        } else {
            log::debug!("Spawner {} skipped: pool exhausted", slot);
        }
    }

    fn check(&self, level: &Level) -> Result<(), &'static str> {
        if self.obj >= level.objects.len() {
            return Err("missing object type");
        }
        if self.interval < 0 {
            return Err("negative interval");
        }
        Ok(())
    }
}
