use serde::{Deserialize, Serialize};

use super::{Behavior, Context};
use crate::sim::point::Point;
use crate::sim::state::State;

/// Sticks to the object that created it, at a fixed offset.
///
/// Freed as soon as the source slot is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyPosition {
    #[serde(default)]
    pub offset: Point,
}

impl Behavior for CopyPosition {
    fn on_tick(&self, _ctx: &Context<'_>, st: &mut State, slot: usize) {
        match st[slot].src().filter(|&src| st.is_live(src)) {
            Some(src) => {
                let source = st[src];
                let so = &mut st[slot];
                so.pos = source.pos + self.offset;
                so.speed = source.speed;
            }
            None => {
                if st.free(slot).is_ok() {
                    log::trace!("Orphan copy in slot {} freed", slot);
                }
            }
        }
    }
}
