use serde::{Deserialize, Serialize};

use super::Behavior;
use crate::consts::*;
use crate::renderer::RenderDescriptor;
use crate::sim::collision::Owner;
use crate::sim::level::Level;
use crate::sim::state::State;

/// Draws the animation whose id is held in a register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeAnimation {
    pub var_index: usize,
}

impl Behavior for ChangeAnimation {
    fn render_override(&self, level: &Level, st: &State, slot: usize) -> Option<RenderDescriptor> {
        let so = &st[slot];
        let animation = u8::try_from(st.var(self.var_index)).ok()?;
        level
            .object(so.kind())?
            .descriptor(level, so, Owner::Slot(slot), animation)
    }

    fn check(&self, _level: &Level) -> Result<(), &'static str> {
        if self.var_index >= NB_VARS {
            return Err("animation register out of range");
        }
        Ok(())
    }
}
