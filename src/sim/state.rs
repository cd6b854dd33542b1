//! Simulation state: the object slot pool, registers and generator
//!
//! Everything that must survive from one frame to the next lives in `State`.
//! It is plain old data: copying it is a snapshot, and its byte image is a
//! rollback checkpoint.

use std::fmt;
use std::ops::{BitOr, Index, IndexMut};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::fixed::Fixed;
use super::point::Point;
use super::rng::Lcg;
use crate::consts::*;
use crate::error::{PoolError, SnapshotError};
use crate::settings::Settings;
use rand::SeedableRng;

/// Bit layout of `StateObject::header`
pub mod layout {
    /// Animation id, 8 bits
    pub const STATE_SHIFT: u32 = 0;
    pub const STATE_MASK: u32 = 0xFF;
    /// Frame / sub-state index, 7 bits
    pub const STATE_NO_SHIFT: u32 = 8;
    pub const STATE_NO_MASK: u32 = 0x7F;
    /// Source slot, 9 bits
    pub const SRC_SHIFT: u32 = 15;
    pub const SRC_MASK: u32 = 0x1FF;
    /// Object type, 8 bits
    pub const KIND_SHIFT: u32 = 24;
    pub const KIND_MASK: u32 = 0xFF;
}

const fn pack_header(state: u32, state_no: u32, src: u32, kind: u32) -> u32 {
    use layout::*;
    ((state & STATE_MASK) << STATE_SHIFT)
        | ((state_no & STATE_NO_MASK) << STATE_NO_SHIFT)
        | ((src & SRC_MASK) << SRC_SHIFT)
        | ((kind & KIND_MASK) << KIND_SHIFT)
}

/// One 32-byte object record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct StateObject {
    pub pos: Point,
    pub speed: Point,
    /// Packed animation / frame / source / type, see [`layout`]
    pub header: u32,
    /// Behaviour-private flags or accumulator
    pub action: u32,
    /// Behaviour-private movement scratch
    pub mvt: [u32; 2],
}

const _: () = assert!(std::mem::size_of::<StateObject>() == 32);

impl StateObject {
    /// An unoccupied slot
    pub const FREE: StateObject = StateObject {
        pos: Point::ZERO,
        speed: Point::ZERO,
        header: pack_header(0, 0, NO_SOURCE, FREE_KIND as u32),
        action: 0,
        mvt: [0, 0],
    };

    /// Fresh record of type `kind` at `pos`
    pub fn new(kind: u8, src: Option<usize>, pos: Point) -> Self {
        let mut so = Self {
            pos,
            ..Self::FREE
        };
        so.set_kind(kind);
        so.set_src(src);
        so
    }

    #[inline]
    fn field(&self, shift: u32, mask: u32) -> u32 {
        (self.header >> shift) & mask
    }

    #[inline]
    fn set_field(&mut self, shift: u32, mask: u32, value: u32) {
        self.header = (self.header & !(mask << shift)) | ((value & mask) << shift);
    }

    /// Animation id
    pub fn state(&self) -> u8 {
        self.field(layout::STATE_SHIFT, layout::STATE_MASK) as u8
    }

    pub fn set_state(&mut self, state: u8) {
        self.set_field(layout::STATE_SHIFT, layout::STATE_MASK, state as u32);
    }

    /// Frame index inside the animation (7 bits, wraps)
    pub fn state_no(&self) -> u8 {
        self.field(layout::STATE_NO_SHIFT, layout::STATE_NO_MASK) as u8
    }

    pub fn set_state_no(&mut self, state_no: u8) {
        self.set_field(layout::STATE_NO_SHIFT, layout::STATE_NO_MASK, state_no as u32);
    }

    /// Slot of the object that created this one
    pub fn src(&self) -> Option<usize> {
        match self.field(layout::SRC_SHIFT, layout::SRC_MASK) {
            NO_SOURCE => None,
            src => Some(src as usize),
        }
    }

    pub fn set_src(&mut self, src: Option<usize>) {
        let value = src.map_or(NO_SOURCE, |s| s as u32);
        debug_assert!(value <= layout::SRC_MASK, "source slot {value} out of range");
        self.set_field(layout::SRC_SHIFT, layout::SRC_MASK, value);
    }

    /// Object type tag (`FREE_KIND` for an empty slot)
    pub fn kind(&self) -> u8 {
        self.field(layout::KIND_SHIFT, layout::KIND_MASK) as u8
    }

    pub fn set_kind(&mut self, kind: u8) {
        self.set_field(layout::KIND_SHIFT, layout::KIND_MASK, kind as u32);
    }

    pub fn is_free(&self) -> bool {
        self.kind() == FREE_KIND
    }

    /// `action` read as a raw fixed-point value
    pub fn action_fixed(&self) -> Fixed {
        Fixed::from_raw(self.action as i32)
    }

    pub fn set_action_fixed(&mut self, value: Fixed) {
        self.action = value.raw() as u32;
    }

    /// Both `mvt` words read as a fixed-point point
    pub fn mvt_point(&self) -> Point {
        Point::new(
            Fixed::from_raw(self.mvt[0] as i32),
            Fixed::from_raw(self.mvt[1] as i32),
        )
    }

    pub fn set_mvt_point(&mut self, p: Point) {
        self.mvt = [p.re.raw() as u32, p.im.raw() as u32];
    }
}

/// One frame of decoded input, one bit per logical key
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct KeyStrokes(u8);

impl KeyStrokes {
    pub const NONE: KeyStrokes = KeyStrokes(0);
    pub const LEFT: KeyStrokes = KeyStrokes(1 << 0);
    pub const RIGHT: KeyStrokes = KeyStrokes(1 << 1);
    pub const UP: KeyStrokes = KeyStrokes(1 << 2);
    pub const DOWN: KeyStrokes = KeyStrokes(1 << 3);
    pub const JUMP: KeyStrokes = KeyStrokes(1 << 4);
    pub const ACTION1: KeyStrokes = KeyStrokes(1 << 5);
    pub const ACTION2: KeyStrokes = KeyStrokes(1 << 6);
    pub const ACTION3: KeyStrokes = KeyStrokes(1 << 7);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True when every key of `keys` is pressed
    pub const fn contains(self, keys: KeyStrokes) -> bool {
        self.0 & keys.0 == keys.0
    }
}

impl BitOr for KeyStrokes {
    type Output = KeyStrokes;
    fn bitor(self, rhs: KeyStrokes) -> KeyStrokes {
        KeyStrokes(self.0 | rhs.0)
    }
}

/// Complete simulation state (deterministic, plain old data)
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct State {
    pub slots: [StateObject; NB_SLOTS],
    /// General-purpose registers shared by behaviours
    pub vars: [i32; NB_VARS],
    /// Camera origin, moved by behaviours (e.g. to follow the player)
    pub xscreen: i32,
    pub yscreen: i32,
    /// Frame counter
    pub timestamp: i32,
    pub rng: Lcg,
}

impl State {
    /// Empty pool seeded from the settings
    pub fn new(settings: &Settings) -> Self {
        Self {
            slots: [StateObject::FREE; NB_SLOTS],
            vars: [0; NB_VARS],
            xscreen: 0,
            yscreen: 0,
            timestamp: 0,
            rng: Lcg::seed_from_u64(settings.seed),
        }
    }

    /// Copy `so` into the first free slot, scanning upward from 0.
    ///
    /// Returns `None` when the pool is full.
    pub fn allocate(&mut self, so: StateObject) -> Option<usize> {
        let slot = self.slots.iter().position(StateObject::is_free)?;
        self.slots[slot] = so;
        Some(slot)
    }

    /// Release a slot
    pub fn free(&mut self, slot: usize) -> Result<(), PoolError> {
        let so = self
            .slots
            .get_mut(slot)
            .ok_or(PoolError::OutOfRange { slot })?;
        if so.is_free() {
            log::warn!("Double free of slot {}", slot);
            return Err(PoolError::AlreadyFree { slot });
        }
        so.set_kind(FREE_KIND);
        Ok(())
    }

    /// Next word of the generator; the only randomness source of a frame
    pub fn rnd(&mut self) -> u32 {
        self.rng.step()
    }

    /// Draw in `[0, bound)` from the high bits (the low LCG bits cycle fast)
    pub fn rnd_below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0);
        (self.rnd() >> 16) % bound
    }

    pub fn is_live(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|so| !so.is_free())
    }

    /// Occupied slots in ascending order
    pub fn live_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, so)| !so.is_free())
            .map(|(i, _)| i)
    }

    pub fn live_count(&self) -> usize {
        self.live_slots().count()
    }

    /// Register value (out-of-range indices read as 0)
    pub fn var(&self, index: usize) -> i32 {
        self.vars.get(index).copied().unwrap_or(0)
    }

    pub fn set_var(&mut self, index: usize, value: i32) {
        if let Some(var) = self.vars.get_mut(index) {
            *var = value;
        }
    }

    /// Camera origin (top-left of the screen) in world units
    pub fn camera(&self) -> Point {
        Point::from_ints(self.xscreen, self.yscreen)
    }

    /// Byte image for rollback buffers (native endianness)
    pub fn to_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Restore a byte image produced by [`State::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bytemuck::try_pod_read_unaligned(bytes).map_err(|_| SnapshotError::Size {
            expected: std::mem::size_of::<State>(),
            actual: bytes.len(),
        })
    }
}

impl Index<usize> for State {
    type Output = StateObject;
    fn index(&self, slot: usize) -> &StateObject {
        &self.slots[slot]
    }
}

impl IndexMut<usize> for State {
    fn index_mut(&mut self, slot: usize) -> &mut StateObject {
        &mut self.slots[slot]
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("timestamp", &self.timestamp)
            .field("rng", &self.rng)
            .field("camera", &(self.xscreen, self.yscreen))
            .field("live", &self.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> State {
        State::new(&Settings::default())
    }

    fn object(kind: u8) -> StateObject {
        StateObject::new(kind, None, Point::ZERO)
    }

    #[test]
    fn test_header_fields_are_independent() {
        let mut so = StateObject::new(7, Some(300), Point::from_ints(1, 2));
        so.set_state(200);
        so.set_state_no(127);
        assert_eq!(so.kind(), 7);
        assert_eq!(so.src(), Some(300));
        assert_eq!(so.state(), 200);
        assert_eq!(so.state_no(), 127);

        so.set_state_no(130); // 7 bits only
        assert_eq!(so.state_no(), 2);
        assert_eq!(so.state(), 200);
        assert_eq!(so.src(), Some(300));
    }

    #[test]
    fn test_free_record() {
        assert!(StateObject::FREE.is_free());
        assert_eq!(StateObject::FREE.src(), None);
        assert!(!object(0).is_free());
    }

    #[test]
    fn test_allocate_ascending_then_full() {
        let mut st = state();
        for expected in 0..NB_SLOTS {
            assert_eq!(st.allocate(object(1)), Some(expected));
        }
        assert_eq!(st.allocate(object(1)), None);
        assert_eq!(st.live_count(), NB_SLOTS);
    }

    #[test]
    fn test_free_then_allocate_reuses_lowest() {
        let mut st = state();
        for _ in 0..10 {
            st.allocate(object(1));
        }
        st.free(7).unwrap();
        st.free(3).unwrap();
        assert_eq!(st.allocate(object(2)), Some(3));
        assert_eq!(st.allocate(object(2)), Some(7));
        assert_eq!(st.allocate(object(2)), Some(10));
    }

    #[test]
    fn test_double_free_is_reported() {
        let mut st = state();
        let slot = st.allocate(object(1)).unwrap();
        assert_eq!(st.free(slot), Ok(()));
        assert_eq!(st.free(slot), Err(PoolError::AlreadyFree { slot }));
        assert_eq!(
            st.free(NB_SLOTS),
            Err(PoolError::OutOfRange { slot: NB_SLOTS })
        );
    }

    #[test]
    fn test_rnd_is_lcg() {
        let mut st = state();
        let before = st.rng.state();
        let next = st.rnd();
        assert_eq!(next, before.wrapping_mul(22_695_477).wrapping_add(1));
        assert!(st.rnd_below(5) < 5);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = state();
        let mut b = state();
        for _ in 0..100 {
            assert_eq!(a.rnd(), b.rnd());
        }
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut st = state();
        st.allocate(object(4));
        st.set_var(3, -17);
        st.timestamp = 99;
        let bytes = st.to_bytes().to_vec();
        let back = State::from_bytes(&bytes).unwrap();
        assert_eq!(back, st);

        assert!(matches!(
            State::from_bytes(&bytes[1..]),
            Err(SnapshotError::Size { .. })
        ));
    }

    #[test]
    fn test_keystrokes() {
        let keys = KeyStrokes::LEFT | KeyStrokes::JUMP;
        assert!(keys.contains(KeyStrokes::LEFT));
        assert!(keys.contains(KeyStrokes::JUMP));
        assert!(!keys.contains(KeyStrokes::RIGHT));
        assert_eq!(keys.bits(), 0b1_0001);
    }
}
