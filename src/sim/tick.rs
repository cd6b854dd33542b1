//! Fixed timestep simulation tick
//!
//! `compute` turns one state into the next. It never mutates its input, so
//! a caller can keep previous states for rollback and replay.

use std::collections::BTreeSet;

use super::actions::Context;
use super::collision::{Mask, Owner, Spot};
use super::level::Level;
use super::state::{KeyStrokes, State};
use crate::consts::*;
use crate::renderer::RenderDescriptor;

/// Advance `previous` by one frame.
///
/// Collision events are computed once from the geometry at the start of the
/// frame. Phases then run in ascending order; within a phase, slots run in
/// ascending order. Only objects alive at the start of the frame execute:
/// anything created during the frame first runs on the next one, and a slot
/// freed during the frame stops executing immediately.
pub fn compute(level: &Level, previous: &State, inputs: &[KeyStrokes]) -> State {
    let mut st = *previous;
    let evts = level.collisions(&st);
    let ctx = Context {
        level,
        evts: &evts,
        inputs,
    };

    let mut alive = [None::<u8>; NB_SLOTS];
    for slot in st.live_slots() {
        alive[slot] = Some(st[slot].kind());
    }

    let phases: BTreeSet<i32> = alive
        .iter()
        .flatten()
        .filter_map(|&kind| level.object(kind))
        .flat_map(|object| object.phases())
        .collect();

    for &phase in &phases {
        for slot in 0..NB_SLOTS {
            let Some(kind) = alive[slot] else {
                continue;
            };
            if st[slot].kind() != kind {
                alive[slot] = None;
                continue;
            }
            let Some(object) = level.object(kind) else {
                continue;
            };
            object.execute(&ctx, &mut st, slot, phase);
            retire_freed(&st, &mut alive);
        }
    }

    for slot in 0..NB_SLOTS {
        let Some(kind) = alive[slot] else {
            continue;
        };
        if let Some(object) = level.object(kind) {
            object.animate(&level.graphics, &mut st[slot]);
        }
    }

    // Events describe the frame-start geometry: only objects alive since
    // then are theirs to remove
    for evt in &evts {
        if evt.spot != Spot::Spawn || evt.mask != Mask::Unspawn {
            continue;
        }
        let slot = evt.spot_obj;
        if matches!(alive.get(slot), Some(Some(_))) && st.free(slot).is_ok() {
            alive[slot] = None;
            log::trace!("Unspawned slot {slot}");
        }
    }

    st.timestamp += 1;
    log::trace!(
        "Frame {}: {} events, {} live objects",
        st.timestamp,
        evts.len(),
        st.live_count()
    );
    st
}

/// Drop slots whose record changed kind (freed, possibly reused) since the
/// frame started
fn retire_freed(st: &State, alive: &mut [Option<u8>; NB_SLOTS]) {
    for (slot, entry) in alive.iter_mut().enumerate() {
        if entry.is_some_and(|kind| st[slot].kind() != kind) {
            *entry = None;
        }
    }
}

/// Draw list for `st`: live objects then static scenery, sorted by
/// `(depth, id)`.
///
/// Live objects use their slot as id; static objects follow the pool with
/// `NB_SLOTS + index`, so ids are stable from one frame to the next.
pub fn render_list(level: &Level, st: &State) -> Vec<RenderDescriptor> {
    let live = st.live_slots().filter_map(|slot| {
        let object = level.object(st[slot].kind())?;
        let mut descriptor = object.graphic(level, st, slot)?;
        descriptor.id = slot;
        Some(descriptor)
    });
    let scenery = level
        .static_objects
        .iter()
        .enumerate()
        .filter_map(|(index, so)| {
            let object = level.object(so.kind())?;
            let mut descriptor = object.descriptor(level, so, Owner::Static(index), so.state())?;
            descriptor.id = NB_SLOTS + index;
            Some(descriptor)
        });

    let mut list: Vec<RenderDescriptor> = live.chain(scenery).collect();
    list.sort_by_key(|descriptor| (descriptor.depth, descriptor.id));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::actions::{Action, ActionKind, CopyPosition, Direction, Spawner, Walker};
    use crate::sim::collision::CollisionEvt;
    use crate::sim::fixed::Fixed;
    use crate::sim::graphics::{
        AnimationData, FrameData, GraphicData, Graphics, Pixel, full_sprite, solid_image,
    };
    use crate::sim::object::Object;
    use crate::sim::point::Point;
    use crate::sim::state::StateObject;

    fn walker(speed: i32) -> Action {
        Action::new(
            "walk",
            0,
            ActionKind::Walker(Walker {
                speed: Fixed::from_int(speed),
                fall: false,
                gravity_coeff: Fixed::ONE,
                direction: Direction::Right,
            }),
        )
    }

    fn spawner(obj: usize, interval: i32, phase: i32) -> Action {
        Action::new(
            "spawn",
            phase,
            ActionKind::Spawner(Spawner {
                timestamps: Vec::new(),
                interval,
                delay: 0,
                obj,
                max_nb_elts: 0,
                max_spawn: 0,
                offset: Point::ZERO,
            }),
        )
    }

    fn level_with(objects: Vec<Object>) -> Level {
        Level {
            objects,
            ..Level::new(Settings::default())
        }
    }

    #[test]
    fn test_compute_advances_timestamp_without_touching_input() {
        let level = level_with(vec![Object::new("walker", 0, 0, vec![walker(1)])]);
        let mut st = State::new(&level.settings);
        level.objects[0].newobject(&level, &mut st, None, Point::ZERO);
        let before = st;
        let next = compute(&level, &st, &[]);
        assert_eq!(st, before);
        assert_eq!(next.timestamp, 1);
        assert_eq!(next[0].pos, Point::from_ints(1, 0));
    }

    #[test]
    fn test_determinism() {
        // Same seed, same inputs: identical states frame by frame
        let level = level_with(vec![
            Object::new("walker", 0, 0, vec![walker(2)]),
            Object::new("nest", 1, 0, vec![spawner(0, 3, 0)]),
        ]);
        let mut st1 = level.initial_state();
        level.objects[1].newobject(&level, &mut st1, None, Point::from_ints(10, 10));
        let mut st2 = st1;

        for frame in 0..40 {
            let keys = [KeyStrokes::from_bits(frame as u8)];
            st1 = compute(&level, &st1, &keys);
            st2 = compute(&level, &st2, &keys);
            assert_eq!(st1.to_bytes(), st2.to_bytes());
        }
        assert!(st1.live_count() > 1);
    }

    #[test]
    fn test_created_objects_run_next_frame() {
        let level = level_with(vec![
            Object::new("walker", 0, 0, vec![walker(1)]),
            Object::new("nest", 1, 0, vec![spawner(0, 100, 0)]),
        ]);
        let mut st = State::new(&level.settings);
        level.objects[1].newobject(&level, &mut st, None, Point::ZERO);

        let st = compute(&level, &st, &[]);
        assert_eq!(st.live_count(), 2);
        assert_eq!(st[1].pos, Point::ZERO);

        let st = compute(&level, &st, &[]);
        assert_eq!(st[1].pos, Point::from_ints(1, 0));
    }

    #[test]
    fn test_phases_run_in_ascending_order_across_objects() {
        // The follower copies its leader in phase 5; the leader moves in
        // phase 1, so the copy sees this frame's position
        let follow = Action::new(
            "follow",
            5,
            ActionKind::CopyPosition(CopyPosition {
                offset: Point::from_ints(0, -3),
            }),
        );
        let lead = Action::new("walk", 1, walker(1).kind);
        let level = level_with(vec![
            Object::new("follower", 0, 0, vec![follow]),
            Object::new("leader", 1, 0, vec![lead]),
        ]);
        let mut st = State::new(&level.settings);
        // Follower takes slot 0 so it would run first without phase ordering
        st.allocate(StateObject::new(0, Some(1), Point::ZERO));
        level.objects[1].newobject(&level, &mut st, None, Point::ZERO);

        let st = compute(&level, &st, &[]);
        assert_eq!(st[1].pos, Point::from_ints(1, 0));
        assert_eq!(st[0].pos, Point::from_ints(1, -3));
    }

    #[test]
    fn test_freed_slot_stops_and_reused_slot_waits() {
        // An orphan follower frees itself in phase 0; a spawner in phase 1
        // reuses the slot; the new walker must not run in phase 2 while the
        // walker alive since the frame start does
        let follow = Action::new(
            "follow",
            0,
            ActionKind::CopyPosition(CopyPosition {
                offset: Point::ZERO,
            }),
        );
        let level = level_with(vec![
            Object::new("follower", 0, 0, vec![follow, walker(1)]),
            Object::new("nest", 1, 0, vec![spawner(2, 1, 1)]),
            Object::new("walker", 2, 0, vec![Action::new("walk", 2, walker(1).kind)]),
        ]);
        let mut st = State::new(&level.settings);
        st.allocate(StateObject::new(0, Some(200), Point::from_ints(50, 50)));
        level.objects[1].newobject(&level, &mut st, None, Point::ZERO);
        level.objects[2].newobject(&level, &mut st, None, Point::from_ints(50, 0));

        let st = compute(&level, &st, &[]);
        assert_eq!(st[0].kind(), 2);
        assert_eq!(st[0].pos, Point::ZERO);
        assert_eq!(st[2].pos, Point::from_ints(51, 0));
    }

    /// Set 0: a 16 × 16 unspawn zone; set 1: a clear actor with its spawn
    /// spot in the middle
    fn unspawn_graphics() -> Graphics {
        let zone = Pixel {
            rgba: [0, 0, 0, 0],
            masks: Mask::Unspawn.bit(),
            depth: 0,
        };
        Graphics::new(
            vec![solid_image(16, zone), solid_image(16, Pixel::default())],
            vec![full_sprite(0, 16), full_sprite(1, 16)],
            vec![
                GraphicData {
                    animations: vec![AnimationData {
                        frames: vec![FrameData::new(0)],
                        looped: true,
                    }],
                },
                GraphicData {
                    animations: vec![AnimationData {
                        frames: vec![FrameData::new(1).with_spot(Spot::Spawn, Point::from_ints(8, 8))],
                        looped: true,
                    }],
                },
            ],
        )
    }

    #[test]
    fn test_unspawn_frees_objects_in_zone() {
        let level = Level {
            graphics: unspawn_graphics(),
            objects: vec![
                Object::new("zone", 0, 0, Vec::new()),
                Object::new("walker", 1, 1, vec![walker(1)]),
            ],
            static_objects: vec![StateObject::new(0, None, Point::from_ints(100, 0))],
            ..Level::new(Settings::default())
        };
        let mut st = State::new(&level.settings);
        let inside = level.objects[1]
            .newobject(&level, &mut st, None, Point::from_ints(100, 0))
            .unwrap();
        let outside = level.objects[1]
            .newobject(&level, &mut st, None, Point::from_ints(0, 0))
            .unwrap();

        assert!(level.collisions(&st).contains(&CollisionEvt {
            spot_obj: inside,
            spot: Spot::Spawn,
            mask: Mask::Unspawn,
            mask_owner: Owner::Static(0),
        }));
        let st = compute(&level, &st, &[]);
        assert!(!st.is_live(inside));
        assert!(st.is_live(outside));
    }

    #[test]
    fn test_unspawn_spares_slot_reused_during_frame() {
        // The follower starts in the zone and frees itself in phase 0; the
        // nest, far away, reuses slot 0 in phase 1
        let follow = Action::new(
            "follow",
            0,
            ActionKind::CopyPosition(CopyPosition {
                offset: Point::ZERO,
            }),
        );
        let level = Level {
            graphics: unspawn_graphics(),
            objects: vec![
                Object::new("follower", 0, 1, vec![follow]),
                Object::new("zone", 1, 0, Vec::new()),
                Object::new("nest", 2, 1, vec![spawner(3, 1, 1)]),
                Object::new("bird", 3, 1, Vec::new()),
            ],
            static_objects: vec![StateObject::new(1, None, Point::from_ints(100, 0))],
            ..Level::new(Settings::default())
        };
        let mut st = State::new(&level.settings);
        st.allocate(StateObject::new(0, Some(200), Point::from_ints(100, 0)));
        level.objects[2].newobject(&level, &mut st, None, Point::from_ints(500, 500));
        assert!(level.collisions(&st).iter().any(|evt| evt.spot_obj == 0
            && evt.spot == Spot::Spawn
            && evt.mask == Mask::Unspawn));

        let st = compute(&level, &st, &[]);
        assert!(st.is_live(0));
        assert_eq!(st[0].kind(), 3);
        assert_eq!(st[0].pos, Point::from_ints(500, 500));
    }

    #[test]
    fn test_render_list_sorted_by_depth_then_id() {
        let graphics = Graphics::new(
            vec![solid_image(4, Pixel::default())],
            vec![full_sprite(0, 4)],
            vec![GraphicData {
                animations: vec![AnimationData {
                    frames: vec![FrameData::new(0)],
                    looped: true,
                }],
            }],
        );
        let mut front = Object::new("front", 0, 0, Vec::new());
        front.depth = 2;
        let mut back = Object::new("back", 1, 0, Vec::new());
        back.depth = -1;
        let level = Level {
            graphics,
            objects: vec![front, back],
            static_objects: vec![StateObject::new(1, None, Point::ZERO)],
            ..Level::new(Settings::default())
        };
        let mut st = State::new(&level.settings);
        for kind in [0, 1, 0] {
            level.objects[kind].newobject(&level, &mut st, None, Point::ZERO);
        }

        let list = render_list(&level, &st);
        let order: Vec<(i32, usize)> = list.iter().map(|d| (d.depth, d.id)).collect();
        assert_eq!(order, vec![(-1, 1), (-1, NB_SLOTS), (2, 0), (2, 2)]);
        assert_eq!(list[1].owner, Owner::Static(0));
        assert_eq!(list[2].owner, Owner::Slot(0));
    }
}
