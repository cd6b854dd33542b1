//! Level tables and per-frame collision events
//!
//! A `Level` is immutable configuration: graphics, paths, object types,
//! static scenery and the background map. It is built once by an external
//! loader (or from JSON), validated, and then only borrowed by the frame
//! step.

use serde::{Deserialize, Serialize};

use super::actions::Behavior;
use super::collision::{
    CollisionEvt, CollisionMask, Map, Mask, MaskInstance, Owner, Spot, SpriteInstance, colliding,
};
use super::graphics::Graphics;
use super::object::Object;
use super::path::Path;
use super::point::{IPoint, Point};
use super::state::{State, StateObject};
use crate::consts::*;
use crate::error::{LevelError, LoadError};
use crate::settings::Settings;

/// An object created when the level starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub object: usize,
    pub pos: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Level {
    pub settings: Settings,
    pub graphics: Graphics,
    pub paths: Vec<Path>,
    /// Object types, indexed by `StateObject::kind`
    pub objects: Vec<Object>,
    /// Scenery that collides but never runs behaviours
    pub static_objects: Vec<StateObject>,
    pub map: Map,
    pub placements: Vec<Placement>,
}

impl Level {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Parse and validate a level
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        log::info!(
            "Loaded level: {} object types, {} paths, {} static objects, {}x{} map",
            level.objects.len(),
            level.paths.len(),
            level.static_objects.len(),
            level.map.width,
            level.map.height
        );
        Ok(level)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn object(&self, kind: u8) -> Option<&Object> {
        self.objects.get(kind as usize)
    }

    /// Check every cross-reference between the tables
    pub fn validate(&self) -> Result<(), LevelError> {
        let max = FREE_KIND as usize;
        if self.objects.len() > max {
            return Err(LevelError::TooManyObjects {
                count: self.objects.len(),
                max,
            });
        }

        for (index, object) in self.objects.iter().enumerate() {
            if object.kind as usize != index {
                return Err(LevelError::ObjectKindMismatch {
                    index,
                    kind: object.kind,
                });
            }
            if self.graphics.set(object.graphics).is_none() && !self.graphics.sets.is_empty() {
                return Err(LevelError::UnknownGraphics {
                    object: object.name.clone(),
                    graphics: object.graphics,
                });
            }
            for action in object.actions() {
                action
                    .kind
                    .check(self)
                    .map_err(|reason| LevelError::InvalidAction {
                        object: object.name.clone(),
                        action: action.name.clone(),
                        reason,
                    })?;
            }
        }

        for (graphics, set) in self.graphics.sets.iter().enumerate() {
            for (animation, anim) in set.animations.iter().enumerate() {
                if let Some(frame) = anim
                    .frames
                    .iter()
                    .find(|frame| self.graphics.sprite(frame.sprite).is_none())
                {
                    return Err(LevelError::UnknownSprite {
                        graphics,
                        animation,
                        sprite: frame.sprite,
                    });
                }
            }
        }

        for (index, sprite) in self.graphics.sprites.iter().enumerate() {
            let Some(image) = self.graphics.images.get(sprite.image) else {
                return Err(LevelError::UnknownImage {
                    sprite: index,
                    image: sprite.image,
                });
            };
            let rect = sprite.rect;
            if rect.min.x < 0
                || rect.min.y < 0
                || rect.max.x > image.width
                || rect.max.y > image.height
                || image.content.len() < (image.stride * image.height).max(0) as usize
            {
                return Err(LevelError::SpriteOutsideImage { sprite: index });
            }
            if rect.width() > MASK_WIDTH as i32 || rect.height() > MASK_WIDTH as i32 {
                return Err(LevelError::SpriteTooLarge {
                    sprite: index,
                    width: rect.width(),
                    height: rect.height(),
                });
            }
        }

        self.validate_map()?;

        for (index, so) in self.static_objects.iter().enumerate() {
            if self.object(so.kind()).is_none() {
                return Err(LevelError::InvalidStatic { index });
            }
        }
        for (index, placement) in self.placements.iter().enumerate() {
            if placement.object >= self.objects.len() {
                return Err(LevelError::InvalidPlacement { index });
            }
        }
        Ok(())
    }

    fn validate_map(&self) -> Result<(), LevelError> {
        let map = &self.map;
        if map.width == 0 || map.height == 0 {
            return Ok(());
        }
        if map.width < 0 || map.height < 0 {
            return Err(LevelError::InvalidMap {
                reason: "negative size",
            });
        }
        if map.cell_width <= 0 || map.cell_height <= 0 {
            return Err(LevelError::InvalidMap {
                reason: "empty cells",
            });
        }
        if map.stride < map.width {
            return Err(LevelError::InvalidMap {
                reason: "stride shorter than a row",
            });
        }
        if map.cells.len() < (map.stride * (map.height - 1) + map.width) as usize {
            return Err(LevelError::InvalidMap {
                reason: "not enough cells",
            });
        }
        if self.graphics.set(map.graphics).is_none() {
            return Err(LevelError::InvalidMap {
                reason: "missing graphics",
            });
        }
        Ok(())
    }

    /// Fresh state with every placement created, in declaration order
    pub fn initial_state(&self) -> State {
        let mut st = State::new(&self.settings);
        for placement in &self.placements {
            if let Some(object) = self.objects.get(placement.object) {
                object.newobject(self, &mut st, None, placement.pos);
            }
        }
        st
    }

    /// Instance of a record for spot/mask tests, if it shows a frame
    fn instance<'a>(&'a self, so: &StateObject, owner: Owner) -> Option<SpriteInstance<'a>> {
        let object = self.object(so.kind())?;
        Some(SpriteInstance {
            frame: object.frame(&self.graphics, so)?,
            coor: so.pos,
            owner,
            has_parallax: object.has_parallax(),
        })
    }

    /// Every spot/mask contact for the geometry of `st`, sorted.
    ///
    /// Live objects are tested against each other, against static objects
    /// and against the map. Only live objects own spots: static objects and
    /// map cells only provide masks.
    pub fn collisions(&self, st: &State) -> Vec<CollisionEvt> {
        let instances: Vec<SpriteInstance<'_>> = st
            .live_slots()
            .filter_map(|slot| self.instance(&st[slot], Owner::Slot(slot)))
            .chain(
                self.static_objects
                    .iter()
                    .enumerate()
                    .filter_map(|(i, so)| self.instance(so, Owner::Static(i))),
            )
            .collect();

        let masks: Vec<(CollisionMask, IPoint)> = instances
            .iter()
            .map(|inst| {
                self.graphics
                    .mask(inst.frame.sprite)
                    .copied()
                    .unwrap_or_default()
                    .with_spots(inst.frame)
            })
            .collect();

        let broad: Vec<MaskInstance<'_>> = instances
            .iter()
            .zip(&masks)
            .enumerate()
            .map(|(id, (inst, (mask, origin)))| MaskInstance {
                mask,
                coor: inst.coor + Point::from_ints(origin.x, origin.y),
                id,
                background: matches!(inst.owner, Owner::Static(_)),
            })
            .collect();

        let mut evts = Vec::new();
        for (a, b) in colliding(&broad, |i| !instances[i.id].has_parallax) {
            self.spot_events(&instances[a], &instances[b], &mut evts);
            self.spot_events(&instances[b], &instances[a], &mut evts);
        }

        let timestamp = st.timestamp as u32;
        for inst in instances.iter().filter(|i| !i.has_parallax) {
            let Owner::Slot(slot) = inst.owner else {
                continue;
            };
            for spot in Spot::ALL {
                for mask in Mask::ALL {
                    if self.map.contains(&self.graphics, timestamp, mask, inst, spot) {
                        evts.push(CollisionEvt {
                            spot_obj: slot,
                            spot,
                            mask,
                            mask_owner: Owner::Map,
                        });
                    }
                }
            }
        }

        evts.sort_unstable();
        evts.dedup();
        log::trace!("{} collision events at frame {}", evts.len(), st.timestamp);
        evts
    }

    /// Events for the spots of `spotter` inside the masks of `owner`
    fn spot_events(
        &self,
        spotter: &SpriteInstance<'_>,
        owner: &SpriteInstance<'_>,
        evts: &mut Vec<CollisionEvt>,
    ) {
        let Owner::Slot(slot) = spotter.owner else {
            return;
        };
        for spot in Spot::ALL {
            for mask in Mask::ALL {
                if owner.contains(&self.graphics, mask, spotter, spot) {
                    evts.push(CollisionEvt {
                        spot_obj: slot,
                        spot,
                        mask,
                        mask_owner: owner.owner,
                    });
                }
            }
        }
    }
}
