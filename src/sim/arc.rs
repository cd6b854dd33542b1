//! Arc segments: the atomic motion primitive of a path
//!
//! An arc is either a straight segment `start -> end` or a circular segment
//! around a centre. Both are parametrized by traversal time: `length` is the
//! geometric length divided by the traversal speed, and `at(t)` moves along
//! the arc at constant speed for `t` in `[0, length]`.

use serde::{Deserialize, Serialize};

use super::fixed::{Fixed, PI, hypot};
use super::point::{Point, expj};

/// Circular part of an arc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curve {
    pub center: Point,
    pub radius: Fixed,
    /// Start angle (grad400)
    pub angle_start: Fixed,
    /// End angle (grad400)
    pub angle_end: Fixed,
}

/// A segment or circular arc traversed at constant speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arc {
    pub start: Point,
    pub end: Point,
    pub speed: Fixed,
    /// Traversal duration (geometric length / speed)
    pub length: Fixed,
    /// `None` for straight segments
    pub curve: Option<Curve>,
}

impl Arc {
    /// Straight segment from `start` to `end`
    pub fn segment(start: Point, end: Point, speed: Fixed) -> Self {
        let length = hypot(end - start) / speed;
        Self {
            start,
            end,
            speed,
            length,
            curve: None,
        }
    }

    /// Circular arc starting at `start`, sweeping `angle_start -> angle_end`.
    ///
    /// Requires `angle_end > angle_start`.
    pub fn circular(
        start: Point,
        speed: Fixed,
        radius: Fixed,
        angle_start: Fixed,
        angle_end: Fixed,
    ) -> Self {
        debug_assert!(angle_end > angle_start, "circular arc must sweep forward");
        let center = start - expj(angle_start) * radius;
        let end = center + expj(angle_end) * radius;
        let length = radius * 2 * PI * (angle_end - angle_start).abs() / 400 / speed;
        Self {
            start,
            end,
            speed,
            length,
            curve: Some(Curve {
                center,
                radius,
                angle_start,
                angle_end,
            }),
        }
    }

    pub fn is_curved(&self) -> bool {
        self.curve.is_some()
    }

    /// Same geometry traversed backward
    pub fn reversed(&self) -> Self {
        let mut result = *self;
        std::mem::swap(&mut result.start, &mut result.end);
        if let Some(curve) = result.curve.as_mut() {
            std::mem::swap(&mut curve.angle_start, &mut curve.angle_end);
        }
        result
    }

    /// Position after `param` time units, `0 <= param <= length`
    pub fn at(&self, param: Fixed) -> Point {
        debug_assert!(
            param >= 0 && param <= self.length,
            "arc parameter {param} outside [0, {}]",
            self.length
        );
        let k = param / self.length;
        match self.curve {
            Some(curve) => {
                let angle = curve.angle_start + (curve.angle_end - curve.angle_start) * k;
                curve.center + expj(angle) * curve.radius
            }
            None => self.start + (self.end - self.start) * k,
        }
    }
}
