//! Paths: ordered arcs with a wrap policy
//!
//! A path is built once from level data and queried every frame with an
//! elapsed traversal time. The wrap policy defines what happens past the end:
//! - `stop_end`: clamp to the last point
//! - `reverse`: ping-pong (triangle wave over twice the length)
//! - otherwise: loop back to the start

use serde::{Deserialize, Serialize};

use super::arc::Arc;
use super::fixed::Fixed;
use super::point::Point;

/// Serialized form of a path; offsets are recomputed on load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathDef {
    pub arcs: Vec<Arc>,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub stop_end: bool,
}

/// Ordered composition of arcs keyed by cumulative start time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PathDef", into = "PathDef")]
pub struct Path {
    /// `(start offset, arc)`, offsets strictly increasing
    arcs: Vec<(Fixed, Arc)>,
    pub reverse: bool,
    pub stop_end: bool,
    /// Sum of arc durations
    total_length: Fixed,
}

impl Path {
    pub fn new(arcs: Vec<Arc>, reverse: bool, stop_end: bool) -> Self {
        let mut path = Self {
            arcs: Vec::with_capacity(arcs.len()),
            reverse,
            stop_end,
            total_length: Fixed::ZERO,
        };
        for arc in arcs {
            path.add_arc(arc);
        }
        path
    }

    /// Append an arc at the current end of the path
    pub fn add_arc(&mut self, arc: Arc) {
        // A zero-duration arc can never be selected and cannot be evaluated
        if arc.length <= 0 {
            log::debug!("Skipping degenerate arc ending at {:?}", arc.end);
            return;
        }
        let offset = self.total_length;
        self.total_length += arc.length;
        self.arcs.push((offset, arc));
    }

    /// End point of the last arc (origin for an empty path)
    pub fn last_node(&self) -> Point {
        self.arcs.last().map(|(_, arc)| arc.end).unwrap_or_default()
    }

    /// Straight segment continuing from the last node
    pub fn add_segment(&mut self, dest: Point, speed: Fixed) {
        self.add_segment_from(self.last_node(), dest, speed);
    }

    pub fn add_segment_from(&mut self, source: Point, dest: Point, speed: Fixed) {
        self.add_arc(Arc::segment(source, dest, speed));
    }

    /// Circular arc continuing from the last node
    pub fn add_curve(&mut self, speed: Fixed, radius: Fixed, angle_start: Fixed, angle_end: Fixed) {
        self.add_curve_from(self.last_node(), speed, radius, angle_start, angle_end);
    }

    pub fn add_curve_from(
        &mut self,
        source: Point,
        speed: Fixed,
        radius: Fixed,
        angle_start: Fixed,
        angle_end: Fixed,
    ) {
        self.add_arc(Arc::circular(source, speed, radius, angle_start, angle_end));
    }

    pub fn total_length(&self) -> Fixed {
        self.total_length
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.iter().map(|(_, arc)| arc)
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Position after `timestamp` traversal time units
    pub fn at(&self, timestamp: Fixed) -> Point {
        if self.arcs.is_empty() {
            return Point::ZERO;
        }

        let total = self.total_length;
        let mut t = timestamp.abs();

        if self.stop_end {
            t = t.min(total);
        } else if self.reverse {
            t %= total * 2;
            if t > total {
                t = total * 2 - t;
            }
        } else {
            t %= total;
        }

        // Last arc starting at or before t
        let index = self.arcs.partition_point(|(offset, _)| *offset <= t) - 1;
        let (offset, arc) = &self.arcs[index];
        arc.at((t - *offset).min(arc.length))
    }
}

impl From<PathDef> for Path {
    fn from(def: PathDef) -> Self {
        Path::new(def.arcs, def.reverse, def.stop_end)
    }
}

impl From<Path> for PathDef {
    fn from(path: Path) -> Self {
        PathDef {
            arcs: path.arcs.into_iter().map(|(_, arc)| arc).collect(),
            reverse: path.reverse,
            stop_end: path.stop_end,
        }
    }
}
