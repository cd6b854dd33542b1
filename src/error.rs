use std::fmt;

use crate::consts::MASK_WIDTH;

/// Slot pool misuse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolError {
    OutOfRange { slot: usize },
    AlreadyFree { slot: usize },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { slot } => write!(f, "slot {slot} is outside the pool"),
            Self::AlreadyFree { slot } => write!(f, "slot {slot} is already free"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Rollback buffer that does not hold a `State` image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotError {
    Size { expected: usize, actual: usize },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size { expected, actual } => write!(
                f,
                "snapshot size mismatch: expected {expected} bytes, got {actual}"
            ),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Inconsistent level tables
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelError {
    TooManyObjects { count: usize, max: usize },
    ObjectKindMismatch { index: usize, kind: u8 },
    UnknownGraphics { object: String, graphics: usize },
    UnknownSprite { graphics: usize, animation: usize, sprite: usize },
    UnknownImage { sprite: usize, image: usize },
    SpriteOutsideImage { sprite: usize },
    SpriteTooLarge { sprite: usize, width: i32, height: i32 },
    InvalidMap { reason: &'static str },
    InvalidStatic { index: usize },
    InvalidPlacement { index: usize },
    InvalidAction { object: String, action: String, reason: &'static str },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyObjects { count, max } => {
                write!(f, "too many object types: {count} (max {max})")
            }
            Self::ObjectKindMismatch { index, kind } => {
                write!(f, "object at index {index} declares kind {kind}")
            }
            Self::UnknownGraphics { object, graphics } => {
                write!(f, "object '{object}' refers to missing graphics {graphics}")
            }
            Self::UnknownSprite {
                graphics,
                animation,
                sprite,
            } => write!(
                f,
                "animation {animation} of graphics {graphics} refers to missing sprite {sprite}"
            ),
            Self::UnknownImage { sprite, image } => {
                write!(f, "sprite {sprite} refers to missing image {image}")
            }
            Self::SpriteOutsideImage { sprite } => {
                write!(f, "sprite {sprite} rectangle exceeds its image")
            }
            Self::SpriteTooLarge {
                sprite,
                width,
                height,
            } => write!(
                f,
                "sprite {sprite} is {width}x{height}, collision masks hold at most {MASK_WIDTH}x{MASK_WIDTH}"
            ),
            Self::InvalidMap { reason } => write!(f, "invalid map: {reason}"),
            Self::InvalidStatic { index } => {
                write!(f, "static object {index} has an unknown kind")
            }
            Self::InvalidPlacement { index } => {
                write!(f, "initial placement {index} has an unknown object type")
            }
            Self::InvalidAction {
                object,
                action,
                reason,
            } => write!(f, "invalid action '{object}/{action}': {reason}"),
        }
    }
}

impl std::error::Error for LevelError {}

/// Failure to read settings or level content
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(LevelError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "read failed: {err}"),
            Self::Json(err) => write!(f, "malformed json: {err}"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<LevelError> for LoadError {
    fn from(err: LevelError) -> Self {
        Self::Invalid(err)
    }
}
