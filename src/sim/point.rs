//! Planar points in fixed-point space
//!
//! A `Point` behaves like a complex number: `re` is the horizontal axis and
//! `im` the vertical one (screen convention, growing downward). Rotation is
//! multiplication by `expj(angle)`.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::fixed::{Fixed, cos, sin};

/// 2D point / vector of fixed-point scalars
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Point {
    pub re: Fixed,
    pub im: Fixed,
}

impl Point {
    pub const ZERO: Point = Point {
        re: Fixed::ZERO,
        im: Fixed::ZERO,
    };

    pub const fn new(re: Fixed, im: Fixed) -> Self {
        Self { re, im }
    }

    pub const fn from_ints(re: i32, im: i32) -> Self {
        Self {
            re: Fixed::from_int(re),
            im: Fixed::from_int(im),
        }
    }

    #[inline]
    pub fn real(self) -> Fixed {
        self.re
    }

    #[inline]
    pub fn imag(self) -> Fixed {
        self.im
    }

    /// Complex conjugate
    pub fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }

    /// Scalar product
    pub fn dot(self, other: Point) -> Fixed {
        self.re * other.re + self.im * other.im
    }

    /// Integer grid cell containing this point (truncating toward zero)
    pub fn to_ipoint(self) -> IPoint {
        IPoint::new(self.re.roundin() as i32, self.im.roundin() as i32)
    }

    /// Render-side conversion; never feed the result back into the simulation
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.re.to_f32(), self.im.to_f32())
    }
}

/// Unit vector at `angle` (grad400): `cos(angle) + i·sin(angle)`
pub fn expj(angle: Fixed) -> Point {
    Point::new(cos(angle), sin(angle))
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.re, -self.im)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        *self = *self + rhs;
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        *self = *self - rhs;
    }
}

/// Complex product
impl Mul for Point {
    type Output = Point;
    fn mul(self, rhs: Point) -> Point {
        Point::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Mul<Fixed> for Point {
    type Output = Point;
    fn mul(self, rhs: Fixed) -> Point {
        Point::new(self.re * rhs, self.im * rhs)
    }
}

impl Mul<Point> for Fixed {
    type Output = Point;
    fn mul(self, rhs: Point) -> Point {
        rhs * self
    }
}

impl Mul<i32> for Point {
    type Output = Point;
    fn mul(self, rhs: i32) -> Point {
        Point::new(self.re * rhs, self.im * rhs)
    }
}

/// Integer point (pixel coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IPoint {
    pub x: i32,
    pub y: i32,
}

impl IPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for IPoint {
    type Output = IPoint;
    fn add(self, rhs: IPoint) -> IPoint {
        IPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Inclusive rectangle in fixed-point space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn inside(&self, p: Point) -> bool {
        self.min.re <= p.re && self.min.im <= p.im && self.max.re >= p.re && self.max.im >= p.im
    }
}

/// Pixel rectangle, `min` inclusive and `max` exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IRect {
    pub min: IPoint,
    pub max: IPoint,
}

impl IRect {
    pub const fn new(min: IPoint, max: IPoint) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn inside(&self, p: IPoint) -> bool {
        self.min.x <= p.x && self.min.y <= p.y && self.max.x > p.x && self.max.y > p.y
    }
}
