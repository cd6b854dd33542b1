//! Deterministic Q22.10 fixed-point scalar
//!
//! Every observable quantity of the simulation goes through this type:
//! - 10 fractional bits in an `i32`
//! - multiply/divide widen to `i64`
//! - trigonometry in grad400 (400 units per full turn) from a quarter table
//! - roots and angles are seeded from `f64`, then settled by integer loops
//!
//! Overflow, division by zero and negative `sqrt` are precondition
//! violations: they trip `debug_assert!` in debug builds and are not checked
//! in release builds.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::point::Point;

/// Number of fractional bits
pub const FRAC_BITS: u32 = 10;
/// Raw representation of 1.0
pub const ONE_RAW: i32 = 1 << FRAC_BITS;
/// Angle units per full turn
pub const FULL_TURN: i32 = 400;

/// Signed fixed-point number, value × 2^10.
///
/// Serialized as the raw scaled integer so content tables stay bit-exact.
#[repr(transparent)]
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(i32);

/// π rounded to the fixed-point grid
pub const PI: Fixed = Fixed(3217);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(ONE_RAW);
    /// Smallest representable positive step
    pub const EPSILON: Fixed = Fixed(1);

    /// Integer value
    pub const fn from_int(value: i32) -> Self {
        Self(value * ONE_RAW)
    }

    /// Raw scaled value
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// `num / den` rounded toward zero (handy for tuning constants)
    pub const fn from_ratio(num: i32, den: i32) -> Self {
        Self(((num as i64 * ONE_RAW as i64) / den as i64) as i32)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Integer part, rounded toward zero
    pub const fn roundin(self) -> i64 {
        (self.0 / ONE_RAW) as i64
    }

    /// Integer part, rounded away from zero
    pub const fn roundout(self) -> i64 {
        let value = self.0 as i64;
        let one = ONE_RAW as i64;
        if value < 0 {
            (value - one + 1) / one
        } else {
            (value + one - 1) / one
        }
    }

    /// Signed raw remainder below one unit
    pub const fn fractional(self) -> i64 {
        (self.0 % ONE_RAW) as i64
    }

    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Lossless conversion for diagnostics and seeds. Never feed the result
    /// back into simulation state.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / ONE_RAW as f64
    }

    /// Conversion for the render boundary
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / ONE_RAW as f32
    }

    /// Clamp into `[low, high]`
    pub fn clamp_to(self, low: Fixed, high: Fixed) -> Fixed {
        self.max(low).min(high)
    }
}

#[inline]
fn narrow(value: i64) -> i32 {
    debug_assert!(
        value >= i32::MIN as i64 && value <= i32::MAX as i64,
        "fixed-point overflow: {value}"
    );
    value as i32
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", self.to_f64())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Fixed::from_int(value)
    }
}

// Fixed ∘ Fixed

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(narrow(self.0 as i64 * rhs.0 as i64 / ONE_RAW as i64))
    }
}

impl Div for Fixed {
    type Output = Fixed;
    fn div(self, rhs: Fixed) -> Fixed {
        debug_assert!(rhs.0 != 0, "fixed-point division by zero");
        Fixed(narrow(self.0 as i64 * ONE_RAW as i64 / rhs.0 as i64))
    }
}

impl Rem for Fixed {
    type Output = Fixed;
    fn rem(self, rhs: Fixed) -> Fixed {
        debug_assert!(rhs.0 != 0, "fixed-point remainder by zero");
        Fixed(self.0 % rhs.0)
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

// Fixed ∘ integer

impl Add<i32> for Fixed {
    type Output = Fixed;
    fn add(self, rhs: i32) -> Fixed {
        Fixed(self.0 + rhs * ONE_RAW)
    }
}

impl Sub<i32> for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: i32) -> Fixed {
        Fixed(self.0 - rhs * ONE_RAW)
    }
}

impl Mul<i32> for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: i32) -> Fixed {
        Fixed(self.0 * rhs)
    }
}

impl Div<i32> for Fixed {
    type Output = Fixed;
    fn div(self, rhs: i32) -> Fixed {
        debug_assert!(rhs != 0, "fixed-point division by zero");
        Fixed(self.0 / rhs)
    }
}

impl Rem<i32> for Fixed {
    type Output = Fixed;
    fn rem(self, rhs: i32) -> Fixed {
        debug_assert!(rhs != 0, "fixed-point remainder by zero");
        Fixed(self.0 % (rhs * ONE_RAW))
    }
}

impl Add<Fixed> for i32 {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        rhs + self
    }
}

impl Sub<Fixed> for i32 {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed::from_int(self) - rhs
    }
}

impl Mul<Fixed> for i32 {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        rhs * self
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fixed {
    fn mul_assign(&mut self, rhs: Fixed) {
        *self = *self * rhs;
    }
}

impl DivAssign for Fixed {
    fn div_assign(&mut self, rhs: Fixed) {
        *self = *self / rhs;
    }
}

impl RemAssign for Fixed {
    fn rem_assign(&mut self, rhs: Fixed) {
        *self = *self % rhs;
    }
}

impl AddAssign<i32> for Fixed {
    fn add_assign(&mut self, rhs: i32) {
        *self = *self + rhs;
    }
}

impl SubAssign<i32> for Fixed {
    fn sub_assign(&mut self, rhs: i32) {
        *self = *self - rhs;
    }
}

impl MulAssign<i32> for Fixed {
    fn mul_assign(&mut self, rhs: i32) {
        *self = *self * rhs;
    }
}

impl DivAssign<i32> for Fixed {
    fn div_assign(&mut self, rhs: i32) {
        *self = *self / rhs;
    }
}

impl RemAssign<i32> for Fixed {
    fn rem_assign(&mut self, rhs: i32) {
        *self = *self % rhs;
    }
}

impl PartialEq<i32> for Fixed {
    fn eq(&self, other: &i32) -> bool {
        self.0 as i64 == *other as i64 * ONE_RAW as i64
    }
}

impl PartialOrd<i32> for Fixed {
    fn partial_cmp(&self, other: &i32) -> Option<Ordering> {
        Some((self.0 as i64).cmp(&(*other as i64 * ONE_RAW as i64)))
    }
}

/// Quarter-period cosine table, one entry per grad, raw units (1024 = 1.0)
static COS_GRAD: [u16; 101] = [
    1024, 1023, 1023, 1022, 1021, 1020, 1019, 1017, 1015, 1013, 1011, 1008, 1005, 1002, 999, 995,
    991, 987, 983, 978, 973, 968, 963, 957, 952, 946, 939, 933, 926, 919, 912, 904, 897, 889, 881,
    873, 864, 855, 846, 837, 828, 818, 809, 799, 789, 778, 768, 757, 746, 735, 724, 712, 700, 689,
    677, 665, 652, 640, 627, 614, 601, 588, 575, 562, 548, 535, 521, 507, 493, 479, 464, 450, 435,
    421, 406, 391, 376, 361, 346, 331, 316, 301, 285, 270, 254, 239, 223, 207, 191, 176, 160, 144,
    128, 112, 96, 80, 64, 48, 32, 16, 0,
];

/// Cosine of an angle in grad400
pub fn cos(angle: Fixed) -> Fixed {
    let mut angle = angle.abs() % FULL_TURN;
    if angle > 200 {
        angle = FULL_TURN - angle;
    }

    let negative = angle > 100;
    if negative {
        angle = 200 - angle;
    }

    // Linear interpolation between the two bracketing grads
    let index = angle.roundin() as usize;
    let frac = angle.fractional() as i32;
    let low = COS_GRAD[index] as i32;
    let high = COS_GRAD[(index + 1).min(100)] as i32;
    let value = low + (high - low) * frac / ONE_RAW;

    Fixed(if negative { -value } else { value })
}

/// Sine of an angle in grad400
pub fn sin(angle: Fixed) -> Fixed {
    cos(100 - angle)
}

/// Largest `r >= 0` whose fixed-point square `r * r / 2^10` stays `<= target`.
///
/// The seed only decides how many steps the loops take, never where they stop.
fn settle_root(seed: i64, target: i64) -> i64 {
    let fits = |r: i64| r * r / ONE_RAW as i64 <= target;
    let mut root = seed.max(0);
    while root > 0 && !fits(root) {
        root -= 1;
    }
    while fits(root + 1) {
        root += 1;
    }
    root
}

/// Square root, largest `r` with `r * r <= number`.
///
/// `number` must not be negative.
pub fn sqrt(number: Fixed) -> Fixed {
    debug_assert!(number.0 >= 0, "sqrt of negative fixed-point value");
    let seed = (number.to_f64().sqrt() * ONE_RAW as f64).ceil() as i64;
    Fixed(narrow(settle_root(seed, number.0 as i64)))
}

/// Euclidean norm of a vector, evaluated against a 64-bit sum of squares
pub fn hypot(vect: Point) -> Fixed {
    let x = vect.re.0 as i64;
    let y = vect.im.0 as i64;
    let squared = (x * x + y * y) / ONE_RAW as i64;
    let seed = (vect.re.to_f64().hypot(vect.im.to_f64()) * ONE_RAW as f64).ceil() as i64;
    Fixed(narrow(settle_root(seed, squared)))
}

/// Grads searched on each side of the floating-point estimate by `atan2`
const ATAN2_BRACKET: i32 = 2;

/// Direction of a vector in grad400.
///
/// The result maximises `Re(expj(angle) * conj(vect))`. The interpolated
/// cosine table makes that score a staircase, so every raw angle within
/// `ATAN2_BRACKET` grads of the floating-point estimate is scored and the
/// lowest maximum wins. The maximum is a plateau of raw values; its centre
/// is returned. The zero vector maps to angle 0.
pub fn atan2(vect: Point) -> Fixed {
    if vect.re.0 == 0 && vect.im.0 == 0 {
        return Fixed::ZERO;
    }

    let score = |raw: i32| -> i64 {
        let angle = Fixed(raw);
        cos(angle).0 as i64 * vect.re.0 as i64 + sin(angle).0 as i64 * vect.im.0 as i64
    };

    let estimate = vect.im.to_f64().atan2(vect.re.to_f64()) * 200.0 / std::f64::consts::PI;
    let centre = estimate.round() as i32;
    let first = (centre - ATAN2_BRACKET) * ONE_RAW;
    let last = (centre + ATAN2_BRACKET) * ONE_RAW;

    let mut low = first;
    let mut best = score(first);
    for raw in first + 1..=last {
        let here = score(raw);
        if here > best {
            best = here;
            low = raw;
        }
    }

    while score(low - 1) >= best {
        low -= 1;
    }
    let mut high = low;
    while score(high + 1) >= best {
        high += 1;
    }

    Fixed((low + high).div_euclid(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn safe() -> impl Strategy<Value = i32> {
        -(1 << 20)..(1 << 20)
    }

    #[test]
    fn test_integer_conversions() {
        assert_eq!(Fixed::from_int(3).raw(), 3 * 1024);
        assert_eq!(Fixed::from_ratio(1, 4).raw(), 256);
        assert_eq!(Fixed::from_int(7), 7);
        assert!(Fixed::from_int(7) > 6);
        assert!(Fixed::from_raw(-1) < 0);
    }

    #[test]
    fn test_rounding() {
        let x = Fixed::from_raw(1536); // 1.5
        assert_eq!(x.roundin(), 1);
        assert_eq!(x.roundout(), 2);
        assert_eq!((-x).roundin(), -1);
        assert_eq!((-x).roundout(), -2);
        assert_eq!(Fixed::from_int(4).roundout(), 4);
        assert_eq!(Fixed::from_int(-4).roundin(), -4);
        assert_eq!((-x).fractional(), -512);
    }

    #[test]
    fn test_mixed_operands() {
        let x = Fixed::from_int(10);
        assert_eq!(x + 2, 12);
        assert_eq!(x - 2, 8);
        assert_eq!(x * 3, 30);
        assert_eq!(x / 4, Fixed::from_raw(2560));
        assert_eq!(x % 3, 1);
        assert_eq!(20 - x, 10);
        assert_eq!(Fixed::from_ratio(5, 2) * Fixed::from_int(2), 5);
        assert_eq!(Fixed::from_int(9) / Fixed::from_int(2), Fixed::from_ratio(9, 2));
    }

    #[test]
    fn test_cos_landmarks() {
        assert_eq!(cos(Fixed::ZERO), Fixed::ONE);
        assert_eq!(cos(Fixed::from_int(100)), Fixed::ZERO);
        assert_eq!(cos(Fixed::from_int(200)), -Fixed::ONE);
        assert_eq!(cos(Fixed::from_int(300)), Fixed::ZERO);
        assert_eq!(cos(Fixed::from_int(400)), Fixed::ONE);
        assert_eq!(sin(Fixed::from_int(100)), Fixed::ONE);
        assert_eq!(sin(Fixed::from_int(-100)), -Fixed::ONE);
    }

    #[test]
    fn test_cos_interpolates() {
        // Halfway between grad 50 (724) and 51 (712)
        let c = cos(Fixed::from_raw(50 * 1024 + 512));
        assert_eq!(c.raw(), 718);
    }

    #[test]
    fn test_sqrt_exact_squares() {
        assert_eq!(sqrt(Fixed::from_int(16)), 4);
        assert_eq!(sqrt(Fixed::ZERO), 0);
        assert_eq!(sqrt(Fixed::ONE), 1);
    }

    #[test]
    fn test_hypot_pythagorean() {
        let v = Point::from_ints(3, 4);
        assert_eq!(hypot(v), 5);
        let v = Point::from_ints(-6, 8);
        assert_eq!(hypot(v), 10);
    }

    #[test]
    fn test_atan2_axes() {
        assert_eq!(atan2(Point::from_ints(1, 0)), 0);
        assert_eq!(atan2(Point::from_ints(0, 1)), 100);
        assert_eq!(atan2(Point::from_ints(-5, 0)), 200);
        assert_eq!(atan2(Point::from_ints(0, -3)), -100);
        assert_eq!(atan2(Point::ZERO), 0);
    }

    /// Best score over a whole turn, by exhaustive search
    fn best_score(vect: Point) -> i64 {
        let score = |raw: i32| {
            let angle = Fixed(raw);
            cos(angle).0 as i64 * vect.re.0 as i64 + sin(angle).0 as i64 * vect.im.0 as i64
        };
        (-200 * ONE_RAW..200 * ONE_RAW).map(score).max().unwrap_or(0)
    }

    #[test]
    fn test_atan2_reaches_the_maximum() {
        let mut vects = vec![Point::new(Fixed(-1480), Fixed(-2120))];
        for x in -4..=4 {
            for y in -4..=4 {
                if (x, y) != (0, 0) {
                    vects.push(Point::new(Fixed(x * 37), Fixed(y * 53)));
                }
            }
        }
        for vect in vects {
            let angle = atan2(vect);
            let reached = cos(angle).0 as i64 * vect.re.0 as i64
                + sin(angle).0 as i64 * vect.im.0 as i64;
            assert_eq!(reached, best_score(vect), "atan2{:?} = {:?}", vect, angle);
        }
    }

    #[test]
    fn test_atan2_diagonal() {
        let angle = atan2(Point::from_ints(10, 10));
        assert!((angle - 50).abs() < Fixed::ONE, "got {angle}");
    }

    proptest! {
        #[test]
        fn prop_add_sub_inverse(a in safe(), b in safe()) {
            let (a, b) = (Fixed::from_raw(a), Fixed::from_raw(b));
            prop_assert_eq!((a + b) - b, a);
        }

        #[test]
        fn prop_mul_identity(a in safe()) {
            let a = Fixed::from_raw(a);
            prop_assert_eq!(a * Fixed::ONE, a);
            prop_assert_eq!(a * 1, a);
        }

        #[test]
        fn prop_rounding_symmetry(a in safe()) {
            let a = Fixed::from_raw(a);
            prop_assert_eq!(a.roundout(), -(-a).roundout());
            prop_assert_eq!(a.roundin(), -(-a).roundin());
            prop_assert!(a.roundin().abs() <= a.roundout().abs());
        }

        #[test]
        fn prop_sin_is_shifted_cos(a in -(800 * 1024)..(800 * 1024)) {
            let a = Fixed::from_raw(a);
            prop_assert_eq!(sin(a), cos(100 - a));
        }

        #[test]
        fn prop_cos_bounded(a in -(800 * 1024)..(800 * 1024)) {
            let c = cos(Fixed::from_raw(a));
            prop_assert!(c >= -1 && c <= 1);
        }

        #[test]
        fn prop_sqrt_is_tight(n in 0..(1 << 30)) {
            let n = Fixed::from_raw(n);
            let r = sqrt(n);
            prop_assert!(r * r <= n);
            let next = r + Fixed::EPSILON;
            prop_assert!(next * next > n);
        }
    }
}
