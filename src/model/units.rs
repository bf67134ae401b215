//! Lengths and rectangles in English Metric Units.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A length in EMU, the integer unit of DrawingML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Emu(pub i64);

impl Emu {
    /// EMU per inch.
    pub const PER_INCH: i64 = 914_400;
    /// EMU per typographic point.
    pub const PER_POINT: i64 = 12_700;
    /// EMU per centimeter.
    pub const PER_CM: i64 = 360_000;

    /// Zero length.
    pub const ZERO: Emu = Emu(0);

    /// Largest magnitude accepted for a length taken from an edit plan.
    pub const LIMIT: i64 = 1 << 31;

    /// Length from inches, rounded to the nearest EMU.
    pub fn from_inches(inches: f64) -> Self {
        Emu((inches * Self::PER_INCH as f64).round() as i64)
    }

    /// Length from points, rounded to the nearest EMU.
    pub fn from_points(points: f64) -> Self {
        Emu((points * Self::PER_POINT as f64).round() as i64)
    }

    /// Length from centimeters, rounded to the nearest EMU.
    pub fn from_cm(cm: f64) -> Self {
        Emu((cm * Self::PER_CM as f64).round() as i64)
    }

    /// `Some` when the magnitude is within [`Emu::LIMIT`].
    pub fn bounded(value: i64) -> Option<Self> {
        (value.checked_abs()? <= Self::LIMIT).then_some(Emu(value))
    }

    pub fn checked_add(self, rhs: Emu) -> Option<Emu> {
        self.0.checked_add(rhs.0).map(Emu)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Emu> {
        self.0.checked_mul(rhs).map(Emu)
    }

    /// Raw EMU value.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Length in points.
    pub fn points(self) -> f64 {
        self.0 as f64 / Self::PER_POINT as f64
    }

    /// Length in inches.
    pub fn inches(self) -> f64 {
        self.0 as f64 / Self::PER_INCH as f64
    }
}

impl Add for Emu {
    type Output = Emu;
    fn add(self, rhs: Emu) -> Emu {
        Emu(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Emu {
    type Output = Emu;
    fn sub(self, rhs: Emu) -> Emu {
        Emu(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<i64> for Emu {
    type Output = Emu;
    fn mul(self, rhs: i64) -> Emu {
        Emu(self.0.saturating_mul(rhs))
    }
}

impl Div<i64> for Emu {
    type Output = Emu;
    fn div(self, rhs: i64) -> Emu {
        Emu(self.0 / rhs)
    }
}

impl Neg for Emu {
    type Output = Emu;
    fn neg(self) -> Emu {
        Emu(self.0.saturating_neg())
    }
}

impl std::fmt::Display for Emu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} EMU", self.0)
    }
}

/// A point on the slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: Emu,
    pub y: Emu,
}

impl Point {
    pub fn new(x: Emu, y: Emu) -> Self {
        Self { x, y }
    }
}

/// Position and size of a shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

impl Rect {
    pub fn new(left: Emu, top: Emu, width: Emu, height: Emu) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> Emu {
        self.left + self.width
    }

    pub fn bottom(&self) -> Emu {
        self.top + self.height
    }

    /// Midpoint of the right edge.
    pub fn right_center(&self) -> Point {
        Point::new(self.right(), self.top + self.height / 2)
    }

    /// Midpoint of the left edge.
    pub fn left_center(&self) -> Point {
        Point::new(self.left, self.top + self.height / 2)
    }

    /// Bounding box of a segment, with the flips needed to draw it from
    /// `begin` to `end`.
    pub fn spanning(begin: Point, end: Point) -> (Rect, bool, bool) {
        let rect = Rect::new(
            begin.x.min(end.x),
            begin.y.min(end.y),
            Emu(end.x.0.abs_diff(begin.x.0).min(i64::MAX as u64) as i64),
            Emu(end.y.0.abs_diff(begin.y.0).min(i64::MAX as u64) as i64),
        );
        (rect, begin.x > end.x, begin.y > end.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Emu::from_inches(1.0), Emu(914_400));
        assert_eq!(Emu::from_points(2.5), Emu(31_750));
        assert_eq!(Emu::from_cm(1.0), Emu(360_000));
        assert_eq!(Emu(25_400).points(), 2.0);
        assert_eq!(Emu::from_inches(0.1), Emu(91_440));
    }

    #[test]
    fn test_edges() {
        let rect = Rect::new(Emu(100), Emu(200), Emu(300), Emu(50));
        assert_eq!(rect.right_center(), Point::new(Emu(400), Emu(225)));
        assert_eq!(rect.left_center(), Point::new(Emu(100), Emu(225)));
    }

    #[test]
    fn test_extreme_values_saturate() {
        let rect = Rect::new(Emu(i64::MAX), Emu(i64::MAX - 1), Emu(10), Emu(10));
        assert_eq!(rect.right(), Emu(i64::MAX));
        assert_eq!(rect.right_center().y, Emu(i64::MAX));
        assert_eq!(Emu(i64::MIN) - Emu(1), Emu(i64::MIN));
        assert_eq!(Emu(i64::MAX) * 2, Emu(i64::MAX));
        let (span, _, _) = Rect::spanning(Point::new(Emu(i64::MIN), Emu(0)), Point::new(Emu(i64::MAX), Emu(0)));
        assert_eq!(span.width, Emu(i64::MAX));
    }

    #[test]
    fn test_bounded() {
        assert_eq!(Emu::bounded(914_400), Some(Emu(914_400)));
        assert_eq!(Emu::bounded(-Emu::LIMIT), Some(Emu(-Emu::LIMIT)));
        assert_eq!(Emu::bounded(Emu::LIMIT + 1), None);
        assert_eq!(Emu::bounded(i64::MIN), None);
        assert_eq!(Emu(i64::MAX).checked_add(Emu(1)), None);
        assert_eq!(Emu(3).checked_mul(4), Some(Emu(12)));
    }

    #[test]
    fn test_spanning_flips() {
        let (rect, flip_h, flip_v) =
            Rect::spanning(Point::new(Emu(500), Emu(100)), Point::new(Emu(200), Emu(300)));
        assert_eq!(rect, Rect::new(Emu(200), Emu(100), Emu(300), Emu(200)));
        assert!(flip_h);
        assert!(!flip_v);
    }
}
