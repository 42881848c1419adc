//! Points and 2-D affine matrices used to position glyphs.
//!
//! `Point` is `#[repr(C)]` and `Pod` so position arrays can be handed to
//! GPU upload code without copying.

use std::ops::{Add, Sub};

use bytemuck::{Pod, Zeroable};

// ───────────────────────────────────────────────────────────────────
// Point / IPoint
// ───────────────────────────────────────────────────────────────────

/// A 2-D floating point coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Offset by an integer device shift.
    #[inline]
    pub fn offset(self, shift: IPoint) -> Self {
        Self {
            x: self.x + shift.x as f32,
            y: self.y + shift.y as f32,
        }
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An integer device-space coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IPoint {
    pub x: i32,
    pub y: i32,
}

impl IPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Round half up on each axis: `floor(v + 0.5)`.
    #[inline]
    pub fn round(p: Point) -> Self {
        Self {
            x: (p.x + 0.5).floor() as i32,
            y: (p.y + 0.5).floor() as i32,
        }
    }

    #[inline]
    pub fn floor(p: Point) -> Self {
        Self {
            x: p.x.floor() as i32,
            y: p.y.floor() as i32,
        }
    }

    #[inline]
    pub fn to_point(self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }
}

// ───────────────────────────────────────────────────────────────────
// Matrix
// ───────────────────────────────────────────────────────────────────

/// A 2x3 affine transform.
///
/// ```text
/// | sx kx tx |   | x |
/// | ky sy ty | * | y |
///                | 1 |
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    pub sx: f32,
    pub kx: f32,
    pub tx: f32,
    pub ky: f32,
    pub sy: f32,
    pub ty: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        sx: 1.0,
        kx: 0.0,
        tx: 0.0,
        ky: 0.0,
        sy: 1.0,
        ty: 0.0,
    };

    pub const fn new(sx: f32, kx: f32, tx: f32, ky: f32, sy: f32, ty: f32) -> Self {
        Self { sx, kx, tx, ky, sy, ty }
    }

    pub const fn translate(dx: f32, dy: f32) -> Self {
        Self::new(1.0, 0.0, dx, 0.0, 1.0, dy)
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// `self * other`: `other` is applied first.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            sx: self.sx * other.sx + self.kx * other.ky,
            kx: self.sx * other.kx + self.kx * other.sy,
            tx: self.sx * other.tx + self.kx * other.ty + self.tx,
            ky: self.ky * other.sx + self.sy * other.ky,
            sy: self.ky * other.kx + self.sy * other.sy,
            ty: self.ky * other.tx + self.sy * other.ty + self.ty,
        }
    }

    /// Append a translation applied after this matrix.
    pub fn post_translate(&self, dx: f32, dy: f32) -> Matrix {
        Matrix {
            tx: self.tx + dx,
            ty: self.ty + dy,
            ..*self
        }
    }

    /// True when the linear part is the identity.
    pub fn is_translate(&self) -> bool {
        self.sx == 1.0 && self.kx == 0.0 && self.ky == 0.0 && self.sy == 1.0
    }

    /// True when `other` differs from `self` by at most a translation.
    pub fn same_linear_part(&self, other: &Matrix) -> bool {
        self.sx == other.sx && self.kx == other.kx && self.ky == other.ky && self.sy == other.sy
    }

    /// The linear part as raw bits, usable as a hash key.
    pub fn linear_bits(&self) -> [u32; 4] {
        [
            self.sx.to_bits(),
            self.kx.to_bits(),
            self.ky.to_bits(),
            self.sy.to_bits(),
        ]
    }

    pub fn invert(&self) -> Option<Matrix> {
        let det = self.sx * self.sy - self.kx * self.ky;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let sx = self.sy * inv;
        let kx = -self.kx * inv;
        let ky = -self.ky * inv;
        let sy = self.sx * inv;
        Some(Matrix {
            sx,
            kx,
            tx: -(sx * self.tx + kx * self.ty),
            ky,
            sy,
            ty: -(ky * self.tx + sy * self.ty),
        })
    }

    #[inline]
    pub fn map_point(&self, p: Point) -> Point {
        Point::new(
            self.sx * p.x + self.kx * p.y + self.tx,
            self.ky * p.x + self.sy * p.y + self.ty,
        )
    }

    /// Map `src` into `dst`. Both slices must have the same length.
    pub fn map_points(&self, dst: &mut [Point], src: &[Point]) {
        debug_assert_eq!(dst.len(), src.len());
        for (d, s) in dst.iter_mut().zip(src) {
            *d = self.map_point(*s);
        }
    }

    /// Where the source origin `(0, 0)` lands.
    #[inline]
    pub fn map_origin(&self) -> Point {
        Point::new(self.tx, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_maps_unchanged() {
        let p = Point::new(3.5, -2.25);
        assert_eq!(Matrix::IDENTITY.map_point(p), p);
        assert!(Matrix::IDENTITY.is_translate());
    }

    #[test]
    fn test_concat_applies_right_first() {
        let m = Matrix::translate(10.0, 0.0).concat(&Matrix::scale(2.0, 2.0));
        assert_eq!(m.map_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let m = Matrix::new(2.0, 0.5, 7.0, -0.25, 3.0, -4.0);
        let inv = m.invert().unwrap();
        let p = Point::new(5.0, 9.0);
        let back = inv.map_point(m.map_point(p));
        assert!((back.x - p.x).abs() < 1e-4);
        assert!((back.y - p.y).abs() < 1e-4);
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        assert!(Matrix::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_same_linear_part_ignores_translation() {
        let a = Matrix::new(1.5, 0.0, 10.0, 0.0, 1.5, 20.0);
        let b = a.post_translate(3.0, -2.0);
        assert!(a.same_linear_part(&b));
        assert!(!a.same_linear_part(&Matrix::scale(2.0, 1.5)));
        assert_eq!(a.linear_bits(), b.linear_bits());
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(IPoint::round(Point::new(1.5, -1.5)), IPoint::new(2, -1));
        assert_eq!(IPoint::round(Point::new(2.49, 0.0)), IPoint::new(2, 0));
    }

    #[test]
    fn test_point_is_pod() {
        let pts = [Point::new(1.0, 2.0), Point::new(3.0, 4.0)];
        let floats: &[f32] = bytemuck::cast_slice(&pts);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }
}
