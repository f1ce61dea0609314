use crate::foundation::core::{Point, Rect};

/// 4x4 matrix applied to row vectors (`v' = v * M`), translation in the last row.
///
/// Only used for the pseudo-3D Y-axis rotation of advanced comments, which needs a
/// perspective term that an affine 2D transform cannot express.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    /// Row-major elements.
    pub m: [[f64; 4]; 4],
}

impl Mat4 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Translation by `(x, y, z)`.
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        let mut out = Self::IDENTITY;
        out.m[3][0] = x;
        out.m[3][1] = y;
        out.m[3][2] = z;
        out
    }

    /// Rotation about the Z axis by `rad` radians.
    pub fn rotation_z(rad: f64) -> Self {
        let (s, c) = rad.sin_cos();
        let mut out = Self::IDENTITY;
        out.m[0][0] = c;
        out.m[0][1] = s;
        out.m[1][0] = -s;
        out.m[1][1] = c;
        out
    }

    /// Rotation about the Y axis by `rad` radians.
    pub fn rotation_y(rad: f64) -> Self {
        let (s, c) = rad.sin_cos();
        let mut out = Self::IDENTITY;
        out.m[0][0] = c;
        out.m[0][2] = -s;
        out.m[2][0] = s;
        out.m[2][2] = c;
        out
    }

    /// Matrix product `self * rhs` (apply `self` first).
    pub fn then(&self, rhs: &Self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Self { m: out }
    }

    /// Project a 2D point (z = 0) through the matrix with perspective divide.
    pub fn project(&self, p: Point) -> Point {
        let v = [p.x, p.y, 0.0, 1.0];
        let mut r = [0.0; 4];
        for (j, out) in r.iter_mut().enumerate() {
            *out = (0..4).map(|k| v[k] * self.m[k][j]).sum();
        }
        let w = if r[3].abs() < f64::EPSILON { 1.0 } else { r[3] };
        Point::new(r[0] / w, r[1] / w)
    }

    /// Axis-aligned bounds of `rect` after projection.
    pub fn project_bounds(&self, rect: Rect) -> Rect {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x0, rect.y1),
            Point::new(rect.x1, rect.y1),
        ]
        .map(|p| self.project(p));

        let mut out = Rect::from_points(corners[0], corners[0]);
        for c in &corners[1..] {
            out = out.union_pt(*c);
        }
        out
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub(crate) fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

/// Treat rotations below a hundredth of a degree as absent.
pub(crate) fn is_rotated(deg: f64) -> bool {
    deg.abs() >= 0.01
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
