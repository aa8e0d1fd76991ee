use serde::{Deserialize, Serialize};

use stagehand_core::{Point3, StageError, StageResult};

/// A curve an object's center can travel along.
///
/// Smooth paths pass through every control point using a uniform
/// Catmull-Rom spline; the first and last points are duplicated as phantom
/// neighbours so the curve starts and ends exactly on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point3>", into = "Vec<Point3>")]
pub struct MotionPath {
    points: Vec<Point3>,
}

impl MotionPath {
    pub fn smooth(points: Vec<Point3>) -> StageResult<Self> {
        if points.len() < 2 {
            return Err(StageError::InvalidArgument(format!(
                "a motion path needs at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(StageError::InvalidArgument(format!(
                "motion path point {} is not finite",
                bad
            )));
        }
        Ok(Self { points })
    }

    pub fn straight(from: Point3, to: Point3) -> Self {
        Self {
            points: vec![from, to],
        }
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn start(&self) -> Point3 {
        self.points[0]
    }

    pub fn end(&self) -> Point3 {
        self.points[self.points.len() - 1]
    }

    /// Point at progress `t` in [0, 1]. Each control-point segment takes an
    /// equal share of `t`.
    pub fn point_at(&self, t: f64) -> Point3 {
        let t = t.clamp(0.0, 1.0);
        let segments = self.points.len() - 1;
        if t >= 1.0 {
            return self.end();
        }
        let scaled = t * segments as f64;
        let index = (scaled.floor() as usize).min(segments - 1);
        let local = scaled - index as f64;

        let p1 = self.points[index];
        let p2 = self.points[index + 1];
        let p0 = if index == 0 { p1 } else { self.points[index - 1] };
        let p3 = self.points.get(index + 2).copied().unwrap_or(p2);
        catmull_rom(p0, p1, p2, p3, local)
    }
}

fn catmull_rom(p0: Point3, p1: Point3, p2: Point3, p3: Point3, t: f64) -> Point3 {
    let tangent_start = (p2 - p0) * 0.5;
    let tangent_end = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t2 * t;
    p1 * (2.0 * t3 - 3.0 * t2 + 1.0)
        + tangent_start * (t3 - 2.0 * t2 + t)
        + p2 * (-2.0 * t3 + 3.0 * t2)
        + tangent_end * (t3 - t2)
}

impl TryFrom<Vec<Point3>> for MotionPath {
    type Error = StageError;

    fn try_from(points: Vec<Point3>) -> Result<Self, Self::Error> {
        MotionPath::smooth(points)
    }
}

impl From<MotionPath> for Vec<Point3> {
    fn from(path: MotionPath) -> Self {
        path.points
    }
}
