use nalgebra::Vector2;

use crate::constants::{ArcSec, ArcSecPerPixel, Degree, Pixel, PixelPosition};
use crate::planner_errors::PlannerError;

/// Radius in pixels of the circle a companion at `separation` describes on the detector.
///
/// Errors
/// ----------
/// * [`PlannerError::InvalidConfiguration`] if `plate_scale <= 0` or `separation < 0`.
pub fn radius_in_pixels(
    separation: ArcSec,
    plate_scale: ArcSecPerPixel,
) -> Result<Pixel, PlannerError> {
    if !(plate_scale > 0.0 && plate_scale.is_finite()) {
        return Err(PlannerError::InvalidConfiguration(format!(
            "plate scale must be positive, got {plate_scale}"
        )));
    }
    if !(separation >= 0.0 && separation.is_finite()) {
        return Err(PlannerError::InvalidConfiguration(format!(
            "separation must be non-negative, got {separation}"
        )));
    }
    Ok(separation / plate_scale)
}

/// Offset of an angle on a circle of radius `r`, north up and east left.
fn offset(radius: Pixel, angle: Degree) -> Vector2<Pixel> {
    let angle = angle.to_radians();
    Vector2::new(-angle.sin() * radius, angle.cos() * radius)
}

/// Project a companion into detector pixels around a PSF anchor.
///
/// ```text
/// r  = separation / plate_scale
/// dx = −sin(angle) · r
/// dy =  cos(angle) · r
/// ```
///
/// Arguments
/// ---------
/// * `anchor`: pixel position of the PSF copy the companion is measured from
/// * `separation`: companion separation in arcseconds
/// * `plate_scale`: detector plate scale in arcseconds per pixel
/// * `angle`: detector-frame position angle in degrees
///
/// Return
/// ------
/// * the pixel position, always at distance `r` from `anchor`
pub fn project(
    anchor: &PixelPosition,
    separation: ArcSec,
    plate_scale: ArcSecPerPixel,
    angle: Degree,
) -> Result<PixelPosition, PlannerError> {
    let radius = radius_in_pixels(separation, plate_scale)?;
    Ok(anchor + offset(radius, angle))
}

/// Circle of possible companion positions around one anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApertureCircle {
    pub center: PixelPosition,
    pub radius: Pixel,
}

impl ApertureCircle {
    pub fn new(
        center: PixelPosition,
        separation: ArcSec,
        plate_scale: ArcSecPerPixel,
    ) -> Result<Self, PlannerError> {
        Ok(ApertureCircle {
            center,
            radius: radius_in_pixels(separation, plate_scale)?,
        })
    }

    /// Point of the circle at a detector position angle.
    pub fn point_at(&self, angle: Degree) -> PixelPosition {
        self.center + offset(self.radius, angle)
    }

    /// Points of the circle for a sequence of angles, in order.
    pub fn track(&self, angles: &[Degree]) -> Vec<PixelPosition> {
        angles.iter().map(|a| self.point_at(*a)).collect()
    }
}

#[cfg(test)]
mod aperture_test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{distance, Point2};

    #[test]
    fn test_north_is_up() {
        let anchor = Point2::new(100.0, 100.0);
        let pos = project(&anchor, 0.5, 0.01, 0.0).unwrap();
        assert_relative_eq!(pos.x, 100.0, epsilon = 1e-12);
        assert_relative_eq!(pos.y, 150.0, epsilon = 1e-12);

        // east is to the left
        let pos = project(&anchor, 0.5, 0.01, 90.0).unwrap();
        assert_relative_eq!(pos.x, 50.0, epsilon = 1e-12);
        assert_relative_eq!(pos.y, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_radius_invariance() {
        let anchor = Point2::new(100.0, 100.0);
        for angle in [-725.0, -63.0, 0.0, 13.7, 181.8, 359.9, 1000.0] {
            let pos = project(&anchor, 0.5, 0.01, angle).unwrap();
            assert_relative_eq!(distance(&anchor, &pos), 50.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_circle_track_matches_project() {
        let circle = ApertureCircle::new(Point2::new(62.0, 119.0), 0.257, 0.015).unwrap();
        let angles = [10.0, 20.0, 30.0];
        let track = circle.track(&angles);
        assert_eq!(track.len(), 3);
        for (angle, pos) in angles.iter().zip(&track) {
            assert_eq!(*pos, project(&circle.center, 0.257, 0.015, *angle).unwrap());
        }
    }

    #[test]
    fn test_invalid_scale_or_separation() {
        let anchor = Point2::new(0.0, 0.0);
        assert!(matches!(
            project(&anchor, 0.5, 0.0, 0.0),
            Err(PlannerError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            project(&anchor, -0.1, 0.01, 0.0),
            Err(PlannerError::InvalidConfiguration(_))
        ));
        assert_eq!(project(&anchor, 0.0, 0.01, 45.0).unwrap(), anchor);
    }
}
