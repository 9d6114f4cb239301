//! Common sampling functions.

use crate::geometry::*;
use crate::pbrt::*;

/// Sample a point on a unit disk by mapping from a unit square to the unit
/// circle. Concentric squares in [-1, 1]^2 map to concentric circles, which
/// keeps the sample density uniform and adjacent samples adjacent.
///
/// * `u` - The random sample point in [0, 1)^2.
pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    // Map uniform random numbers to [-1,1]^2.
    let sx = 2.0 * u.x - 1.0;
    let sy = 2.0 * u.y - 1.0;

    // Handle degeneracy at the origin.
    if sx == 0.0 && sy == 0.0 {
        return Point2f::zero();
    }

    // Map the square to (r, θ) with θ measured in units of π/4.
    let (r, theta) = if sx >= -sy {
        if sx > sy {
            // First region.
            let theta = if sy > 0.0 { sy / sx } else { 8.0 + sy / sx };
            (sx, theta)
        } else {
            // Second region.
            (sy, 2.0 - sx / sy)
        }
    } else if sx <= sy {
        // Third region.
        (-sx, 4.0 - sy / -sx)
    } else {
        // Fourth region.
        (-sy, 6.0 + sx / -sy)
    };

    let theta = theta * PI_OVER_FOUR;
    Point2f::new(r * cos(theta), r * sin(theta))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
