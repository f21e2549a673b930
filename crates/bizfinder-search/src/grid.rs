//! Splits one large search disc into overlapping sub-discs.
//!
//! Sub-disc centers sit on a hexagonal lattice laid out in a local
//! east/north plane around the requested center. Each planar offset is
//! mapped onto the sphere by walking its length along its bearing from the
//! center (an azimuthal equidistant projection). That mapping keeps the
//! distance to the center exact and never stretches the distance between two
//! points, so it holds up near the poles and across the antimeridian.
//!
//! The lattice spacing is chosen so every point of the plane lies within
//! [`COVERING_FACTOR`] × `sub_radius` of some lattice center. Lattice centers
//! whose disc reaches into the search area but which lie outside it are
//! pulled in radially onto its boundary. That projection never moves two
//! points further apart, so coverage survives it and every sub-disc center
//! ends up inside the original disc.

use bizfinder_core::types::EARTH_RADIUS_M;
use bizfinder_core::Coordinates;
use uuid::Uuid;

use crate::error::SearchError;
use crate::request::SubSearchTask;

/// Worst-case distance from any point to its nearest lattice center, as a
/// fraction of the sub-radius.
pub const COVERING_FACTOR: f64 = 0.97;

/// Allowed coverage shortfall, as a fraction of the sub-radius, when checking
/// that a point of the search disc is reached by some sub-disc.
pub const COVERAGE_TOLERANCE: f64 = 0.01;

/// Projected centers land this fraction inside the boundary so rounding in
/// the lat/lng conversion cannot push them past it.
const BOUNDARY_INSET: f64 = 1e-4;

/// Cover the disc (`center`, `total_radius_m`) with sub-discs of radius
/// `sub_radius_m`.
///
/// When the whole disc fits in one sub-disc the result is a single task
/// at `center` with radius `total_radius_m`. Otherwise tasks are ordered
/// row by row from south to north, west to east within a row, and each
/// carries its position as `index`.
///
/// # Errors
///
/// Returns [`SearchError::InvalidParameter`] if either radius is not a
/// positive finite number or `center` is out of range.
pub fn partition(
    center: Coordinates,
    total_radius_m: f64,
    sub_radius_m: f64,
    request_id: Uuid,
) -> Result<Vec<SubSearchTask>, SearchError> {
    if !(total_radius_m.is_finite() && total_radius_m > 0.0) {
        return Err(SearchError::invalid(
            "radius",
            format!("must be a positive number of meters, got {total_radius_m}"),
        ));
    }
    if !(sub_radius_m.is_finite() && sub_radius_m > 0.0) {
        return Err(SearchError::invalid(
            "sub_radius",
            format!("must be a positive number of meters, got {sub_radius_m}"),
        ));
    }
    if !center.is_valid() {
        return Err(SearchError::invalid(
            "center",
            format!("out of range: {center}"),
        ));
    }

    if total_radius_m <= sub_radius_m {
        return Ok(vec![SubSearchTask {
            index: 0,
            center,
            radius_m: total_radius_m,
            request_id,
        }]);
    }

    let offsets = lattice_offsets(total_radius_m, sub_radius_m);
    let tasks = offsets
        .into_iter()
        .enumerate()
        .map(|(index, (east, north))| SubSearchTask {
            index,
            center: offset_to_coordinates(center, east, north),
            radius_m: sub_radius_m,
            request_id,
        })
        .collect();
    Ok(tasks)
}

/// Approximate number of tasks [`partition`] produces for these radii,
/// computed without building the lattice.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn estimated_task_count(total_radius_m: f64, sub_radius_m: f64) -> usize {
    if total_radius_m <= sub_radius_m {
        return 1;
    }
    let spacing = sub_radius_m * COVERING_FACTOR * 3f64.sqrt();
    let cell_area = spacing * spacing * 3f64.sqrt() / 2.0;
    let reach = total_radius_m + sub_radius_m;
    (std::f64::consts::PI * reach * reach / cell_area).ceil() as usize
}

/// Planar (east, north) offsets in meters of every sub-disc center, already
/// pulled inside the search disc.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn lattice_offsets(total_radius_m: f64, sub_radius_m: f64) -> Vec<(f64, f64)> {
    // A hex lattice with spacing d has covering radius d / sqrt(3).
    let spacing = sub_radius_m * COVERING_FACTOR * 3f64.sqrt();
    let row_step = spacing * 3f64.sqrt() / 2.0;
    let reach = total_radius_m + sub_radius_m;
    let limit = total_radius_m * (1.0 - BOUNDARY_INSET);

    let rows = (reach / row_step).ceil() as i64;
    let cols = (reach / spacing).ceil() as i64 + 1;

    let mut offsets = Vec::new();
    for row in -rows..=rows {
        let north = row as f64 * row_step;
        let shift = if row.rem_euclid(2) == 1 {
            spacing / 2.0
        } else {
            0.0
        };
        for col in -cols..=cols {
            let east = col as f64 * spacing + shift;
            let dist = east.hypot(north);
            // The sub-disc does not reach the search area.
            if dist >= reach {
                continue;
            }
            if dist > limit {
                let scale = limit / dist;
                offsets.push((east * scale, north * scale));
            } else {
                offsets.push((east, north));
            }
        }
    }
    offsets
}

/// Point reached from `origin` by travelling `hypot(east, north)` meters
/// along the bearing of `(east, north)` on a spherical earth.
///
/// Works in 3-D unit vectors. The local east and north vectors stay
/// orthonormal even at a pole, where they follow `origin`'s longitude.
fn offset_to_coordinates(origin: Coordinates, east_m: f64, north_m: f64) -> Coordinates {
    let distance = east_m.hypot(north_m);
    if distance < f64::MIN_POSITIVE {
        return origin;
    }
    let delta = distance / EARTH_RADIUS_M;
    let (sin_lat, cos_lat) = origin.latitude.to_radians().sin_cos();
    let (sin_lng, cos_lng) = origin.longitude.to_radians().sin_cos();

    let here = [cos_lat * cos_lng, cos_lat * sin_lng, sin_lat];
    let east = [-sin_lng, cos_lng, 0.0];
    let north = [-sin_lat * cos_lng, -sin_lat * sin_lng, cos_lat];

    let (along_east, along_north) = (east_m / distance, north_m / distance);
    let (sin_d, cos_d) = delta.sin_cos();
    let point: [f64; 3] = std::array::from_fn(|k| {
        here[k] * cos_d + (east[k] * along_east + north[k] * along_north) * sin_d
    });

    let lat = point[2].clamp(-1.0, 1.0).asin().to_degrees();
    let lng = point[1].atan2(point[0]).to_degrees();
    Coordinates::new(lat, normalize_longitude(lng))
}

fn normalize_longitude(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the caller's sign at the seam.
    if lng > 0.0 && (wrapped + 180.0).abs() < f64::EPSILON {
        180.0
    } else {
        wrapped
    }
}
