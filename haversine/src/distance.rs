use crate::point::Point;
use crate::real::Real;

fn square<T: Real>(x: T) -> T {
    x * x
}

/// Central angle from the sines and cosines of both latitudes and of the
/// absolute longitude difference, using the `atan2` form that stays
/// well-conditioned for tiny and near-antipodal separations.
#[inline]
pub(crate) fn angle<T: Real>(
    sin_lat1: T,
    cos_lat1: T,
    sin_lat2: T,
    cos_lat2: T,
    sin_dlon: T,
    cos_dlon: T,
) -> T {
    let numerator = T::sqrt(
        square(cos_lat2 * sin_dlon) + square(cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon),
    );
    let denominator = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_dlon;
    T::atan2(numerator, denominator)
}

/// Central angle in radians between two points, computed in precision `T`.
#[must_use]
pub fn central_angle<T: Real>(p1: &Point, p2: &Point) -> T {
    let lat1 = T::from_f64(p1.latitude).to_radians();
    let lat2 = T::from_f64(p2.latitude).to_radians();
    let lon1 = T::from_f64(p1.longitude).to_radians();
    let lon2 = T::from_f64(p2.longitude).to_radians();
    let dlon = (lon1 - lon2).abs();

    angle(
        lat1.sin(),
        lat1.cos(),
        lat2.sin(),
        lat2.cos(),
        dlon.sin(),
        dlon.cos(),
    )
}

/// Great-circle distance between two points on a sphere of `radius`.
///
/// Gives exactly the value the pairwise evaluators produce for this pair.
#[must_use]
pub fn vincenty<T: Real>(p1: &Point, p2: &Point, radius: f64) -> T {
    T::from_f64(radius) * central_angle::<T>(p1, p2)
}

/// The textbook `2 asin(sqrt(a))` haversine in double precision. Independent
/// of the pairwise kernel, so it serves as a reference for answer files.
#[must_use]
pub fn naive(p1: &Point, p2: &Point, radius: f64) -> f64 {
    let lat1 = p1.latitude;
    let lat2 = p2.latitude;
    let lon1 = p1.longitude;
    let lon2 = p2.longitude;

    let lat_deg = (lat2 - lat1).to_radians();
    let lon_deg = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = square(f64::sin(lat_deg / 2.0))
        + f64::cos(lat1) * f64::cos(lat2) * square(f64::sin(lon_deg / 2.0));
    let c = 2.0 * f64::asin(f64::sqrt(a.min(1.0)));

    radius * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earth;

    #[test]
    fn known_distance() {
        let a = Point::new(1.01, 1.01);
        let b = Point::new(2.01, 2.01);
        let single: f32 = vincenty(&a, &b, earth::RADIUS);
        let double: f64 = vincenty(&a, &b, earth::RADIUS);
        assert!((f64::from(single) - 157_294.0).abs() < 1_573.0, "{single}");
        assert!((double - 157_294.0).abs() < 1_573.0, "{double}");
        assert!((double - naive(&a, &b, earth::RADIUS)).abs() < 1e-6);
    }

    #[test]
    fn identical_points_are_zero_apart() {
        let p = Point::new(51.5, -0.12);
        assert_eq!(vincenty::<f32>(&p, &p, earth::RADIUS), 0.0);
        assert_eq!(vincenty::<f64>(&p, &p, earth::RADIUS), 0.0);
        assert_eq!(naive(&p, &p, earth::RADIUS), 0.0);
    }

    #[test]
    fn antipodes_are_half_a_circumference_apart() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 180.0);
        let half = std::f64::consts::PI * earth::RADIUS;
        assert!((vincenty::<f64>(&a, &b, earth::RADIUS) - half).abs() < 1e-6);
        assert!((naive(&a, &b, earth::RADIUS) - half).abs() < 1e-6);
    }

    #[test]
    fn longitude_difference_is_unsigned() {
        let a = Point::new(10.0, -20.0);
        let b = Point::new(-5.0, 35.0);
        let forward = central_angle::<f64>(&a, &b);
        let backward = central_angle::<f64>(&b, &a);
        assert!((forward - backward).abs() < 1e-12);
        let mirrored = Point::new(10.0, 20.0);
        let mirrored_b = Point::new(-5.0, -35.0);
        assert_eq!(forward, central_angle::<f64>(&mirrored, &mirrored_b));
    }
}
