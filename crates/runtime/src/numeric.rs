use std::f64::consts::TAU;

pub type Real = f64;

pub fn degtorad(degrees: Real) -> Real {
    degrees.to_radians()
}

pub fn radtodeg(radians: Real) -> Real {
    radians.to_degrees()
}

/// Wraps an angle in radians into `[0, 2π)`.
pub fn normalize_radians(radians: Real) -> Real {
    let wrapped = radians.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

pub fn magnitude(hspeed: Real, vspeed: Real) -> Real {
    hspeed.hypot(vspeed)
}

/// Screen-space heading of a velocity: 0 is +x, angles grow toward -y.
/// Returns `None` for the zero vector, whose heading is undefined.
pub fn direction_from(hspeed: Real, vspeed: Real) -> Option<Real> {
    if hspeed == 0.0 && vspeed == 0.0 {
        return None;
    }
    Some(normalize_radians((-vspeed).atan2(hspeed)))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    fn approx_eq(a: Real, b: Real) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn direction_points_up_for_negative_vspeed() {
        let up = direction_from(0.0, -4.0).expect("non-zero");
        assert!(approx_eq(up, FRAC_PI_2));
        let left = direction_from(-1.0, 0.0).expect("non-zero");
        assert!(approx_eq(left, PI));
        let down = direction_from(0.0, 2.0).expect("non-zero");
        assert!(approx_eq(down, 3.0 * FRAC_PI_2));
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert_eq!(direction_from(0.0, 0.0), None);
        assert_eq!(direction_from(-0.0, 0.0), None);
    }

    #[test]
    fn normalize_wraps_into_single_turn() {
        assert!(approx_eq(normalize_radians(-FRAC_PI_2), 3.0 * FRAC_PI_2));
        assert!(approx_eq(normalize_radians(TAU + 1.0), 1.0));
        assert!(normalize_radians(-1e-300) < TAU);
    }

    #[test]
    fn magnitude_matches_pythagoras() {
        assert!(approx_eq(magnitude(3.0, -4.0), 5.0));
    }
}
