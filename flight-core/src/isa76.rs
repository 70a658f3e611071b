//! U.S. Standard Atmosphere 1976 (ISA-76), layered static-pressure to
//! altitude conversion. Ported from the template's `ISA76.h`, with the
//! constant tables kept as geopotential base heights / temperatures /
//! pressures / lapse rates for the seven layers below 86 km.

use micromath::F32Ext;

const G0: f32 = 9.80665;
const RD: f32 = 287.05287;
/// Gravity-equivalent Earth radius, m, used for geopotential->geometric conversion.
const RE: f32 = 6_356_766.0;

const N: usize = 7;
const HB: [f32; N] = [0.0, 11_000.0, 20_000.0, 32_000.0, 47_000.0, 51_000.0, 71_000.0];
const TB: [f32; N] = [288.150, 216.650, 216.650, 228.650, 270.650, 270.650, 214.650];
/// Layer base pressures under standard ISA (sea level 101325 Pa), scaled to QNH at call time.
const PB_STD: [f32; N] = [
    101_325.00, 22_632.06, 5_474.889, 868.0187, 110.9063, 66.93887, 3.956420,
];
const LB: [f32; N] = [-0.0065, 0.0, 0.0010, 0.0028, 0.0, -0.0028, -0.0020];

/// Geopotential -> geometric altitude, meters.
fn geo_from_geopot(h: f32) -> f32 {
    (RE * h) / (RE - h)
}

/// Static pressure (Pa) and QNH (Pa) -> geopotential altitude (m).
fn geopotential_from_pressure(p_pa: f32, qnh_pa: f32) -> f32 {
    let k = qnh_pa / 101_325.0;
    let pb: [f32; N] = {
        let mut out = [0.0f32; N];
        let mut i = 0;
        while i < N {
            out[i] = PB_STD[i] * k;
            i += 1;
        }
        out
    };

    if p_pa > pb[0] {
        // Below MSL: extrapolate the troposphere gradient layer to negative h.
        let l = LB[0];
        let t0 = TB[0];
        let p0 = pb[0];
        let h0 = HB[0];
        let a = (RD * l) / G0;
        let t = (p_pa / p0).powf(-a);
        return h0 + (t0 / l) * (t - 1.0);
    }

    let mut i = 0usize;
    while i + 1 < N && p_pa <= pb[i + 1] {
        i += 1;
    }

    let l = LB[i];
    let t0 = TB[i];
    let p0 = pb[i];
    let h0 = HB[i];

    if l == 0.0 {
        h0 - (RD * t0 / G0) * (p_pa / p0).ln()
    } else {
        let a = (RD * l) / G0;
        let t = (p_pa / p0).powf(-a);
        h0 + (t0 / l) * (t - 1.0)
    }
}

/// Altitude above mean sea level, meters, from static pressure and QNH, both in hPa.
/// Leave `qnh_hpa` at 1013.25 for pure-ISA (no local pressure setting) altitude.
pub fn altitude_msl_from_pressure(p_hpa: f32, qnh_hpa: f32) -> f32 {
    let p = p_hpa.max(0.1) * 100.0;
    let qnh = qnh_hpa.max(0.1) * 100.0;
    let h = geopotential_from_pressure(p, qnh);
    geo_from_geopot(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sea_level_standard_pressure_is_zero_altitude() {
        let alt = altitude_msl_from_pressure(1013.25, 1013.25);
        assert_relative_eq!(alt, 0.0, epsilon = 1.0);
    }

    #[test]
    fn pressure_drop_increases_altitude() {
        let low = altitude_msl_from_pressure(1013.25, 1013.25);
        let high = altitude_msl_from_pressure(900.0, 1013.25);
        assert!(high > low);
    }

    #[test]
    fn roughly_matches_known_altitude_pressure_pair() {
        // ~1000 m ISA pressure is about 898.7 hPa.
        let alt = altitude_msl_from_pressure(898.7, 1013.25);
        assert!((alt - 1000.0).abs() < 15.0);
    }

    #[test]
    fn qnh_shift_changes_reported_altitude_at_fixed_pressure() {
        let a = altitude_msl_from_pressure(1000.0, 1013.25);
        let b = altitude_msl_from_pressure(1000.0, 1020.0);
        assert!(b > a);
    }

    #[test]
    fn handles_pressure_above_sea_level_base_without_panicking() {
        // Below-MSL branch: pressure higher than the scaled sea-level base.
        let alt = altitude_msl_from_pressure(1030.0, 1000.0);
        assert!(alt < 0.0);
    }
}
