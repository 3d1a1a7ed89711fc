use serde::{Deserialize, Serialize};

pub const MIN_POWER: f64 = 0.1;
pub const MAX_POWER: f64 = 3.0;
/// Energy kept back so a shot never drains the bot to zero.
pub const ENERGY_RESERVE: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FirePowerCurve {
    /// Distance tiers, with a softer cap when our own energy runs low.
    Tiered {
        close_range: f64,
        close_power: f64,
        mid_range: f64,
        mid_power: f64,
        far_power: f64,
        low_energy_below: f64,
        low_energy_cap: f64,
    },
    /// `energy / divisor`, ignoring distance.
    EnergyFraction { divisor: f64 },
}

impl Default for FirePowerCurve {
    fn default() -> Self {
        Self::Tiered {
            close_range: 150.0,
            close_power: 3.0,
            mid_range: 400.0,
            mid_power: 2.0,
            far_power: 1.0,
            low_energy_below: 20.0,
            low_energy_cap: 1.5,
        }
    }
}

impl FirePowerCurve {
    pub fn choose(&self, distance: f64, energy: f64) -> f64 {
        let raw = match *self {
            Self::Tiered {
                close_range,
                close_power,
                mid_range,
                mid_power,
                far_power,
                low_energy_below,
                low_energy_cap,
            } => {
                let tier = if distance < close_range {
                    close_power
                } else if distance < mid_range {
                    mid_power
                } else {
                    far_power
                };
                if energy < low_energy_below {
                    tier.min(low_energy_cap)
                } else {
                    tier
                }
            }
            Self::EnergyFraction { divisor } => energy / divisor.max(1.0),
        };
        bound_power(raw, energy)
    }

    pub fn clamp(&mut self) {
        match self {
            Self::Tiered {
                close_range,
                close_power,
                mid_range,
                mid_power,
                far_power,
                low_energy_below,
                low_energy_cap,
            } => {
                *close_range = close_range.clamp(0.0, 2_000.0);
                *mid_range = mid_range.clamp(*close_range, 4_000.0);
                *close_power = close_power.clamp(MIN_POWER, MAX_POWER);
                *mid_power = mid_power.clamp(MIN_POWER, MAX_POWER);
                *far_power = far_power.clamp(MIN_POWER, MAX_POWER);
                *low_energy_below = low_energy_below.clamp(0.0, 100.0);
                *low_energy_cap = low_energy_cap.clamp(MIN_POWER, MAX_POWER);
            }
            Self::EnergyFraction { divisor } => {
                *divisor = divisor.clamp(1.0, 100.0);
            }
        }
    }
}

/// Applies the hard limits every shot must respect: at most [`MAX_POWER`],
/// never more than `energy - ENERGY_RESERVE`, never below [`MIN_POWER`].
pub fn bound_power(raw: f64, energy: f64) -> f64 {
    let raw = if raw.is_nan() { MIN_POWER } else { raw };
    raw.min(MAX_POWER)
        .min(energy - ENERGY_RESERVE)
        .max(MIN_POWER)
}

/// Muzzle speed for a shot of the given power, `20 - 3p`, falling back to
/// 11 when the formula degenerates.
pub fn projectile_speed(power: f64) -> f64 {
    let speed = 20.0 - 3.0 * power;
    if speed > 0.0 {
        speed
    } else {
        11.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_fall_with_distance() {
        let curve = FirePowerCurve::default();
        assert_eq!(curve.choose(100.0, 100.0), 3.0);
        assert_eq!(curve.choose(300.0, 100.0), 2.0);
        assert_eq!(curve.choose(600.0, 100.0), 1.0);
    }

    #[test]
    fn power_respects_bounds_for_every_input() {
        let curves = [
            FirePowerCurve::default(),
            FirePowerCurve::EnergyFraction { divisor: 10.0 },
            FirePowerCurve::EnergyFraction { divisor: 20.0 },
        ];
        for curve in curves {
            let mut distance = 0.0;
            while distance <= 1_200.0 {
                let mut energy = 0.2;
                while energy <= 200.0 {
                    let p = curve.choose(distance, energy);
                    assert!(p >= MIN_POWER, "curve={curve:?} d={distance} e={energy}");
                    assert!(
                        p <= MAX_POWER.min(energy - ENERGY_RESERVE) + 1e-12,
                        "curve={curve:?} d={distance} e={energy} p={p}"
                    );
                    energy += 0.7;
                }
                distance += 25.0;
            }
        }
    }

    #[test]
    fn low_energy_caps_close_range_shot() {
        let p = FirePowerCurve::default().choose(100.0, 5.0);
        assert!(p <= 3.0);
        assert!(p <= 4.9);
        assert_eq!(p, 1.5);
    }

    #[test]
    fn energy_reserve_dominates_when_nearly_empty() {
        let p = FirePowerCurve::EnergyFraction { divisor: 1.0 }.choose(50.0, 1.0);
        assert!((p - 0.9).abs() < 1e-12);
        assert_eq!(bound_power(2.0, 0.05), MIN_POWER);
    }

    #[test]
    fn projectile_speed_has_fallback() {
        assert_eq!(projectile_speed(1.0), 17.0);
        assert_eq!(projectile_speed(3.0), 11.0);
        assert_eq!(projectile_speed(7.0), 11.0);
    }
}
