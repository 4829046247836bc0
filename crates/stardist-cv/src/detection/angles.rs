//! Ray directions shared by every reconstruction call

use stardist_core::{Result, StardistError};
use std::f64::consts::PI;

/// Cosines and sines of `n` angles evenly spaced over `[0, 2π)`
#[derive(Debug, Clone, PartialEq)]
pub struct RayAngles {
    cos: Vec<f64>,
    sin: Vec<f64>,
}

impl RayAngles {
    pub fn new(n_rays: usize) -> Result<Self> {
        if n_rays == 0 {
            return Err(StardistError::config("at least one ray angle is required"));
        }

        let (cos, sin): (Vec<f64>, Vec<f64>) = (0..n_rays)
            .map(|k| (2.0 * PI * k as f64 / n_rays as f64).sin_cos())
            .map(|(s, c)| (c, s))
            .unzip();

        Ok(Self { cos, sin })
    }

    pub fn len(&self) -> usize {
        self.cos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cos.is_empty()
    }

    /// Unit directions `(cos, sin)` in ray order
    pub fn directions(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.cos.iter().copied().zip(self.sin.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirty_two_rays() {
        let rays = RayAngles::new(32).unwrap();

        assert_eq!(rays.len(), 32);
        let directions: Vec<(f64, f64)> = rays.directions().collect();
        assert_eq!(directions.len(), 32);
        assert_eq!(directions[0], (1.0, 0.0));

        let (c, s) = directions[1];
        assert!((c - (PI / 16.0).cos()).abs() < 1e-12);
        assert!((s - (PI / 16.0).sin()).abs() < 1e-12);

        let (c, s) = directions[8];
        assert!(c.abs() < 1e-12);
        assert!((s - 1.0).abs() < 1e-12);

        let (c, s) = directions[31];
        assert!((c - (31.0 * PI / 16.0).cos()).abs() < 1e-12);
        assert!((s - (31.0 * PI / 16.0).sin()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_rays_rejected() {
        assert!(RayAngles::new(0).is_err());
    }
}
