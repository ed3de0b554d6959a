//! Smoothing kernels injected into the neighbor search.
//!
//! The search caches one kernel value and gradient per accepted neighbor;
//! these are the implementations it is handed. Both kernels take the full
//! support radius at construction so that their support matches the grid
//! cell edge exactly.

use std::f32::consts::PI;

use crate::config::SmoothingKernelKind;
use space::SmoothingKernel;

/// Cubic B-spline kernel with support radius `h`.
///
/// ```text
/// W(q) = (8 / (pi h^3)) * (1 - 6q^2 + 6q^3)        for q = r/h <= 1/2
/// W(q) = (8 / (pi h^3)) * 2 (1 - q)^3              for 1/2 < q <= 1
/// W(q) = 0                                         for q > 1
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CubicSplineKernel {
    support: f32,
    norm: f32,
}

impl CubicSplineKernel {
    /// Build the kernel for a full support radius `support`.
    pub fn new(support: f32) -> Self {
        let norm = 8.0 / (PI * support * support * support);
        Self { support, norm }
    }

    /// Kernel value at distance `r`.
    pub fn value(&self, r: f32) -> f32 {
        let q = r / self.support;
        if q > 1.0 {
            0.0
        } else if q <= 0.5 {
            self.norm * (1.0 - 6.0 * q * q + 6.0 * q * q * q)
        } else {
            let t = 1.0 - q;
            self.norm * 2.0 * t * t * t
        }
    }

    /// dW/dr at distance `r`.
    fn derivative(&self, r: f32) -> f32 {
        let q = r / self.support;
        if q > 1.0 {
            0.0
        } else if q <= 0.5 {
            self.norm / self.support * (-12.0 * q + 18.0 * q * q)
        } else {
            let t = 1.0 - q;
            self.norm / self.support * (-6.0 * t * t)
        }
    }
}

impl SmoothingKernel for CubicSplineKernel {
    fn evaluate(&self, displacement: [f32; 3], distance: f32) -> (f32, [f32; 3]) {
        let w = self.value(distance);
        let grad = radial_gradient(self.derivative(distance), displacement, distance);
        (w, grad)
    }
}

/// Normalization constant for the 3D Wendland C2 kernel: 21 / (2 * pi).
///
/// Expressed for a support radius `h` directly (q = r/h in [0, 1]), the
/// normalized form is `W(q) = 21/(2 pi h^3) * (1 - q)^4 * (4q + 1)`.
const WENDLAND_C2_NORM_3D: f32 = 21.0 / (2.0 * PI);

/// Wendland C2 kernel with support radius `h`.
///
/// Strictly positive inside its support; no tensile-instability pairing
/// artifacts.
#[derive(Debug, Clone, Copy)]
pub struct WendlandC2Kernel {
    support: f32,
    norm: f32,
}

impl WendlandC2Kernel {
    /// Build the kernel for a full support radius `support`.
    pub fn new(support: f32) -> Self {
        let norm = WENDLAND_C2_NORM_3D / (support * support * support);
        Self { support, norm }
    }

    /// Kernel value at distance `r`.
    pub fn value(&self, r: f32) -> f32 {
        let q = r / self.support;
        if q >= 1.0 {
            return 0.0;
        }
        let t = 1.0 - q;
        let t2 = t * t;
        self.norm * t2 * t2 * (4.0 * q + 1.0)
    }

    /// dW/dr at distance `r`.
    fn derivative(&self, r: f32) -> f32 {
        let q = r / self.support;
        if q >= 1.0 {
            return 0.0;
        }
        let t = 1.0 - q;
        self.norm / self.support * (-20.0 * q) * t * t * t
    }
}

impl SmoothingKernel for WendlandC2Kernel {
    fn evaluate(&self, displacement: [f32; 3], distance: f32) -> (f32, [f32; 3]) {
        let w = self.value(distance);
        let grad = radial_gradient(self.derivative(distance), displacement, distance);
        (w, grad)
    }
}

/// Either kernel, picked from configuration.
#[derive(Debug, Clone, Copy)]
pub enum SceneKernel {
    /// Cubic B-spline
    CubicSpline(CubicSplineKernel),
    /// Wendland C2
    WendlandC2(WendlandC2Kernel),
}

impl SceneKernel {
    /// Build the configured kernel for a full support radius.
    pub fn new(kind: SmoothingKernelKind, support: f32) -> Self {
        match kind {
            SmoothingKernelKind::CubicSpline => {
                SceneKernel::CubicSpline(CubicSplineKernel::new(support))
            }
            SmoothingKernelKind::WendlandC2 => {
                SceneKernel::WendlandC2(WendlandC2Kernel::new(support))
            }
        }
    }
}

impl SmoothingKernel for SceneKernel {
    fn evaluate(&self, displacement: [f32; 3], distance: f32) -> (f32, [f32; 3]) {
        match self {
            SceneKernel::CubicSpline(k) => k.evaluate(displacement, distance),
            SceneKernel::WendlandC2(k) => k.evaluate(displacement, distance),
        }
    }
}

/// Project a radial derivative onto the displacement direction. The search
/// never hands out pairs at (near) zero separation, but the guard keeps the
/// helper total anyway.
fn radial_gradient(dw_dr: f32, displacement: [f32; 3], distance: f32) -> [f32; 3] {
    if distance < 1.0e-12 {
        return [0.0; 3];
    }
    let inv_r = 1.0 / distance;
    [
        dw_dr * displacement[0] * inv_r,
        dw_dr * displacement[1] * inv_r,
        dw_dr * displacement[2] * inv_r,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrate(value: impl Fn(f32) -> f32, support: f32) -> f32 {
        // Radial shell integration of W over its support.
        let steps = 2000;
        let dr = support / steps as f32;
        let mut total = 0.0;
        for i in 0..steps {
            let r = (i as f32 + 0.5) * dr;
            total += value(r) * 4.0 * PI * r * r * dr;
        }
        total
    }

    #[test]
    fn cubic_spline_integrates_to_one() {
        let kernel = CubicSplineKernel::new(0.3);
        let total = integrate(|r| kernel.value(r), 0.3);
        assert!((total - 1.0).abs() < 1.0e-2, "{total}");
    }

    #[test]
    fn wendland_c2_integrates_to_one() {
        let kernel = WendlandC2Kernel::new(0.3);
        let total = integrate(|r| kernel.value(r), 0.3);
        assert!((total - 1.0).abs() < 1.0e-2, "{total}");
    }

    #[test]
    fn kernels_vanish_at_support() {
        let cubic = CubicSplineKernel::new(0.3);
        let wendland = WendlandC2Kernel::new(0.3);
        assert_eq!(cubic.value(0.3), 0.0);
        assert_eq!(wendland.value(0.3), 0.0);
        assert_eq!(cubic.value(0.4), 0.0);
        assert_eq!(wendland.value(0.4), 0.0);
    }

    #[test]
    fn kernels_decrease_monotonically() {
        for kernel in [
            SceneKernel::new(SmoothingKernelKind::CubicSpline, 0.3),
            SceneKernel::new(SmoothingKernelKind::WendlandC2, 0.3),
        ] {
            let mut previous = f32::INFINITY;
            for i in 0..30 {
                let r = 0.01 * i as f32;
                let (w, _) = kernel.evaluate([r, 0.0, 0.0], r);
                assert!(w <= previous);
                previous = w;
            }
        }
    }

    #[test]
    fn gradient_is_antisymmetric() {
        let kernel = SceneKernel::new(SmoothingKernelKind::CubicSpline, 0.3);
        let displacement = [0.1, 0.05, -0.02];
        let distance =
            (displacement.iter().map(|d| d * d).sum::<f32>()).sqrt();
        let negated = [-displacement[0], -displacement[1], -displacement[2]];
        let (_, grad_ab) = kernel.evaluate(displacement, distance);
        let (_, grad_ba) = kernel.evaluate(negated, distance);
        for axis in 0..3 {
            assert!((grad_ab[axis] + grad_ba[axis]).abs() < 1.0e-6);
        }
    }

    #[test]
    fn gradient_points_against_the_displacement() {
        // W decreases with r, so the gradient along the displacement from
        // neighbor to particle is negative.
        let kernel = WendlandC2Kernel::new(0.3);
        let (_, grad) = kernel.evaluate([0.1, 0.0, 0.0], 0.1);
        assert!(grad[0] < 0.0);
    }
}
