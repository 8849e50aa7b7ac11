use crate::{Curve, Direction, KneeError, KneeLocatorParams, KneeLocatorValidParams};
use clusterflow::{Float, ParamGuard};
use ndarray::{Array1, ArrayBase, Data, Ix1};

/// Kneedle knee locator
///
/// Finds the point of maximum curvature of a curve sampled at strictly increasing `x`. Both axes
/// are normalized to `[0, 1]`, the curve is flipped so that it becomes concave and increasing,
/// and the knee is read off the local maxima of the difference between the flipped curve and
/// the diagonal. A maximum only counts as a knee once the difference curve drops below
/// `max - sensitivity * mean step`.
///
/// ## Example
///
/// ```
/// use clusterflow_clustering::KneeLocator;
/// use ndarray::array;
///
/// let x = array![1., 2., 3., 4., 5., 6., 7., 8., 9., 10.];
/// let inertia = array![100., 50., 25., 15., 12., 10., 9., 8.5, 8., 7.8];
///
/// let knee = KneeLocator::params().locate(&x, &inertia).unwrap().unwrap();
/// assert_eq!(knee.index, 2);
/// assert_eq!(knee.x, 3.);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KneeLocator;

impl KneeLocator {
    /// Hyperparameters for a convex, decreasing curve located offline with sensitivity 1
    pub fn params() -> KneeLocatorParams {
        KneeLocatorParams::new()
    }
}

/// A knee found on a curve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Knee<F> {
    /// Position of the knee in the input arrays
    pub index: usize,
    pub x: F,
    pub y: F,
}

impl KneeLocatorParams {
    /// Check the hyperparameters and locate the knee of the curve `(x, y)`
    pub fn locate<F: Float>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<Option<Knee<F>>, KneeError> {
        self.check_ref()?.locate(x, y)
    }
}

impl KneeLocatorValidParams {
    /// Locate the knee of the curve `(x, y)`.
    ///
    /// Returns `None` for curves with fewer than two points, flat curves and curves whose
    /// difference curve has no local maximum or never drops below its threshold.
    pub fn locate<F: Float>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<Option<Knee<F>>, KneeError> {
        if x.len() != y.len() {
            return Err(KneeError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(KneeError::NonFinite);
        }
        if x.windows(2).into_iter().any(|w| w[1] <= w[0]) {
            return Err(KneeError::NotIncreasing);
        }

        let n = x.len();
        if n < 2 {
            return Ok(None);
        }
        let (x_norm, y_norm) = match (normalize(x), normalize(y)) {
            (Some(x_norm), Some(y_norm)) => (x_norm, y_norm),
            _ => return Ok(None),
        };

        let y_flipped = match (self.curve(), self.direction()) {
            (Curve::Concave, Direction::Increasing) => y_norm,
            (Curve::Convex, Direction::Decreasing) => y_norm.mapv(|v| F::one() - v),
            (Curve::Concave, Direction::Decreasing) => reversed(&y_norm),
            (Curve::Convex, Direction::Increasing) => reversed(&y_norm.mapv(|v| F::one() - v)),
        };
        let diff = &y_flipped - &x_norm;

        let maxima = local_extrema(&diff, |a, b| a >= b);
        let minima = local_extrema(&diff, |a, b| a <= b);
        let first = match maxima.first() {
            Some(&first) => first,
            None => return Ok(None),
        };

        let mean_step = x_norm
            .windows(2)
            .into_iter()
            .map(|w| (w[1] - w[0]).abs())
            .sum::<F>()
            / F::cast(n - 1);
        let sensitivity = F::cast(self.sensitivity());
        let thresholds = maxima
            .iter()
            .map(|&i| diff[i] - sensitivity * mean_step)
            .collect::<Vec<_>>();

        let mut knee = None;
        let mut threshold = F::zero();
        let mut threshold_index = first;
        let mut next_maximum = 0;
        // the last point can't be followed by a drop
        for i in first..n - 1 {
            if maxima.contains(&i) {
                threshold = thresholds[next_maximum];
                threshold_index = i;
                next_maximum += 1;
            }
            if minima.contains(&i) {
                threshold = F::zero();
            }

            if diff[i + 1] < threshold {
                let index = match (self.curve(), self.direction()) {
                    (Curve::Convex, Direction::Decreasing)
                    | (Curve::Concave, Direction::Increasing) => threshold_index,
                    _ => n - 1 - threshold_index,
                };
                knee = Some(Knee {
                    index,
                    x: x[index],
                    y: y[index],
                });
                if !self.online() {
                    break;
                }
            }
        }

        Ok(knee)
    }
}

/// Rescale to `[0, 1]`, `None` if all values are equal
fn normalize<F: Float>(values: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Option<Array1<F>> {
    let min = values.iter().fold(F::infinity(), |acc, &v| acc.min(v));
    let max = values.iter().fold(F::neg_infinity(), |acc, &v| acc.max(v));
    let range = max - min;
    if range > F::zero() {
        Some(values.mapv(|v| (v - min) / range))
    } else {
        None
    }
}

fn reversed<F: Float>(values: &Array1<F>) -> Array1<F> {
    values.iter().rev().copied().collect()
}

/// Indices where `cmp` holds against both neighbours, the neighbours of the first and last
/// points being the points themselves.
fn local_extrema<F: Float>(values: &Array1<F>, cmp: impl Fn(F, F) -> bool) -> Vec<usize> {
    let n = values.len();
    (0..n)
        .filter(|&i| {
            let left = values[i.saturating_sub(1)];
            let right = values[(i + 1).min(n - 1)];
            cmp(values[i], left) && cmp(values[i], right)
        })
        .collect()
}
