use crate::KneeParamsError;
use clusterflow::ParamGuard;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Shape of the curve around its knee
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    /// The curve bends upwards, like an inertia curve
    Convex,
    /// The curve bends downwards
    Concave,
}

/// Whether the curve goes up or down with increasing `x`
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

#[derive(Clone, Debug, PartialEq)]
/// The set of hyperparameters of the [knee locator](crate::KneeLocator).
pub struct KneeLocatorValidParams {
    curve: Curve,
    direction: Direction,
    sensitivity: f64,
    online: bool,
}

#[derive(Clone, Debug, PartialEq)]
/// A helper struct used to construct a set of [valid hyperparameters](KneeLocatorValidParams)
/// for the [knee locator](crate::KneeLocator).
pub struct KneeLocatorParams(KneeLocatorValidParams);

impl Default for KneeLocatorParams {
    fn default() -> Self {
        Self::new()
    }
}

impl KneeLocatorParams {
    /// Defaults are tuned for elbow curves:
    /// * `curve = Convex`
    /// * `direction = Decreasing`
    /// * `sensitivity = 1.0`
    /// * `online = false`
    pub fn new() -> Self {
        Self(KneeLocatorValidParams {
            curve: Curve::Convex,
            direction: Direction::Decreasing,
            sensitivity: 1.0,
            online: false,
        })
    }

    pub fn curve(mut self, curve: Curve) -> Self {
        self.0.curve = curve;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.0.direction = direction;
        self
    }

    /// How many "flat" points are required before a knee is declared. Smaller values detect
    /// knees quicker, larger values are more conservative.
    pub fn sensitivity(mut self, sensitivity: f64) -> Self {
        self.0.sensitivity = sensitivity;
        self
    }

    /// In online mode the whole curve is scanned and the last knee is kept, otherwise the first
    /// knee found is returned.
    pub fn online(mut self, online: bool) -> Self {
        self.0.online = online;
        self
    }
}

impl ParamGuard for KneeLocatorParams {
    type Checked = KneeLocatorValidParams;
    type Error = KneeParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if !self.0.sensitivity.is_finite() || self.0.sensitivity < 0.0 {
            Err(KneeParamsError::Sensitivity)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl KneeLocatorValidParams {
    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn online(&self) -> bool {
        self.online
    }
}
