use crate::{KneeError, KneeLocator, KneeLocatorParams};
use clusterflow::Float;
use ndarray::Array1;
use std::iter::FromIterator;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Dispersion of the model fitted with `n_clusters` clusters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispersionScore<F> {
    pub n_clusters: usize,
    pub score: F,
}

/// Dispersion scores of a sweep over cluster counts
///
/// One `(n_clusters, score)` entry per fitted model, in ascending cluster count order. The score
/// is the inertia of the model, so on well-behaved data it decreases with the cluster count and
/// the elbow of the curve is a reasonable guess for the number of clusters.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispersionScores<F> {
    entries: Vec<DispersionScore<F>>,
}

impl<F: Float> DispersionScores<F> {
    pub fn new() -> Self {
        DispersionScores {
            entries: Vec::new(),
        }
    }

    /// Record the score of the model with `n_clusters` clusters. Entries are expected in
    /// ascending cluster count order, otherwise [`elbow`](Self::elbow) fails.
    pub fn push(&mut self, n_clusters: usize, score: F) {
        self.entries.push(DispersionScore { n_clusters, score });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DispersionScore<F>> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&DispersionScore<F>> {
        self.entries.last()
    }

    /// Score of the model with `n_clusters` clusters, if it was recorded
    pub fn score(&self, n_clusters: usize) -> Option<F> {
        self.entries
            .iter()
            .find(|entry| entry.n_clusters == n_clusters)
            .map(|entry| entry.score)
    }

    pub fn cluster_counts(&self) -> Array1<F> {
        self.entries
            .iter()
            .map(|entry| F::cast(entry.n_clusters))
            .collect()
    }

    pub fn scores(&self) -> Array1<F> {
        self.entries.iter().map(|entry| entry.score).collect()
    }

    /// Cluster count at the elbow of the score curve, treated as convex and decreasing
    pub fn elbow(&self) -> Result<Option<usize>, KneeError> {
        self.elbow_with(&KneeLocator::params())
    }

    /// Cluster count at the knee found by a custom locator
    pub fn elbow_with(&self, locator: &KneeLocatorParams) -> Result<Option<usize>, KneeError> {
        let knee = locator.locate(&self.cluster_counts(), &self.scores())?;
        Ok(knee.map(|knee| self.entries[knee.index].n_clusters))
    }
}

impl<F: Float> FromIterator<(usize, F)> for DispersionScores<F> {
    fn from_iter<I: IntoIterator<Item = (usize, F)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(n_clusters, score)| DispersionScore { n_clusters, score })
            .collect();
        DispersionScores { entries }
    }
}
