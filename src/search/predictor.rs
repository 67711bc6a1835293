//! History-guided restart prediction
//!
//! Past cycle outcomes are mapped to `(log10 k, log10 error)` and a small
//! gradient-boosted ensemble of regression stumps is fitted to them. The next
//! cycle starts from whichever evenly spaced sample around the current best
//! candidate the model scores lowest.

use crate::math::log10_positive;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fewer recorded cycles than this leave the candidate untouched.
pub const MIN_HISTORY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub k: BigInt,
    pub error: BigUint,
}

/// Append-only log of per-cycle outcomes, owned by the campaign.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, k: BigInt, error: BigUint) {
        self.entries.push(HistoryEntry { k, error });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Lowest-error entry, earliest first on ties.
    pub fn best(&self) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .reduce(|best, e| if e.error < best.error { e } else { best })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("history candidate {0} is not positive")]
    NonPositiveCandidate(BigInt),
    #[error("history contains a zero error")]
    ZeroError,
    #[error("no positive candidates in the sampled interval")]
    NoPositiveSamples,
    #[error("training data is empty")]
    EmptyTrainingSet,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostParams {
    pub rounds: usize,
    pub learning_rate: f64,
    pub lambda: f64,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            rounds: 50,
            learning_rate: 0.3,
            lambda: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Stump {
    threshold: f64,
    left: f64,
    right: f64,
}

impl Stump {
    fn predict(&self, x: f64) -> f64 {
        if x < self.threshold {
            self.left
        } else {
            self.right
        }
    }
}

/// Single-feature boosted stumps under squared loss with L2-regularised leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct StumpBooster {
    base: f64,
    learning_rate: f64,
    stumps: Vec<Stump>,
}

impl StumpBooster {
    pub fn fit(xs: &[f64], ys: &[f64], params: &BoostParams) -> Result<Self, PredictError> {
        if xs.is_empty() || xs.len() != ys.len() {
            return Err(PredictError::EmptyTrainingSet);
        }

        let n = xs.len();
        let base = ys.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base; n];
        let mut stumps = Vec::with_capacity(params.rounds);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));

        for _ in 0..params.rounds {
            let residuals: Vec<f64> = ys.iter().zip(&predictions).map(|(y, p)| y - p).collect();
            let Some(stump) = best_split(xs, &residuals, &order, params.lambda) else {
                break;
            };
            for (p, &x) in predictions.iter_mut().zip(xs) {
                *p += params.learning_rate * stump.predict(x);
            }
            stumps.push(stump);
        }

        Ok(Self {
            base,
            learning_rate: params.learning_rate,
            stumps,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.base
            + self
                .stumps
                .iter()
                .map(|s| self.learning_rate * s.predict(x))
                .sum::<f64>()
    }
}

/// Split with the largest gain `G_L²/(n_L+λ) + G_R²/(n_R+λ) - G²/(n+λ)`.
fn best_split(xs: &[f64], residuals: &[f64], order: &[usize], lambda: f64) -> Option<Stump> {
    let n = order.len();
    let total: f64 = residuals.iter().sum();
    let parent = total * total / (n as f64 + lambda);

    let mut best: Option<(f64, Stump)> = None;
    let mut left_sum = 0.0;
    for split in 1..n {
        left_sum += residuals[order[split - 1]];
        let (lo, hi) = (xs[order[split - 1]], xs[order[split]]);
        if lo == hi {
            continue;
        }
        let left_n = split as f64 + lambda;
        let right_n = (n - split) as f64 + lambda;
        let right_sum = total - left_sum;
        let gain = left_sum * left_sum / left_n + right_sum * right_sum / right_n - parent;
        if best.as_ref().map_or(true, |(g, _)| gain > *g) {
            best = Some((
                gain,
                Stump {
                    threshold: lo + (hi - lo) / 2.0,
                    left: left_sum / left_n,
                    right: right_sum / right_n,
                },
            ));
        }
    }
    best.map(|(_, stump)| stump)
}

pub struct Predictor {
    radius: BigUint,
    samples: usize,
    boost: BoostParams,
}

impl Predictor {
    pub fn new(radius: BigUint, samples: usize) -> Self {
        Self {
            radius,
            samples,
            boost: BoostParams::default(),
        }
    }

    /// Proposes the next base candidate, falling back to `best_k` when the
    /// history is too short or the model cannot be fitted.
    pub fn propose(&self, best_k: &BigInt, history: &History) -> BigInt {
        if history.len() < MIN_HISTORY {
            debug!(entries = history.len(), "history too short for prediction");
            return best_k.clone();
        }
        match self.try_propose(best_k, history) {
            Ok(predicted) => {
                info!(k = %predicted, "predicted next candidate from history");
                predicted
            }
            Err(e) => {
                warn!(error = %e, "restart prediction failed, keeping current candidate");
                best_k.clone()
            }
        }
    }

    pub fn try_propose(&self, best_k: &BigInt, history: &History) -> Result<BigInt, PredictError> {
        let mut xs = Vec::with_capacity(history.len());
        let mut ys = Vec::with_capacity(history.len());
        for entry in history.entries() {
            if entry.error.is_zero() {
                return Err(PredictError::ZeroError);
            }
            let x = log10_positive(&entry.k)
                .ok_or_else(|| PredictError::NonPositiveCandidate(entry.k.clone()))?;
            let y = log10_positive(&BigInt::from(entry.error.clone()))
                .ok_or(PredictError::ZeroError)?;
            xs.push(x);
            ys.push(y);
        }

        let model = StumpBooster::fit(&xs, &ys, &self.boost)?;

        // Far above 2^53 neighbouring samples share one log10, so equal scores
        // are common; among those keep the sample nearest `best_k`.
        let mut best: Option<(f64, BigUint, BigInt)> = None;
        for candidate in self.sample_points(best_k) {
            let Some(x) = log10_positive(&candidate) else {
                continue;
            };
            let score = model.predict(x);
            let distance = (&candidate - best_k).magnitude().clone();
            let better = match &best {
                None => true,
                Some((s, d, _)) => score < *s || (score == *s && distance < *d),
            };
            if better {
                best = Some((score, distance, candidate));
            }
        }
        best.map(|(_, _, k)| k).ok_or(PredictError::NoPositiveSamples)
    }

    /// `samples` evenly spaced integers covering `[best_k - radius, best_k + radius]`.
    pub fn sample_points(&self, best_k: &BigInt) -> Vec<BigInt> {
        let radius = BigInt::from(self.radius.clone());
        let low = best_k - &radius;
        if self.samples <= 1 {
            return vec![low];
        }
        let span = &radius * 2;
        let intervals = self.samples - 1;
        (0..self.samples)
            .map(|i| &low + (&span * i) / intervals)
            .collect()
    }
}
