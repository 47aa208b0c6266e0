//! Latent-Factor Source - rating prediction by matrix factorization
//!
//! ## Model
//! `r̂(u, i) = μ + b_u + b_i + p_u · q_i`
//!
//! - μ: global mean rating
//! - b_u, b_i: user and item biases
//! - p_u, q_i: user and item latent factor vectors
//!
//! Fitted with plain SGD over the full rating table (no hold-out split: the
//! model exists to serve predictions, not to be evaluated). Terms for an
//! unknown user or item are dropped, so cold predictions fall back to the
//! biases and finally to μ.

use crate::context::RequestContext;
use crate::types::{Candidate, CandidateSource, rank_candidates};
use data_loader::{DataIndex, MAX_RATING, MIN_RATING, MovieId, Rating, UserId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Hyper-parameters for [`LatentFactorModel::train`]
#[derive(Debug, Clone)]
pub struct LatentFactorConfig {
    pub factors: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    pub regularization: f32,
    /// Standard deviation of the initial factor values
    pub init_std: f32,
    pub seed: u64,
}

impl Default for LatentFactorConfig {
    fn default() -> Self {
        Self {
            factors: 100,
            epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            init_std: 0.1,
            seed: 42,
        }
    }
}

impl LatentFactorConfig {
    /// Configure the number of latent factors (default: 100)
    pub fn with_factors(mut self, factors: usize) -> Self {
        self.factors = factors;
        self
    }

    /// Configure the number of SGD passes (default: 20)
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Configure the SGD step size (default: 0.005)
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Configure the L2 penalty (default: 0.02)
    pub fn with_regularization(mut self, regularization: f32) -> Self {
        self.regularization = regularization;
        self
    }

    /// Configure the RNG seed used for factor initialisation (default: 42)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Trained biased matrix-factorization model. Immutable after `train`.
#[derive(Debug, Clone)]
pub struct LatentFactorModel {
    factors: usize,
    global_mean: f32,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<MovieId, usize>,
    user_bias: Vec<f32>,
    item_bias: Vec<f32>,
    /// Row-major users x factors
    user_factors: Vec<f32>,
    /// Row-major items x factors
    item_factors: Vec<f32>,
}

impl LatentFactorModel {
    /// Fit the model on every rating
    ///
    /// With no ratings at all the model predicts the lower bound of the scale.
    #[instrument(skip(ratings, config), fields(ratings = ratings.len(), factors = config.factors))]
    pub fn train(ratings: &[Rating], config: &LatentFactorConfig) -> Self {
        let start = Instant::now();
        let k = config.factors;

        // Dense ids in order of first appearance
        let mut user_index: HashMap<UserId, usize> = HashMap::new();
        let mut item_index: HashMap<MovieId, usize> = HashMap::new();
        for rating in ratings {
            let next_user = user_index.len();
            user_index.entry(rating.user_id).or_insert(next_user);
            let next_item = item_index.len();
            item_index.entry(rating.movie_id).or_insert(next_item);
        }

        let global_mean = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().map(|r| r.rating as f64).sum::<f64>() as f32 / ratings.len() as f32
        };

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut model = Self {
            factors: k,
            global_mean,
            user_bias: vec![0.0; user_index.len()],
            item_bias: vec![0.0; item_index.len()],
            user_factors: normal_vec(&mut rng, user_index.len() * k, config.init_std),
            item_factors: normal_vec(&mut rng, item_index.len() * k, config.init_std),
            user_index,
            item_index,
        };

        let lr = config.learning_rate;
        let reg = config.regularization;
        for epoch in 0..config.epochs {
            let mut squared_error = 0.0_f64;
            for rating in ratings {
                let u = model.user_index[&rating.user_id];
                let i = model.item_index[&rating.movie_id];

                let dot = model.dot(u, i);
                let err = rating.rating
                    - (model.global_mean + model.user_bias[u] + model.item_bias[i] + dot);
                squared_error += (err as f64) * (err as f64);

                model.user_bias[u] += lr * (err - reg * model.user_bias[u]);
                model.item_bias[i] += lr * (err - reg * model.item_bias[i]);

                for f in 0..k {
                    let puf = model.user_factors[u * k + f];
                    let qif = model.item_factors[i * k + f];
                    model.user_factors[u * k + f] += lr * (err * qif - reg * puf);
                    model.item_factors[i * k + f] += lr * (err * puf - reg * qif);
                }
            }
            if !ratings.is_empty() {
                debug!(
                    epoch,
                    rmse = (squared_error / ratings.len() as f64).sqrt(),
                    "SGD epoch finished"
                );
            }
        }

        info!(
            users = model.user_index.len(),
            items = model.item_index.len(),
            elapsed = ?start.elapsed(),
            "Trained latent-factor model"
        );
        model
    }

    /// Estimated rating for any (user, movie) pair, clipped to the rating scale
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        let user = self.user_index.get(&user_id).copied();
        let item = self.item_index.get(&movie_id).copied();

        let mut estimate = self.global_mean;
        if let Some(u) = user {
            estimate += self.user_bias[u];
        }
        if let Some(i) = item {
            estimate += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (user, item) {
            estimate += self.dot(u, i);
        }
        estimate.clamp(MIN_RATING, MAX_RATING)
    }

    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }

    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    fn dot(&self, u: usize, i: usize) -> f32 {
        let k = self.factors;
        self.user_factors[u * k..(u + 1) * k]
            .iter()
            .zip(&self.item_factors[i * k..(i + 1) * k])
            .map(|(p, q)| p * q)
            .sum()
    }
}

/// N(0, std) samples via the Box-Muller transform
fn normal_vec(rng: &mut StdRng, len: usize, std: f32) -> Vec<f32> {
    (0..len)
        .map(|_| {
            let u1: f32 = rng.random_range(0.0001_f32..1.0_f32);
            let u2: f32 = rng.random_range(0.0_f32..1.0_f32);
            let z = (-2.0_f32 * u1.ln()).sqrt() * (2.0_f32 * std::f32::consts::PI * u2).cos();
            std * z
        })
        .collect()
}

/// Round an estimate for display; ranking always uses the raw value
pub fn round_estimate(estimate: f32) -> f32 {
    (estimate * 100.0).round() / 100.0
}

/// Latent-factor source scores catalog movies for one user
#[derive(Clone)]
pub struct LatentFactorSource {
    data_index: Arc<DataIndex>,
    model: Arc<LatentFactorModel>,
}

impl LatentFactorSource {
    pub fn new(data_index: Arc<DataIndex>, model: Arc<LatentFactorModel>) -> Self {
        Self { data_index, model }
    }

    /// Every catalog movie with its predicted rating for `context.user_id`, best first
    ///
    /// Already-rated movies are still included; the filter pipeline removes them.
    #[instrument(skip(self, context), fields(user_id = ?context.user_id))]
    pub fn get_candidates(&self, context: &RequestContext, limit: usize) -> Vec<Candidate> {
        let Some(user_id) = context.user_id else {
            return Vec::new();
        };

        let mut candidates: Vec<Candidate> = self
            .data_index
            .movies()
            .iter()
            .map(|movie| {
                Candidate::new(
                    movie.id,
                    CandidateSource::LatentFactor,
                    self.model.predict(user_id, movie.id),
                )
            })
            .collect();

        rank_candidates(&mut candidates);
        candidates.truncate(limit);

        debug!("Generated {} latent-factor candidates", candidates.len());
        candidates
    }
}
