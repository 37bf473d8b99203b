use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use super::{ControllerKind, Decision, Feedback, rng_from};
use crate::config::Hyperparameters;
use crate::features::{FEATURE_LEN, FeatureScope, Features};
use crate::policies::PolicyType;
use crate::PolicyController;

/// Learned eviction gate for a single store
///
/// A linear layer followed by a sigmoid turns the accessed key's
/// `[frequency, recency rank, presence]` into an eviction probability. Every
/// miss is recorded as a labeled example (was the store full?) in a rolling
/// window; once enough examples are buffered, each access runs one
/// full-batch gradient step on binary cross-entropy.
///
/// The predictor never switches backends: it works over one recency-ordered
/// store and only gates whether a full store evicts its head.
#[derive(Debug, Clone)]
pub struct EvictionPredictor {
    weights: [f64; FEATURE_LEN],
    bias: f64,
    learning_rate: f64,
    threshold: f64,
    window: usize,
    min_examples: usize,
    history: VecDeque<(Features, f64)>,
    state: PolicyType,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl EvictionPredictor {
    pub fn new(params: &Hyperparameters) -> Self {
        let mut rng = rng_from(params.seed);
        let bound = 1.0 / (FEATURE_LEN as f64).sqrt();
        let mut weights = [0.0; FEATURE_LEN];
        for w in weights.iter_mut() {
            *w = rng.gen_range(-bound..bound);
        }
        let bias = rng.gen_range(-bound..bound);

        Self {
            weights,
            bias,
            learning_rate: params.predictor_learning_rate,
            threshold: params.eviction_threshold,
            window: params.history_window,
            min_examples: params.min_training_examples,
            history: VecDeque::with_capacity(params.history_window),
            state: PolicyType::Recency,
        }
    }

    /// Eviction probability for a feature vector
    pub fn probability(&self, features: &Features) -> f64 {
        sigmoid(features.dot(&self.weights) + self.bias)
    }

    /// Number of buffered training examples
    pub fn buffered(&self) -> usize {
        self.history.len()
    }

    /// One gradient step of mean binary cross-entropy over the whole buffer
    fn train(&mut self) {
        if self.history.len() < self.min_examples {
            return;
        }

        let n = self.history.len() as f64;
        let mut grad_w = [0.0; FEATURE_LEN];
        let mut grad_b = 0.0;
        let mut loss = 0.0;
        for (features, label) in &self.history {
            let p = self.probability(features);
            let err = p - label;
            for (g, x) in grad_w.iter_mut().zip(features.values().iter()) {
                *g += err * x;
            }
            grad_b += err;
            let p = p.clamp(1e-12, 1.0 - 1e-12);
            loss -= label * p.ln() + (1.0 - label) * (1.0 - p).ln();
        }

        for (w, g) in self.weights.iter_mut().zip(grad_w.iter()) {
            *w -= self.learning_rate * g / n;
        }
        self.bias -= self.learning_rate * grad_b / n;
        debug!(loss = loss / n, examples = self.history.len(), "trained eviction predictor");
    }
}

impl PolicyController for EvictionPredictor {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Predictor
    }

    fn feature_scope(&self) -> FeatureScope {
        FeatureScope::Key
    }

    fn candidates(&self) -> &'static [PolicyType] {
        &[PolicyType::Recency]
    }

    fn active(&self) -> PolicyType {
        self.state
    }

    fn decide(&mut self, features: &Features) -> Decision {
        let probability = self.probability(features);
        Decision::Gate {
            probability,
            evict: probability > self.threshold,
        }
    }

    fn update(&mut self, _decision: &Decision, features: &Features, feedback: &Feedback) {
        if !feedback.hit {
            if self.history.len() == self.window {
                self.history.pop_front();
            }
            let label = if feedback.eviction_required { 1.0 } else { 0.0 };
            self.history.push_back((*features, label));
        }
        self.train();
    }

    fn on_switch(&mut self, target: PolicyType) {
        self.state = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predictor() -> EvictionPredictor {
        EvictionPredictor::new(&Hyperparameters::for_kind(ControllerKind::Predictor).with_seed(5))
    }

    fn miss(eviction_required: bool) -> Feedback {
        Feedback {
            hit: false,
            impact: 1,
            eviction_required,
            next_state: PolicyType::Recency,
        }
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_decision_is_a_gate() {
        let mut p = predictor();
        match p.decide(&Features::new([3.0, 1.0, 1.0])) {
            Decision::Gate { probability, evict } => {
                assert!((0.0..=1.0).contains(&probability));
                assert_eq!(evict, probability > 0.5);
            }
            other => panic!("unexpected decision {other:?}"),
        }
        assert_eq!(p.feature_scope(), FeatureScope::Key);
    }

    #[test]
    fn test_trains_only_after_minimum_examples() {
        let mut p = predictor();
        let decision = Decision::Gate { probability: 0.5, evict: false };
        let initial = (p.weights, p.bias);

        for _ in 0..9 {
            p.update(&decision, &Features::default(), &miss(true));
        }
        assert_eq!(p.buffered(), 9);
        assert_eq!((p.weights, p.bias), initial);

        p.update(&decision, &Features::default(), &miss(true));
        assert_eq!(p.buffered(), 10);
        assert!(p.bias > initial.1);
    }

    #[test]
    fn test_hits_are_not_recorded() {
        let mut p = predictor();
        let decision = Decision::Gate { probability: 0.5, evict: false };
        let hit = Feedback { hit: true, ..miss(false) };
        p.update(&decision, &Features::new([1.0, 1.0, 1.0]), &hit);
        assert_eq!(p.buffered(), 0);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut p = predictor();
        let decision = Decision::Gate { probability: 0.5, evict: false };
        for i in 0..250 {
            p.update(&decision, &Features::default(), &miss(i % 2 == 0));
        }
        assert_eq!(p.buffered(), 100);
    }

    #[test]
    fn test_learns_both_labels() {
        let decision = Decision::Gate { probability: 0.5, evict: false };

        let mut full = predictor();
        for _ in 0..300 {
            full.update(&decision, &Features::default(), &miss(true));
        }
        assert!(full.probability(&Features::default()) > 0.5);

        let mut roomy = predictor();
        for _ in 0..300 {
            roomy.update(&decision, &Features::default(), &miss(false));
        }
        assert!(roomy.probability(&Features::default()) < 0.5);
    }
}
