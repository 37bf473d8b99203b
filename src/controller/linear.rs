use super::{ControllerKind, Decision, Feedback, RegimeSignal, argmax};
use crate::config::Hyperparameters;
use crate::features::{FEATURE_LEN, Features};
use crate::policies::PolicyType;
use crate::PolicyController;

const N: usize = 3;
const HIT_REWARD: f64 = 0.5;
const MISS_PENALTY: f64 = -5.0;

/// Linear scorer with one weight vector per policy
///
/// The chosen policy is the arg-max of `weights[p] . features`. After each
/// access only the chosen policy's weights move, by `alpha * reward * features`
/// with a reward of `+0.5` for a hit and `-5` for a miss.
#[derive(Debug, Clone)]
pub struct LinearController {
    weights: [[f64; FEATURE_LEN]; N],
    state: PolicyType,
    last_choice: PolicyType,
    alpha: f64,
    miss_threshold: u64,
}

impl LinearController {
    pub fn new(params: &Hyperparameters) -> Self {
        Self {
            weights: [[0.0; FEATURE_LEN]; N],
            state: PolicyType::Recency,
            last_choice: PolicyType::Recency,
            alpha: params.alpha,
            miss_threshold: params.miss_threshold,
        }
    }

    /// Score of every policy for a feature vector
    pub fn scores(&self, features: &Features) -> [f64; N] {
        let mut scores = [0.0; N];
        for (score, weights) in scores.iter_mut().zip(self.weights.iter()) {
            *score = features.dot(weights);
        }
        scores
    }

    pub fn weights(&self, policy: PolicyType) -> &[f64; FEATURE_LEN] {
        &self.weights[policy.index()]
    }
}

impl PolicyController for LinearController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Linear
    }

    fn active(&self) -> PolicyType {
        self.state
    }

    fn decide(&mut self, features: &Features) -> Decision {
        let best = argmax(&self.scores(features));
        self.last_choice = PolicyType::from_index(best).unwrap_or(self.state);
        Decision::Select(self.last_choice)
    }

    fn regime_check(&mut self, signal: &RegimeSignal) -> Option<PolicyType> {
        if signal.local_misses > self.miss_threshold && self.last_choice != self.state {
            Some(self.last_choice)
        } else {
            None
        }
    }

    fn update(&mut self, decision: &Decision, features: &Features, feedback: &Feedback) {
        let Decision::Select(policy) = decision else {
            return;
        };
        let reward = if feedback.hit { HIT_REWARD } else { MISS_PENALTY };
        let step = self.alpha * reward;
        for (w, x) in self.weights[policy.index()]
            .iter_mut()
            .zip(features.values().iter())
        {
            *w += step * x;
        }
    }

    fn on_switch(&mut self, target: PolicyType) {
        self.state = target;
    }
}
