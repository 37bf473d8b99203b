use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

use super::{ControllerKind, Decision, Feedback, RegimeSignal, argmax, rng_from, softmax};
use crate::config::Hyperparameters;
use crate::features::Features;
use crate::policies::PolicyType;
use crate::PolicyController;

const N: usize = 3;

/// Double Q-learning selector over LRU, FIFO and LFU
///
/// States and actions are both policies. Actions are sampled from a softmax
/// over the summed rows of the two tables for the active state; each update
/// picks one table at random and bootstraps it from the other's estimate of
/// the greedy next action.
///
/// The regime check fires once misses since the last switch exceed
/// `miss_threshold` while the hit ratio since the switch sits below
/// `hit_ratio_floor`; it then proposes the greedy policy of the summed tables.
#[derive(Debug, Clone)]
pub struct DoubleQController {
    q1: [[f64; N]; N],
    q2: [[f64; N]; N],
    /// Active policy
    state: PolicyType,
    /// Active policy at the time of the last decision
    decided_in: PolicyType,
    alpha: f64,
    gamma: f64,
    temperature: f64,
    miss_threshold: u64,
    hit_ratio_floor: f64,
    rng: StdRng,
}

impl DoubleQController {
    pub fn new(params: &Hyperparameters) -> Self {
        Self {
            q1: [[0.0; N]; N],
            q2: [[0.0; N]; N],
            state: PolicyType::Recency,
            decided_in: PolicyType::Recency,
            alpha: params.alpha,
            gamma: params.gamma,
            temperature: params.temperature,
            miss_threshold: params.miss_threshold,
            hit_ratio_floor: params.hit_ratio_floor,
            rng: rng_from(params.seed),
        }
    }

    fn summed_row(&self, state: PolicyType) -> [f64; N] {
        let s = state.index();
        let mut row = [0.0; N];
        for (a, value) in row.iter_mut().enumerate() {
            *value = self.q1[s][a] + self.q2[s][a];
        }
        row
    }

    /// Summed Q-values, indexed `[state][action]`
    pub fn q_values(&self) -> [[f64; N]; N] {
        let mut table = [[0.0; N]; N];
        for &policy in PolicyType::all() {
            table[policy.index()] = self.summed_row(policy);
        }
        table
    }
}

impl PolicyController for DoubleQController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::DoubleQ
    }

    fn active(&self) -> PolicyType {
        self.state
    }

    fn decide(&mut self, _features: &Features) -> Decision {
        self.decided_in = self.state;
        let probs = softmax(&self.summed_row(self.state), self.temperature);
        let index = match WeightedIndex::new(&probs) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => argmax(&probs),
        };
        Decision::Select(PolicyType::from_index(index).unwrap_or(self.state))
    }

    fn regime_check(&mut self, signal: &RegimeSignal) -> Option<PolicyType> {
        if signal.local_misses <= self.miss_threshold
            || signal.local_hit_ratio() >= self.hit_ratio_floor
        {
            return None;
        }
        let best = PolicyType::from_index(argmax(&self.summed_row(self.state)))?;
        (best != self.state).then_some(best)
    }

    fn update(&mut self, decision: &Decision, _features: &Features, feedback: &Feedback) {
        let Decision::Select(action) = decision else {
            return;
        };
        let (s, a) = (self.decided_in.index(), action.index());
        let next = feedback.next_state.index();
        let reward = feedback.reward();

        if self.rng.gen_bool(0.5) {
            let best_next = argmax(&self.q1[next]);
            let target = reward + self.gamma * self.q2[next][best_next];
            self.q1[s][a] += self.alpha * (target - self.q1[s][a]);
        } else {
            let best_next = argmax(&self.q2[next]);
            let target = reward + self.gamma * self.q1[next][best_next];
            self.q2[s][a] += self.alpha * (target - self.q2[s][a]);
        }
    }

    fn on_switch(&mut self, target: PolicyType) {
        self.state = target;
    }

    /// Softmax over the summed tables' row for the active state
    fn selection_probabilities(&self) -> Vec<(PolicyType, f64)> {
        let probs = softmax(&self.summed_row(self.state), self.temperature);
        PolicyType::all().iter().copied().zip(probs).collect()
    }
}
