use rand::Rng;
use rand::rngs::StdRng;

use super::{ControllerKind, Decision, Feedback, RegimeSignal, argmax, rng_from};
use crate::config::Hyperparameters;
use crate::features::Features;
use crate::policies::PolicyType;
use crate::PolicyController;

const POLICIES: [PolicyType; 2] = [PolicyType::Recency, PolicyType::Arrival];

/// Epsilon-greedy Q-learning over LRU and FIFO
///
/// Exploration decays geometrically toward `epsilon_floor`. The regime check
/// ignores the hit ratio: once misses since the last switch exceed the
/// threshold, the cache flips to the other policy.
#[derive(Debug, Clone)]
pub struct SingleQController {
    q: [[f64; 2]; 2],
    state: PolicyType,
    decided_in: PolicyType,
    alpha: f64,
    gamma: f64,
    epsilon: f64,
    epsilon_decay: f64,
    epsilon_floor: f64,
    miss_threshold: u64,
    rng: StdRng,
}

fn slot(policy: PolicyType) -> usize {
    match policy {
        PolicyType::Arrival => 1,
        _ => 0,
    }
}

impl SingleQController {
    pub fn new(params: &Hyperparameters) -> Self {
        Self {
            q: [[0.0; 2]; 2],
            state: PolicyType::Recency,
            decided_in: PolicyType::Recency,
            alpha: params.alpha,
            gamma: params.gamma,
            epsilon: params.epsilon,
            epsilon_decay: params.epsilon_decay,
            epsilon_floor: params.epsilon_floor,
            miss_threshold: params.miss_threshold,
            rng: rng_from(params.seed),
        }
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Greedy policy for the active state
    pub fn greedy(&self) -> PolicyType {
        POLICIES[argmax(&self.q[slot(self.state)])]
    }
}

impl PolicyController for SingleQController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::SingleQ
    }

    fn candidates(&self) -> &'static [PolicyType] {
        &POLICIES
    }

    fn active(&self) -> PolicyType {
        self.state
    }

    fn decide(&mut self, _features: &Features) -> Decision {
        self.decided_in = self.state;
        let action = if self.rng.gen_bool(self.epsilon) {
            POLICIES[self.rng.gen_range(0..POLICIES.len())]
        } else {
            self.greedy()
        };
        Decision::Select(action)
    }

    fn regime_check(&mut self, signal: &RegimeSignal) -> Option<PolicyType> {
        if signal.local_misses <= self.miss_threshold {
            return None;
        }
        Some(match self.state {
            PolicyType::Recency => PolicyType::Arrival,
            _ => PolicyType::Recency,
        })
    }

    fn update(&mut self, decision: &Decision, _features: &Features, feedback: &Feedback) {
        let Decision::Select(action) = decision else {
            return;
        };
        let (s, a) = (slot(self.decided_in), slot(*action));
        let next = slot(feedback.next_state);
        let best_next = self.q[next][argmax(&self.q[next])];
        let target = feedback.reward() + self.gamma * best_next;
        self.q[s][a] += self.alpha * (target - self.q[s][a]);
    }

    fn on_switch(&mut self, target: PolicyType) {
        self.state = target;
    }

    fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_floor);
    }

    fn selection_probabilities(&self) -> Vec<(PolicyType, f64)> {
        let greedy = self.greedy();
        let explore = self.epsilon / POLICIES.len() as f64;
        POLICIES
            .iter()
            .map(|&policy| {
                let p = if policy == greedy { 1.0 - self.epsilon + explore } else { explore };
                (policy, p)
            })
            .collect()
    }
}
