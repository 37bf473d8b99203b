//! Policy controller implementations
//!
//! A controller watches cache performance and decides which eviction
//! discipline should be live. All strategies sit behind the
//! `PolicyController` trait so the adaptive cache never branches on which
//! one it holds.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::Hyperparameters;
use crate::error::CacheError;
use crate::features::Features;
use crate::policies::PolicyType;
use crate::PolicyController;

pub mod double_q;
pub mod linear;
pub mod predictor;
pub mod single_q;

pub use double_q::DoubleQController;
pub use linear::LinearController;
pub use predictor::EvictionPredictor;
pub use single_q::SingleQController;

/// Enumeration of available controller strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ControllerKind {
    /// Softmax over two Q-tables, three policies
    DoubleQ,
    /// Epsilon-greedy over one Q-table, LRU and FIFO only
    SingleQ,
    /// One weight vector per policy, arg-max scoring
    Linear,
    /// Sigmoid eviction predictor gating a single recency-ordered store
    Predictor,
    /// No learning; pinned to one policy (baseline runs)
    Static(PolicyType),
}

impl ControllerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerKind::DoubleQ => "DoubleQ",
            ControllerKind::SingleQ => "SingleQ",
            ControllerKind::Linear => "Linear",
            ControllerKind::Predictor => "Predictor",
            ControllerKind::Static(_) => "Static",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ControllerKind::DoubleQ => "Double Q-learning with softmax exploration over LRU, FIFO and LFU",
            ControllerKind::SingleQ => "Epsilon-greedy Q-learning toggling between LRU and FIFO",
            ControllerKind::Linear => "Linear scorer picking the policy with the highest weighted features",
            ControllerKind::Predictor => "Learned eviction gate over a single store",
            ControllerKind::Static(_) => "Fixed policy - baseline strategy",
        }
    }

    /// The learning strategies (baselines excluded)
    pub fn all() -> &'static [ControllerKind] {
        &[
            ControllerKind::DoubleQ,
            ControllerKind::SingleQ,
            ControllerKind::Linear,
            ControllerKind::Predictor,
        ]
    }
}

/// What a controller decided for one access
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// The policy the controller would like credited for this access
    Select(PolicyType),
    /// Eviction prediction for a single store
    Gate { probability: f64, evict: bool },
}

impl Decision {
    /// Whether a missing key may be admitted given the store's fullness
    pub fn admits(&self, store_full: bool) -> bool {
        match self {
            Decision::Select(_) => true,
            Decision::Gate { evict, .. } => !store_full || *evict,
        }
    }
}

/// Outcome of an access as seen by the learner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    pub hit: bool,
    /// Opportunity-cost weight of a miss: 2 if the key is resident under LRU, else 1
    pub impact: u8,
    /// The store was full when the miss arrived
    pub eviction_required: bool,
    /// Active policy after the regime check
    pub next_state: PolicyType,
}

impl Feedback {
    /// `+1` on a hit, `-impact` on a miss
    pub fn reward(&self) -> f64 {
        if self.hit {
            1.0
        } else {
            -(self.impact as f64)
        }
    }
}

/// Counters the regime check looks at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegimeSignal {
    pub local_misses: u64,
    pub local_accesses: u64,
}

impl RegimeSignal {
    /// Hit ratio since the last switch, 0 before any access
    pub fn local_hit_ratio(&self) -> f64 {
        if self.local_accesses == 0 {
            0.0
        } else {
            self.local_accesses.saturating_sub(self.local_misses) as f64
                / self.local_accesses as f64
        }
    }
}

/// Non-learning controller pinned to one policy
#[derive(Debug, Clone)]
pub struct StaticController {
    policy: PolicyType,
}

impl StaticController {
    pub fn new(policy: PolicyType) -> Self {
        Self { policy }
    }
}

impl PolicyController for StaticController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Static(self.policy)
    }

    fn candidates(&self) -> &'static [PolicyType] {
        match self.policy {
            PolicyType::Recency => &[PolicyType::Recency],
            PolicyType::Arrival => &[PolicyType::Arrival],
            PolicyType::Frequency => &[PolicyType::Frequency],
        }
    }

    fn active(&self) -> PolicyType {
        self.policy
    }

    fn decide(&mut self, _features: &Features) -> Decision {
        Decision::Select(self.policy)
    }

    fn update(&mut self, _decision: &Decision, _features: &Features, _feedback: &Feedback) {}

    fn on_switch(&mut self, target: PolicyType) {
        self.policy = target;
    }
}

/// Factory function to create controllers dynamically
pub fn create_controller(
    kind: ControllerKind,
    params: &Hyperparameters,
) -> Result<Box<dyn PolicyController>, CacheError> {
    params.validate()?;
    Ok(match kind {
        ControllerKind::DoubleQ => Box::new(DoubleQController::new(params)),
        ControllerKind::SingleQ => Box::new(SingleQController::new(params)),
        ControllerKind::Linear => Box::new(LinearController::new(params)),
        ControllerKind::Predictor => Box::new(EvictionPredictor::new(params)),
        ControllerKind::Static(policy) => Box::new(StaticController::new(policy)),
    })
}

pub(crate) fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Index of the largest value; the first one wins ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}

/// Temperature softmax, shifted by the row max so large rewards cannot overflow
pub(crate) fn softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values
        .iter()
        .map(|&v| ((v - max) / temperature).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return vec![1.0 / values.len() as f64; values.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}
