//! Construction-time configuration for the adaptive cache.

use crate::controller::ControllerKind;
use crate::error::CacheError;

/// Every tunable of the controllers and the switch protocol
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Hyperparameters {
    /// Learning rate (Q-learning and linear scorer)
    pub alpha: f64,
    /// Discount factor for Q-learning
    pub gamma: f64,
    /// Initial exploration rate, read only by `SingleQ`
    ///
    /// `DoubleQ` explores through its softmax `temperature` instead.
    pub epsilon: f64,
    /// Multiplicative decay applied to epsilon after every access (`SingleQ`)
    pub epsilon_decay: f64,
    /// Epsilon never decays below this
    pub epsilon_floor: f64,
    /// Softmax temperature for the double-Q selector
    pub temperature: f64,
    /// Misses since the last switch that must be exceeded before a switch
    pub miss_threshold: u64,
    /// Double-Q only switches while the hit ratio since the last switch is below this
    pub hit_ratio_floor: f64,
    /// Gradient step size for the eviction predictor
    pub predictor_learning_rate: f64,
    /// Predicted eviction probability above which an eviction is predicted
    pub eviction_threshold: f64,
    /// Labeled examples kept for predictor training
    pub history_window: usize,
    /// Examples required before the predictor trains
    pub min_training_examples: usize,
    /// Carry use counts into the LFU backend on switch instead of resetting them to 1
    pub preserve_frequency_on_switch: bool,
    /// Seed for the controller's random source; entropy when absent
    pub seed: Option<u64>,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            gamma: 0.95,
            epsilon: 0.2,
            epsilon_decay: 0.995,
            epsilon_floor: 0.01,
            temperature: 1.0,
            miss_threshold: 3,
            hit_ratio_floor: 0.4,
            predictor_learning_rate: 0.1,
            eviction_threshold: 0.5,
            history_window: 100,
            min_training_examples: 10,
            preserve_frequency_on_switch: false,
            seed: None,
        }
    }
}

impl Hyperparameters {
    /// Defaults tuned for a controller kind
    pub fn for_kind(kind: ControllerKind) -> Self {
        let base = Self::default();
        match kind {
            ControllerKind::SingleQ => Self {
                alpha: 0.1,
                gamma: 0.9,
                epsilon: 0.1,
                ..base
            },
            ControllerKind::Linear => Self { alpha: 0.1, ..base },
            ControllerKind::DoubleQ | ControllerKind::Predictor | ControllerKind::Static(_) => {
                base
            }
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_miss_threshold(mut self, threshold: u64) -> Self {
        self.miss_threshold = threshold;
        self
    }

    /// Reject values the controllers cannot work with
    pub fn validate(&self) -> Result<(), CacheError> {
        fn unit(name: &str, value: f64) -> Result<(), CacheError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(CacheError::config(format!("{name} must be in [0, 1], got {value}")))
            }
        }

        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(CacheError::config(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.gamma >= 0.0 && self.gamma < 1.0) {
            return Err(CacheError::config(format!(
                "gamma must be in [0, 1), got {}",
                self.gamma
            )));
        }
        unit("epsilon", self.epsilon)?;
        unit("epsilon_floor", self.epsilon_floor)?;
        unit("hit_ratio_floor", self.hit_ratio_floor)?;
        unit("eviction_threshold", self.eviction_threshold)?;
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(CacheError::config(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            )));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(CacheError::config(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if !(self.predictor_learning_rate.is_finite() && self.predictor_learning_rate > 0.0) {
            return Err(CacheError::config(format!(
                "predictor_learning_rate must be positive, got {}",
                self.predictor_learning_rate
            )));
        }
        if self.history_window == 0 {
            return Err(CacheError::config("history_window must be greater than 0"));
        }
        if self.min_training_examples > self.history_window {
            return Err(CacheError::config(format!(
                "min_training_examples ({}) exceeds history_window ({})",
                self.min_training_examples, self.history_window
            )));
        }
        Ok(())
    }
}

/// Everything needed to build an `AdaptiveCache`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheConfig {
    pub capacity: usize,
    pub controller: ControllerKind,
    /// Falls back to `Hyperparameters::for_kind(controller)` when absent
    #[cfg_attr(feature = "serde", serde(default))]
    pub hyperparameters: Option<Hyperparameters>,
}

impl CacheConfig {
    pub fn new(capacity: usize, controller: ControllerKind) -> Self {
        Self {
            capacity,
            controller,
            hyperparameters: None,
        }
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = Some(hyperparameters);
        self
    }

    /// The hyperparameters in effect
    pub fn resolved_hyperparameters(&self) -> Hyperparameters {
        self.hyperparameters
            .clone()
            .unwrap_or_else(|| Hyperparameters::for_kind(self.controller))
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::config("capacity must be greater than 0"));
        }
        self.resolved_hyperparameters().validate()
    }
}
