//! Synthesis policies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How unconstrained scalar choices are made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarStrategy {
    /// Uniform over the legal domain.
    #[default]
    Uniform,
    /// Half the draws come from the domain's boundary values
    /// (min/max/zero/one), the rest are uniform.
    BoundaryBiased,
}

/// Caller-tunable knobs for one synthesis session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub strategy: ScalarStrategy,
    /// RNG seed; absent means seed from OS entropy.
    pub seed: Option<u64>,
    /// Caller-fixed scalar values by parameter name. Pinned values are
    /// still domain-checked: a pin outside the domain fails valid
    /// synthesis rather than silently violating it.
    pub pins: BTreeMap<String, i128>,
    /// Caller-fixed buffer element counts by parameter name — the
    /// auxiliary length policy for length-linked buffers.
    pub len_pins: BTreeMap<String, u64>,
}

impl Policy {
    pub fn uniform() -> Self {
        Self::default()
    }

    pub fn boundary_biased() -> Self {
        Self {
            strategy: ScalarStrategy::BoundaryBiased,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pin a scalar parameter to a fixed value.
    pub fn pin(mut self, param: impl Into<String>, value: i128) -> Self {
        self.pins.insert(param.into(), value);
        self
    }

    /// Pin a buffer parameter's element count.
    pub fn pin_len(mut self, param: impl Into<String>, count: u64) -> Self {
        self.len_pins.insert(param.into(), count);
        self
    }
}
