use anyhow::Result;
use tracing::{info, warn};

use crate::transition::TransitionStrategy;

/// Answers whether the rendering engine can animate transforms itself.
///
/// `Err` means the probe could not tell; callers treat that as "no".
pub trait CapabilityProbe {
    fn accelerated_transforms(&mut self) -> Result<bool>;
}

/// A probe with a known answer, for hosts that detect support elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProbe(pub bool);

impl CapabilityProbe for StaticProbe {
    fn accelerated_transforms(&mut self) -> Result<bool> {
        Ok(self.0)
    }
}

impl<F> CapabilityProbe for F
where
    F: FnMut() -> Result<bool>,
{
    fn accelerated_transforms(&mut self) -> Result<bool> {
        self()
    }
}

/// Run the probe once and pick the strategy a gallery keeps for its whole life.
pub fn select_strategy<P: CapabilityProbe + ?Sized>(probe: &mut P) -> TransitionStrategy {
    match probe.accelerated_transforms() {
        Ok(true) => {
            info!("accelerated transforms available");
            TransitionStrategy::Accelerated
        }
        Ok(false) => {
            info!("accelerated transforms unavailable; animating box properties");
            TransitionStrategy::Animated
        }
        Err(err) => {
            warn!(error = %err, "capability probe inconclusive; animating box properties");
            TransitionStrategy::Animated
        }
    }
}
