use std::fmt;

/// Lifecycle of a sampler run
///
/// Every run starts [Initialized](SamplerState::Initialized), becomes
/// [Running](SamplerState::Running) with the first batch or step and ends either
/// [Converged](SamplerState::Converged) or [Stopped](SamplerState::Stopped).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SamplerState {
    #[default]
    Initialized,
    Running,
    /// The requested number of samples was collected or the chains converged
    Converged,
    /// Cancelled by a [StopSignal](crate::StopSignal) or out of iterations
    Stopped,
}

impl SamplerState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Converged | Self::Stopped)
    }
}

impl fmt::Display for SamplerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Converged => "converged",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_states() {
        assert!(!SamplerState::default().is_finished());
        assert!(!SamplerState::Running.is_finished());
        assert!(SamplerState::Converged.is_finished());
        assert!(SamplerState::Stopped.is_finished());
        assert_eq!(SamplerState::Stopped.to_string(), "stopped");
    }
}
