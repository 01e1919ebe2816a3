//! Maps `Box<dyn Error>` from trait boundaries to typed `ControlError`.
//!
//! The traits in `droplet_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `droplet_hardware::HwError` downcasting.

use crate::error::ControlError;

/// Map a trait-boundary error to a typed `ControlError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "hardware-errors")]
    {
        use droplet_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => ControlError::Timeout,
                HwError::Closed => ControlError::Closed,
                other => ControlError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        ControlError::Timeout
    } else {
        ControlError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_message_heuristics() {
        let e = std::io::Error::other("write timed out");
        assert!(matches!(map_hw_error(&e), ControlError::Timeout));
        let e = std::io::Error::other("broken pipe");
        assert!(matches!(map_hw_error(&e), ControlError::Hardware(_)));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn downcasts_hw_error() {
        use droplet_hardware::error::HwError;
        assert!(matches!(map_hw_error(&HwError::Closed), ControlError::Closed));
        assert!(matches!(
            map_hw_error(&HwError::Serial("gone".into())),
            ControlError::HardwareFault(_)
        ));
    }
}
