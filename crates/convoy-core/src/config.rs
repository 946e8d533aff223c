//! # Allocation Configuration

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of drivers offered a shipment when nothing else is configured.
pub const DEFAULT_ALLOCATION_WINDOW: usize = 10;

/// Tunables for the offer allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationConfig {
    window: usize,
}

impl AllocationConfig {
    /// Build a configuration with the given allocation window.
    pub fn new(window: usize) -> Result<Self, ValidationError> {
        if window == 0 {
            return Err(ValidationError::InvalidWindow(window));
        }
        Ok(Self { window })
    }

    /// Maximum number of offers created per shipment.
    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_ALLOCATION_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_ten() {
        assert_eq!(AllocationConfig::default().window(), 10);
    }

    #[test]
    fn zero_window_rejected() {
        assert_eq!(
            AllocationConfig::new(0).unwrap_err(),
            ValidationError::InvalidWindow(0)
        );
        assert_eq!(AllocationConfig::new(3).unwrap().window(), 3);
    }
}
