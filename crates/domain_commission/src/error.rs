//! Commission domain errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur in the commission domain
#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("Malformed commission payload: {0}")]
    MalformedPayload(String),

    #[error("No eligible commissions in batch ({skipped} skipped)")]
    EmptyBatch { skipped: usize },

    #[error("Invalid payment date: {0}")]
    InvalidPaymentDate(String),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Export failed: {0}")]
    Export(String),
}

impl CommissionError {
    /// Returns true if retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, CommissionError::Port(e) if e.is_transient())
    }
}

impl From<csv::Error> for CommissionError {
    fn from(e: csv::Error) -> Self {
        CommissionError::Export(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_only_for_port_errors() {
        let err: CommissionError = PortError::ServiceUnavailable {
            service: "commissions-backend".to_string(),
        }
        .into();
        assert!(err.is_transient());

        assert!(!CommissionError::EmptyBatch { skipped: 2 }.is_transient());
        assert!(!CommissionError::from(PortError::unauthorized("bad key")).is_transient());
    }

    #[test]
    fn test_messages() {
        let err = CommissionError::EmptyBatch { skipped: 3 };
        assert_eq!(err.to_string(), "No eligible commissions in batch (3 skipped)");
    }
}
