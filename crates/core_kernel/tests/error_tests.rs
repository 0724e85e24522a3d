//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::temporal::TemporalError;
use core_kernel::{AgentId, Currency};

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_from_money_error() {
    let money_error = "BTC".parse::<Currency>().unwrap_err();
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(MoneyError::UnknownCurrency(_))));
    assert!(core_error.to_string().contains("BTC"));
}

#[test]
fn test_core_error_from_temporal_error() {
    let temporal_error = TemporalError::UnknownTimezone("Nowhere/City".to_string());
    let core_error: CoreError = temporal_error.into();

    assert!(matches!(core_error, CoreError::Temporal(_)));
}

#[test]
fn test_core_error_from_identifier_error() {
    let id_error = "".parse::<AgentId>().unwrap_err();
    let core_error: CoreError = id_error.into();

    assert!(core_error.to_string().contains("agent identifier must not be empty"));
}

#[test]
fn test_configuration_error_display() {
    let error = CoreError::configuration("DESK_TIMEZONE is not a valid IANA name");
    assert_eq!(
        error.to_string(),
        "Configuration error: DESK_TIMEZONE is not a valid IANA name"
    );
}
