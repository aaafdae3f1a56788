//! Configuration validation

use crate::schema::{RawConfig, RawMarkers, RawServiceConfig};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Marker '{name}' cannot be empty")]
    EmptyMarker { name: &'static str },

    #[error("Start and complete markers must differ (both are '{0}')")]
    DuplicateMarker(String),

    #[error("Marker '{inner}' is contained in marker '{outer}'")]
    OverlappingMarkers { inner: String, outer: String },

    #[error("Service config error: {0}")]
    ServiceError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = validate_markers(&config.markers);
    errors.extend(validate_service(&config.service));
    errors
}

fn validate_markers(markers: &RawMarkers) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if markers.start.is_empty() {
        errors.push(ValidationError::EmptyMarker { name: "start" });
    }
    if markers.complete.is_empty() {
        errors.push(ValidationError::EmptyMarker { name: "complete" });
    }
    if !errors.is_empty() {
        return errors;
    }

    if markers.start == markers.complete {
        errors.push(ValidationError::DuplicateMarker(markers.start.clone()));
    } else if markers.complete.contains(&markers.start) {
        // Every completion text would also read as a start
        errors.push(ValidationError::OverlappingMarkers {
            inner: markers.start.clone(),
            outer: markers.complete.clone(),
        });
    } else if markers.start.contains(&markers.complete) {
        errors.push(ValidationError::OverlappingMarkers {
            inner: markers.complete.clone(),
            outer: markers.start.clone(),
        });
    }

    errors
}

fn validate_service(service: &RawServiceConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if service.tick_interval_ms == Some(0) {
        errors.push(ValidationError::ServiceError(
            "tick_interval_ms must be greater than 0".into(),
        ));
    }

    if service.shutdown_timeout_seconds == Some(0) {
        errors.push(ValidationError::ServiceError(
            "shutdown_timeout_seconds must be greater than 0".into(),
        ));
    }

    if let Some(file) = &service.ledger_file
        && (file.is_empty() || file.contains('/') || file.contains('\\'))
    {
        errors.push(ValidationError::ServiceError(format!(
            "ledger_file must be a plain filename, got '{}'",
            file
        )));
    }

    if let (Some(http), Some(push)) = (service.http_addr, service.push_addr)
        && http == push
    {
        errors.push(ValidationError::ServiceError(format!(
            "http_addr and push_addr must differ (both are {})",
            http
        )));
    }

    errors
}
