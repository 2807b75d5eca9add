//! Error types for shared domain values.

use thiserror::Error;

/// Reasons a launch site record is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SiteValidationError {
    #[error("Site name must not be blank")]
    BlankName,

    #[error("Latitude out of range [-90, 90]: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude out of range [-180, 180]: {0}")]
    LongitudeOutOfRange(f64),
}
