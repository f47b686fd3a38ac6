use thiserror::Error;

/// Why the location provider stopped delivering fixes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for a position")]
    Timeout,

    #[error("Unknown location error")]
    Unknown,
}

impl LocationError {
    /// Maps the W3C `GeolocationPositionError.code` values.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeepAwakeError {
    #[error("Screen wake lock is not supported")]
    Unsupported,

    #[error("Screen wake lock was denied: {0}")]
    Denied(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage is unavailable")]
    Unavailable,

    #[error("Storage IO error: {0}")]
    Io(String),

    #[error("Stored value is corrupt: {0}")]
    Corrupt(String),
}

#[test]
fn location_error_codes() {
    assert_eq!(LocationError::from_code(1), LocationError::PermissionDenied);
    assert_eq!(LocationError::from_code(2), LocationError::PositionUnavailable);
    assert_eq!(LocationError::from_code(3), LocationError::Timeout);
    assert_eq!(LocationError::from_code(0), LocationError::Unknown);
    assert_eq!(LocationError::from_code(42), LocationError::Unknown);
}
