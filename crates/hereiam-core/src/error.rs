use hereiam_geo::GeoError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HereIamError {
    pub code: ErrorCode,
    pub message: String,
}

impl HereIamError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }
}

impl fmt::Display for HereIamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for HereIamError {}

impl From<GeoError> for HereIamError {
    fn from(error: GeoError) -> Self {
        Self::invalid_input(error.message)
    }
}

pub type HereIamResult<T> = Result<T, HereIamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_errors_are_invalid_input() {
        let error = HereIamError::from(GeoError::new("ring is not closed"));
        assert_eq!(error.code, ErrorCode::InvalidInput);
        assert_eq!(error.to_string(), "InvalidInput: ring is not closed");
    }
}
