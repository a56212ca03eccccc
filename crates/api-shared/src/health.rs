use crate::types::HealthRes;

/// Simple health service that can be used by the REST API and the CLI
///
/// This service provides a standardised way to check the health status of uploadimg.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "uploadimg is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_health_serialises() {
        let json = serde_json::to_string(&HealthService::check_health()).unwrap();
        assert_eq!(json, r#"{"ok":true,"message":"uploadimg is alive"}"#);
    }
}
