//! Inbound request origin.

/// Path of the placeholder image served for accounts without one.
pub const MISSING_IMAGE_PATH: &str = "/static/missing.png";

/// Scheme and host the client used to reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    #[must_use]
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// URL of the placeholder image on this gateway.
    #[must_use]
    pub fn missing_image_url(&self) -> String {
        format!("{}://{}{MISSING_IMAGE_PATH}", self.scheme, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_url() {
        let origin = RequestOrigin::new("https", "gateway.example:8443");
        assert_eq!(
            origin.missing_image_url(),
            "https://gateway.example:8443/static/missing.png"
        );
    }
}
