use serde::Serialize;

/// Version reported by `GET /version`
pub const VERSION: &str = "v0.0.1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionResponse {
    pub version: String,
}

impl VersionResponse {
    pub fn current() -> Self {
        Self {
            version: VERSION.to_string(),
        }
    }
}
