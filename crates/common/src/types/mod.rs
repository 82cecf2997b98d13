use serde::Serialize;

/// Body of `GET /health`.
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    /// Storage manager status label: `uninitialized`, `ready`, `degraded` or `disposed`.
    pub storage: String,
}
