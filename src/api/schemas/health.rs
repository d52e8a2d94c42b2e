use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub timestamp: String,
    pub environment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnosticResponse {
    pub success: bool,
    pub message: String,
    pub method: String,
    pub timestamp: String,
}
