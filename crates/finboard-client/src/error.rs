//! Error types for finboard-client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Failed to build HTTP client: {message}")]
    Build { message: String },
}
