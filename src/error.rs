//! Error types for pagelens
//!
//! This module provides the error hierarchy using `thiserror`. Extraction
//! never surfaces these to its caller directly: the orchestrator converts
//! them into the failure envelope.

use thiserror::Error;

/// The main error type for pagelens operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser-related errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Content extraction errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Navigation errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Chat API errors
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),
}

/// Content extraction errors
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Element not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid selector
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Extraction failed
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Content parsing failed
    #[error("Content parsing failed: {0}")]
    ParsingFailed(String),

    /// JavaScript execution failed
    #[error("JavaScript execution failed: {0}")]
    JsExecutionFailed(String),
}

/// Navigation errors
#[derive(Error, Debug)]
pub enum NavigationError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Navigation timeout
    #[error("Navigation timed out after {0}ms")]
    Timeout(u64),

    /// Page load failed
    #[error("Page load failed: {0}")]
    LoadFailed(String),
}

/// Chat completion API errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// No API key configured for an endpoint that needs one
    #[error("API key is not configured")]
    Unauthorized,

    /// Non-success HTTP status
    #[error("API request failed ({status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The response carried no assistant message
    #[error("API returned no message content")]
    EmptyResponse,
}

/// Result type alias for pagelens operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }

    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}
