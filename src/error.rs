//! # Error Types
//!
//! This module defines error types used throughout the holicard library.

use thiserror::Error;

/// Main error type for holicard operations
#[derive(Debug, Error)]
pub enum CardError {
    /// Form input rejected before submission
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The provider could not write the wish (fatal to the submission)
    #[error("Text generation failed: {0}")]
    TextGeneration(String),

    /// The provider could not paint the artwork (callers substitute a placeholder)
    #[error("Image generation failed: {0}")]
    ImageGeneration(String),

    /// Rasterizing or encoding a card face failed
    #[error("Export error: {0}")]
    Export(String),

    /// A share channel could not be opened
    #[error("Share error: {0}")]
    Share(String),

    /// A submission arrived while another one is in flight
    #[error("A postcard is already being generated")]
    Busy,

    /// The submission was overtaken by a reset or a newer submission
    #[error("Generation was superseded by a newer request")]
    Superseded,

    /// An operation needs a finished postcard and there is none
    #[error("No postcard has been generated yet")]
    NoPostcard,

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level errors (bind, HTTP client)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
