//! Error Types
//!
//! This module defines the error types used throughout the render engine.
//!
//! # Overview
//!
//! [`PearRayError`] covers the five failure families the engine
//! distinguishes:
//! - Configuration errors (bad scene references, factory/parameter errors)
//! - Resource errors (cache, upsampler table)
//! - Runtime numerical faults (NaN/negative spectral samples — these are
//!   recorded in [`crate::render::output::Feedback`], never returned
//!   as an `Err`; the variant exists so tooling can format them uniformly)
//! - Cancellation
//! - Implementation invariant violations
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, PearRayError>`.

use thiserror::Error;

/// The main error type for the PearRay render engine.
#[derive(Error, Debug)]
pub enum PearRayError {
    // ========================================================================
    // Configuration errors (§7.1)
    // ========================================================================
    /// A scene reference (entity/material/emission/mesh/node id) pointed at
    /// nothing the database knows about.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// A named plugin factory was not found in the registry.
    #[error("unknown factory: {0}")]
    UnknownFactory(String),

    /// A parameter value fell outside its declared min/max or type.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name as declared by the factory.
        name: String,
        /// Human-readable description of why it was rejected.
        reason: String,
    },

    // ========================================================================
    // Resource errors (§7.2)
    // ========================================================================
    /// The cache directory could not be created or is not writable.
    #[error("cache path error: {0}")]
    CachePath(String),

    /// The binary spectral upsampler table failed its magic-tag check or is
    /// truncated.
    #[error("invalid spectral upsampler table: {0}")]
    UpsamplerTable(String),

    // ========================================================================
    // I/O
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Cancellation (§7.4)
    // ========================================================================
    /// The render was cancelled via the cooperative `stopping` flag. Not a
    /// true error — maps to CLI exit code 4.
    #[error("render cancelled")]
    Cancelled,

    // ========================================================================
    // Implementation invariants (§7.5)
    // ========================================================================
    /// A debug-build assertion about engine invariants failed (non-unit
    /// normal, path weight outside `[0, 1]`, etc). In release builds the
    /// same condition is downgraded to a numerical fault instead of an
    /// `Err`.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Alias for `Result<T, PearRayError>`.
pub type Result<T> = std::result::Result<T, PearRayError>;
