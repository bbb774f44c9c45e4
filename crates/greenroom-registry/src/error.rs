//! Error types for the registry layer.

/// Errors that can occur during registration.
///
/// Registration itself always succeeds; the only failure mode at this
/// layer is the admission check in front of it.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The admission policy refused this connection. The connection is
    /// closed before any participant or room state is created.
    #[error("admission denied: {0}")]
    AdmissionDenied(String),
}
