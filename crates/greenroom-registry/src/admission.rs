//! Admission hook for gating new connections.
//!
//! Greenroom assumes an external layer decides how many connections a
//! deployment can take — the coordinator itself never refuses a
//! registration. The [`AdmissionPolicy`] trait is that seam: a single
//! async method called once per connection, before the participant is
//! registered or placed in a room. Denial closes the connection without
//! touching any lobby state.
//!
//! The default [`OpenAdmission`] admits everyone, which is the right
//! choice for development and for deployments that gate at a proxy.

use std::net::SocketAddr;

use crate::RegistryError;

/// Decides whether an incoming connection is allowed in.
///
/// # Trait bounds
///
/// - `Send + Sync` → the policy is shared across connection tasks.
/// - `'static` → it lives as long as the server.
///
/// # Example
///
/// ```rust
/// use std::net::SocketAddr;
///
/// use greenroom_registry::{AdmissionPolicy, RegistryError};
///
/// /// Caps the server at a fixed number of concurrent participants.
/// struct CappedAdmission {
///     max: usize,
/// }
///
/// impl AdmissionPolicy for CappedAdmission {
///     async fn admit(
///         &self,
///         _peer: Option<SocketAddr>,
///         connected: usize,
///     ) -> Result<(), RegistryError> {
///         if connected >= self.max {
///             return Err(RegistryError::AdmissionDenied(
///                 "server is full".into(),
///             ));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait AdmissionPolicy: Send + Sync + 'static {
    /// Decides whether to admit a connection.
    ///
    /// # Arguments
    /// - `peer` — the remote address, if the transport knows it
    /// - `connected` — how many participants are currently registered
    ///
    /// # Returns
    /// - `Ok(())` — admit; registration proceeds
    /// - `Err(RegistryError::AdmissionDenied)` — refuse; the connection
    ///   is closed with no side effects
    fn admit(
        &self,
        peer: Option<SocketAddr>,
        connected: usize,
    ) -> impl std::future::Future<Output = Result<(), RegistryError>> + Send;
}

/// The default policy: admits every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAdmission;

impl AdmissionPolicy for OpenAdmission {
    async fn admit(
        &self,
        _peer: Option<SocketAddr>,
        _connected: usize,
    ) -> Result<(), RegistryError> {
        Ok(())
    }
}
