// src/auth/mod.rs

//! Kerberos/SPNEGO challenge generation.
//!
//! The handshake itself is delegated to a [`SecurityProvider`]; this module
//! owns the process-wide serialization of context establishment and the
//! mapping of provider failures onto [`Error`](crate::Error).

#[cfg(all(unix, feature = "gssapi"))]
pub(crate) mod gssapi;

mod lock;
mod negotiate;

pub use negotiate::{service_host, ChallengeGenerator};

use crate::error::BoxError;

/// An authenticated principal whose credentials back a challenge.
///
/// The generator never acquires credentials itself. It runs the GSS
/// handshake inside [`do_as`](Subject::do_as), and the implementation is
/// expected to make its principal's credentials visible to the provider for
/// exactly the duration of that call.
///
/// The negotiation lock is not reentrant: generating another challenge from
/// inside `do_as` on the same thread deadlocks.
pub trait Subject {
    /// Run `action` as this principal.
    fn do_as<T, F>(&self, action: F) -> T
    where
        F: FnOnce() -> T;
}

/// The principal of the current process user.
///
/// With the native provider this is whatever the default credential cache
/// holds (see `kinit`), so `do_as` runs the action unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentUser;

impl Subject for CurrentUser {
    fn do_as<T, F>(&self, action: F) -> T
    where
        F: FnOnce() -> T,
    {
        action()
    }
}

impl<S: Subject + ?Sized> Subject for &S {
    fn do_as<T, F>(&self, action: F) -> T
    where
        F: FnOnce() -> T,
    {
        (**self).do_as(action)
    }
}

/// A DER-encoded GSS mechanism object identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mechanism(&'static [u8]);

impl Mechanism {
    /// Kerberos v5, `1.2.840.113554.1.2.2`.
    pub const KRB5: Mechanism =
        Mechanism(&[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x12, 0x01, 0x02, 0x02]);

    /// The encoded identifier, without the DER tag and length.
    pub fn as_bytes(&self) -> &'static [u8] {
        self.0
    }
}

/// The GSS-API operations a challenge is built from.
///
/// Implementations wrap a concrete GSS library. They are called with the
/// process-wide negotiation lock held, so they never observe concurrent
/// context establishment. That lock is not reentrant; a provider must not call
/// back into [`ChallengeGenerator`](crate::ChallengeGenerator) on the same
/// thread.
pub trait SecurityProvider {
    /// An imported GSS name.
    type Name;
    /// A one-shot initiator context.
    type Context: InitiatorContext;

    /// Resolve the Kerberos v5 mechanism.
    fn kerberos_mechanism(&self) -> Result<Mechanism, BoxError> {
        Ok(Mechanism::KRB5)
    }

    /// Import `service` (`service@host`) as a host-based service name.
    fn host_based_service(&self, service: &str) -> Result<Self::Name, BoxError>;

    /// Canonicalize `name` for `mech`.
    fn canonicalize(&self, name: &Self::Name, mech: Mechanism) -> Result<Self::Name, BoxError>;

    /// Create an initiator context targeting `target`.
    ///
    /// The context must source its credentials from the ambient principal
    /// rather than an explicit credential handle.
    fn create_context(&self, target: Self::Name, mech: Mechanism) -> Result<Self::Context, BoxError>;
}

/// The initiator side of a GSS security context.
///
/// Dropping the context disposes it.
pub trait InitiatorContext {
    /// Request mutual authentication.
    fn request_mutual_auth(&mut self, state: bool);

    /// Request credential delegation to the target.
    fn request_cred_deleg(&mut self, state: bool);

    /// Run one handshake step, returning the token to send to the acceptor.
    fn init_sec_context(&mut self, input: &[u8]) -> Result<Vec<u8>, BoxError>;
}
