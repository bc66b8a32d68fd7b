// src/cookie/mod.rs

//! Auth-cookie session policy.
//!
//! A server protected by a Kerberos/SPNEGO filter answers a successful
//! `Negotiate` handshake with an authentication cookie. While a usable copy of
//! that cookie is in the client's store, there is no need to run the handshake
//! again. [`CookieSessionPolicy`] answers that question for each request, and
//! strips the cookie once the server stops accepting it.

use std::sync::Arc;

use url::Url;

pub use cookie_crate::Cookie;

mod memory;
#[cfg(feature = "cookies")]
mod store;

pub use self::memory::MemoryCookieStore;
#[cfg(feature = "cookies")]
pub use self::store::PoisonedStore;

/// Name of the cookie the server-side authentication filter sets once a
/// client has authenticated.
pub const AUTH_COOKIE: &str = "hadoop.auth";

/// A cookie store owned by the HTTP layer.
///
/// Implementations provide their own synchronization; the policy calls into
/// the store without any additional locking.
pub trait CookieStore {
    /// Error raised when the store cannot be accessed.
    type Error;

    /// Every cookie in the store, in iteration order, regardless of scope.
    fn cookies(&self) -> Result<Vec<Cookie<'static>>, Self::Error>;

    /// Remove `cookie` from the scope of `uri`.
    ///
    /// `cookie` comes from [`cookies`](CookieStore::cookies), which is not
    /// filtered by URI, so it may live under a different scope than `uri`
    /// (an address instead of a host name, say). Implementations must still
    /// remove it in that case. Returns whether an entry was removed.
    fn remove(&self, uri: &Url, cookie: &Cookie<'_>) -> Result<bool, Self::Error>;
}

impl<S: CookieStore + ?Sized> CookieStore for &S {
    type Error = S::Error;

    fn cookies(&self) -> Result<Vec<Cookie<'static>>, Self::Error> {
        (**self).cookies()
    }

    fn remove(&self, uri: &Url, cookie: &Cookie<'_>) -> Result<bool, Self::Error> {
        (**self).remove(uri, cookie)
    }
}

impl<S: CookieStore + ?Sized> CookieStore for Arc<S> {
    type Error = S::Error;

    fn cookies(&self) -> Result<Vec<Cookie<'static>>, Self::Error> {
        (**self).cookies()
    }

    fn remove(&self, uri: &Url, cookie: &Cookie<'_>) -> Result<bool, Self::Error> {
        (**self).remove(uri, cookie)
    }
}

/// Decides whether a request needs a fresh `Negotiate` challenge.
///
/// Store errors are returned unchanged. A missing store, or a store without a
/// usable auth cookie, is not an error.
#[derive(Clone, Debug)]
pub struct CookieSessionPolicy {
    cookie_name: String,
}

impl Default for CookieSessionPolicy {
    fn default() -> Self {
        CookieSessionPolicy::new()
    }
}

impl CookieSessionPolicy {
    /// A policy looking for [`AUTH_COOKIE`].
    pub fn new() -> Self {
        CookieSessionPolicy {
            cookie_name: AUTH_COOKIE.to_owned(),
        }
    }

    /// Look for a differently named auth cookie.
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Find the auth cookie that may be sent to `uri`.
    ///
    /// Secure cookies are skipped unless `uri` is `https`; they are left in
    /// the store. The first matching cookie in store order wins.
    pub fn find_auth_cookie<S>(
        &self,
        store: Option<&S>,
        uri: &Url,
    ) -> Result<Option<Cookie<'static>>, S::Error>
    where
        S: CookieStore + ?Sized,
    {
        let store = match store {
            Some(store) => store,
            None => return Ok(None),
        };
        let is_ssl = uri.scheme() == "https";

        for cookie in store.cookies()? {
            // A secure cookie is never replayed over plain HTTP, so it
            // cannot stand in for credentials there.
            if cookie.secure().unwrap_or(false) && !is_ssl {
                log::trace!("skipping secure cookie {} for {}", cookie.name(), uri);
                continue;
            }
            if cookie.name() == self.cookie_name {
                return Ok(Some(cookie));
            }
        }
        Ok(None)
    }

    /// Remove the auth cookie usable for `uri`, if there is one.
    pub fn remove_auth_cookie<S>(&self, store: Option<&S>, uri: &Url) -> Result<(), S::Error>
    where
        S: CookieStore + ?Sized,
    {
        if let (Some(store), Some(cookie)) = (store, self.find_auth_cookie(store, uri)?) {
            if store.remove(uri, &cookie)? {
                log::debug!("removed auth cookie {} for {}", cookie.name(), uri);
            }
        }
        Ok(())
    }

    /// Returns true if no usable auth cookie exists for `uri`, i.e. a
    /// challenge must be generated for the request.
    pub fn needs_credentials<S>(&self, store: Option<&S>, uri: &Url) -> Result<bool, S::Error>
    where
        S: CookieStore + ?Sized,
    {
        Ok(self.find_auth_cookie(store, uri)?.is_none())
    }
}
