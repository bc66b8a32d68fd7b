// src/cookie/memory.rs

use std::convert::Infallible;

use parking_lot::RwLock;
use url::Url;

use super::{Cookie, CookieStore};

/// A thread-safe, in-memory cookie store.
///
/// Cookies are scoped to the host of the URI they were added for and kept in
/// insertion order. Adding a cookie with the same name, domain and path as an
/// existing one in the same scope replaces it in place.
///
/// Removal prefers the entry in the scope of the given URI; if there is none
/// there, the first entry equal to the cookie is removed from whatever scope
/// holds it.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    entries: RwLock<Vec<Entry>>,
}

#[derive(Debug)]
struct Entry {
    scope: String,
    cookie: Cookie<'static>,
}

impl MemoryCookieStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemoryCookieStore::default()
    }

    /// Add `cookie` to the scope of `uri`.
    pub fn add(&self, uri: &Url, cookie: Cookie<'static>) {
        let scope = scope(uri);
        let mut entries = self.entries.write();
        match entries
            .iter_mut()
            .find(|e| e.scope == scope && same_cookie(&e.cookie, &cookie))
        {
            Some(existing) => existing.cookie = cookie,
            None => entries.push(Entry { scope, cookie }),
        }
    }

    /// Number of stored cookies.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CookieStore for MemoryCookieStore {
    type Error = Infallible;

    fn cookies(&self) -> Result<Vec<Cookie<'static>>, Infallible> {
        Ok(self.entries.read().iter().map(|e| e.cookie.clone()).collect())
    }

    fn remove(&self, uri: &Url, cookie: &Cookie<'_>) -> Result<bool, Infallible> {
        let scope = scope(uri);
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| !(e.scope == scope && same_cookie(&e.cookie, cookie)));
        if entries.len() != before {
            return Ok(true);
        }
        // not under this scope, e.g. set via an address and requested via a host name
        match entries.iter().position(|e| e.cookie == *cookie) {
            Some(i) => {
                entries.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn scope(uri: &Url) -> String {
    uri.host_str().unwrap_or_default().to_ascii_lowercase()
}

// RFC 6265 identity: name, domain and path
fn same_cookie(a: &Cookie<'_>, b: &Cookie<'_>) -> bool {
    a.name() == b.name()
        && a.domain().map(str::to_ascii_lowercase) == b.domain().map(str::to_ascii_lowercase)
        && a.path() == b.path()
}
