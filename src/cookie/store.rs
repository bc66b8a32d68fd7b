// src/cookie/store.rs

use std::fmt;
use std::sync::{PoisonError, RwLock};

use url::Url;

use super::{Cookie, CookieStore};

/// A `cookie_store::CookieStore` whose lock was poisoned by a panicking writer.
#[derive(Debug)]
pub struct PoisonedStore;

impl fmt::Display for PoisonedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cookie store lock poisoned")
    }
}

impl std::error::Error for PoisonedStore {}

impl<T> From<PoisonError<T>> for PoisonedStore {
    fn from(_: PoisonError<T>) -> Self {
        PoisonedStore
    }
}

/// The store shape used by reqwest's cookie `Jar`.
///
/// Expired cookies are included; the store evicts them on its own schedule.
impl CookieStore for RwLock<cookie_store::CookieStore> {
    type Error = PoisonedStore;

    fn cookies(&self) -> Result<Vec<Cookie<'static>>, PoisonedStore> {
        let store = self.read()?;
        Ok(store.iter_any().map(|c| (**c).clone()).collect())
    }

    fn remove(&self, uri: &Url, cookie: &Cookie<'_>) -> Result<bool, PoisonedStore> {
        let mut store = self.write()?;
        let host = uri.host_str().unwrap_or_default();
        let domain_matches = |c: &cookie_store::Cookie<'_>| {
            c.domain
                .as_cow()
                .map_or(false, |d| host.eq_ignore_ascii_case(&d) || host.ends_with(&*format!(".{}", d)))
        };
        // prefer the entry scoped to `uri`, else the same cookie under any domain
        let key = store
            .iter_any()
            .find(|c| ***c == *cookie && domain_matches(*c))
            .or_else(|| store.iter_any().find(|c| ***c == *cookie))
            .and_then(|c| {
                let domain = c.domain.as_cow()?.into_owned();
                let path: &str = c.path.as_ref();
                Some((domain, path.to_owned(), c.name().to_owned()))
            });

        Ok(match key {
            Some((domain, path, name)) => store.remove(&domain, &path, &name).is_some(),
            None => false,
        })
    }
}
