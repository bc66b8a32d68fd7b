#![deny(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # negotiate-session
//!
//! Client-side helpers for talking to Kerberos/SPNEGO protected HTTP
//! services, such as a Druid broker behind a Hadoop authentication filter.
//!
//! - [`ChallengeGenerator`] produces the base64 token for a
//!   `Authorization: Negotiate <token>` header.
//! - [`CookieSessionPolicy`] decides from the client's cookie store whether a
//!   request still carries an authenticated session, and removes the auth
//!   cookie once the server stops accepting it.
//!
//! The HTTP client, its cookie store and the Kerberos ticket cache all stay
//! with the caller.
//!
//! ## Example
//!
//! ```
//! use negotiate_session::{CookieSessionPolicy, MemoryCookieStore};
//! use url::Url;
//!
//! let store = MemoryCookieStore::new();
//! let uri = Url::parse("http://broker.corp:8082/druid/v2").unwrap();
//! let policy = CookieSessionPolicy::new();
//!
//! if policy.needs_credentials(Some(&store), &uri).unwrap() {
//!     // generate a challenge and send `Authorization: Negotiate <token>`
//! }
//! ```
//!
//! ## Optional Features
//!
//! - **gssapi**: Native provider over the system GSS-API library (unix).
//! - **cookies** *(enabled by default)*: `CookieStore` implementation for
//!   `RwLock<cookie_store::CookieStore>`.

pub use url::Url;

pub use self::auth::{
    service_host, ChallengeGenerator, CurrentUser, InitiatorContext, Mechanism, SecurityProvider,
    Subject,
};
pub use self::cookie::{Cookie, CookieSessionPolicy, CookieStore, MemoryCookieStore, AUTH_COOKIE};
pub use self::error::{BoxError, Error, Result};

#[cfg(all(unix, feature = "gssapi"))]
#[cfg_attr(docsrs, doc(cfg(feature = "gssapi")))]
pub use self::auth::gssapi::{GssContext, GssError, GssName, Gssapi};

#[cfg(feature = "cookies")]
#[cfg_attr(docsrs, doc(cfg(feature = "cookies")))]
pub use self::cookie::PoisonedStore;

mod auth;
pub mod cookie;
mod error;
