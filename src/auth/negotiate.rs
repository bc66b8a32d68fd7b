// src/auth/negotiate.rs

//! SPNEGO challenge generation (RFC 4559 initiator token).

use base64::Engine as _;
use url::Url;

use super::lock::KERBEROS_LOCK;
use super::{InitiatorContext, SecurityProvider, Subject};
use crate::error::{self, Result};

const DEFAULT_SERVICE: &str = "HTTP";

/// Derive the host part of a Kerberos service name from a URL.
///
/// The result carries no scheme or port and is suitable as the
/// `server_host` argument of [`ChallengeGenerator::generate_challenge`].
///
/// # Examples
/// ```
/// # use url::Url;
/// let url = Url::parse("https://druid.corp.com:8082/druid/v2").unwrap();
/// assert_eq!(negotiate_session::service_host(&url).unwrap(), "druid.corp.com");
/// ```
pub fn service_host(url: &Url) -> Result<&str> {
    url.host_str()
        .ok_or_else(|| error::builder("URL has no host for service name"))
}

/// Generates `Negotiate` challenges for Kerberos-protected HTTP services.
///
/// Every call negotiates a fresh, single-use GSS context; nothing is cached
/// between calls. Context establishment is serialized across the whole
/// process, regardless of the target server or the generator instance.
#[derive(Clone, Debug)]
pub struct ChallengeGenerator<P> {
    provider: P,
    service: String,
}

impl<P: SecurityProvider> ChallengeGenerator<P> {
    /// Create a generator over `provider` for `HTTP` services.
    pub fn new(provider: P) -> Self {
        ChallengeGenerator {
            provider,
            service: DEFAULT_SERVICE.to_owned(),
        }
    }

    /// Override the service class of the target principal (default `HTTP`).
    pub fn service(mut self, class: impl Into<String>) -> Self {
        self.service = class.into();
        self
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Generate a base64 encoded challenge for `server_host` as `subject`.
    ///
    /// `server_host` is a bare host name, without scheme or port. The
    /// handshake runs inside [`Subject::do_as`], so the provider sees the
    /// subject's credentials; no credential handle is passed explicitly.
    ///
    /// Mutual authentication and credential delegation are both requested.
    /// Blocks until every earlier caller has finished its own handshake.
    ///
    /// # Errors
    ///
    /// Any provider failure aborts the call with an error for which
    /// [`Error::is_authentication`](crate::Error::is_authentication) is true.
    /// No partial token is ever returned and nothing is retried.
    pub fn generate_challenge<S>(&self, server_host: &str, subject: &S) -> Result<String>
    where
        S: Subject + ?Sized,
    {
        let service = format!("{}@{}", self.service, server_host);
        subject
            .do_as(|| {
                let _guard = KERBEROS_LOCK.lock();
                self.negotiate(&service)
            })
            .map_err(|e| e.with_service(service))
    }

    /// Generate a challenge for the host of `url`.
    pub fn challenge_for_url<S>(&self, url: &Url, subject: &S) -> Result<String>
    where
        S: Subject + ?Sized,
    {
        let host = service_host(url)?;
        self.generate_challenge(host, subject)
    }

    // must be called with KERBEROS_LOCK held
    fn negotiate(&self, service: &str) -> Result<String> {
        let mech = self.provider.kerberos_mechanism().map_err(|e| {
            log::debug!("kerberos mechanism lookup failed: {}", e);
            error::mechanism(e)
        })?;

        let name = self
            .provider
            .host_based_service(service)
            .and_then(|name| self.provider.canonicalize(&name, mech))
            .map_err(|e| {
                log::debug!("cannot import service name {}: {}", service, e);
                error::name(e)
            })?;

        let mut ctx = self.provider.create_context(name, mech).map_err(|e| {
            log::debug!("cannot create security context for {}: {}", service, e);
            error::context(e)
        })?;
        ctx.request_mutual_auth(true);
        ctx.request_cred_deleg(true);

        let token = ctx.init_sec_context(&[]);
        drop(ctx);
        let token = token.map_err(|e| {
            log::debug!("initiating security context for {} failed: {}", service, e);
            error::negotiate(e)
        })?;

        log::debug!("Got valid challenge for host {}", service);
        Ok(base64::engine::general_purpose::STANDARD.encode(token))
    }
}

#[cfg(all(unix, feature = "gssapi"))]
impl ChallengeGenerator<super::gssapi::Gssapi> {
    /// Create a generator over the system GSS-API library.
    pub fn gssapi() -> Self {
        ChallengeGenerator::new(super::gssapi::Gssapi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CurrentUser, Mechanism};
    use crate::error::BoxError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
        fail_at: Option<&'static str>,
    }

    struct Provider(Rc<Recorder>);

    struct Context(Rc<Recorder>);

    impl Recorder {
        fn record(&self, call: &str) -> std::result::Result<(), BoxError> {
            self.calls.borrow_mut().push(call.to_owned());
            if self.fail_at == Some(call.split(' ').next().unwrap_or_default()) {
                return Err(format!("{} failed", call).into());
            }
            Ok(())
        }
    }

    impl SecurityProvider for Provider {
        type Name = String;
        type Context = Context;

        fn kerberos_mechanism(&self) -> std::result::Result<Mechanism, BoxError> {
            self.0.record("mechanism")?;
            Ok(Mechanism::KRB5)
        }

        fn host_based_service(&self, service: &str) -> std::result::Result<String, BoxError> {
            self.0.record(&format!("import {}", service))?;
            Ok(service.to_owned())
        }

        fn canonicalize(&self, name: &String, _: Mechanism) -> std::result::Result<String, BoxError> {
            self.0.record(&format!("canonicalize {}", name))?;
            Ok(name.to_lowercase())
        }

        fn create_context(&self, target: String, _: Mechanism) -> std::result::Result<Context, BoxError> {
            self.0.record(&format!("create {}", target))?;
            Ok(Context(self.0.clone()))
        }
    }

    impl InitiatorContext for Context {
        fn request_mutual_auth(&mut self, state: bool) {
            self.0.calls.borrow_mut().push(format!("mutual {}", state));
        }

        fn request_cred_deleg(&mut self, state: bool) {
            self.0.calls.borrow_mut().push(format!("deleg {}", state));
        }

        fn init_sec_context(&mut self, input: &[u8]) -> std::result::Result<Vec<u8>, BoxError> {
            self.0.record(&format!("init {}", input.len()))?;
            Ok(b"token".to_vec())
        }
    }

    impl Drop for Context {
        fn drop(&mut self) {
            self.0.calls.borrow_mut().push("dispose".to_owned());
        }
    }

    fn generator(fail_at: Option<&'static str>) -> (ChallengeGenerator<Provider>, Rc<Recorder>) {
        let recorder = Rc::new(Recorder {
            fail_at,
            ..Recorder::default()
        });
        (ChallengeGenerator::new(Provider(recorder.clone())), recorder)
    }

    #[test]
    fn test_handshake_order() {
        let (gen, rec) = generator(None);
        let challenge = gen.generate_challenge("Druid.Example.com", &CurrentUser).unwrap();
        assert_eq!(challenge, "dG9rZW4=");
        assert_eq!(
            *rec.calls.borrow(),
            vec![
                "mechanism",
                "import HTTP@Druid.Example.com",
                "canonicalize HTTP@Druid.Example.com",
                "create http@druid.example.com",
                "mutual true",
                "deleg true",
                "init 0",
                "dispose",
            ]
        );
    }

    #[test]
    fn test_custom_service_class() {
        let (gen, rec) = generator(None);
        let gen = gen.service("host");
        gen.generate_challenge("broker", &CurrentUser).unwrap();
        assert!(rec.calls.borrow().contains(&"import host@broker".to_owned()));
    }

    #[test]
    fn test_mechanism_failure() {
        let (gen, rec) = generator(Some("mechanism"));
        let err = gen.generate_challenge("broker", &CurrentUser).unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(err.service(), Some("HTTP@broker"));
        assert_eq!(*rec.calls.borrow(), vec!["mechanism"]);
    }

    #[test]
    fn test_negotiation_failure_still_disposes() {
        let (gen, rec) = generator(Some("init"));
        let err = gen.generate_challenge("broker", &CurrentUser).unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(rec.calls.borrow().last().map(String::as_str), Some("dispose"));
        // lock must be free again
        let (gen, _) = generator(None);
        assert!(gen.generate_challenge("broker", &CurrentUser).is_ok());
    }

    #[test]
    fn test_challenge_for_url() {
        let (gen, rec) = generator(None);
        let url = Url::parse("http://broker.corp:8082/druid/v2").unwrap();
        gen.challenge_for_url(&url, &CurrentUser).unwrap();
        assert!(rec.calls.borrow().contains(&"import HTTP@broker.corp".to_owned()));
    }

    #[test]
    fn test_service_host() {
        let url = Url::parse("http://example.com/path").unwrap();
        assert_eq!(service_host(&url).unwrap(), "example.com");

        let url = Url::parse("https://server.corp.com:8080/api").unwrap();
        assert_eq!(service_host(&url).unwrap(), "server.corp.com");

        let url = Url::parse("data:text/plain,hello").unwrap();
        assert!(service_host(&url).unwrap_err().is_builder());
    }
}
