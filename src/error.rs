#![deny(missing_docs)]

use std::error::Error as StdError;
use std::fmt;

/// A boxed error as produced by a [`SecurityProvider`](crate::SecurityProvider).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// A `Result` alias where the `Err` case is `negotiate_session::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The Errors that may occur while generating a challenge.
///
/// Every failure inside the GSS handshake, including a missing Kerberos
/// mechanism, is reported as an authentication failure. The underlying
/// provider error is available through [`source()`](StdError::source).
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    service: Option<String>,
    source: Option<BoxError>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                service: None,
                source: source.map(Into::into),
            }),
        }
    }

    pub(crate) fn with_service(mut self, service: impl Into<String>) -> Error {
        self.inner.service = Some(service.into());
        self
    }

    /// Returns the service name the failed challenge was generated for, if known.
    pub fn service(&self) -> Option<&str> {
        self.inner.service.as_deref()
    }

    /// Returns true if the error came from the Kerberos handshake.
    ///
    /// A caller receiving such an error should treat the request as
    /// unauthenticated.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self.inner.kind,
            Kind::Mechanism | Kind::Name | Kind::Context | Kind::Negotiate
        )
    }

    /// Returns true if the error is related to the request target, for
    /// example a URL without a host.
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("negotiate_session::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref service) = self.inner.service {
            builder.field("service", service);
        }

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Builder => f.write_str("builder error")?,
            Kind::Mechanism => f.write_str("kerberos mechanism unavailable")?,
            Kind::Name => f.write_str("failed to build service name")?,
            Kind::Context => f.write_str("failed to create security context")?,
            Kind::Negotiate => f.write_str("negotiate authentication failed")?,
        }

        if let Some(service) = &self.inner.service {
            write!(f, " for {service}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    Builder,
    Mechanism,
    Name,
    Context,
    Negotiate,
}

// constructors

pub(crate) fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder, Some(e))
}

pub(crate) fn mechanism<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Mechanism, Some(e))
}

pub(crate) fn name<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Name, Some(e))
}

pub(crate) fn context<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Context, Some(e))
}

pub(crate) fn negotiate<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Negotiate, Some(e))
}
