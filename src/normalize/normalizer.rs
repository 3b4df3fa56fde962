//! Rewrites transport variables to hide a single load-balancer hop.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

use crate::config::ForwardedHeadersConfig;
use crate::normalize::chain::ForwardedChain;
use crate::variables::names::{
    HTTPS, HTTP_X_FORWARDED_FOR, HTTP_X_FORWARDED_PROTO, HTTP_X_REQUESTED_WITH, REMOTE_ADDR,
    SERVER_PORT, SERVER_PORT_SECURE, X_REQUESTED_WITH,
};
use crate::variables::{ReadOnlyToggle, VariableBag, VariablesError, WritableScope};

/// Variable written while probing a bag type at startup.
const TOGGLE_CHECK_VARIABLE: &str = "FORWARDED_NORMALIZER_TOGGLE_CHECK";

/// Errors that prevent the normalizer from being installed.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The host's bag type cannot be safely toggled between read-only and writable.
    #[error("Read-only toggle unsupported on '{type_name}': {reason}")]
    ReadOnlyToggleUnsupported {
        type_name: &'static str,
        reason: &'static str,
    },
}

/// Summary of the changes made to one bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Address assigned to `REMOTE_ADDR`.
    pub remote_addr: Option<String>,
    /// Entries left in `HTTP_X_FORWARDED_FOR` after stripping the nearest hop.
    pub remaining_hops: usize,
    /// Secure state derived from the forwarded protocol.
    pub secure: Option<bool>,
    /// Whether the AJAX marker was copied to `X-Requested-With`.
    pub requested_with: bool,
}

impl Normalized {
    /// True when no forwarding header was present.
    pub fn is_untouched(&self) -> bool {
        self.remote_addr.is_none() && self.secure.is_none() && !self.requested_with
    }
}

/// Normalizes forwarded headers for bags of type `B`.
///
/// Only obtainable through [`ForwardedHeaderNormalizer::install`], which
/// verifies that `B` honours its read-only flag.
pub struct ForwardedHeaderNormalizer<B> {
    _bag: PhantomData<fn(&mut B)>,
}

impl<B> Clone for ForwardedHeaderNormalizer<B> {
    fn clone(&self) -> Self {
        Self { _bag: PhantomData }
    }
}

impl<B> fmt::Debug for ForwardedHeaderNormalizer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardedHeaderNormalizer")
            .field("bag", &type_name::<B>())
            .finish()
    }
}

impl<B> ForwardedHeaderNormalizer<B>
where
    B: VariableBag + ReadOnlyToggle + Default,
{
    /// Build the normalizer if the switch is on.
    ///
    /// Returns `Ok(None)` when disabled. Fails when `B` does not support
    /// toggling its read-only flag.
    pub fn install(config: &ForwardedHeadersConfig) -> Result<Option<Self>, StartupError> {
        if !config.enabled {
            tracing::info!("Forwarded header normalization disabled");
            return Ok(None);
        }

        check_read_only_toggle::<B>()?;

        tracing::info!(
            bag = type_name::<B>(),
            sync_request_headers = config.sync_request_headers,
            "Forwarded header normalization enabled"
        );
        Ok(Some(Self { _bag: PhantomData }))
    }
}

impl<B> ForwardedHeaderNormalizer<B>
where
    B: VariableBag + ReadOnlyToggle,
{
    /// Rewrite `bag` in place.
    ///
    /// The bag's read-only flag is the same on return as on entry, whether
    /// the rewrite succeeds, fails or panics.
    pub fn normalize(&self, bag: &mut B) -> Result<Normalized, VariablesError> {
        let mut scope = WritableScope::acquire(bag);
        rewrite(&mut *scope)
    }
}

fn check_read_only_toggle<B>() -> Result<(), StartupError>
where
    B: VariableBag + ReadOnlyToggle + Default,
{
    let unsupported = |reason| StartupError::ReadOnlyToggleUnsupported {
        type_name: type_name::<B>(),
        reason,
    };

    let mut bag = B::default();
    bag.set_read_only(true);
    if !bag.is_read_only() {
        return Err(unsupported("read-only flag cannot be set"));
    }
    if bag.set(TOGGLE_CHECK_VARIABLE, "1").is_ok() {
        return Err(unsupported("read-only flag does not block writes"));
    }

    bag.set_read_only(false);
    if bag.is_read_only() {
        return Err(unsupported("read-only flag cannot be cleared"));
    }
    if bag.set(TOGGLE_CHECK_VARIABLE, "1").is_err() {
        return Err(unsupported("cleared flag still blocks writes"));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

fn rewrite<B: VariableBag>(bag: &mut B) -> Result<Normalized, VariablesError> {
    let mut outcome = Normalized::default();

    let forwarded_for = bag.get(HTTP_X_FORWARDED_FOR).map(str::to_owned);
    if let Some(chain) = forwarded_for.as_deref().and_then(ForwardedChain::parse) {
        let (remaining, nearest) = chain.split_last();
        bag.set(REMOTE_ADDR, nearest)?;
        match remaining {
            Some(rest) => {
                bag.set(HTTP_X_FORWARDED_FOR, rest)?;
                outcome.remaining_hops = ForwardedChain::parse(rest)
                    .map(|rest| rest.addresses().count())
                    .unwrap_or(0);
            }
            None => {
                bag.remove(HTTP_X_FORWARDED_FOR)?;
            }
        }
        outcome.remote_addr = Some(nearest.to_string());
    }

    if let Some(protocol) = non_empty(bag.get(HTTP_X_FORWARDED_PROTO)) {
        bag.remove(HTTP_X_FORWARDED_PROTO)?;

        let secure = protocol.eq_ignore_ascii_case("https");
        let (https, port, port_secure) = if secure {
            ("on", "443", "1")
        } else {
            ("off", "80", "0")
        };
        bag.set(HTTPS, https)?;
        bag.set(SERVER_PORT, port)?;
        bag.set(SERVER_PORT_SECURE, port_secure)?;
        outcome.secure = Some(secure);
    }

    if let Some(requested_with) = non_empty(bag.get(HTTP_X_REQUESTED_WITH)) {
        bag.set(X_REQUESTED_WITH, &requested_with)?;
        outcome.requested_with = true;
    }

    Ok(outcome)
}
