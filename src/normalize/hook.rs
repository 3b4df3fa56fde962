//! Begin-request hook interface.

use crate::normalize::normalizer::ForwardedHeaderNormalizer;
use crate::observability::metrics;
use crate::variables::{ReadOnlyToggle, VariableBag};

/// Invoked by the host once per inbound request, before application code runs.
pub trait RequestHook<B>: Send + Sync {
    fn begin_request(&self, bag: &mut B);
}

impl<B> RequestHook<B> for ForwardedHeaderNormalizer<B>
where
    B: VariableBag + ReadOnlyToggle,
{
    fn begin_request(&self, bag: &mut B) {
        match self.normalize(bag) {
            Ok(outcome) => {
                if !outcome.is_untouched() {
                    tracing::debug!(
                        remote_addr = ?outcome.remote_addr,
                        remaining_hops = outcome.remaining_hops,
                        secure = ?outcome.secure,
                        requested_with = outcome.requested_with,
                        "Forwarded headers normalized"
                    );
                }
                metrics::record_normalized(&outcome);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Forwarded header normalization failed");
            }
        }
    }
}
