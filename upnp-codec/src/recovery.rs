//! Repair-and-retry decoding of malformed bodies
//!
//! Many devices send bodies that are not quite XML: URLs with raw `&` in
//! `CurrentURI`, `LastChange` values that were never escaped, envelopes
//! missing their final characters. [`Recovering`] wraps a codec and, when a
//! decode fails with [`CodecError::UnsupportedData`], retries on repaired
//! copies of the body:
//!
//! 1. the body as received (trimmed);
//! 2. pass A: raw `&` escaped, plus the `LastChange` repair for events;
//! 3. pass B: pass A plus completion of a truncated `</s:Envelope>`, for
//!    SOAP responses.
//!
//! A pass is skipped when it does not change the text. Before every retry the
//! invocation outcome or the collected event values are reset. When every
//! pass fails, the error of the first attempt is returned.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use upnp_model::{
    ActionDescriptor, ActionInvocation, ArgumentValue, IncomingEventRequest, OutgoingEventRequest,
};
use upnp_xml::repair;

use crate::codec::{ActionCodec, EventCodec};
use crate::config::{CodecConfig, PartialEventPolicy};
use crate::error::{CodecError, Result};

/// Callback observing bodies that could not be decoded even after repair.
///
/// Receives the last repaired body that was tried and the original error.
pub type InvalidBodyHook = Arc<dyn Fn(&str, &CodecError) + Send + Sync>;

/// Which textual repairs are applied to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairPlan {
    pub fix_entities: bool,
    pub fix_last_change: bool,
    pub fix_truncated_envelope: bool,
}

impl RepairPlan {
    /// No repairs; only the strict attempt is made
    pub const fn none() -> Self {
        Self {
            fix_entities: false,
            fix_last_change: false,
            fix_truncated_envelope: false,
        }
    }

    pub const fn soap_request() -> Self {
        Self {
            fix_entities: true,
            ..Self::none()
        }
    }

    pub const fn soap_response() -> Self {
        Self {
            fix_entities: true,
            fix_truncated_envelope: true,
            ..Self::none()
        }
    }

    pub const fn gena() -> Self {
        Self {
            fix_entities: true,
            fix_last_change: true,
            ..Self::none()
        }
    }

    /// Repaired candidates to try after the strict attempt, in order
    pub fn candidates(&self, body: &str) -> Vec<(&'static str, String)> {
        let body = body.trim();
        let mut candidates = Vec::new();

        let mut pass_a = body.to_string();
        if self.fix_entities {
            pass_a = repair::fix_xml_entities(&pass_a).into_owned();
        }
        if self.fix_last_change {
            pass_a = repair::fix_last_change(&pass_a).into_owned();
        }

        if self.fix_truncated_envelope {
            let pass_b = repair::fix_truncated_envelope(&pass_a).into_owned();
            if pass_a != body {
                candidates.push(("entity repair", pass_a));
            }
            if pass_b != body && candidates.last().map(|(_, c)| c != &pass_b).unwrap_or(true) {
                candidates.push(("envelope repair", pass_b));
            }
        } else if pass_a != body {
            candidates.push(("entity repair", pass_a));
        }

        candidates
    }
}

/// Decorator adding the repair ladder to a codec
#[derive(Clone)]
pub struct Recovering<C> {
    inner: C,
    config: CodecConfig,
    request_plan: RepairPlan,
    response_plan: RepairPlan,
    event_plan: RepairPlan,
    on_invalid_body: Option<InvalidBodyHook>,
}

impl<C> Recovering<C> {
    pub fn new(inner: C, config: CodecConfig) -> Self {
        Self {
            inner,
            config,
            request_plan: RepairPlan::soap_request(),
            response_plan: RepairPlan::soap_response(),
            event_plan: RepairPlan::gena(),
            on_invalid_body: None,
        }
    }

    pub fn with_request_plan(mut self, plan: RepairPlan) -> Self {
        self.request_plan = plan;
        self
    }

    pub fn with_response_plan(mut self, plan: RepairPlan) -> Self {
        self.response_plan = plan;
        self
    }

    pub fn with_event_plan(mut self, plan: RepairPlan) -> Self {
        self.event_plan = plan;
        self
    }

    pub fn with_invalid_body_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &CodecError) + Send + Sync + 'static,
    {
        self.on_invalid_body = Some(Arc::new(hook));
        self
    }

    pub(crate) fn set_invalid_body_hook(&mut self, hook: Option<InvalidBodyHook>) {
        self.on_invalid_body = hook;
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Run `decode` on the body, then on each repaired candidate.
    ///
    /// `decode` receives the text to decode and whether the accumulator must
    /// be reset first.
    fn recover<T, F>(&self, kind: &str, body: &str, plan: RepairPlan, mut decode: F) -> Result<T>
    where
        F: FnMut(&str, bool) -> Result<T>,
    {
        let original = match decode(body, false) {
            Ok(decoded) => return Ok(decoded),
            Err(err) if err.is_unsupported_data() && self.config.recover_malformed_bodies => err,
            Err(err) => return Err(err),
        };

        warn!("Bad {} XML found: {}", kind, original);
        debug!("Bad {} body: {}", kind, self.config.loggable(body.trim()));

        let mut last_body: Option<String> = None;
        for (pass, candidate) in plan.candidates(body) {
            match decode(&candidate, true) {
                Ok(decoded) => {
                    info!("Successfully fixed bad {} XML ({})", kind, pass);
                    return Ok(decoded);
                }
                Err(err) if err.is_unsupported_data() => {
                    debug!("{} of {} body failed: {}", pass, kind, err);
                    last_body = Some(candidate);
                }
                Err(err) => return Err(err),
            }
        }

        error!("Could not repair {} XML: {}", kind, original);
        if let Some(hook) = &self.on_invalid_body {
            hook(last_body.as_deref().unwrap_or(body), &original);
        }
        Err(original)
    }
}

impl<C: fmt::Debug> fmt::Debug for Recovering<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recovering")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .field("request_plan", &self.request_plan)
            .field("response_plan", &self.response_plan)
            .field("event_plan", &self.event_plan)
            .field("on_invalid_body", &self.on_invalid_body.is_some())
            .finish()
    }
}

impl<C: ActionCodec> ActionCodec for Recovering<C> {
    fn encode_request(&self, invocation: &ActionInvocation) -> Result<String> {
        self.inner.encode_request(invocation)
    }

    fn encode_response(&self, invocation: &ActionInvocation) -> Result<String> {
        self.inner.encode_response(invocation)
    }

    fn decode_request(&self, body: &str, action: &ActionDescriptor) -> Result<Vec<ArgumentValue>> {
        self.recover("SOAP request", body, self.request_plan, |text, _| {
            self.inner.decode_request(text, action)
        })
    }

    fn decode_response(&self, body: &str, invocation: &mut ActionInvocation) -> Result<()> {
        self.recover("SOAP response", body, self.response_plan, |text, reset| {
            if reset {
                invocation.reset_outcome();
            }
            self.inner.decode_response(text, invocation)
        })
    }
}

impl<C: EventCodec> EventCodec for Recovering<C> {
    fn encode(&self, request: &OutgoingEventRequest) -> Result<String> {
        self.inner.encode(request)
    }

    fn decode(&self, body: &str, request: &mut IncomingEventRequest) -> Result<()> {
        let result = self.recover("GENA event", body, self.event_plan, |text, reset| {
            if reset {
                request.clear_values();
            }
            self.inner.decode(text, request)
        });

        match result {
            Err(err)
                if err.is_unsupported_data()
                    && self.config.partial_events == PartialEventPolicy::Lenient
                    && !request.values().is_empty() =>
            {
                warn!(
                    "Partial read of GENA event properties ({} values, probably truncated XML): {}",
                    request.values().len(),
                    err
                );
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_skip_unchanged_passes() {
        let clean = "<a>x &amp; y</a>";
        assert!(RepairPlan::gena().candidates(clean).is_empty());
        assert!(RepairPlan::soap_response().candidates(clean).is_empty());
        assert!(RepairPlan::none().candidates("<a>&</a>").is_empty());
    }

    #[test]
    fn test_soap_response_candidates() {
        let both = "<s:Envelope><s:Body>a & b</s:Body></s:Envelop";
        let candidates = RepairPlan::soap_response().candidates(both);
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0].1,
            "<s:Envelope><s:Body>a &amp; b</s:Body></s:Envelop"
        );
        assert_eq!(
            candidates[1].1,
            "<s:Envelope><s:Body>a &amp; b</s:Body></s:Envelope>"
        );

        let truncated_only = "<s:Envelope><s:Body/></s:Envelop";
        let candidates = RepairPlan::soap_response().candidates(truncated_only);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].0, "envelope repair");
    }

    #[test]
    fn test_request_plan_does_not_touch_envelope() {
        let truncated = "<s:Envelope><s:Body/></s:Envelop";
        assert!(RepairPlan::soap_request().candidates(truncated).is_empty());
    }
}
