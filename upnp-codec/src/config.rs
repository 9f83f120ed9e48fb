//! Configuration of the codec stack
//!
//! Controls whether malformed bodies are repaired and retried, and how
//! much of an event may be lost before decoding counts as a failure.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// What to do with an event body that stays broken after every repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartialEventPolicy {
    /// Accept the values read before the body broke off, if there are any
    #[default]
    Lenient,
    /// Fail the whole event
    Strict,
}

/// Configuration for [`UpnpCodecs`](crate::UpnpCodecs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Repair and retry bodies that fail to parse
    /// Default: true
    pub recover_malformed_bodies: bool,

    /// Handling of events that can only be read in part
    /// Default: Lenient
    pub partial_events: PartialEventPolicy,

    /// Bodies longer than this are cut in log output
    /// Default: 2048 bytes
    pub max_logged_body_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            recover_malformed_bodies: true,
            partial_events: PartialEventPolicy::Lenient,
            max_logged_body_len: 2048,
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept well-formed bodies
    pub fn strict() -> Self {
        Self {
            recover_malformed_bodies: false,
            partial_events: PartialEventPolicy::Strict,
            ..Default::default()
        }
    }

    /// Repair what can be repaired and keep partial events
    pub fn lenient() -> Self {
        Self {
            recover_malformed_bodies: true,
            partial_events: PartialEventPolicy::Lenient,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_logged_body_len == 0 {
            return Err(CodecError::Config(
                "Max logged body length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_recovery(mut self, enabled: bool) -> Self {
        self.recover_malformed_bodies = enabled;
        self
    }

    pub fn with_partial_events(mut self, policy: PartialEventPolicy) -> Self {
        self.partial_events = policy;
        self
    }

    pub fn with_max_logged_body_len(mut self, len: usize) -> Self {
        self.max_logged_body_len = len;
        self
    }

    /// Body text shortened for log output
    pub(crate) fn loggable<'a>(&self, body: &'a str) -> &'a str {
        if body.len() <= self.max_logged_body_len {
            return body;
        }
        let mut end = self.max_logged_body_len;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        &body[..end]
    }
}
