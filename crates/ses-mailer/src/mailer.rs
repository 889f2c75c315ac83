//! Mailer declaration and delivery orchestration
//!
//! A [`Mailer`] is a named, pre-configured template endpoint. `mail()` merges
//! its defaults with per-call overrides, resolves merge variables, assembles
//! the SES payload, and hands back a pending [`Message`]; `deliver()` gates
//! the message through the runtime's interceptor chain and then captures or
//! transmits it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::merge::resolve_merge_vars;
use crate::runtime::{DeliveryMode, MailerRuntime};
use crate::types::{DeliveryOutcome, MessagePayload, SendOptions};
use crate::MailerError;

/// Per-mailer declaration: the SES template it is bound to and the default
/// options merged under every call. Immutable once declared.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    template_name: String,
    defaults: SendOptions,
}

impl MailerConfig {
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            defaults: SendOptions::default(),
        }
    }

    /// Template name following the `<mailer>-<operation>` convention.
    pub fn namespaced(mailer: &str, operation: &str) -> Self {
        Self::new(format!("{mailer}-{operation}"))
    }

    /// Set the default options merged under every `mail()` call.
    pub fn defaults(mut self, defaults: SendOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }
}

/// A named, pre-configured template-sending endpoint.
pub struct Mailer {
    config: Arc<MailerConfig>,
    runtime: Arc<MailerRuntime>,
    fields: BTreeMap<String, Value>,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.config)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl Mailer {
    pub fn new(config: Arc<MailerConfig>, runtime: Arc<MailerRuntime>) -> Self {
        Self {
            config,
            runtime,
            fields: BTreeMap::new(),
        }
    }

    /// Bind a named field, exposed as a fallback merge variable when a call
    /// supplies no explicit merge vars. Fields are declared here, never
    /// harvested from arbitrary state.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn template_name(&self) -> &str {
        self.config.template_name()
    }

    /// Assemble a pending message. Overrides win over declared defaults per
    /// key; the bound template wins over any default template.
    pub fn mail(&self, overrides: SendOptions) -> Message {
        let mut defaults = self.config.defaults.clone();
        defaults.template = Some(self.config.template_name.clone());

        let options = overrides.merged_over(&defaults);
        let template_data = resolve_merge_vars(options.merge_vars.as_ref(), &self.fields);
        let payload = MessagePayload::build(&options, template_data);

        let template = options.template.unwrap_or_default();
        debug!(template = %template, "message assembled");

        Message {
            payload,
            template,
            runtime: self.runtime.clone(),
        }
    }
}

/// An assembled, not-yet-delivered message. The payload is immutable;
/// `deliver()` may be called repeatedly and re-evaluates the interceptor
/// chain each time.
pub struct Message {
    payload: MessagePayload,
    template: String,
    runtime: Arc<MailerRuntime>,
}

impl Message {
    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Gate, then capture or transmit.
    ///
    /// Interceptor evaluation always completes before any capture or
    /// transmission. A veto is a normal `Blocked` outcome with no side
    /// effects; SES failures in live mode propagate as errors.
    pub async fn deliver(&self) -> Result<DeliveryOutcome, MailerError> {
        if !self.runtime.allows(&self.payload) {
            info!(template = %self.template, "delivery blocked by interceptor");
            return Ok(DeliveryOutcome::Blocked);
        }

        match self.runtime.mode() {
            DeliveryMode::Test => {
                let record = self
                    .runtime
                    .capture()
                    .record(self.payload.clone(), &self.template);
                info!(template = %self.template, "delivery captured");
                Ok(DeliveryOutcome::Captured(record))
            }
            DeliveryMode::Live => {
                let transport = self.runtime.transport().ok_or_else(|| {
                    MailerError::Config("live delivery requires a transport".to_string())
                })?;
                let response = transport.send_templated_email(&self.payload).await?;
                Ok(DeliveryOutcome::Sent(response))
            }
        }
    }
}

/// Explicit string-keyed table of declared mailers.
///
/// Dispatching an undeclared name is a contract violation, reported as an
/// error rather than resolved dynamically.
pub struct MailerRegistry {
    runtime: Arc<MailerRuntime>,
    mailers: BTreeMap<String, Arc<MailerConfig>>,
}

impl MailerRegistry {
    pub fn new(runtime: Arc<MailerRuntime>) -> Self {
        Self {
            runtime,
            mailers: BTreeMap::new(),
        }
    }

    /// Registry backed by the process-wide default runtime.
    pub fn with_global_runtime() -> Self {
        Self::new(MailerRuntime::global())
    }

    pub fn declare(&mut self, name: impl Into<String>, config: MailerConfig) -> &mut Self {
        self.mailers.insert(name.into(), Arc::new(config));
        self
    }

    /// Look up a declared mailer by name.
    pub fn mailer(&self, name: &str) -> Result<Mailer, MailerError> {
        let config = self
            .mailers
            .get(name)
            .ok_or_else(|| MailerError::ContractViolation {
                candidate: name.to_string(),
            })?;
        Ok(Mailer::new(config.clone(), self.runtime.clone()))
    }

    pub fn runtime(&self) -> &Arc<MailerRuntime> {
        &self.runtime
    }
}
