//! Template-based transactional mailer over AWS SES v2
//!
//! Callers declare named mailers, each bound to an SES template, and invoke
//! delivery with recipient and merge-variable data. The crate assembles the
//! SES-ready payload, runs it through a chain of delivery interceptors, and
//! either sends it live or, in test mode, records it in an in-memory capture
//! list for verification without a real send.
//!
//! ## Architecture
//!
//! ```text
//! MailerRegistry → Mailer::mail(options)
//!                     ↓ merge defaults, resolve merge vars
//!                  MessagePayload (SES SendEmail shape)
//!                     ↓ Message::deliver()
//!                  InterceptorChain.allows()?
//!                     ├─ no  → DeliveryOutcome::Blocked
//!                     ├─ yes + test mode → DeliveryCapture
//!                     └─ yes + live mode → SesTransport → AWS SES
//! ```
//!
//! All shared state (delivery mode, interceptors, capture list, transport)
//! lives on a [`MailerRuntime`] context. A process-wide default runtime exists
//! for convenience; tests build isolated instances instead of mutating it.

pub mod interceptor;
pub mod mailer;
pub mod merge;
pub mod runtime;
pub mod ses;
pub mod types;

pub use interceptor::{Interceptor, InterceptorChain};
pub use mailer::{Mailer, MailerConfig, MailerRegistry, Message};
pub use merge::{normalize, resolve_merge_vars};
pub use runtime::{DeliveryCapture, DeliveryMode, MailerRuntime};
pub use ses::{DeliveryTransport, SesTransport};
pub use types::{
    ensure_sequence, Content, DeliveryOutcome, DeliveryRecord, Destination, ListManagementOptions,
    MessagePayload, ProviderResponse, SendOptions, TemplateContent,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mailer operation errors
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// A name was dispatched against the registry without a matching
    /// declaration.
    #[error("{candidate} is not a declared mailer")]
    ContractViolation { candidate: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to build email: {0}")]
    BuildError(String),

    #[error("SES send failed: {0}")]
    SendFailed(String),
}
