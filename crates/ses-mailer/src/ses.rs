//! AWS SES v2 transport
//!
//! The live side of delivery: [`DeliveryTransport`] is the seam the runtime
//! sends through, and [`SesTransport`] implements it against the SES v2
//! templated SendEmail API. SES failures are surfaced to the caller
//! unmodified in meaning; nothing here retries or suppresses.

use async_trait::async_trait;
use aws_sdk_sesv2::{
    types::{
        Destination as SesDestination, EmailContent,
        ListManagementOptions as SesListManagementOptions, Template,
    },
    Client as SesClient,
};
use chrono::Utc;
use tracing::{error, info, instrument};

use crate::types::{MessagePayload, ProviderResponse};
use crate::MailerError;

/// Boundary with the email provider. Implement this to back deliveries with
/// something other than SES (or with a test double).
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn send_templated_email(
        &self,
        payload: &MessagePayload,
    ) -> Result<ProviderResponse, MailerError>;
}

/// SES-backed transport.
pub struct SesTransport {
    client: SesClient,
}

impl SesTransport {
    /// Create a transport from ambient AWS configuration.
    pub async fn new() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: SesClient::new(&config),
        }
    }

    /// Create with an explicit client (for testing or custom endpoints).
    pub fn with_client(client: SesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeliveryTransport for SesTransport {
    #[instrument(
        skip(self, payload),
        fields(template = %payload.content.template.template_name)
    )]
    async fn send_templated_email(
        &self,
        payload: &MessagePayload,
    ) -> Result<ProviderResponse, MailerError> {
        let template = Template::builder()
            .template_name(&payload.content.template.template_name)
            .template_data(&payload.content.template.template_data)
            .build();

        let content = EmailContent::builder().template(template).build();

        let mut destination = SesDestination::builder();
        for to in &payload.destination.to_addresses {
            destination = destination.to_addresses(to);
        }

        let mut request = self
            .client
            .send_email()
            .from_email_address(&payload.from_email_address)
            .destination(destination.build())
            .content(content);

        for reply_to in &payload.reply_to_addresses {
            request = request.reply_to_addresses(reply_to);
        }

        if let Some(ref config_set) = payload.configuration_set_name {
            request = request.configuration_set_name(config_set);
        }

        if let Some(ref list) = payload.list_management_options {
            let mut options =
                SesListManagementOptions::builder().contact_list_name(&list.contact_list_name);
            if let Some(ref topic) = list.topic_name {
                options = options.topic_name(topic);
            }
            request = request.list_management_options(
                options
                    .build()
                    .map_err(|e| MailerError::BuildError(e.to_string()))?,
            );
        }

        let result = request.send().await.map_err(|e| {
            error!(error = %e, "SES send failed");
            MailerError::SendFailed(e.to_string())
        })?;

        let message_id = result.message_id().unwrap_or("unknown").to_string();
        info!(message_id = %message_id, "Email sent successfully");

        Ok(ProviderResponse {
            message_id,
            queued_at: Utc::now(),
        })
    }
}
