//! Executor for the `bulk_outreach` tool.
//!
//! Outreach is two-phase: the model first calls with
//! `confirm_template: true` to get a preview the user can approve, then
//! calls again with `confirm_template: false` to send. The ordering is
//! enforced by the system prompt, not by stored state; the send path is
//! at-least-once with no rollback, and partial failures are reported in
//! the outcome data.

use crate::args;
use crate::error::ToolError;
use megaphone_campaign::{Campaign, CampaignService, Mailer, OutboundEmail};
use serde_json::{json, Value as JsonValue};

/// Handles `bulk_outreach`.
///
/// # Errors
///
/// Returns `InvalidArguments` on bad inputs, including a campaign with no
/// linked creators, and `Backend` on service failure.
pub async fn run(
    service: &dyn CampaignService,
    mailer: &dyn Mailer,
    arguments: &JsonValue,
) -> Result<JsonValue, ToolError> {
    let id = args::require_campaign_id(arguments, "campaign_id")?;
    let subject = args::require_str(arguments, "subject")?;
    let template = args::require_str(arguments, "template")?;
    let preview_only = args::require_bool(arguments, "confirm_template")?;

    let campaign = service.get(id).await.map_err(ToolError::backend)?;
    if campaign.creators.is_empty() {
        return Err(ToolError::invalid(
            "campaign has no linked creators to contact",
        ));
    }

    if preview_only {
        return Ok(preview(&campaign, &subject, &template));
    }
    send_all(mailer, &campaign, &subject, &template).await
}

/// Renders the template for one recipient. Only `{{handle}}` is
/// substituted; unknown placeholders pass through untouched.
fn render(template: &str, handle: &str) -> String {
    template.replace("{{handle}}", handle)
}

fn preview(campaign: &Campaign, subject: &str, template: &str) -> JsonValue {
    // First linked creator stands in as the rendered sample.
    let sample = campaign
        .creators
        .first()
        .map(|link| render(template, &link.handle))
        .unwrap_or_default();

    json!({
        "preview": true,
        "campaign_id": campaign.id,
        "recipient_count": campaign.creators.len(),
        "subject": subject,
        "sample_body": sample,
    })
}

async fn send_all(
    mailer: &dyn Mailer,
    campaign: &Campaign,
    subject: &str,
    template: &str,
) -> Result<JsonValue, ToolError> {
    let mut sent = 0usize;
    let mut failures: Vec<String> = Vec::new();

    for link in &campaign.creators {
        let email = OutboundEmail {
            to: link.handle.clone(),
            subject: subject.to_string(),
            body: render(template, &link.handle),
        };
        match mailer.send(&email).await {
            Ok(()) => sent += 1,
            Err(e) => {
                tracing::warn!(handle = %link.handle, error = %e, "outreach send failed");
                failures.push(link.handle.clone());
            }
        }
    }

    tracing::info!(
        campaign_id = %campaign.id,
        sent,
        failed = failures.len(),
        "bulk outreach completed"
    );
    Ok(json!({
        "preview": false,
        "campaign_id": campaign.id,
        "sent": sent,
        "failed": failures,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use megaphone_campaign::{InMemoryCampaignService, MailError, NewCampaign};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
            if self.fail_for.as_deref() == Some(email.to.as_str()) {
                return Err(MailError::SendFailed {
                    reason: "mailbox full".to_string(),
                });
            }
            self.sent.lock().expect("lock").push(email.clone());
            Ok(())
        }
    }

    async fn seeded_with_creators() -> (InMemoryCampaignService, megaphone_core::CampaignId) {
        let service = InMemoryCampaignService::new();
        let campaign = service
            .create(NewCampaign {
                name: "Launch".to_string(),
                brand: "Acme".to_string(),
                description: String::new(),
                budget_cents: 0,
            })
            .await
            .expect("create");
        service
            .add_creators(
                campaign.id,
                vec!["@alice".to_string(), "@bob".to_string()],
            )
            .await
            .expect("link");
        (service, campaign.id)
    }

    #[tokio::test]
    async fn preview_sends_no_email() {
        let (service, id) = seeded_with_creators().await;
        let mailer = RecordingMailer::default();

        let data = run(
            &service,
            &mailer,
            &json!({
                "campaign_id": id.to_string(),
                "subject": "Collab with Acme",
                "template": "Hi {{handle}}, let's talk.",
                "confirm_template": true
            }),
        )
        .await
        .expect("preview");

        assert_eq!(data["preview"], true);
        assert_eq!(data["recipient_count"], 2);
        assert_eq!(data["sample_body"], "Hi @alice, let's talk.");
        assert!(mailer.sent.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn send_delivers_to_every_creator() {
        let (service, id) = seeded_with_creators().await;
        let mailer = RecordingMailer::default();

        let data = run(
            &service,
            &mailer,
            &json!({
                "campaign_id": id.to_string(),
                "subject": "Collab",
                "template": "Hi {{handle}}!",
                "confirm_template": false
            }),
        )
        .await
        .expect("send");

        assert_eq!(data["sent"], 2);
        let sent = mailer.sent.lock().expect("lock");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body, "Hi @alice!");
        assert_eq!(sent[1].body, "Hi @bob!");
    }

    #[tokio::test]
    async fn partial_failure_is_reported_not_fatal() {
        let (service, id) = seeded_with_creators().await;
        let mailer = RecordingMailer {
            fail_for: Some("@alice".to_string()),
            ..RecordingMailer::default()
        };

        let data = run(
            &service,
            &mailer,
            &json!({
                "campaign_id": id.to_string(),
                "subject": "Collab",
                "template": "Hi {{handle}}!",
                "confirm_template": false
            }),
        )
        .await
        .expect("send");

        assert_eq!(data["sent"], 1);
        assert_eq!(data["failed"], json!(["@alice"]));
    }

    #[tokio::test]
    async fn empty_campaign_is_a_validation_failure() {
        let service = InMemoryCampaignService::new();
        let campaign = service
            .create(NewCampaign {
                name: "Empty".to_string(),
                brand: "Acme".to_string(),
                description: String::new(),
                budget_cents: 0,
            })
            .await
            .expect("create");
        let mailer = RecordingMailer::default();

        let err = run(
            &service,
            &mailer,
            &json!({
                "campaign_id": campaign.id.to_string(),
                "subject": "s",
                "template": "t",
                "confirm_template": true
            }),
        )
        .await
        .expect_err("reject");
        assert!(err.to_string().contains("no linked creators"));
    }

    #[tokio::test]
    async fn missing_confirm_flag_is_rejected() {
        let (service, id) = seeded_with_creators().await;
        let mailer = RecordingMailer::default();

        let err = run(
            &service,
            &mailer,
            &json!({
                "campaign_id": id.to_string(),
                "subject": "s",
                "template": "t"
            }),
        )
        .await
        .expect_err("reject");
        assert!(err.to_string().contains("confirm_template"));
        assert!(mailer.sent.lock().expect("lock").is_empty());
    }
}
