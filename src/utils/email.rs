use campusly_auth::OtpPurpose;
use campusly_config::EmailConfig;
use campusly_core::AppError;
use chrono::{DateTime, Utc};
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, error, info};

/// Outgoing mail. Every `send_*` method is fire-and-forget: delivery runs on
/// a background task and failures are only logged.
#[derive(Clone, Debug)]
pub struct EmailService {
    config: EmailConfig,
}

/// A rendered email waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn send_otp(&self, to_email: &str, name: &str, purpose: OtpPurpose, code: &str, ttl_seconds: i64) {
        self.dispatch(otp_email(to_email, name, purpose, code, ttl_seconds));
    }

    pub fn send_invite(&self, to_email: &str, role: &str, token: &str, expires_at: DateTime<Utc>) {
        let link = self.registration_url(token);
        self.dispatch(invite_email(to_email, role, &link, expires_at));
    }

    pub fn send_password_changed(&self, to_email: &str, name: &str) {
        let text = format!(
            "Hi {},\n\nYour Campusly password was just changed. If this wasn't you, contact the school office immediately.",
            name
        );
        let html = layout(
            "Password Changed",
            &format!(
                "<p>Hi <strong>{}</strong>,</p><p>Your Campusly password was just changed.</p>\
                 <p>If this wasn't you, contact the school office immediately.</p>",
                escape_html(name)
            ),
        );
        self.dispatch(OutgoingEmail {
            to: to_email.to_string(),
            subject: "Your Campusly password was changed".to_string(),
            text_body: text,
            html_body: html,
        });
    }

    /// Notifies a guardian about a change to an admission application.
    pub fn send_admission_update(
        &self,
        to_email: &str,
        guardian_name: &str,
        applicant_name: &str,
        headline: &str,
        detail: &str,
    ) {
        self.dispatch(admission_email(
            to_email,
            guardian_name,
            applicant_name,
            headline,
            detail,
        ));
    }

    pub fn registration_url(&self, token: &str) -> String {
        format!(
            "{}/register/invite?token={}",
            self.config.frontend_url.trim_end_matches('/'),
            token
        )
    }

    fn dispatch(&self, email: OutgoingEmail) {
        if !self.config.enabled {
            debug!(to = %email.to, subject = %email.subject, "SMTP disabled, email not sent");
            return;
        }

        let service = self.clone();
        tokio::spawn(async move {
            match service.send_email(&email).await {
                Ok(()) => info!(to = %email.to, subject = %email.subject, "Email sent"),
                Err(e) => error!(to = %email.to, error = %e.message(), "Failed to send email"),
            }
        });
    }

    async fn send_email(&self, outgoing: &OutgoingEmail) -> Result<(), AppError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(outgoing
                .to
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(outgoing.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(outgoing.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(outgoing.html_body.clone()),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

fn otp_email(to: &str, name: &str, purpose: OtpPurpose, code: &str, ttl_seconds: i64) -> OutgoingEmail {
    let minutes = (ttl_seconds / 60).max(1);
    let (subject, intro) = match purpose {
        OtpPurpose::EmailVerification => (
            "Verify your Campusly account",
            "Use this code to verify your email address:",
        ),
        OtpPurpose::PasswordReset => (
            "Your Campusly password reset code",
            "Use this code to reset your password:",
        ),
    };

    let text_body = format!(
        "Hi {},\n\n{}\n\n{}\n\nThe code expires in {} minute(s). If you didn't request it, ignore this email.",
        name, intro, code, minutes
    );
    let html_body = layout(
        subject,
        &format!(
            "<p>Hi <strong>{}</strong>,</p><p>{}</p>\
             <p style=\"font-size: 32px; letter-spacing: 8px; font-weight: bold; color: #4F46E5; text-align: center;\">{}</p>\
             <p><strong>The code expires in {} minute(s).</strong></p>\
             <p>If you didn't request it, ignore this email.</p>",
            escape_html(name),
            intro,
            code,
            minutes
        ),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: subject.to_string(),
        text_body,
        html_body,
    }
}

fn invite_email(to: &str, role: &str, link: &str, expires_at: DateTime<Utc>) -> OutgoingEmail {
    let expires = expires_at.format("%Y-%m-%d %H:%M UTC");
    let text_body = format!(
        "You have been invited to join Campusly as a {}.\n\nRegister here: {}\n\nThis invite expires on {}.",
        role, link, expires
    );
    let html_body = layout(
        "You're invited",
        &format!(
            "<p>You have been invited to join Campusly as a <strong>{}</strong>.</p>\
             <p><a href=\"{}\" style=\"display: inline-block; padding: 14px 40px; background-color: #4F46E5; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold;\">Accept Invite</a></p>\
             <p style=\"word-break: break-all; color: #4F46E5;\">{}</p>\
             <p>This invite expires on {}.</p>",
            escape_html(role),
            link,
            link,
            expires
        ),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: "Your invitation to Campusly".to_string(),
        text_body,
        html_body,
    }
}

fn admission_email(
    to: &str,
    guardian_name: &str,
    applicant_name: &str,
    headline: &str,
    detail: &str,
) -> OutgoingEmail {
    let text_body = format!(
        "Dear {},\n\nAdmission application for {}: {}\n\n{}",
        guardian_name, applicant_name, headline, detail
    );
    let html_body = layout(
        headline,
        &format!(
            "<p>Dear <strong>{}</strong>,</p>\
             <p>Admission application for <strong>{}</strong>: {}</p><p>{}</p>",
            escape_html(guardian_name),
            escape_html(applicant_name),
            escape_html(headline),
            escape_html(detail)
        ),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: format!("Admission update: {}", headline),
        text_body,
        html_body,
    }
}

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden;">
                    <tr>
                        <td style="background-color: #4F46E5; padding: 30px; text-align: center;">
                            <h1 style="margin: 0; color: #ffffff; font-size: 28px;">Campusly</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 40px 30px; color: #666666; font-size: 16px; line-height: 1.5;">
                            <h2 style="margin: 0 0 20px 0; color: #333333; font-size: 24px;">{title}</h2>
                            {content}
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color: #f8f9fa; padding: 20px 30px; text-align: center; border-top: 1px solid #e9ecef;">
                            <p style="margin: 0; color: #999999; font-size: 12px;">
                                This is an automated email from Campusly. Please do not reply.
                            </p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#,
        title = escape_html(title),
        content = content
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@campusly.app".to_string(),
            from_name: "Campusly".to_string(),
            frontend_url: "https://app.campusly.test/".to_string(),
        }
    }

    #[test]
    fn test_registration_url_trims_trailing_slash() {
        let service = EmailService::new(config());
        assert_eq!(
            service.registration_url("abc"),
            "https://app.campusly.test/register/invite?token=abc"
        );
    }

    #[test]
    fn test_otp_email_contains_code_and_lifetime() {
        let email = otp_email("a@b.test", "Ada", OtpPurpose::PasswordReset, "123456", 600);
        assert_eq!(email.subject, "Your Campusly password reset code");
        assert!(email.text_body.contains("123456"));
        assert!(email.text_body.contains("10 minute(s)"));
        assert!(email.html_body.contains("123456"));
    }

    #[test]
    fn test_admission_email_escapes_names() {
        let email = admission_email("g@b.test", "<script>", "Tom", "Accepted", "Welcome");
        assert!(email.html_body.contains("&lt;script&gt;"));
        assert!(!email.html_body.contains("<script>"));
    }

    #[test]
    fn test_disabled_service_does_not_spawn() {
        // No runtime is running here, so spawning would panic.
        let service = EmailService::new(config());
        service.send_password_changed("a@b.test", "Ada");
    }
}
