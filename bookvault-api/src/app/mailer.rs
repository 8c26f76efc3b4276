//! 激活与重置邮件发送：异步 SMTP，发送失败只记录日志，不影响请求

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info, warn};

/// 邮件配置
#[derive(Debug, Clone)]
pub struct MailSettings {
    /// SMTP 主机；未配置时邮件只写入日志
    pub smtp_host: Option<String>,
    pub smtp_username: String,
    pub smtp_password: String,
    /// 发件人地址，形如 "Bookvault <no-reply@example.com>"
    pub from: String,
    /// 对外可访问的服务地址（拼接确认链接用）
    pub public_url: String,
}

/// 邮件发送器
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    public_url: String,
}

impl Mailer {
    pub fn new(settings: &MailSettings) -> anyhow::Result<Self> {
        let from: Mailbox = settings.from.parse()?;

        let transport = match &settings.smtp_host {
            Some(host) => {
                let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                    .credentials(Credentials::new(
                        settings.smtp_username.clone(),
                        settings.smtp_password.clone(),
                    ))
                    .build();
                Some(transport)
            }
            None => {
                info!("smtp not configured; outgoing mail will only be logged");
                None
            }
        };

        Ok(Self {
            transport,
            from,
            public_url: settings.public_url.trim_end_matches('/').to_string(),
        })
    }

    /// 发送激活邮件（包含确认链接）
    pub fn send_activation(&self, to: &str, login: &str, token: &str) {
        let link = format!("{}/registerconfirm?token={}", self.public_url, token);
        let subject = "Activate your Bookvault account";
        let plain = format!(
            "Hi {login},\n\nconfirm your registration by opening:\n{link}\n\n\
             The link is only valid for a limited time.\n"
        );
        let html = format!(
            "<p>Hi {login},</p>\
             <p>confirm your registration by clicking <a href=\"{link}\">this link</a>.</p>\
             <p>The link is only valid for a limited time.</p>"
        );
        self.deliver(to, subject, plain, html);
    }

    /// 发送密码重置邮件（包含重置 token）
    pub fn send_password_reset(&self, to: &str, login: &str, token: &str) {
        let subject = "Reset your Bookvault password";
        let plain = format!(
            "Hi {login},\n\na password reset was requested for your account.\n\
             Send your new password to /resetconfirm with this bearer token:\n\n{token}\n\n\
             If you did not request a reset, you can ignore this mail.\n"
        );
        let html = format!(
            "<p>Hi {login},</p>\
             <p>a password reset was requested for your account. Send your new password \
             to <code>/resetconfirm</code> with this bearer token:</p>\
             <pre>{token}</pre>\
             <p>If you did not request a reset, you can ignore this mail.</p>"
        );
        self.deliver(to, subject, plain, html);
    }

    /// 构建并投递邮件。投递在后台任务中执行，任何失败只记录日志。
    fn deliver(&self, to: &str, subject: &str, plain: String, html: String) {
        let recipient: Mailbox = match to.parse() {
            Ok(m) => m,
            Err(e) => {
                warn!(to = %to, error = %e, "skipping mail: invalid recipient address");
                return;
            }
        };

        let transport = match &self.transport {
            Some(t) => t.clone(),
            None => {
                // 无 SMTP 配置：把正文写进日志，方便本地调试
                info!(to = %to, subject = %subject, body = %plain, "mail logged (smtp disabled)");
                return;
            }
        };

        let message = match Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(plain, html))
        {
            Ok(m) => m,
            Err(e) => {
                error!(to = %to, error = %e, "failed to build mail message");
                return;
            }
        };

        let to = to.to_string();
        let subject = subject.to_string();
        tokio::spawn(async move {
            match transport.send(message).await {
                Ok(response) if !response.is_positive() => {
                    error!(to = %to, subject = %subject, "smtp rejected mail");
                }
                Ok(_) => {
                    debug!(to = %to, subject = %subject, "mail sent");
                }
                Err(e) => {
                    error!(to = %to, subject = %subject, error = %e, "failed to send mail");
                }
            }
        });
    }
}
