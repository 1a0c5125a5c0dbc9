use std::fmt::Debug;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Code;
use lettre::{Address, Message, SmtpTransport, Transport};

/// SMTP reply code for a message accepted for delivery.
pub const SMTP_SUCCESS_CODE: u16 = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub from: Sender,
    pub to: String,
    pub attachment: Option<EmailAttachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status_code: u16,
}

impl DeliveryReceipt {
    pub fn is_success(&self) -> bool {
        self.status_code == SMTP_SUCCESS_CODE
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },
    #[error("failed to compose message: {0}")]
    Compose(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Outbound mail channel used by the report dispatcher.
pub trait EmailTransport: Debug + Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, MailError>;
}

/// Authenticated SMTP relay over implicit TLS.
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, MailError> {
        let transport = SmtpTransport::relay(host)
            .map_err(|err| MailError::Transport(err.to_string()))?
            .port(port)
            .credentials(Credentials::new(username.into(), password.into()))
            .build();
        Ok(Self { transport })
    }
}

impl Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

impl EmailTransport for SmtpMailer {
    /// Any coded server reply, including a 4xx/5xx refusal, is a receipt.
    /// Only failures without a reply (connect, TLS, I/O) are errors.
    fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, MailError> {
        let message = compose(email)?;
        match self.transport.send(&message) {
            Ok(response) => receipt(response.code()),
            Err(err) => match err.status() {
                Some(code) => receipt(code),
                None => Err(MailError::Transport(err.to_string())),
            },
        }
    }
}

fn receipt(code: Code) -> Result<DeliveryReceipt, MailError> {
    let status_code = code
        .to_string()
        .parse::<u16>()
        .map_err(|err| MailError::Transport(format!("unreadable SMTP reply code: {err}")))?;
    Ok(DeliveryReceipt { status_code })
}

fn parse_address(address: &str) -> Result<Address, MailError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|err| MailError::Address {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

pub(crate) fn compose(email: &OutgoingEmail) -> Result<Message, MailError> {
    let from = Mailbox::new(
        Some(email.from.name.clone()),
        parse_address(&email.from.address)?,
    );
    let to = Mailbox::new(None, parse_address(&email.to)?);

    let alternative =
        MultiPart::alternative_plain_html(email.text_body.clone(), email.html_body.clone());

    let body = match &email.attachment {
        Some(attachment) => {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|err| MailError::Compose(err.to_string()))?;
            MultiPart::mixed().multipart(alternative).singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.bytes.clone(), content_type),
            )
        }
        None => alternative,
    };

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone())
        .multipart(body)
        .map_err(|err| MailError::Compose(err.to_string()))
}
