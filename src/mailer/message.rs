//! Message types and MIME construction

use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;
use thiserror::Error;

use crate::config::InlineLogo;

/// Per-message failure. Never fatal for a run; recorded against the row.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid {field} address {address:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        reason: String,
    },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),

    #[error("Delivery task failed: {0}")]
    Task(String),
}

/// A fully rendered message for one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
    pub is_html: bool,
}

fn parse_mailbox(field: &'static str, address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| DeliveryError::InvalidAddress {
            field,
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Build the MIME message for `mail`.
///
/// Plain text unless `is_html`. HTML with an inline logo becomes
/// `multipart/related` so the body can reference `cid:<cid>`.
pub fn build_message(
    mail: &OutgoingMail,
    inline_logo: Option<&InlineLogo>,
) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder()
        .from(parse_mailbox("from", &mail.from)?)
        .to(parse_mailbox("to", &mail.to)?)
        .subject(mail.subject.as_str());

    if let Some(reply_to) = mail.reply_to.as_deref() {
        builder = builder.reply_to(parse_mailbox("reply-to", reply_to)?);
    }

    let built = match (mail.is_html, inline_logo) {
        (true, Some(logo)) => {
            // The logo is decoration: a failed embed still sends the HTML.
            let (related, _logo_attached) = html_with_inline_logo(&mail.body, logo);
            builder.multipart(related)
        }
        (true, None) => builder.singlepart(SinglePart::html(mail.body.clone())),
        (false, _) => builder.singlepart(SinglePart::plain(mail.body.clone())),
    };

    built.map_err(|e| DeliveryError::Build(e.to_string()))
}

/// Wrap an HTML body with an inline image. Returns whether the image was
/// embedded; on failure the HTML goes out alone.
fn html_with_inline_logo(body: &str, logo: &InlineLogo) -> (MultiPart, bool) {
    let alternative = MultiPart::alternative().singlepart(SinglePart::html(body.to_string()));
    let related = MultiPart::related().multipart(alternative);

    match read_inline_part(logo) {
        Ok(image) => (related.singlepart(image), true),
        Err(reason) => {
            tracing::warn!(path = %logo.path, reason = %reason, "Inline logo skipped");
            (related, false)
        }
    }
}

fn read_inline_part(logo: &InlineLogo) -> Result<SinglePart, String> {
    let bytes = std::fs::read(&logo.path).map_err(|e| e.to_string())?;
    let content_type =
        ContentType::parse(image_mime(Path::new(&logo.path))).map_err(|e| e.to_string())?;
    Ok(Attachment::new_inline(logo.cid.clone()).body(bytes, content_type))
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
