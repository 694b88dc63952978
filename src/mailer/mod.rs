//! Outbound mail: message construction and the transport seam.
//!
//! The campaign pipeline only depends on [`MailTransport`]; [`SmtpMailer`]
//! is the production implementation over lettre's SMTP client.

mod message;
mod transport;

pub use message::{build_message, DeliveryError, OutgoingMail};
pub use transport::{MailTransport, SmtpMailer};
