mod settings;

pub use settings::{parse_flag, InlineLogo, SenderConfig, Settings, SmtpConfig};
