//! User-facing security message texts
//!
//! Templates may contain `{0}`, replaced by the engine sub-code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSeverity {
    Warning,
    Severe,
    /// Protocol error reported by the peer or the engine
    Zrtp,
}

impl fmt::Display for MessageSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSeverity::Warning => write!(f, "warning"),
            MessageSeverity::Severe => write!(f, "severe"),
            MessageSeverity::Zrtp => write!(f, "zrtp"),
        }
    }
}

fn default_warning_label() -> String {
    "Warning".to_string()
}

fn default_severe_label() -> String {
    "Severe".to_string()
}

fn default_zrtp_label() -> String {
    "ZRTP".to_string()
}

fn default_no_rs_match() -> String {
    "No retained shared secret matched. Please verify the short authentication string with your peer."
        .to_string()
}

fn default_no_expected_rs_match() -> String {
    "The shared secret retained from an earlier call did not match. \
     Verify the short authentication string: this may indicate an attack."
        .to_string()
}

fn default_checksum_mismatch() -> String {
    "Internal ZRTP packet checksum mismatch.".to_string()
}

fn default_data_send_failed() -> String {
    "Failed to send security negotiation data. Internal error: {0}".to_string()
}

fn default_retry_rate_exceeded() -> String {
    "Too many retries during security negotiation. Internal error: {0}".to_string()
}

fn default_internal_protocol_error() -> String {
    "Internal security protocol error. Internal error: {0}".to_string()
}

fn default_generic() -> String {
    "ZRTP security negotiation problem: {0}".to_string()
}

/// Text table for security messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityMessages {
    #[serde(default = "default_warning_label")]
    pub warning_label: String,
    #[serde(default = "default_severe_label")]
    pub severe_label: String,
    #[serde(default = "default_zrtp_label")]
    pub zrtp_label: String,
    #[serde(default = "default_no_rs_match")]
    pub no_rs_match: String,
    #[serde(default = "default_no_expected_rs_match")]
    pub no_expected_rs_match: String,
    #[serde(default = "default_checksum_mismatch")]
    pub checksum_mismatch: String,
    #[serde(default = "default_data_send_failed")]
    pub data_send_failed: String,
    #[serde(default = "default_retry_rate_exceeded")]
    pub retry_rate_exceeded: String,
    #[serde(default = "default_internal_protocol_error")]
    pub internal_protocol_error: String,
    #[serde(default = "default_generic")]
    pub generic: String,
}

impl Default for SecurityMessages {
    fn default() -> Self {
        Self {
            warning_label: default_warning_label(),
            severe_label: default_severe_label(),
            zrtp_label: default_zrtp_label(),
            no_rs_match: default_no_rs_match(),
            no_expected_rs_match: default_no_expected_rs_match(),
            checksum_mismatch: default_checksum_mismatch(),
            data_send_failed: default_data_send_failed(),
            retry_rate_exceeded: default_retry_rate_exceeded(),
            internal_protocol_error: default_internal_protocol_error(),
            generic: default_generic(),
        }
    }
}

/// Substitute `{0}` in `template` with `argument`
pub fn render(template: &str, argument: impl fmt::Display) -> String {
    template.replace("{0}", &argument.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_argument() {
        assert_eq!(render("error: {0}", "SevereCannotSend"), "error: SevereCannotSend");
        assert_eq!(render("no placeholder", 7), "no placeholder");
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let json = r#"{"checksum_mismatch": "Prüfsummenfehler"}"#;
        let messages: SecurityMessages = serde_json::from_str(json).unwrap();
        assert_eq!(messages.checksum_mismatch, "Prüfsummenfehler");
        assert_eq!(messages.warning_label, "Warning");
        assert_eq!(messages.generic, SecurityMessages::default().generic);
    }
}
