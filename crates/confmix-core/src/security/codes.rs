//! ZRTP engine message codes and events
//!
//! The key-agreement engine reports progress and problems as sub-codes from
//! four tables (informational, warning, severe, protocol error). They are
//! modelled as one tagged union, [`SubCode`], so the event manager can
//! dispatch on them with an exhaustive `match`.

use std::fmt;

/// Informational progress codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoCode {
    HelloReceived,
    CommitDhGenerated,
    RespCommitReceived,
    Dh1DhGenerated,
    InitDh1Received,
    RespDh2Received,
    InitConf1Received,
    RespConf2Received,
    RsMatchFound,
    /// Media is now encrypted
    SecureStateOn,
    SecureStateOff,
}

/// Warning codes; most are internal, a few ask the user to verify the SAS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    DhAesMismatch,
    GoClearReceived,
    DhShort,
    /// No retained shared secret matched the peer's
    NoRsMatch,
    /// Internal packet checksum mismatch
    CrcMismatch,
    SrtpAuthError,
    SrtpReplayError,
    /// A retained shared secret was expected but did not match
    NoExpectedRsMatch,
}

/// Severe codes; negotiation is unlikely to succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SevereCode {
    HelloHmacFailed,
    CommitHmacFailed,
    Dh1HmacFailed,
    Dh2HmacFailed,
    /// Sending packets to the peer failed
    CannotSend,
    /// Internal protocol state machine error
    ProtocolError,
    NoTimer,
    /// Too many retransmissions without an answer
    TooMuchRetries,
}

/// Protocol error codes carried in ZRTP Error packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZrtpErrorCode {
    MalformedPacket,
    CriticalSwError,
    UnsupportedVersion,
    HelloComponentsMismatch,
    UnsupportedHashType,
    UnsupportedCipherType,
    UnsupportedPkExchange,
    UnsupportedSrtpAuthTag,
    UnsupportedSasScheme,
    NoSharedSecret,
    DhBadPublicValue,
    DhBadHvi,
    SasUntrustedMitm,
    ConfirmHmacWrong,
    NonceReused,
    EqualZidHello,
    SsrcCollision,
    ServiceUnavailable,
    ProtocolTimeout,
    GoClearNotAllowed,
}

impl ZrtpErrorCode {
    const TABLE: [(ZrtpErrorCode, u32); 20] = [
        (Self::MalformedPacket, 0x10),
        (Self::CriticalSwError, 0x20),
        (Self::UnsupportedVersion, 0x30),
        (Self::HelloComponentsMismatch, 0x40),
        (Self::UnsupportedHashType, 0x51),
        (Self::UnsupportedCipherType, 0x52),
        (Self::UnsupportedPkExchange, 0x53),
        (Self::UnsupportedSrtpAuthTag, 0x54),
        (Self::UnsupportedSasScheme, 0x55),
        (Self::NoSharedSecret, 0x56),
        (Self::DhBadPublicValue, 0x61),
        (Self::DhBadHvi, 0x62),
        (Self::SasUntrustedMitm, 0x63),
        (Self::ConfirmHmacWrong, 0x70),
        (Self::NonceReused, 0x80),
        (Self::EqualZidHello, 0x90),
        (Self::SsrcCollision, 0x91),
        (Self::ServiceUnavailable, 0xA0),
        (Self::ProtocolTimeout, 0xB0),
        (Self::GoClearNotAllowed, 0x100),
    ];

    /// Wire value of the error code
    pub fn code(self) -> u32 {
        Self::TABLE
            .iter()
            .find(|(c, _)| *c == self)
            .map(|(_, v)| *v)
            .unwrap_or_default()
    }

    /// Look up an error code by its wire value
    pub fn from_code(value: u32) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(c, _)| *c)
    }
}

/// Sub-code of an engine message, tagged by its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubCode {
    Info(InfoCode),
    Warning(WarningCode),
    Severe(SevereCode),
    ZrtpError(ZrtpErrorCode),
}

impl fmt::Display for SubCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubCode::Info(code) => write!(f, "Info{:?}", code),
            SubCode::Warning(code) => write!(f, "Warning{:?}", code),
            SubCode::Severe(code) => write!(f, "Severe{:?}", code),
            SubCode::ZrtpError(code) => write!(f, "{:?} (0x{:x})", code, code.code()),
        }
    }
}

impl From<InfoCode> for SubCode {
    fn from(code: InfoCode) -> Self {
        SubCode::Info(code)
    }
}

impl From<WarningCode> for SubCode {
    fn from(code: WarningCode) -> Self {
        SubCode::Warning(code)
    }
}

impl From<SevereCode> for SubCode {
    fn from(code: SevereCode) -> Self {
        SubCode::Severe(code)
    }
}

impl From<ZrtpErrorCode> for SubCode {
    fn from(code: ZrtpErrorCode) -> Self {
        SubCode::ZrtpError(code)
    }
}

/// Event reported by the key-agreement engine for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityEvent {
    /// The negotiated cipher
    CipherAgreed(String),
    /// Short authentication string and whether it was verified before
    SasComputed { sas: String, verified: bool },
    /// Progress, warning, severe or protocol error message
    Message(SubCode),
    /// Media encryption was switched off
    SecureOff,
    /// Key agreement failed for good
    NegotiationFailed(SubCode),
    /// The peer does not speak ZRTP
    NotSupportedByPeer,
    /// The peer asks to fall back to clear media
    GoClearRequested,
}

impl SecurityEvent {
    /// The "media is now encrypted" message
    pub fn secure_on() -> Self {
        SecurityEvent::Message(SubCode::Info(InfoCode::SecureStateOn))
    }

    /// A warning message
    pub fn warning(code: WarningCode) -> Self {
        SecurityEvent::Message(SubCode::Warning(code))
    }

    /// A severe message
    pub fn severe(code: SevereCode) -> Self {
        SecurityEvent::Message(SubCode::Severe(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_lookup() {
        assert_eq!(ZrtpErrorCode::NoSharedSecret.code(), 0x56);
        assert_eq!(
            ZrtpErrorCode::from_code(0x100),
            Some(ZrtpErrorCode::GoClearNotAllowed)
        );
        assert_eq!(ZrtpErrorCode::from_code(0x57), None);
    }

    #[test]
    fn test_every_error_code_round_trips() {
        for (code, value) in ZrtpErrorCode::TABLE {
            assert_eq!(code.code(), value);
            assert_eq!(ZrtpErrorCode::from_code(value), Some(code));
        }
    }

    #[test]
    fn test_subcode_display() {
        assert_eq!(
            SubCode::from(SevereCode::CannotSend).to_string(),
            "SevereCannotSend"
        );
        assert_eq!(
            SubCode::from(WarningCode::CrcMismatch).to_string(),
            "WarningCrcMismatch"
        );
        assert_eq!(
            SubCode::from(ZrtpErrorCode::MalformedPacket).to_string(),
            "MalformedPacket (0x10)"
        );
    }

    #[test]
    fn test_secure_on_event() {
        assert_eq!(
            SecurityEvent::secure_on(),
            SecurityEvent::Message(SubCode::Info(InfoCode::SecureStateOn))
        );
    }
}
