//! ZRTP user callback: engine events to call security state
//!
//! The key-agreement engine reports each session's progress through
//! [`KeyAgreementCallback`]. [`SecurityEventManager`] turns those reports into
//! session state transitions and into the few call-layer updates the user
//! sees:
//! - security on/off with cipher and SAS
//! - advisory warnings (only the three that ask the user to verify the SAS)
//! - severe and protocol error messages
//!
//! When a master session turns secure it asks the call to start the derived
//! multi-stream sessions, which reuse the master's keys and have no SAS of
//! their own.
//!
//! Events are delivered one at a time: the state change of an event and the
//! call-layer updates it produces complete before the next event is applied,
//! so the call sees updates in the same order as the session states change.
//! The session arena itself is unlocked while the call runs, so the call may
//! register, query or end sessions from inside a callback. It must not feed
//! engine events back in from there.

use super::codes::{InfoCode, SecurityEvent, SevereCode, SubCode, WarningCode};
use super::messages::{render, MessageSeverity, SecurityMessages};
use super::session::{
    SecuritySession, SessionArena, SessionError, SessionId, SessionState, SessionType,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Call-layer collaborator receiving security updates
pub trait CallModel: Send + Sync {
    /// Media of `session_type` is encrypted
    fn set_security_on(
        &self,
        session_type: SessionType,
        cipher: Option<&str>,
        sas: Option<&str>,
        verified: bool,
    );

    /// Media of `session_type` is no longer encrypted
    fn set_security_off(&self, session_type: SessionType);

    /// Show a security message to the user
    fn set_security_message(&self, message_type: &str, text: &str, severity: MessageSeverity);

    /// Start the multi-stream sessions deriving from the master; returns how
    /// many were started
    fn start_derived_sessions(&self) -> usize;

    /// Whether the call has already ended
    fn is_call_ended(&self) -> bool;
}

/// Callback surface of the key-agreement engine for one session
pub trait KeyAgreementCallback {
    /// The negotiated cipher
    fn secure_on(&self, cipher: &str);
    /// The short authentication string
    fn show_sas(&self, sas: &str, verified: bool);
    /// Progress, warning, severe or protocol error message
    fn show_message(&self, code: SubCode);
    /// Negotiation failed for good
    fn negotiation_failed(&self, code: SubCode);
    /// Media encryption switched off
    fn secure_off(&self);
    /// The peer does not support ZRTP
    fn not_supported_by_other(&self);
    /// The peer asks to go clear
    fn confirm_go_clear(&self);
}

/// Call-layer update produced while the arena is locked, applied after
#[derive(Debug, Clone, PartialEq, Eq)]
enum Notification {
    StartDerivedSessions,
    SecurityOn {
        session_type: SessionType,
        cipher: Option<String>,
        sas: Option<String>,
        verified: bool,
    },
    SecurityOff(SessionType),
    Message {
        message_type: String,
        text: String,
        severity: MessageSeverity,
    },
}

/// Translates key-agreement events into call security state
pub struct SecurityEventManager {
    call: Arc<dyn CallModel>,
    messages: SecurityMessages,
    sessions: Mutex<SessionArena>,
    /// Held from an event's state change until its updates are delivered
    delivery: Mutex<()>,
}

impl SecurityEventManager {
    /// Create a manager reporting to `call` with the default texts
    pub fn new(call: Arc<dyn CallModel>) -> Self {
        Self::with_messages(call, SecurityMessages::default())
    }

    /// Create a manager reporting to `call` with custom texts
    pub fn with_messages(call: Arc<dyn CallModel>, messages: SecurityMessages) -> Self {
        Self {
            call,
            messages,
            sessions: Mutex::new(SessionArena::new()),
            delivery: Mutex::new(()),
        }
    }

    fn arena(&self) -> MutexGuard<'_, SessionArena> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register the master (full key agreement) session of a call
    pub fn create_master_session(&self, session_type: SessionType) -> SessionId {
        let id = self.arena().create_master(session_type);
        tracing::debug!(session = %id, %session_type, "Master security session created");
        id
    }

    /// Register a multi-stream session deriving from `master`
    pub fn create_derived_session(
        &self,
        master: SessionId,
        session_type: SessionType,
    ) -> Result<SessionId, SessionError> {
        let id = self.arena().create_derived(master, session_type)?;
        tracing::debug!(session = %id, %master, %session_type, "Derived security session created");
        Ok(id)
    }

    /// Media of the session started; key agreement begins
    pub fn start_session(&self, id: SessionId) -> Result<(), SessionError> {
        let mut arena = self.arena();
        let session = arena.get_mut(id).ok_or(SessionError::UnknownSession(id))?;
        if session.state != SessionState::Idle {
            return Err(SessionError::InvalidState {
                id,
                state: session.state,
            });
        }
        session.state = SessionState::Negotiating;
        tracing::info!(session = %id, session_type = %session.session_type(), "Security negotiation started");
        Ok(())
    }

    /// Tear down a session and, for a master, its derived sessions
    pub fn end_session(&self, id: SessionId) -> Result<Vec<SessionId>, SessionError> {
        let ended = self.arena().end(id)?;
        tracing::info!(session = %id, ended = ended.len(), "Security session ended");
        Ok(ended)
    }

    /// Tear down every session of the call
    pub fn end_call(&self) -> Vec<SessionId> {
        let ended = self.arena().end_all();
        tracing::info!(ended = ended.len(), "Call security torn down");
        ended
    }

    /// Copy of a session's current state
    pub fn session(&self, id: SessionId) -> Option<SecuritySession> {
        self.arena().get(id).cloned()
    }

    /// Derived sessions of a master
    pub fn derived_sessions(&self, master: SessionId) -> Vec<SessionId> {
        self.arena().derived_of(master)
    }

    /// Engine callback handle bound to one session
    pub fn callback(self: &Arc<Self>, session: SessionId) -> SessionCallback {
        SessionCallback {
            manager: Arc::clone(self),
            session,
        }
    }

    /// Apply one engine event to a session
    ///
    /// Never fails: events for unknown or ended sessions are logged and
    /// dropped, and every negotiation problem becomes a call-layer message.
    pub fn handle_event(&self, id: SessionId, event: SecurityEvent) {
        let _delivery = self
            .delivery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let call_ended = matches!(event, SecurityEvent::SecureOff) && self.call.is_call_ended();

        let notifications = {
            let mut arena = self.arena();
            let Some(session) = arena.get_mut(id) else {
                tracing::warn!(session = %id, ?event, "Event for unknown security session");
                return;
            };
            if session.is_ended() {
                tracing::debug!(session = %id, ?event, "Event for ended security session ignored");
                return;
            }
            if session.state == SessionState::Idle {
                session.state = SessionState::Negotiating;
            }
            self.apply(session, event, call_ended)
        };

        for notification in notifications {
            self.notify(notification);
        }
    }

    fn apply(
        &self,
        session: &mut SecuritySession,
        event: SecurityEvent,
        call_ended: bool,
    ) -> Vec<Notification> {
        let session_type = session.session_type();

        match event {
            SecurityEvent::CipherAgreed(cipher) => {
                tracing::info!(%session_type, %cipher, "Cipher enabled");
                session.cipher = Some(cipher);
                Vec::new()
            }
            SecurityEvent::SasComputed { sas, verified } => {
                tracing::info!(%session_type, %sas, verified, "SAS computed");
                session.sas = Some(sas);
                session.sas_verified = verified;
                Vec::new()
            }
            SecurityEvent::Message(code) => {
                let notifications = self.on_message(session, code);
                tracing::info!(
                    %session_type,
                    sub_code = %code,
                    master = session.is_master(),
                    shown = notifications
                        .iter()
                        .any(|n| matches!(n, Notification::Message { .. })),
                    "ZRTP message"
                );
                notifications
            }
            SecurityEvent::SecureOff => {
                tracing::info!(%session_type, "Security off");
                if call_ended {
                    session.state = SessionState::Ended;
                    return Vec::new();
                }
                if session.state != SessionState::Failed {
                    session.state = SessionState::SecureOff;
                }
                vec![Notification::SecurityOff(session_type)]
            }
            SecurityEvent::NegotiationFailed(code) => {
                tracing::info!(%session_type, sub_code = %code, "ZRTP key negotiation failed");
                if session.state == SessionState::SecureOn {
                    tracing::warn!(%session_type, "Negotiation failure reported for a secure session");
                } else {
                    session.state = SessionState::Failed;
                    session.failure = Some(code);
                }
                Vec::new()
            }
            SecurityEvent::NotSupportedByPeer => {
                tracing::info!(
                    %session_type,
                    "Other party does not support ZRTP key negotiation, no secure calls possible"
                );
                Vec::new()
            }
            SecurityEvent::GoClearRequested => {
                tracing::info!(%session_type, "GoClear confirmation requested");
                Vec::new()
            }
        }
    }

    fn on_message(&self, session: &mut SecuritySession, code: SubCode) -> Vec<Notification> {
        match code {
            SubCode::Info(InfoCode::SecureStateOn) => self.on_secure_on(session),
            SubCode::Info(_) => Vec::new(),
            SubCode::Warning(warning) => {
                let text = match warning {
                    WarningCode::NoRsMatch => &self.messages.no_rs_match,
                    WarningCode::NoExpectedRsMatch => &self.messages.no_expected_rs_match,
                    WarningCode::CrcMismatch => &self.messages.checksum_mismatch,
                    WarningCode::DhAesMismatch
                    | WarningCode::GoClearReceived
                    | WarningCode::DhShort
                    | WarningCode::SrtpAuthError
                    | WarningCode::SrtpReplayError => return Vec::new(),
                };
                vec![Notification::Message {
                    message_type: self.messages.warning_label.clone(),
                    text: text.clone(),
                    severity: MessageSeverity::Warning,
                }]
            }
            SubCode::Severe(severe) => {
                let template = match severe {
                    SevereCode::CannotSend => &self.messages.data_send_failed,
                    SevereCode::TooMuchRetries => &self.messages.retry_rate_exceeded,
                    SevereCode::ProtocolError => &self.messages.internal_protocol_error,
                    SevereCode::HelloHmacFailed
                    | SevereCode::CommitHmacFailed
                    | SevereCode::Dh1HmacFailed
                    | SevereCode::Dh2HmacFailed
                    | SevereCode::NoTimer => &self.messages.generic,
                };
                vec![Notification::Message {
                    message_type: self.messages.severe_label.clone(),
                    text: render(template, code),
                    severity: MessageSeverity::Severe,
                }]
            }
            SubCode::ZrtpError(_) => vec![Notification::Message {
                message_type: self.messages.zrtp_label.clone(),
                text: render(&self.messages.generic, code),
                severity: MessageSeverity::Zrtp,
            }],
        }
    }

    /// Media of the session is encrypted
    ///
    /// A master asks the call to start its derived sessions before reporting
    /// security on, and only on its first secure-on: later ones (after a
    /// secure-off) reuse the derived sessions already running.
    fn on_secure_on(&self, session: &mut SecuritySession) -> Vec<Notification> {
        if session.state == SessionState::Failed {
            tracing::warn!(session = %session.id(), "Secure-on after failed negotiation ignored");
            return Vec::new();
        }
        session.state = SessionState::SecureOn;

        if !session.is_master() {
            return vec![Notification::SecurityOn {
                session_type: session.session_type(),
                cipher: session.cipher.clone(),
                sas: None,
                verified: false,
            }];
        }

        let mut notifications = Vec::with_capacity(2);
        if !session.derived_started {
            session.derived_started = true;
            notifications.push(Notification::StartDerivedSessions);
        }
        notifications.push(Notification::SecurityOn {
            session_type: session.session_type(),
            cipher: session.cipher.clone(),
            sas: session.sas.clone(),
            verified: session.sas_verified,
        });
        notifications
    }

    fn notify(&self, notification: Notification) {
        match notification {
            Notification::StartDerivedSessions => {
                let started = self.call.start_derived_sessions();
                tracing::info!(started, "Multi-stream sessions started");
            }
            Notification::SecurityOn {
                session_type,
                cipher,
                sas,
                verified,
            } => self.call.set_security_on(
                session_type,
                cipher.as_deref(),
                sas.as_deref(),
                verified,
            ),
            Notification::SecurityOff(session_type) => self.call.set_security_off(session_type),
            Notification::Message {
                message_type,
                text,
                severity,
            } => self
                .call
                .set_security_message(&message_type, &text, severity),
        }
    }
}

impl std::fmt::Debug for SecurityEventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityEventManager")
            .field("sessions", &self.arena().len())
            .finish()
    }
}

/// Engine callback handle for one session
#[derive(Debug, Clone)]
pub struct SessionCallback {
    manager: Arc<SecurityEventManager>,
    session: SessionId,
}

impl SessionCallback {
    /// Session this handle reports for
    pub fn session(&self) -> SessionId {
        self.session
    }

    fn send(&self, event: SecurityEvent) {
        self.manager.handle_event(self.session, event);
    }
}

impl KeyAgreementCallback for SessionCallback {
    fn secure_on(&self, cipher: &str) {
        self.send(SecurityEvent::CipherAgreed(cipher.to_string()));
    }

    fn show_sas(&self, sas: &str, verified: bool) {
        self.send(SecurityEvent::SasComputed {
            sas: sas.to_string(),
            verified,
        });
    }

    fn show_message(&self, code: SubCode) {
        self.send(SecurityEvent::Message(code));
    }

    fn negotiation_failed(&self, code: SubCode) {
        self.send(SecurityEvent::NegotiationFailed(code));
    }

    fn secure_off(&self) {
        self.send(SecurityEvent::SecureOff);
    }

    fn not_supported_by_other(&self) {
        self.send(SecurityEvent::NotSupportedByPeer);
    }

    fn confirm_go_clear(&self) {
        self.send(SecurityEvent::GoClearRequested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::codes::ZrtpErrorCode;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        On(SessionType, Option<String>, Option<String>, bool),
        Off(SessionType),
        Message(String, String, MessageSeverity),
        StartDerived,
    }

    #[derive(Default)]
    struct RecordingCall {
        calls: Mutex<Vec<Call>>,
        ended: std::sync::atomic::AtomicBool,
    }

    impl RecordingCall {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CallModel for RecordingCall {
        fn set_security_on(
            &self,
            session_type: SessionType,
            cipher: Option<&str>,
            sas: Option<&str>,
            verified: bool,
        ) {
            self.calls.lock().unwrap().push(Call::On(
                session_type,
                cipher.map(str::to_string),
                sas.map(str::to_string),
                verified,
            ));
        }

        fn set_security_off(&self, session_type: SessionType) {
            self.calls.lock().unwrap().push(Call::Off(session_type));
        }

        fn set_security_message(&self, message_type: &str, text: &str, severity: MessageSeverity) {
            self.calls.lock().unwrap().push(Call::Message(
                message_type.to_string(),
                text.to_string(),
                severity,
            ));
        }

        fn start_derived_sessions(&self) -> usize {
            self.calls.lock().unwrap().push(Call::StartDerived);
            0
        }

        fn is_call_ended(&self) -> bool {
            self.ended.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    fn setup() -> (Arc<RecordingCall>, SecurityEventManager) {
        let call = Arc::new(RecordingCall::default());
        let manager = SecurityEventManager::new(call.clone());
        (call, manager)
    }

    #[test]
    fn test_start_session_transitions_once() {
        let (_, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);

        manager.start_session(id).unwrap();
        assert_eq!(manager.session(id).unwrap().state, SessionState::Negotiating);
        assert!(matches!(
            manager.start_session(id),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_attribute_events_do_not_transition() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.start_session(id).unwrap();

        manager.handle_event(id, SecurityEvent::CipherAgreed("AES-256".into()));
        manager.handle_event(
            id,
            SecurityEvent::SasComputed {
                sas: "k3p9".into(),
                verified: false,
            },
        );

        let session = manager.session(id).unwrap();
        assert_eq!(session.state, SessionState::Negotiating);
        assert_eq!(session.cipher.as_deref(), Some("AES-256"));
        assert_eq!(session.sas.as_deref(), Some("k3p9"));
        assert!(call.calls().is_empty());
    }

    #[test]
    fn test_master_secure_on_starts_derived_first() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.handle_event(id, SecurityEvent::CipherAgreed("AES".into()));
        manager.handle_event(
            id,
            SecurityEvent::SasComputed {
                sas: "ab12".into(),
                verified: true,
            },
        );
        manager.handle_event(id, SecurityEvent::secure_on());

        assert_eq!(
            call.calls(),
            vec![
                Call::StartDerived,
                Call::On(SessionType::Audio, Some("AES".into()), Some("ab12".into()), true),
            ]
        );
        assert_eq!(manager.session(id).unwrap().state, SessionState::SecureOn);
    }

    #[test]
    fn test_repeated_secure_on_starts_derived_once() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.handle_event(id, SecurityEvent::secure_on());
        manager.handle_event(id, SecurityEvent::SecureOff);
        manager.handle_event(id, SecurityEvent::secure_on());

        let starts = call
            .calls()
            .iter()
            .filter(|c| **c == Call::StartDerived)
            .count();
        assert_eq!(starts, 1);
    }

    /// Call whose `set_security_on` blocks until the test opens the gate
    struct GatedCall {
        log: Mutex<Vec<&'static str>>,
        entered: crossbeam_channel::Sender<()>,
        gate: crossbeam_channel::Receiver<()>,
    }

    impl CallModel for GatedCall {
        fn set_security_on(&self, _: SessionType, _: Option<&str>, _: Option<&str>, _: bool) {
            self.log.lock().unwrap().push("on");
            self.entered.send(()).unwrap();
            self.gate.recv().unwrap();
        }

        fn set_security_off(&self, _: SessionType) {
            self.log.lock().unwrap().push("off");
        }

        fn set_security_message(&self, _: &str, _: &str, _: MessageSeverity) {}

        fn start_derived_sessions(&self) -> usize {
            0
        }

        fn is_call_ended(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_updates_reach_call_in_state_order() {
        let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
        let (gate_tx, gate_rx) = crossbeam_channel::bounded(1);
        let call = Arc::new(GatedCall {
            log: Mutex::new(Vec::new()),
            entered: entered_tx,
            gate: gate_rx,
        });
        let manager = Arc::new(SecurityEventManager::new(call.clone()));
        let master = manager.create_master_session(SessionType::Audio);
        let id = manager
            .create_derived_session(master, SessionType::Video)
            .unwrap();

        let on = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || manager.handle_event(id, SecurityEvent::secure_on()))
        };
        entered_rx.recv().unwrap();

        let off = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || manager.handle_event(id, SecurityEvent::SecureOff))
        };
        std::thread::sleep(std::time::Duration::from_millis(50));

        // secure-off waits behind the secure-on delivery
        assert_eq!(*call.log.lock().unwrap(), vec!["on"]);
        assert_eq!(manager.session(id).unwrap().state, SessionState::SecureOn);

        gate_tx.send(()).unwrap();
        on.join().unwrap();
        off.join().unwrap();

        assert_eq!(*call.log.lock().unwrap(), vec!["on", "off"]);
        assert_eq!(manager.session(id).unwrap().state, SessionState::SecureOff);
    }

    #[test]
    fn test_secure_off_after_failure_keeps_failure() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.handle_event(
            id,
            SecurityEvent::NegotiationFailed(SevereCode::ProtocolError.into()),
        );
        manager.handle_event(id, SecurityEvent::SecureOff);

        assert_eq!(call.calls(), vec![Call::Off(SessionType::Audio)]);
        assert_eq!(manager.session(id).unwrap().state, SessionState::Failed);
    }

    #[test]
    fn test_severe_message_includes_code() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.handle_event(id, SecurityEvent::severe(SevereCode::TooMuchRetries));

        let expected = render(
            &SecurityMessages::default().retry_rate_exceeded,
            "SevereTooMuchRetries",
        );
        assert_eq!(
            call.calls(),
            vec![Call::Message("Severe".into(), expected, MessageSeverity::Severe)]
        );
        assert_eq!(manager.session(id).unwrap().state, SessionState::Negotiating);
    }

    #[test]
    fn test_unlisted_severe_uses_generic_text() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.handle_event(id, SecurityEvent::severe(SevereCode::Dh1HmacFailed));

        let expected = render(&SecurityMessages::default().generic, "SevereDh1HmacFailed");
        assert_eq!(
            call.calls(),
            vec![Call::Message("Severe".into(), expected, MessageSeverity::Severe)]
        );
    }

    #[test]
    fn test_protocol_error_is_shown() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.handle_event(
            id,
            SecurityEvent::Message(SubCode::ZrtpError(ZrtpErrorCode::NonceReused)),
        );

        let calls = call.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Message(t, _, MessageSeverity::Zrtp) if t == "ZRTP"));
    }

    #[test]
    fn test_info_messages_are_silent() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.handle_event(id, SecurityEvent::Message(InfoCode::HelloReceived.into()));
        manager.handle_event(id, SecurityEvent::Message(InfoCode::RsMatchFound.into()));
        assert!(call.calls().is_empty());
    }

    #[test]
    fn test_negotiation_failure_is_terminal() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        let failure = SubCode::Severe(SevereCode::TooMuchRetries);
        manager.handle_event(id, SecurityEvent::NegotiationFailed(failure));
        manager.handle_event(id, SecurityEvent::secure_on());

        let session = manager.session(id).unwrap();
        assert_eq!(session.state, SessionState::Failed);
        assert_eq!(session.failure, Some(failure));
        assert!(call.calls().is_empty());
    }

    #[test]
    fn test_peer_and_go_clear_are_logged_only() {
        let (call, manager) = setup();
        let id = manager.create_master_session(SessionType::Audio);
        manager.start_session(id).unwrap();
        manager.handle_event(id, SecurityEvent::NotSupportedByPeer);
        manager.handle_event(id, SecurityEvent::GoClearRequested);

        assert!(call.calls().is_empty());
        assert_eq!(manager.session(id).unwrap().state, SessionState::Negotiating);
    }

    #[test]
    fn test_events_after_end_are_ignored() {
        let (call, manager) = setup();
        let master = manager.create_master_session(SessionType::Audio);
        let derived = manager
            .create_derived_session(master, SessionType::Video)
            .unwrap();

        assert_eq!(manager.end_session(master).unwrap(), vec![master, derived]);
        manager.handle_event(derived, SecurityEvent::secure_on());
        assert!(call.calls().is_empty());
    }

    #[test]
    fn test_unknown_session_is_ignored() {
        let (call, manager) = setup();
        let mut arena = SessionArena::new();
        let foreign = arena.create_master(SessionType::Audio);
        manager.handle_event(foreign, SecurityEvent::secure_on());
        assert!(call.calls().is_empty());
    }

    #[test]
    fn test_callback_handle_feeds_manager() {
        let call = Arc::new(RecordingCall::default());
        let manager = Arc::new(SecurityEventManager::new(call.clone()));
        let id = manager.create_master_session(SessionType::Video);
        let callback = manager.callback(id);

        callback.secure_on("TWOFISH");
        callback.show_sas("zz99", false);
        callback.show_message(InfoCode::SecureStateOn.into());

        assert_eq!(callback.session(), id);
        assert_eq!(
            call.calls(),
            vec![
                Call::StartDerived,
                Call::On(SessionType::Video, Some("TWOFISH".into()), Some("zz99".into()), false),
            ]
        );
    }
}
