//! Security sessions of a call
//!
//! Every media stream of a call negotiates (or derives) its own SRTP keys and
//! is tracked as a [`SecuritySession`]. The first stream performs the full
//! Diffie-Hellman exchange and becomes the master; later streams derive their
//! keys from it ("multi-stream") and record the master's id. The
//! [`SessionArena`] owns all of them, so ending a master ends its derived
//! sessions in the same step.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use super::codes::SubCode;

/// Errors from session bookkeeping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown security session: {0}")]
    UnknownSession(SessionId),

    #[error("Master session {0} has ended")]
    MasterEnded(SessionId),

    #[error("Session {0} is not a master session")]
    NotAMaster(SessionId),

    #[error("Session {id} cannot start from state {state:?}")]
    InvalidState { id: SessionId, state: SessionState },
}

/// Identity of a security session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Raw id value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zrtp-{}", self.0)
    }
}

/// Media carried by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Audio,
    Video,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::Audio => write!(f, "AUDIO_SESSION"),
            SessionType::Video => write!(f, "VIDEO_SESSION"),
        }
    }
}

/// Negotiation state of a session
///
/// ```text
/// Idle -> Negotiating -> SecureOn <-> SecureOff
///              |                          |
///              +-> Failed          (any) -+-> Ended
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, media not started
    Idle,
    /// Key agreement in progress
    Negotiating,
    /// Media is encrypted
    SecureOn,
    /// Media was encrypted and is now clear
    SecureOff,
    /// Key agreement failed; media continues unencrypted
    Failed,
    /// Torn down with the call
    Ended,
}

/// One negotiated or negotiating secure media session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuritySession {
    id: SessionId,
    session_type: SessionType,
    master: Option<SessionId>,
    /// Cipher agreed by the engine
    pub cipher: Option<String>,
    /// Short authentication string (master sessions only)
    pub sas: Option<String>,
    /// Whether the SAS was verified in an earlier call
    pub sas_verified: bool,
    /// Current negotiation state
    pub state: SessionState,
    /// Sub-code of the failure that ended negotiation
    pub failure: Option<SubCode>,
    /// Whether derived sessions were already started from this master
    pub derived_started: bool,
}

impl SecuritySession {
    fn new(id: SessionId, session_type: SessionType, master: Option<SessionId>) -> Self {
        Self {
            id,
            session_type,
            master,
            cipher: None,
            sas: None,
            sas_verified: false,
            state: SessionState::Idle,
            failure: None,
            derived_started: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    /// Master this session derives its keys from
    pub fn master(&self) -> Option<SessionId> {
        self.master
    }

    /// Whether this session runs the full key agreement
    pub fn is_master(&self) -> bool {
        self.master.is_none()
    }

    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }
}

/// Owner of every security session of a call
#[derive(Debug, Default)]
pub struct SessionArena {
    sessions: HashMap<SessionId, SecuritySession>,
    next_id: u64,
}

impl SessionArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId(self.next_id)
    }

    /// Create a master (full key agreement) session
    pub fn create_master(&mut self, session_type: SessionType) -> SessionId {
        let id = self.allocate();
        self.sessions
            .insert(id, SecuritySession::new(id, session_type, None));
        id
    }

    /// Create a session deriving its keys from `master`
    pub fn create_derived(
        &mut self,
        master: SessionId,
        session_type: SessionType,
    ) -> Result<SessionId, SessionError> {
        let parent = self
            .sessions
            .get(&master)
            .ok_or(SessionError::UnknownSession(master))?;
        if !parent.is_master() {
            return Err(SessionError::NotAMaster(master));
        }
        if parent.is_ended() {
            return Err(SessionError::MasterEnded(master));
        }

        let id = self.allocate();
        self.sessions
            .insert(id, SecuritySession::new(id, session_type, Some(master)));
        Ok(id)
    }

    pub fn get(&self, id: SessionId) -> Option<&SecuritySession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut SecuritySession> {
        self.sessions.get_mut(&id)
    }

    /// Derived sessions of `master`, in creation order
    pub fn derived_of(&self, master: SessionId) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| s.master == Some(master))
            .map(|s| s.id)
            .collect();
        ids.sort();
        ids
    }

    /// End a session; ending a master also ends its derived sessions
    ///
    /// Returns the sessions that changed to [`SessionState::Ended`].
    pub fn end(&mut self, id: SessionId) -> Result<Vec<SessionId>, SessionError> {
        let session = self
            .sessions
            .get(&id)
            .ok_or(SessionError::UnknownSession(id))?;

        let mut targets = vec![id];
        if session.is_master() {
            targets.extend(self.derived_of(id));
        }

        let mut ended = Vec::new();
        for target in targets {
            if let Some(session) = self.sessions.get_mut(&target) {
                if !session.is_ended() {
                    session.state = SessionState::Ended;
                    ended.push(target);
                }
            }
        }
        Ok(ended)
    }

    /// End every session
    pub fn end_all(&mut self) -> Vec<SessionId> {
        let mut ended: Vec<SessionId> = self
            .sessions
            .values_mut()
            .filter(|s| !s.is_ended())
            .map(|s| {
                s.state = SessionState::Ended;
                s.id
            })
            .collect();
        ended.sort();
        ended
    }

    /// All session ids, in creation order
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
