//! Per-session view state: who is operating, which event and match are selected, and the
//! team-name cache for the selected event.

use crate::logic::SessionId;
use crate::models::{EventId, MatchId, Operator, Team, TeamId, TournamentError, TournamentResult};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct ViewSession {
    pub id: SessionId,
    operator: Option<Operator>,
    event: Option<EventId>,
    current_match: Option<MatchId>,
    names: HashMap<TeamId, String>,
    last_activity: Instant,
}

impl Default for ViewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            operator: None,
            event: None,
            current_match: None,
            names: HashMap::new(),
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn sign_in(&mut self, operator: Operator) {
        self.operator = Some(operator);
    }

    pub fn sign_out(&mut self) -> Option<Operator> {
        self.operator.take()
    }

    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    /// The signed-in operator, or `NotSignedIn`.
    pub fn require_operator(&self) -> TournamentResult<&Operator> {
        self.operator.as_ref().ok_or(TournamentError::NotSignedIn)
    }

    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// Switch event. Switching rebuilds the name cache; reselecting the same event keeps it.
    /// Returns whether the selection changed.
    pub fn select_event(&mut self, event_id: &str, teams: &[Team]) -> bool {
        if self.event.as_deref() == Some(event_id) {
            return false;
        }
        self.event = Some(event_id.to_string());
        self.names = teams
            .iter()
            .filter(|t| t.event_id == event_id)
            .map(|t| (t.id.clone(), t.name.clone()))
            .collect();
        true
    }

    pub fn names(&self) -> &HashMap<TeamId, String> {
        &self.names
    }

    /// Cached display name, or the id itself (placeholders have no team record).
    pub fn display_name<'a>(&'a self, team_id: &'a str) -> &'a str {
        self.names.get(team_id).map(String::as_str).unwrap_or(team_id)
    }

    pub fn current_match(&self) -> Option<&str> {
        self.current_match.as_deref()
    }

    /// Select a match. Returns the previously selected match when it differs, so the caller can
    /// release its clock.
    pub fn select_match(&mut self, match_id: &str) -> Option<MatchId> {
        if self.current_match.as_deref() == Some(match_id) {
            return None;
        }
        self.current_match.replace(match_id.to_string())
    }

    pub fn clear_match(&mut self) -> Option<MatchId> {
        self.current_match.take()
    }
}

/// All live sessions of the server.
#[derive(Default)]
pub struct Sessions {
    inner: RwLock<HashMap<SessionId, ViewSession>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the session, creating it when `id` is unknown or absent. Touches the
    /// session. Returns the session id actually used.
    pub fn with<T>(
        &self,
        id: Option<SessionId>,
        f: impl FnOnce(&mut ViewSession) -> T,
    ) -> TournamentResult<(SessionId, T)> {
        let mut g = self
            .inner
            .write()
            .map_err(|_| TournamentError::Store("session lock error".into()))?;
        let id = match id {
            Some(id) if g.contains_key(&id) => id,
            _ => {
                let s = ViewSession::new();
                let id = s.id;
                g.insert(id, s);
                id
            }
        };
        let session = g
            .get_mut(&id)
            .ok_or(TournamentError::Store("session vanished".into()))?;
        session.touch();
        Ok((id, f(session)))
    }

    pub fn remove(&self, id: SessionId) -> Option<ViewSession> {
        self.inner.write().ok()?.remove(&id)
    }

    /// Remove sessions idle for at least `timeout`; returns their ids.
    pub fn purge_idle(&self, timeout: Duration) -> Vec<SessionId> {
        let Ok(mut g) = self.inner.write() else {
            return Vec::new();
        };
        let expired: Vec<SessionId> = g
            .iter()
            .filter(|(_, s)| s.idle_for() >= timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            g.remove(id);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
