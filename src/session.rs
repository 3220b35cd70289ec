// 🔐 Session Lifecycle
// Bounded association between one record and a counterparty
//
// OPEN → CLOSED, nothing else. Closing validates the end date and the usage
// metrics, computes the record's outcome once and caches it. A record can be
// referenced by at most one OPEN session at a time.

use crate::error::{RegistryError, RegistryResult, StateError, ValidationError};
use crate::registry::{Record, Registry};
use crate::validation::require_non_empty;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

// ============================================================================
// SETTLEMENT
// ============================================================================

/// Records whose sessions produce a final figure on close.
pub trait Settle: Record {
    /// Metrics captured when the session closes (distance, fuel, …)
    type Usage: Clone + Debug;

    /// Figure cached on the closed session
    type Outcome: Clone + Debug;

    /// Reject negative metrics and record-specific ceilings
    fn check_usage(&self, usage: &Self::Usage) -> Result<(), ValidationError>;

    /// Variant formula applied to the closed period
    fn settle(&self, period: &Period, usage: &Self::Usage) -> Result<Self::Outcome, ValidationError>;
}

// ============================================================================
// PERIOD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::invalid(
                "end_date",
                format!("{} precedes start {}", end, start),
            ));
        }
        Ok(Period { start, end })
    }

    /// Whole elapsed days
    pub fn elapsed_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Elapsed days, at least 1 for a same-day close
    pub fn billed_days(&self) -> u32 {
        self.elapsed_days().max(1) as u32
    }
}

// ============================================================================
// SESSION STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (SessionStatus::Open, SessionStatus::Closed))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "OPEN",
            SessionStatus::Closed => "CLOSED",
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// One agreement: K = record key, U = usage metrics, O = cached outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session<K, U, O> {
    id: String,
    record: K,
    counterparty: String,
    opened_on: NaiveDate,
    status: SessionStatus,
    closed_on: Option<NaiveDate>,
    usage: Option<U>,
    total: Option<O>,
}

/// Session type for a given record family
pub type SessionOf<R> = Session<<R as Record>::Key, <R as Settle>::Usage, <R as Settle>::Outcome>;

impl<K, U, O> Session<K, U, O>
where
    K: Clone + PartialEq + Debug + std::fmt::Display,
    U: Clone + Debug,
    O: Clone + Debug,
{
    pub fn open(record: K, counterparty: &str, opened_on: NaiveDate) -> Result<Self, ValidationError> {
        require_non_empty("counterparty", counterparty)?;

        Ok(Session {
            id: uuid::Uuid::new_v4().to_string(),
            record,
            counterparty: counterparty.to_string(),
            opened_on,
            status: SessionStatus::Open,
            closed_on: None,
            usage: None,
            total: None,
        })
    }

    /// Close against the referenced record and cache its outcome.
    ///
    /// On any error the session stays OPEN and unchanged.
    pub fn close<R>(&mut self, record: &R, closed_on: NaiveDate, usage: U) -> RegistryResult<&O>
    where
        R: Settle<Key = K, Usage = U, Outcome = O>,
    {
        if !self.status.can_transition_to(&SessionStatus::Closed) {
            return Err(StateError::AlreadyClosed {
                session: self.id.clone(),
            }
            .into());
        }
        if record.key() != &self.record {
            return Err(ValidationError::invalid(
                "record",
                format!("session {} references {}, not {}", self.id, self.record, record.key()),
            )
            .into());
        }

        let period = Period::new(self.opened_on, closed_on)?;
        record.check_usage(&usage)?;
        let outcome = record.settle(&period, &usage)?;

        self.status = SessionStatus::Closed;
        self.closed_on = Some(closed_on);
        self.usage = Some(usage);
        Ok(&*self.total.insert(outcome))
    }

    /// Cached outcome; only available once closed
    pub fn total(&self) -> Result<&O, StateError> {
        self.total.as_ref().ok_or_else(|| StateError::NotClosed {
            session: self.id.clone(),
        })
    }

    /// Closed period, `None` while open
    pub fn period(&self) -> Option<Period> {
        self.closed_on.map(|end| Period {
            start: self.opened_on,
            end,
        })
    }

    pub fn billed_days(&self) -> Result<u32, StateError> {
        self.period()
            .map(|p| p.billed_days())
            .ok_or_else(|| StateError::NotClosed {
                session: self.id.clone(),
            })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record(&self) -> &K {
        &self.record
    }

    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    pub fn opened_on(&self) -> NaiveDate {
        self.opened_on
    }

    pub fn closed_on(&self) -> Option<NaiveDate> {
        self.closed_on
    }

    pub fn usage(&self) -> Option<&U> {
        self.usage.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

// ============================================================================
// SESSION LEDGER
// ============================================================================

/// Every session ever opened for one record family, in opening order.
///
/// Availability lives here: a record is available when no OPEN session
/// references it.
#[derive(Debug, Clone)]
pub struct SessionLedger<R: Settle> {
    sessions: Vec<SessionOf<R>>,
}

impl<R: Settle> SessionLedger<R> {
    pub fn new() -> Self {
        SessionLedger {
            sessions: Vec::new(),
        }
    }

    pub fn open(
        &mut self,
        registry: &Registry<R>,
        key: &R::Key,
        counterparty: &str,
        opened_on: NaiveDate,
    ) -> RegistryResult<&SessionOf<R>> {
        let record = registry.get(key)?;

        if let Some(engaged) = self.open_session_for(record.key()) {
            tracing::warn!(kind = R::KIND, key = %key, session = engaged.id(), "record already engaged");
            return Err(StateError::RecordEngaged {
                record: key.to_string(),
                session: engaged.id().to_string(),
            }
            .into());
        }

        let session = Session::open(record.key().clone(), counterparty, opened_on)?;
        tracing::info!(
            kind = R::KIND,
            key = %key,
            session = session.id(),
            counterparty,
            %opened_on,
            "session opened"
        );

        self.sessions.push(session);
        let last = self.sessions.len() - 1;
        Ok(&self.sessions[last])
    }

    pub fn close(
        &mut self,
        registry: &Registry<R>,
        session_id: &str,
        closed_on: NaiveDate,
        usage: R::Usage,
    ) -> RegistryResult<&R::Outcome> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id() == session_id)
            .ok_or_else(|| RegistryError::not_found("session", session_id))?;
        let record = registry.get(session.record())?;

        match session.close(record, closed_on, usage) {
            Ok(outcome) => {
                tracing::info!(kind = R::KIND, session = session_id, %closed_on, ?outcome, "session closed");
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(kind = R::KIND, session = session_id, error = %err, "close rejected");
                Err(err)
            }
        }
    }

    pub fn find(&self, session_id: &str) -> Option<&SessionOf<R>> {
        self.sessions.iter().find(|s| s.id() == session_id)
    }

    pub fn get(&self, session_id: &str) -> RegistryResult<&SessionOf<R>> {
        self.find(session_id)
            .ok_or_else(|| RegistryError::not_found("session", session_id))
    }

    pub fn open_session_for(&self, key: &R::Key) -> Option<&SessionOf<R>> {
        self.sessions
            .iter()
            .find(|s| s.is_open() && s.record() == key)
    }

    pub fn is_available(&self, key: &R::Key) -> bool {
        self.open_session_for(key).is_none()
    }

    pub fn active(&self) -> Vec<&SessionOf<R>> {
        self.sessions.iter().filter(|s| s.is_open()).collect()
    }

    pub fn closed(&self) -> Vec<&SessionOf<R>> {
        self.sessions.iter().filter(|s| !s.is_open()).collect()
    }

    pub fn history_for(&self, key: &R::Key) -> Vec<&SessionOf<R>> {
        self.sessions.iter().filter(|s| s.record() == key).collect()
    }

    pub fn all(&self) -> &[SessionOf<R>] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<R: Settle> Default for SessionLedger<R> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
