//! In-memory implementation of `AuditSink`.
//!
//! `InMemoryAuditSink` is the reference implementation of the `AuditSink`
//! trait. It keeps one hash chain per plan in a `HashMap` protected by a
//! `Mutex`, making it safe to share across threads while the command service
//! calls `record()` and `seal()`.
//!
//! Use `export_chain()` after a plan completes to obtain a sealed
//! `AuditChain`, and `verify_integrity()` at any time to confirm a chain
//! has not been tampered with in memory.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::info;

use valet_contracts::{
    audit::AuditRecord,
    error::{ValetError, ValetResult},
};
use valet_core::traits::AuditSink;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditChain, AuditEvent},
};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The chain state for a single plan.
struct ChainState {
    /// All events written so far, in append order.
    events: Vec<AuditEvent>,

    /// The next sequence number to assign (starts at 0).
    sequence: u64,

    /// The `this_hash` of the last written event, or `GENESIS_HASH` before
    /// any event has been written.
    last_hash: String,
}

impl ChainState {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            sequence: 0,
            last_hash: AuditEvent::GENESIS_HASH.to_string(),
        }
    }
}

// ── Public sink ───────────────────────────────────────────────────────────────

/// An in-memory, append-only audit sink keeping one SHA-256 hash chain per
/// plan.
///
/// # Thread safety
///
/// `record()` and `seal()` both acquire a `Mutex` internally, so the sink
/// can be shared behind an `Arc` without additional synchronization.
pub struct InMemoryAuditSink {
    chains: Mutex<HashMap<String, ChainState>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self {
            chains: Mutex::new(HashMap::new()),
        }
    }

    /// Export a sealed `AuditChain` for `plan_id`, or `None` when nothing
    /// has been recorded for that plan.
    ///
    /// The `terminal_hash` is the `this_hash` of the last event, or an empty
    /// string when the chain is empty.
    pub fn export_chain(&self, plan_id: &str) -> Option<AuditChain> {
        let chains = self.chains.lock().ok()?;
        let state = chains.get(plan_id)?;
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        Some(AuditChain {
            plan_id: plan_id.to_string(),
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        })
    }

    /// Verify that the chain for `plan_id` has not been tampered with.
    ///
    /// A plan with no recorded events is treated as an empty, valid chain.
    pub fn verify_integrity(&self, plan_id: &str) -> bool {
        let chains = match self.chains.lock() {
            Ok(chains) => chains,
            Err(_) => return false,
        };
        match chains.get(plan_id) {
            Some(state) => verify_chain(&state.events),
            None => true,
        }
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for InMemoryAuditSink {
    /// Append one record to the plan's hash chain, creating the chain on
    /// first use.
    ///
    /// Computes `this_hash` from (plan_id, sequence, prev_hash, record),
    /// wraps the record in an `AuditEvent`, appends it, then advances the
    /// sequence counter and `last_hash`.
    ///
    /// Returns `Err(AuditWriteFailed)` only if the internal mutex is
    /// poisoned, which cannot happen under normal operation.
    fn record(&self, record: &AuditRecord) -> ValetResult<()> {
        let mut chains = self.chains.lock().map_err(|e| ValetError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let state = chains
            .entry(record.plan_id.clone())
            .or_insert_with(ChainState::new);

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let this_hash = hash_event(&record.plan_id, sequence, record, &prev_hash);

        state.events.push(AuditEvent {
            sequence,
            plan_id: record.plan_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;

        Ok(())
    }

    /// Mark the plan's chain as complete.
    ///
    /// Logs a structured message via `tracing`. Implementations that persist
    /// to disk or a database would flush here; the in-memory sink has
    /// nothing to flush.
    fn seal(&self, plan_id: &str) -> ValetResult<()> {
        let chains = self.chains.lock().map_err(|e| ValetError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let (event_count, terminal_hash) = match chains.get(plan_id) {
            Some(state) => (state.events.len(), state.last_hash.clone()),
            None => (0, AuditEvent::GENESIS_HASH.to_string()),
        };

        info!(
            plan_id = %plan_id,
            event_count,
            terminal_hash = %terminal_hash,
            "audit chain sealed"
        );

        Ok(())
    }
}
