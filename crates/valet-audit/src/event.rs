//! Audit event and chain export types.
//!
//! `AuditEvent` is a single entry in a plan's hash chain — it wraps an
//! `AuditRecord` with sequence numbering and the SHA-256 hashes that make
//! tampering detectable. `AuditChain` is the sealed record exported once a
//! plan finishes executing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use valet_contracts::audit::AuditRecord;

/// A single entry in the SHA-256 hash chain for one plan.
///
/// Each event commits to the previous event via `prev_hash`, forming an
/// append-only chain. Modifying any field — including those of the embedded
/// `record` — invalidates `this_hash` and every subsequent `prev_hash`,
/// which `verify_chain` detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Monotonically increasing position in the chain, starting at 0.
    pub sequence: u64,

    /// The plan this event belongs to.
    pub plan_id: String,

    /// The immutable outcome record produced by the executor or verifier.
    pub record: AuditRecord,

    /// SHA-256 hash (hex) of the previous event, or `GENESIS_HASH` for the
    /// first event.
    pub prev_hash: String,

    /// SHA-256 hash (hex) of this event's canonical content.
    ///
    /// Computed by `hash_event()` over (plan_id, sequence, prev_hash,
    /// canonical JSON of record).
    pub this_hash: String,
}

impl AuditEvent {
    /// The sentinel `prev_hash` used for the first event in every chain.
    ///
    /// 64 hex zeros — a value that can never be the SHA-256 of real data,
    /// making genesis detection unambiguous.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A sealed audit chain for a single plan.
///
/// Produced by `InMemoryAuditSink::export_chain()`. The `terminal_hash` is
/// the `this_hash` of the last event and serves as a compact commitment to
/// the whole chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditChain {
    /// The plan whose steps are recorded here.
    pub plan_id: String,

    /// All audit events in chain order (sequence 0 first).
    pub events: Vec<AuditEvent>,

    /// Wall-clock time (UTC) the chain was exported.
    pub exported_at: DateTime<Utc>,

    /// The `this_hash` of the last event. Empty string if the chain is empty.
    pub terminal_hash: String,
}
