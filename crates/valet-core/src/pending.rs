//! Pending-plan store: plans awaiting user confirmation.
//!
//! Keyed by `plan_id`, process-wide, and injectable — construct one store
//! and share it behind an `Arc`. Entries expire after a bounded TTL so an
//! unconfirmed plan cannot live forever, and a successful take consumes the
//! entry exactly once. An ownership mismatch does NOT consume the entry:
//! only the owning user can destroy their pending plan.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use valet_contracts::{
    error::{ValetError, ValetResult},
    plan::ActionPlan,
    session::ChatTurn,
};

/// Default entry lifetime. A bound, not a tuned value.
pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(600);

struct PendingEntry {
    plan: ActionPlan,
    owner_user_id: String,
    snapshot: Vec<ChatTurn>,
    created_at: Instant,
}

/// A consumed pending entry.
pub struct PendingPlan {
    pub plan: ActionPlan,
    pub snapshot: Vec<ChatTurn>,
}

/// The process-wide pending-plan map.
///
/// Shared state is confined to the interior `Mutex`; the lock is held only
/// for map operations, never across awaits.
pub struct PendingPlans {
    ttl: Duration,
    inner: Mutex<HashMap<String, PendingEntry>>,
}

impl Default for PendingPlans {
    fn default() -> Self {
        Self::new(DEFAULT_PENDING_TTL)
    }
}

impl PendingPlans {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Store a plan awaiting confirmation, with the conversation snapshot
    /// to restore when it is confirmed.
    pub fn insert(
        &self,
        plan: ActionPlan,
        owner_user_id: impl Into<String>,
        snapshot: Vec<ChatTurn>,
    ) {
        let mut map = self.inner.lock().expect("pending store lock poisoned");
        Self::sweep(&mut map, self.ttl);
        info!(plan_id = %plan.plan_id, "plan pending confirmation");
        map.insert(
            plan.plan_id.clone(),
            PendingEntry {
                plan,
                owner_user_id: owner_user_id.into(),
                snapshot,
                created_at: Instant::now(),
            },
        );
    }

    /// Consume the entry for `plan_id` on behalf of `caller_user_id`.
    ///
    /// Fails with `PlanNotFound` when no live entry exists (never created,
    /// already consumed, or expired) and with `PlanOwnership` when the
    /// caller is not the creating user — in which case the entry remains
    /// for its owner.
    pub fn take(&self, plan_id: &str, caller_user_id: &str) -> ValetResult<PendingPlan> {
        let mut map = self.inner.lock().expect("pending store lock poisoned");
        Self::sweep(&mut map, self.ttl);

        let entry = map.get(plan_id).ok_or_else(|| ValetError::PlanNotFound {
            plan_id: plan_id.to_string(),
        })?;

        if entry.owner_user_id != caller_user_id {
            warn!(plan_id, caller = caller_user_id, "confirm attempt by non-owner");
            return Err(ValetError::PlanOwnership {
                plan_id: plan_id.to_string(),
            });
        }

        let entry = map.remove(plan_id).expect("entry present under lock");
        Ok(PendingPlan {
            plan: entry.plan,
            snapshot: entry.snapshot,
        })
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let mut map = self.inner.lock().expect("pending store lock poisoned");
        Self::sweep(&mut map, self.ttl);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(map: &mut HashMap<String, PendingEntry>, ttl: Duration) {
        map.retain(|plan_id, entry| {
            let live = entry.created_at.elapsed() < ttl;
            if !live {
                warn!(plan_id = %plan_id, "pending plan expired unconfirmed");
            }
            live
        });
    }
}
