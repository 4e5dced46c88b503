//! Flush and reconciliation logic.
//!
//! A flush runs in two stages. Reconciliation queries the store once per
//! distinct unique attribute and moves pending inserts that already exist
//! remotely over to the updates, taking the remote identity. The write stage
//! then bulk inserts what is left and upserts the updates one by one.
//!
//! Pending state is only ever changed after the store confirmed a step, so a
//! failed flush leaves every unwritten document queued for the next one.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::Ordering;
use std::time::Instant;

use serde_json::Value;

use crate::error_handling::{BufferError, WritePhase};
use crate::storage::collection::DocumentCollection;
use crate::storage::models::{Filter, ID_FIELD};

use super::{BufferState, BulkWriter};
use crate::storage::batch::types::{FlushOutcome, FlushStats};

/// Pending inserts sharing one unique attribute.
#[derive(Debug, Default)]
struct LookupGroup {
    /// Distinct candidate values, in first-seen order
    values: Vec<Value>,
    /// Lookup key of a value -> positions in `pending_inserts`
    positions: HashMap<String, Vec<usize>>,
}

/// Key under which a unique value is matched against lookup results.
///
/// Numbers compare by value the way the store does, so `1`, `1.0` and `1e0`
/// share a key. Everything else uses its canonical JSON text.
fn lookup_key(value: &Value) -> String {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            (None, None, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

impl<C: DocumentCollection> BulkWriter<C> {
    /// Runs a flush on already-locked state.
    ///
    /// Both public entry points take the lock before calling this, so the
    /// inline flush from `update` never locks twice.
    pub(super) async fn flush_locked(
        &self,
        state: &mut BufferState,
        force: bool,
    ) -> Result<FlushOutcome, BufferError> {
        // Re-checked under the lock: another caller may have drained the buffer
        if !force && state.total < self.config.threshold {
            return Ok(FlushOutcome::Skipped);
        }

        let started = Instant::now();
        log::debug!(
            "Flushing {} documents ({} inserts, {} updates)",
            state.total,
            state.pending_inserts.len(),
            state.pending_updates.len()
        );

        let (merged, lookups) = self.reconcile(state).await?;
        let inserted = self.write_inserts(state).await?;
        let updated = self.write_updates(state).await?;

        self.flush_count.fetch_add(1, Ordering::SeqCst);
        let stats = FlushStats {
            inserted,
            updated,
            merged,
            lookups,
            elapsed: started.elapsed(),
        };
        log::debug!(
            "Flush completed: {} inserted, {} updated ({} merged by unique attribute) in {:?}",
            stats.inserted,
            stats.updated,
            stats.merged,
            stats.elapsed
        );
        Ok(FlushOutcome::Flushed(stats))
    }

    /// Moves pending inserts that already exist in the store to the updates.
    ///
    /// Every lookup completes before anything moves, so a failed query leaves
    /// the pending lists untouched. Returns `(merged, lookups)`.
    async fn reconcile(&self, state: &mut BufferState) -> Result<(usize, usize), BufferError> {
        let default_attr = self.config.unique_attr.as_deref();
        let mut groups: BTreeMap<String, LookupGroup> = BTreeMap::new();

        for (position, document) in state.pending_inserts.iter().enumerate() {
            let Some(attr) = document.unique_attr().or(default_attr) else {
                continue;
            };
            let Some(value) = document.get(attr).filter(|v| !v.is_null()) else {
                continue;
            };
            let group = groups.entry(attr.to_string()).or_default();
            match group.positions.entry(lookup_key(value)) {
                Entry::Occupied(mut slot) => slot.get_mut().push(position),
                Entry::Vacant(slot) => {
                    group.values.push(value.clone());
                    slot.insert(vec![position]);
                }
            }
        }

        if groups.is_empty() {
            return Ok((0, 0));
        }

        // position in pending_inserts -> identity of the existing remote document
        let mut matched: HashMap<usize, Value> = HashMap::new();
        for (attr, group) in &groups {
            let filter = Filter::in_values(attr.clone(), group.values.clone());
            let found = self
                .collection
                .find(&filter, &[attr.as_str(), ID_FIELD])
                .await
                .map_err(|source| {
                    log::error!("Lookup by unique attribute '{}' failed: {}", attr, source);
                    BufferError::ReconciliationFailed {
                        attribute: attr.clone(),
                        source,
                    }
                })?;
            log::trace!(
                "Lookup by '{}' for {} values found {} existing documents",
                attr,
                group.values.len(),
                found.len()
            );

            for remote in found {
                let (Some(value), Some(id)) = (remote.get(attr), remote.id()) else {
                    continue;
                };
                if let Some(positions) = group.positions.get(&lookup_key(value)) {
                    for &position in positions {
                        matched.entry(position).or_insert_with(|| id.clone());
                    }
                }
            }
        }

        let merged = matched.len();
        if merged > 0 {
            let inserts = std::mem::take(&mut state.pending_inserts);
            for (position, mut document) in inserts.into_iter().enumerate() {
                match matched.remove(&position) {
                    Some(id) => {
                        document.set_id(id);
                        state.pending_updates.push(document);
                    }
                    None => state.pending_inserts.push(document),
                }
            }
        }
        Ok((merged, groups.len()))
    }

    /// Bulk inserts the remaining pending inserts in one call.
    async fn write_inserts(&self, state: &mut BufferState) -> Result<usize, BufferError> {
        let count = state.pending_inserts.len();
        if count == 0 {
            return Ok(0);
        }

        if let Err(e) = self.collection.insert_many(&state.pending_inserts).await {
            let error = BufferError::from_write(WritePhase::Insert, &state.pending_inserts, e);
            log::error!("Bulk insert of {} documents failed: {}", count, error);
            return Err(error);
        }

        state.pending_inserts.clear();
        state.sync_total();
        self.inserted_count.fetch_add(count as u64, Ordering::SeqCst);
        Ok(count)
    }

    /// Upserts pending updates one at a time, in queue order.
    ///
    /// Stops at the first failure; documents written before it are removed from
    /// the queue and counted, the failing one and the rest stay queued.
    async fn write_updates(&self, state: &mut BufferState) -> Result<usize, BufferError> {
        let mut written = 0;
        let mut failure = None;
        for document in &state.pending_updates {
            match self.collection.save(document).await {
                Ok(()) => written += 1,
                Err(e) => {
                    failure = Some(BufferError::from_write(
                        WritePhase::Update,
                        std::slice::from_ref(document),
                        e,
                    ));
                    break;
                }
            }
        }

        state.pending_updates.drain(..written);
        state.sync_total();
        self.updated_count.fetch_add(written as u64, Ordering::SeqCst);

        match failure {
            Some(error) => {
                log::error!(
                    "Upsert failed after {} of {} documents: {}",
                    written,
                    written + state.pending_updates.len(),
                    error
                );
                Err(error)
            }
            None => Ok(written),
        }
    }
}
