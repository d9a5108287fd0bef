//! Batch driver - load, discover, then resolve and mutate each change in order
//!
//! A run always completes. Unresolved names and failing records are logged
//! and counted in the [`RunSummary`]; nothing propagates to the caller.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::changes::{load_configured_changes, ChangeRecord};
use crate::core::config::BalanceConfig;
use crate::host::Host;
use crate::locator::{discover, CandidatePool};
use crate::mutator::{MutationReport, Mutator};
use crate::resolver::{CardResolver, MatchTier};

/// Counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub changes_loaded: usize,
    pub pool_size: usize,
    pub applied: usize,
    pub unresolved: usize,
    /// Records whose application panicked
    pub failed: usize,
    pub field_writes: usize,
    pub failed_writes: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Changes loaded:  {}", self.changes_loaded)?;
        writeln!(f, "Card pool:       {}", self.pool_size)?;
        writeln!(f, "Applied:         {}", self.applied)?;
        writeln!(f, "Unresolved:      {}", self.unresolved)?;
        writeln!(f, "Failed:          {}", self.failed)?;
        write!(
            f,
            "Field writes:    {} ({} refused)",
            self.field_writes, self.failed_writes
        )
    }
}

enum RecordOutcome {
    Applied(MutationReport),
    Unresolved,
}

/// Locate and load the configured change document, then apply it to `host`
pub fn run<H: Host + ?Sized>(host: &mut H, config: &BalanceConfig) -> RunSummary {
    let changes = load_configured_changes(config);
    run_changes(host, &changes, config)
}

/// Apply already loaded change records to `host`
pub fn run_changes<H: Host + ?Sized>(
    host: &mut H,
    changes: &[ChangeRecord],
    config: &BalanceConfig,
) -> RunSummary {
    let mut summary = RunSummary {
        changes_loaded: changes.len(),
        ..RunSummary::default()
    };

    if changes.is_empty() {
        tracing::info!("[Balance] No changes parsed; skipping.");
        return summary;
    }

    let pool = discover(&*host, config);
    summary.pool_size = pool.len();
    tracing::info!("[Balance] Found {} card-like objects.", pool.len());

    for change in changes {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            apply_record(&mut *host, &pool, change, config)
        }));

        match outcome {
            Ok(RecordOutcome::Applied(report)) => {
                summary.applied += 1;
                summary.field_writes += report.writes;
                summary.failed_writes += report.failed_writes;
            }
            Ok(RecordOutcome::Unresolved) => summary.unresolved += 1,
            Err(payload) => {
                tracing::error!(
                    "[Balance] Apply error for '{}': {}",
                    change.card_name,
                    panic_message(payload.as_ref())
                );
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        "[Balance] Done: {} applied, {} unresolved, {} failed.",
        summary.applied,
        summary.unresolved,
        summary.failed
    );
    summary
}

fn apply_record<H: Host + ?Sized>(
    host: &mut H,
    pool: &CandidatePool,
    change: &ChangeRecord,
    config: &BalanceConfig,
) -> RecordOutcome {
    let Some(resolution) = CardResolver::new(pool).resolve(&change.card_name) else {
        tracing::warn!(
            "[Balance] Could not find card '{}'. Skipping.",
            change.card_name
        );
        return RecordOutcome::Unresolved;
    };

    let display_name = resolution
        .candidate
        .display_name
        .as_deref()
        .unwrap_or(&change.card_name);
    match resolution.tier {
        MatchTier::Exact => tracing::info!("[Balance] Patching '{}'", display_name),
        tier => tracing::info!(
            "[Balance] Patching '{}' (matched '{}' by {})",
            display_name,
            change.card_name,
            tier.name()
        ),
    }

    if let Some(statline) = &change.current_statline {
        tracing::debug!("  was: {}", statline);
    }
    if let Some(effect) = &change.current_effect {
        tracing::debug!("  was: \"{}\"", effect);
    }

    let report = Mutator::new(host, config).apply(change, resolution.candidate.id);
    RecordOutcome::Applied(report)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
