//! Card mutation - writes one change record onto one resolved card
//!
//! Order of writes for a record:
//!
//! 1. Stat fields present in the new statline (Cost, Attack, Health, Space)
//! 2. The Sweep and Explosive keywords, when the new effect text mentions them
//! 3. The Description text
//! 4. The per-card override table, when enabled
//!
//! Every individual write is allowed to fail; failures are logged and counted
//! and never stop the remaining writes. Re-applying the same record leaves the
//! card unchanged.

use serde::Serialize;

use crate::changes::ChangeRecord;
use crate::core::config::BalanceConfig;
use crate::core::error::WriteError;
use crate::core::types::{EntityId, StatField};
use crate::host::{FieldAccessor, FieldValue};
use crate::resolver::contains_ignore_case;

/// Keywords granted when the new effect text mentions them
pub const EFFECT_KEYWORDS: [&str; 2] = ["Sweep", "Explosive"];

pub const KEYWORDS_FIELD: &str = "Keywords";
pub const DESCRIPTION_FIELD: &str = "Description";
pub const EFFECTS_FIELD: &str = "Effects";

/// Damage fields on effect records, in lookup order
const DAMAGE_FIELDS: [&str; 2] = ["Damage", "DamageAmount"];

/// One hard-coded adjustment from the override table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverrideAction {
    SetInt { field: &'static str, value: i32 },
    /// Set the damage of up to `hits` attached effects to `base_damage`
    DamageTicks { base_damage: i32, hits: usize },
    AddKeyword(&'static str),
}

/// Overrides applied to a card after its generic writes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialCase {
    pub card_name: &'static str,
    pub actions: &'static [OverrideAction],
}

/// Adjustments the generic statline/effect writes cannot express
pub const SPECIAL_CASES: &[SpecialCase] = &[
    SpecialCase {
        card_name: "Fanning the Flame",
        actions: &[
            OverrideAction::DamageTicks {
                base_damage: 3,
                hits: 2,
            },
            OverrideAction::SetInt {
                field: "SlayDamageIncrease",
                value: 1,
            },
        ],
    },
    SpecialCase {
        card_name: "Devilish Details",
        actions: &[OverrideAction::SetInt {
            field: "Cost",
            value: 0,
        }],
    },
    SpecialCase {
        card_name: "Soldier of Fortune",
        actions: &[
            OverrideAction::SetInt {
                field: "GoldThreshold",
                value: 50,
            },
            OverrideAction::SetInt {
                field: "ArmorAmount",
                value: 10,
            },
            OverrideAction::SetInt {
                field: "AvariceStacks",
                value: 5,
            },
            OverrideAction::SetInt {
                field: "AttackBuff",
                value: 10,
            },
        ],
    },
    SpecialCase {
        card_name: "Pyreblooded",
        actions: &[OverrideAction::AddKeyword("Explosive")],
    },
];

/// Override table entry for a change record's card name
pub fn special_case_for(card_name: &str) -> Option<&'static SpecialCase> {
    SPECIAL_CASES.iter().find(|case| case.card_name == card_name)
}

/// What happened while applying one change record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MutationReport {
    /// Field writes the host accepted
    pub writes: usize,
    /// Field writes the host refused
    pub failed_writes: usize,
    pub keywords_added: Vec<String>,
    pub special_case: Option<&'static str>,
}

/// Applies change records to cards through a field accessor
pub struct Mutator<'a, A: FieldAccessor + ?Sized> {
    accessor: &'a mut A,
    special_cases: bool,
}

impl<'a, A: FieldAccessor + ?Sized> Mutator<'a, A> {
    pub fn new(accessor: &'a mut A, config: &BalanceConfig) -> Self {
        Self {
            accessor,
            special_cases: config.special_cases,
        }
    }

    /// Apply every applicable write for `change` to `card`
    pub fn apply(&mut self, change: &ChangeRecord, card: EntityId) -> MutationReport {
        let mut report = MutationReport::default();

        if let Some(statline) = &change.new_statline {
            for field in StatField::ALL {
                if let Some(value) = statline.get(field) {
                    self.set_int(card, field.field_name(), value, &mut report);
                }
            }
        }

        if let Some(effect) = &change.new_effect {
            for keyword in EFFECT_KEYWORDS {
                if contains_ignore_case(effect, keyword) {
                    self.add_keyword(card, keyword, &mut report);
                }
            }
            self.set_description(card, effect, &mut report);
        }

        if self.special_cases {
            if let Some(case) = special_case_for(&change.card_name) {
                report.special_case = Some(case.card_name);
                for action in case.actions {
                    self.run_override(card, *action, &mut report);
                }
            }
        }

        report
    }

    fn run_override(&mut self, card: EntityId, action: OverrideAction, report: &mut MutationReport) {
        match action {
            OverrideAction::SetInt { field, value } => self.set_int(card, field, value, report),
            OverrideAction::DamageTicks { base_damage, hits } => {
                self.set_damage_ticks(card, base_damage, hits, report)
            }
            OverrideAction::AddKeyword(keyword) => self.add_keyword(card, keyword, report),
        }
    }

    fn set_int(&mut self, entity: EntityId, field: &str, value: i32, report: &mut MutationReport) {
        match self.accessor.set(entity, field, FieldValue::from(value)) {
            Ok(()) => {
                tracing::info!("  - {} = {}", field, value);
                report.writes += 1;
            }
            Err(e) => record_failure(field, &e, report),
        }
    }

    fn set_description(&mut self, card: EntityId, text: &str, report: &mut MutationReport) {
        match self.accessor.set(card, DESCRIPTION_FIELD, FieldValue::from(text)) {
            Ok(()) => {
                tracing::info!("  - {} = \"{}\"", DESCRIPTION_FIELD, text);
                report.writes += 1;
            }
            Err(e) => record_failure(DESCRIPTION_FIELD, &e, report),
        }
    }

    /// Append `keyword` unless an existing entry already mentions it
    fn add_keyword(&mut self, card: EntityId, keyword: &str, report: &mut MutationReport) {
        let existing = match self.accessor.get(card, KEYWORDS_FIELD) {
            Some(FieldValue::List(items)) => items,
            _ => {
                tracing::debug!("  - No {} collection; '{}' not added", KEYWORDS_FIELD, keyword);
                return;
            }
        };

        let covered = existing
            .iter()
            .filter(|item| !matches!(item, FieldValue::Null))
            .any(|item| contains_ignore_case(&item.to_string(), keyword));
        if covered {
            return;
        }

        match self
            .accessor
            .append_to_collection(card, KEYWORDS_FIELD, FieldValue::from(keyword))
        {
            Ok(()) => {
                tracing::info!("  - Added keyword '{}'", keyword);
                report.keywords_added.push(keyword.to_string());
            }
            Err(e) => record_failure(KEYWORDS_FIELD, &e, report),
        }
    }

    /// Point the first `hits` damage-bearing effects at `base_damage`
    fn set_damage_ticks(
        &mut self,
        card: EntityId,
        base_damage: i32,
        hits: usize,
        report: &mut MutationReport,
    ) {
        let Some(FieldValue::List(effects)) = self.accessor.get(card, EFFECTS_FIELD) else {
            tracing::debug!("  - No {} collection; damage ticks skipped", EFFECTS_FIELD);
            return;
        };

        let mut matched = 0;
        for effect in effects.iter().filter_map(FieldValue::as_object) {
            let Some(field) = DAMAGE_FIELDS
                .into_iter()
                .find(|f| self.accessor.has_field(effect, f))
            else {
                continue;
            };

            match self.accessor.set(effect, field, FieldValue::from(base_damage)) {
                Ok(()) => {
                    matched += 1;
                    report.writes += 1;
                    if matched >= hits {
                        break;
                    }
                }
                Err(e) => record_failure(field, &e, report),
            }
        }

        tracing::info!(
            "  - Damage ticks set to {} x {} (matched {} effects)",
            hits,
            base_damage,
            matched
        );
    }
}

fn record_failure(field: &str, error: &WriteError, report: &mut MutationReport) {
    match error {
        // Plenty of cards simply lack a given stat
        WriteError::MissingField(_) => tracing::debug!("  - {} skipped: {}", field, error),
        _ => tracing::warn!("  - {} not written: {}", field, error),
    }
    report.failed_writes += 1;
}
