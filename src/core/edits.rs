//! Unsaved inventory edits and the save plan built from them.
//!
//! Every keystroke recomputes one draft: the full set of flow fields for the
//! item-day plus the figures derived from them. Drafts win over persisted
//! entries when rows are derived. Saving turns the dirty drafts into
//! [`UpsertCommand`]s; nothing here touches the database.

use crate::core::{
    derive::DerivedRow,
    flows::{Figures, FlowField, FlowFields, compute_figures, parse_quantity},
    index::EntryKey,
    save::SaveReport,
};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

/// The recomputed state of one edited item-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draft {
    /// Id of the persisted entry the draft replaces, if any
    pub id: Option<i64>,
    /// Flow fields as edited
    pub flows: FlowFields,
    /// Figures derived from the edited flows
    pub figures: Figures,
}

impl Draft {
    /// Draft holding a row's current values unchanged.
    #[must_use]
    pub fn from_row(row: &DerivedRow) -> Self {
        Self {
            id: row.entry_id,
            flows: row.flows,
            figures: compute_figures(row.previous_day_remaining, &row.flows),
        }
    }
}

/// Values written for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRecord {
    /// Flow fields to persist
    pub flows: FlowFields,
    /// Denormalised figures to persist
    pub figures: Figures,
    /// Save time; becomes `updated_at`, and `created_at` on insert
    pub timestamp: NaiveDateTime,
}

/// One write of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertCommand {
    /// Overwrite the entry with this id
    Update {
        /// Persisted entry id
        id: i64,
        /// Natural key, for reporting
        key: EntryKey,
        /// Values to write
        record: EntryRecord,
    },
    /// Create the entry, or update it if one already exists for the key
    Insert {
        /// Natural key of the new entry
        key: EntryKey,
        /// Values to write
        record: EntryRecord,
    },
}

impl UpsertCommand {
    /// Natural key the command writes
    #[must_use]
    pub const fn key(&self) -> &EntryKey {
        match self {
            Self::Update { key, .. } | Self::Insert { key, .. } => key,
        }
    }

    /// Values the command writes
    #[must_use]
    pub const fn record(&self) -> &EntryRecord {
        match self {
            Self::Update { record, .. } | Self::Insert { record, .. } => record,
        }
    }
}

/// Commands for the dirty drafts, plus the keys with nothing to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavePlan {
    /// Writes to issue
    pub commands: Vec<UpsertCommand>,
    /// Dirty all-zero drafts without a persisted entry
    pub skipped: Vec<EntryKey>,
}

impl SavePlan {
    /// Whether the plan writes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Drafts of the inventory screen and the keys edited since the last save.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    drafts: HashMap<EntryKey, Draft>,
    dirty: BTreeSet<EntryKey>,
}

impl EditSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one typed value to a row.
    ///
    /// The value is parsed leniently: empty, non-numeric and negative input
    /// is stored as 0. Flow fields not being edited keep their draft value,
    /// or the row's value when the row has no draft yet.
    pub fn record_edit(&mut self, row: &DerivedRow, field: FlowField, raw: &str) {
        self.set_value(row, field, parse_quantity(raw));
    }

    /// Applies an already-parsed value to a row. Negative values are stored as 0.
    pub fn set_value(&mut self, row: &DerivedRow, field: FlowField, value: i64) {
        let base = self
            .drafts
            .get(&row.key)
            .map_or(row.flows, |draft| draft.flows);
        let flows = base.with(field, value.max(0));
        let draft = Draft {
            id: row.entry_id,
            flows,
            figures: compute_figures(row.previous_day_remaining, &flows),
        };
        self.drafts.insert(row.key.clone(), draft);
        self.dirty.insert(row.key.clone());
    }

    /// Draft stored for a key
    #[must_use]
    pub fn draft(&self, key: &EntryKey) -> Option<&Draft> {
        self.drafts.get(key)
    }

    /// Whether the key has unsaved edits
    #[must_use]
    pub fn is_dirty(&self, key: &EntryKey) -> bool {
        self.dirty.contains(key)
    }

    /// Number of keys with unsaved edits
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Whether there is nothing to save
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    /// Drops the draft of one key. Returns whether it existed.
    pub fn discard(&mut self, key: &EntryKey) -> bool {
        self.dirty.remove(key);
        self.drafts.remove(key).is_some()
    }

    /// Drops every draft.
    pub fn clear(&mut self) {
        self.drafts.clear();
        self.dirty.clear();
    }

    /// Builds the writes for the dirty drafts, in key order.
    ///
    /// A draft with any flow field above zero is written. An all-zero draft
    /// is written only when it replaces a persisted entry, so that clearing
    /// a row really clears it; otherwise there is nothing to store.
    #[must_use]
    pub fn plan_save(&self, now: NaiveDateTime) -> SavePlan {
        let mut plan = SavePlan::default();
        for key in &self.dirty {
            let Some(draft) = self.drafts.get(key) else {
                continue;
            };
            let record = EntryRecord {
                flows: draft.flows,
                figures: draft.figures,
                timestamp: now,
            };
            match (draft.id, draft.flows.has_activity()) {
                (Some(id), _) => plan.commands.push(UpsertCommand::Update {
                    id,
                    key: key.clone(),
                    record,
                }),
                (None, true) => plan.commands.push(UpsertCommand::Insert {
                    key: key.clone(),
                    record,
                }),
                (None, false) => plan.skipped.push(key.clone()),
            }
        }
        plan
    }

    /// Clears the keys a save has dealt with. Failed keys stay dirty with
    /// their drafts.
    pub(crate) fn settle(&mut self, report: &SaveReport<EntryKey>) {
        for key in report.saved.iter().chain(&report.skipped) {
            self.discard(key);
        }
    }
}
