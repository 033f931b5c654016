//! Pure state container behind the collection manager.
//!
//! Every operation is a synchronous transition on [`CollectionState`]. The
//! filtered and paginated views are recomputed from the records on each read
//! and are never stored.

use std::collections::{HashMap, HashSet};

use frd_model::{FeedbackPatch, FeedbackRecord, RecordId, StatusFilter};
use serde::Serialize;

use crate::error::UpdateError;

/// Per-row confirmation/removal flag. Rows without an entry are idle.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RowFlag {
    #[default]
    Idle,
    Confirming,
    Deleting,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Empty,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize },
    Empty,
}

#[derive(Clone, Debug)]
pub struct CollectionState {
    records: Vec<FeedbackRecord>,
    open_id: Option<RecordId>,
    editing_id: Option<RecordId>,
    flags: HashMap<RecordId, RowFlag>,
    search: String,
    status_filter: StatusFilter,
    page: usize,
    page_size: usize,
    load: LoadStatus,
}

#[derive(Clone, Debug, Serialize)]
pub struct RowView {
    pub record: FeedbackRecord,
    pub open: bool,
    pub editing: bool,
    pub flag: RowFlag,
}

/// Owned projection of the current page handed to consumers.
#[derive(Clone, Debug, Serialize)]
pub struct PageView {
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub filtered_count: usize,
    pub total_count: usize,
    pub search: String,
    pub status_filter: String,
    pub load: LoadStatus,
    pub rows: Vec<RowView>,
}

impl CollectionState {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            open_id: None,
            editing_id: None,
            flags: HashMap::new(),
            search: String::new(),
            status_filter: StatusFilter::All,
            page: 1,
            page_size: page_size.max(1),
            load: LoadStatus::Idle,
        }
    }

    pub fn with_records(page_size: usize, records: Vec<FeedbackRecord>) -> Self {
        let mut state = Self::new(page_size);
        state.begin_load();
        let _ = state.finish_load(Ok(records));
        state
    }

    // ---- accessors ----

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&FeedbackRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn open_id(&self) -> Option<&str> {
        self.open_id.as_deref()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn row_flag(&self, id: &str) -> RowFlag {
        self.flags.get(id).copied().unwrap_or_default()
    }

    pub fn deleting_ids(&self) -> HashSet<&str> {
        self.flags
            .iter()
            .filter(|(_, flag)| **flag == RowFlag::Deleting)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn status_filter(&self) -> &StatusFilter {
        &self.status_filter
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load
    }

    // ---- load ----

    /// Returns false when a load is already in flight.
    pub fn begin_load(&mut self) -> bool {
        if self.load == LoadStatus::Loading {
            return false;
        }
        self.load = LoadStatus::Loading;
        true
    }

    pub fn finish_load(
        &mut self,
        result: Result<Vec<FeedbackRecord>, String>,
    ) -> Result<LoadOutcome, String> {
        self.open_id = None;
        self.editing_id = None;
        self.flags.clear();
        self.page = 1;
        match result {
            Ok(records) => {
                self.records = dedupe(records);
                if self.records.is_empty() {
                    self.load = LoadStatus::Empty;
                    Ok(LoadOutcome::Empty)
                } else {
                    self.load = LoadStatus::Loaded;
                    Ok(LoadOutcome::Loaded {
                        count: self.records.len(),
                    })
                }
            }
            Err(message) => {
                self.records.clear();
                self.load = LoadStatus::Failed(message.clone());
                Err(message)
            }
        }
    }

    // ---- open / edit ----

    /// Returns true when the open record changed.
    pub fn toggle_open(&mut self, id: &str) -> bool {
        if self.open_id.as_deref() == Some(id) {
            self.open_id = None;
            self.editing_id = None;
            return true;
        }
        if self.get(id).is_none() || self.row_flag(id) == RowFlag::Deleting {
            return false;
        }
        self.open_id = Some(id.to_string());
        self.editing_id = None;
        true
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<(), UpdateError> {
        self.ensure_mutable(id)?;
        if self.open_id.as_deref() != Some(id) {
            self.open_id = Some(id.to_string());
        }
        self.editing_id = Some(id.to_string());
        Ok(())
    }

    pub fn cancel_edit(&mut self, id: &str) -> bool {
        if self.editing_id.as_deref() == Some(id) {
            self.editing_id = None;
            return true;
        }
        false
    }

    pub fn ensure_mutable(&self, id: &str) -> Result<(), UpdateError> {
        if self.get(id).is_none() {
            return Err(UpdateError::NotFound(id.to_string()));
        }
        if self.row_flag(id) == RowFlag::Deleting {
            return Err(UpdateError::Deleting(id.to_string()));
        }
        Ok(())
    }

    // ---- delete ----

    pub fn request_delete(&mut self, id: &str) -> bool {
        if self.get(id).is_none() || self.row_flag(id) != RowFlag::Idle {
            return false;
        }
        self.flags.insert(id.to_string(), RowFlag::Confirming);
        true
    }

    pub fn cancel_delete(&mut self, id: &str) -> bool {
        if self.row_flag(id) != RowFlag::Confirming {
            return false;
        }
        self.flags.remove(id);
        true
    }

    /// Enters the deleting state. Returns false for unknown ids and for rows
    /// already deleting.
    pub fn mark_deleting(&mut self, id: &str) -> bool {
        if self.get(id).is_none() || self.row_flag(id) == RowFlag::Deleting {
            return false;
        }
        self.flags.insert(id.to_string(), RowFlag::Deleting);
        true
    }

    pub fn finish_delete(&mut self, id: &str) -> Option<FeedbackRecord> {
        self.flags.remove(id);
        let idx = self.records.iter().position(|r| r.id == id)?;
        let removed = self.records.remove(idx);
        if self.open_id.as_deref() == Some(id) {
            self.open_id = None;
        }
        if self.editing_id.as_deref() == Some(id) {
            self.editing_id = None;
        }
        self.page = self.current_page();
        Some(removed)
    }

    // ---- update ----

    pub fn apply_patch(&mut self, id: &str, patch: &FeedbackPatch) -> Result<(), UpdateError> {
        self.ensure_mutable(id)?;
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| UpdateError::NotFound(id.to_string()))?;
        patch.apply_to(record);
        if self.editing_id.as_deref() == Some(id) {
            self.editing_id = None;
        }
        Ok(())
    }

    // ---- filter / page ----

    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
        self.page = 1;
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages().max(1));
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page().saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.current_page().saturating_sub(1));
    }

    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        self.status_filter.accepts(&record.status) && record.matches_search(&needle)
    }

    pub fn filtered(&self) -> Vec<&FeedbackRecord> {
        self.records.iter().filter(|r| self.matches(r)).collect()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    /// Stored page clamped against the current filtered count.
    pub fn current_page(&self) -> usize {
        self.page.clamp(1, self.total_pages().max(1))
    }

    pub fn visible(&self) -> Vec<&FeedbackRecord> {
        let start = (self.current_page() - 1) * self.page_size;
        self.filtered()
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    pub fn page_view(&self) -> PageView {
        let filtered_count = self.filtered().len();
        let rows = self
            .visible()
            .into_iter()
            .map(|record| RowView {
                open: self.open_id.as_deref() == Some(record.id.as_str()),
                editing: self.editing_id.as_deref() == Some(record.id.as_str()),
                flag: self.row_flag(&record.id),
                record: record.clone(),
            })
            .collect();
        PageView {
            page: self.current_page(),
            total_pages: filtered_count.div_ceil(self.page_size),
            page_size: self.page_size,
            filtered_count,
            total_count: self.records.len(),
            search: self.search.clone(),
            status_filter: self.status_filter.label(),
            load: self.load.clone(),
            rows,
        }
    }
}

fn dedupe(records: Vec<FeedbackRecord>) -> Vec<FeedbackRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.id.clone()) {
            out.push(record);
        } else {
            tracing::warn!(id = %record.id, "dropping duplicate feedback record");
        }
    }
    out
}
