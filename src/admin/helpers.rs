//! Admin list bookkeeping shared by the coupon and product consoles.

use super::models::Record;

/// A cached list of records plus the one being edited.
#[derive(Debug, Clone)]
pub struct RecordList<T> {
    pub items: Vec<T>,
    pub selected: Option<T>,
}

impl<T> Default for RecordList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
        }
    }
}

impl<T: Record> RecordList<T> {
    /// Appends a newly created record and selects it.
    pub fn insert(&mut self, record: T) {
        self.items.push(record.clone());
        self.selected = Some(record);
    }

    /// Replaces the cached copy with the same id. Unknown ids are ignored.
    pub fn replace(&mut self, record: T) {
        if let Some(cached) = self
            .items
            .iter_mut()
            .find(|cached| cached.record_id() == record.record_id())
        {
            *cached = record.clone();
        }
        if self
            .selected
            .as_ref()
            .is_some_and(|selected| selected.record_id() == record.record_id())
        {
            self.selected = Some(record);
        }
    }

    /// Drops the record with `id`, and the selection if it pointed there.
    pub fn remove(&mut self, id: &str) {
        self.items.retain(|record| record.record_id() != id);
        if self
            .selected
            .as_ref()
            .is_some_and(|selected| selected.record_id() == id)
        {
            self.selected = None;
        }
    }

    /// Selects a cached record by id; returns whether it was found.
    pub fn select(&mut self, id: &str) -> bool {
        self.selected = self
            .items
            .iter()
            .find(|record| record.record_id() == id)
            .cloned();
        self.selected.is_some()
    }
}
