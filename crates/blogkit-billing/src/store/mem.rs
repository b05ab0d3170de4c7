use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::NaiveDate;

use super::{BillStore, Bills, StoreResult};
use crate::pricing::LineItem;

#[derive(Clone, Default)]
pub struct MemStore {
    days: Arc<RwLock<HashMap<NaiveDate, Bills>>>,
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let days = self.days.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MemStore").field("days", &days.len()).finish()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BillStore for MemStore {
    fn bills_for_date(&self, date: NaiveDate) -> StoreResult<Bills> {
        let days = self.days.read().unwrap_or_else(PoisonError::into_inner);
        Ok(days.get(&date).cloned().unwrap_or_default())
    }

    fn write_order(&self, date: NaiveDate, user: &str, line_items: &[LineItem]) -> StoreResult<()> {
        let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
        days.entry(date)
            .or_default()
            .entry(user.to_string())
            .or_default()
            .push(line_items.to_vec());
        Ok(())
    }
}
