use std::collections::BTreeSet;

use crate::api::{PageData, order_by};
use crate::models::{Sort, SortField, SortOrder, Task, TaskFilters, TaskId, TaskQuery};

/// Which server list a table shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    Today,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Actions applied to a snapshot of rows after confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Delete,
    AddToToday,
    RemoveFromToday,
    DeleteCompleted,
}

impl BulkAction {
    pub fn needs_selection(&self) -> bool {
        !matches!(self, BulkAction::DeleteCompleted)
    }

    pub fn prompt(&self, count: usize) -> String {
        match self {
            BulkAction::Delete => format!("Delete {} selected task(s)?", count),
            BulkAction::AddToToday => format!("Add {} task(s) to today's tasks?", count),
            BulkAction::RemoveFromToday => format!("Remove {} task(s) from today's tasks?", count),
            BulkAction::DeleteCompleted => "Delete all completed tasks?".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBulk {
    pub action: BulkAction,
    pub ids: Vec<TaskId>,
}

/// State of one paginated task table: query inputs, loaded rows, cursor,
/// selection and the bulk action waiting for confirmation.
#[derive(Debug, Clone)]
pub struct TaskTable {
    pub scope: ListScope,
    pub filters: TaskFilters,
    pub sort: Option<Sort>,
    pub current: u32,
    pub page_size: u32,
    pub rows: Vec<Task>,
    pub total: u64,
    pub load: LoadState,
    pub cursor: usize,
    selection: BTreeSet<TaskId>,
    pending: Option<PendingBulk>,
    request_seq: u64,
    dirty: bool,
}

impl TaskTable {
    pub fn new(scope: ListScope, page_size: u32) -> Self {
        Self {
            scope,
            filters: TaskFilters::default(),
            sort: None,
            current: 1,
            page_size: page_size.max(1),
            rows: Vec::new(),
            total: 0,
            load: LoadState::Idle,
            cursor: 0,
            selection: BTreeSet::new(),
            pending: None,
            request_seq: 0,
            // first frame loads
            dirty: true,
        }
    }

    /// Query for the current inputs. The today list is not filtered or sorted.
    pub fn query(&self) -> TaskQuery {
        let query = TaskQuery::page(self.current, self.page_size);
        match self.scope {
            ListScope::All => TaskQuery {
                order_by: order_by(self.sort.as_ref()),
                ..query.with_filters(&self.filters)
            },
            ListScope::Today => query,
        }
    }

    /// Ask for a reload on the next loop iteration
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Consume a pending reload request
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }

    /// Enter `Loading` and return the sequence number the response must carry
    pub fn begin_load(&mut self) -> (u64, TaskQuery) {
        self.request_seq += 1;
        self.load = LoadState::Loading;
        self.dirty = false;
        (self.request_seq, self.query())
    }

    /// Apply a response. Returns false when it belongs to an older request.
    pub fn finish_load(&mut self, seq: u64, result: Result<PageData<Task>, String>) -> bool {
        if seq != self.request_seq {
            return false;
        }
        match result {
            Ok(page) => {
                self.rows = page.list;
                self.total = page.total;
                self.selection.clear();
                self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
                self.load = LoadState::Loaded;
            }
            Err(message) => {
                self.load = LoadState::Failed(message);
            }
        }
        true
    }

    pub fn set_filters(&mut self, filters: TaskFilters) {
        self.filters = filters;
        self.current = 1;
        self.invalidate();
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(TaskFilters::default());
    }

    /// A new key sorts ascending, the active key flips direction
    pub fn sort_by(&mut self, field: SortField) {
        self.sort = Some(match self.sort {
            Some(sort) if sort.field == field => Sort {
                field,
                order: sort.order.flipped(),
            },
            _ => Sort {
                field,
                order: SortOrder::Asc,
            },
        });
        self.current = 1;
        self.invalidate();
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(self.page_size as u64);
        pages.clamp(1, u32::MAX as u64) as u32
    }

    pub fn next_page(&mut self) -> bool {
        if self.current < self.total_pages() {
            self.current += 1;
            self.cursor = 0;
            self.invalidate();
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            self.cursor = 0;
            self.invalidate();
            true
        } else {
            false
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    pub fn selected_row(&self) -> Option<&Task> {
        self.rows.get(self.cursor)
    }

    pub fn toggle_selection(&mut self) {
        if let Some(id) = self.selected_row().and_then(|t| t.id) {
            if !self.selection.remove(&id) {
                self.selection.insert(id);
            }
        }
    }

    pub fn is_selected(&self, id: TaskId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Snapshot the selection for `action`. `None` if it needs rows and none are selected.
    pub fn request_bulk(&mut self, action: BulkAction) -> Option<&PendingBulk> {
        let ids: Vec<TaskId> = self.selection.iter().copied().collect();
        if action.needs_selection() && ids.is_empty() {
            return None;
        }
        self.request_action(action, ids)
    }

    /// Ask to apply `action` to explicit rows, e.g. the one under the cursor
    pub fn request_action(&mut self, action: BulkAction, ids: Vec<TaskId>) -> Option<&PendingBulk> {
        self.pending = Some(PendingBulk { action, ids });
        self.pending.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingBulk> {
        self.pending.as_ref()
    }

    /// Take the confirmed action for execution
    pub fn confirm_bulk(&mut self) -> Option<PendingBulk> {
        self.pending.take()
    }

    pub fn cancel_bulk(&mut self) {
        self.pending = None;
    }

    /// After a bulk action: success clears the selection and reloads,
    /// failure leaves everything as displayed.
    pub fn complete_bulk(&mut self, success: bool) {
        if success {
            self.selection.clear();
            self.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::task;

    fn page(ids: &[TaskId], total: u64) -> PageData<Task> {
        PageData {
            success: true,
            list: ids.iter().map(|&id| task(id, "t")).collect(),
            total,
            current: 1,
            page_size: 10,
        }
    }

    #[test]
    fn stale_responses_are_ignored() {
        let mut table = TaskTable::new(ListScope::All, 10);
        let (first, _) = table.begin_load();
        table.sort_by(SortField::DueDate);
        let (second, _) = table.begin_load();

        assert!(!table.finish_load(first, Ok(page(&[1], 1))));
        assert!(table.is_loading());
        assert!(table.finish_load(second, Ok(page(&[2, 3], 2))));
        assert_eq!(table.load, LoadState::Loaded);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn failed_load_keeps_rows() {
        let mut table = TaskTable::new(ListScope::All, 10);
        let (seq, _) = table.begin_load();
        table.finish_load(seq, Ok(page(&[1], 1)));
        let (seq, _) = table.begin_load();
        table.finish_load(seq, Err("offline".to_string()));
        assert_eq!(table.load, LoadState::Failed("offline".to_string()));
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn sort_starts_ascending_and_flips() {
        let mut table = TaskTable::new(ListScope::All, 10);
        table.sort_by(SortField::DueDate);
        assert_eq!(table.query().order_by.as_deref(), Some("dueDate ASC"));
        table.sort_by(SortField::DueDate);
        assert_eq!(table.query().order_by.as_deref(), Some("dueDate DESC"));
        table.sort_by(SortField::CreatedAt);
        assert_eq!(table.query().order_by.as_deref(), Some("created_at ASC"));
    }

    #[test]
    fn filters_reset_paging_and_request_reload() {
        let mut table = TaskTable::new(ListScope::All, 10);
        table.take_reload();
        table.total = 35;
        assert!(table.next_page());
        assert_eq!(table.current, 2);
        assert!(table.take_reload());

        table.set_filters(TaskFilters {
            title: Some("milk".to_string()),
            ..TaskFilters::default()
        });
        assert_eq!(table.current, 1);
        assert!(table.take_reload());
        assert_eq!(table.query().task_name.as_deref(), Some("milk"));
    }

    #[test]
    fn paging_stays_in_bounds() {
        let mut table = TaskTable::new(ListScope::All, 10);
        table.total = 20;
        assert_eq!(table.total_pages(), 2);
        assert!(!table.prev_page());
        assert!(table.next_page());
        assert!(!table.next_page());

        table.total = 0;
        assert_eq!(table.total_pages(), 1);
    }

    #[test]
    fn today_scope_ignores_filters_and_sort() {
        let mut table = TaskTable::new(ListScope::Today, 10);
        table.filters.title = Some("x".to_string());
        table.sort_by(SortField::CreatedAt);
        let query = table.query();
        assert_eq!(query.task_name, None);
        assert_eq!(query.order_by, None);
    }

    #[test]
    fn selection_is_cleared_on_reload() {
        let mut table = TaskTable::new(ListScope::All, 10);
        let (seq, _) = table.begin_load();
        table.finish_load(seq, Ok(page(&[1, 2], 2)));
        table.toggle_selection();
        table.move_down();
        table.toggle_selection();
        assert_eq!(table.selection_len(), 2);

        let (seq, _) = table.begin_load();
        table.finish_load(seq, Ok(page(&[1, 2], 2)));
        assert_eq!(table.selection_len(), 0);
    }

    #[test]
    fn bulk_actions_snapshot_selection_and_need_confirmation() {
        let mut table = TaskTable::new(ListScope::All, 10);
        assert!(table.request_bulk(BulkAction::Delete).is_none());
        assert!(table.request_bulk(BulkAction::DeleteCompleted).is_some());
        table.cancel_bulk();

        let (seq, _) = table.begin_load();
        table.finish_load(seq, Ok(page(&[4, 5], 2)));
        table.toggle_selection();
        let pending = table.request_bulk(BulkAction::AddToToday).cloned().unwrap();
        assert_eq!(pending.ids, vec![4]);

        // changing the selection afterwards does not alter the snapshot
        table.move_down();
        table.toggle_selection();
        let confirmed = table.confirm_bulk().unwrap();
        assert_eq!(confirmed.ids, vec![4]);
        assert!(table.pending().is_none());

        table.take_reload();
        table.complete_bulk(false);
        assert_eq!(table.selection_len(), 2);
        assert!(!table.take_reload());

        table.complete_bulk(true);
        assert_eq!(table.selection_len(), 0);
        assert!(table.take_reload());
    }
}
