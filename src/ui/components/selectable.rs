use std::collections::BTreeSet;

use tui::widgets::{ListState, TableState};

use crate::reports::filter::{Filterable, ListFilter};

/// Rows of a list screen plus the filter, cursor and multi-selection over them.
///
/// The cursor indexes into `visible`, which holds indices into `rows`.
pub struct Selectable<T> {
    rows: Vec<T>,
    visible: Vec<usize>,
    cursor: Option<usize>,
    marked: BTreeSet<usize>,
    pub filter: ListFilter,
}

impl<T: Filterable> Selectable<T> {
    pub fn new(rows: Vec<T>) -> Self {
        let mut list = Self {
            visible: Vec::new(),
            rows,
            cursor: None,
            marked: BTreeSet::new(),
            filter: ListFilter::default(),
        };
        list.refilter();
        list
    }

    pub fn with_filter(rows: Vec<T>, filter: ListFilter) -> Self {
        let mut list = Self::new(rows);
        list.set_filter(filter);
        list
    }

    pub fn set_filter(&mut self, filter: ListFilter) {
        self.filter = filter;
        self.refilter();
    }

    pub fn set_query(&mut self, query: &str) {
        self.filter.query = query.to_string();
        self.refilter();
    }

    /// Recomputes the visible rows; marks on rows that are no longer visible are dropped.
    pub fn refilter(&mut self) {
        self.visible = self.filter.apply(&self.rows);
        let visible = &self.visible;
        self.marked.retain(|i| visible.contains(i));
        self.cursor = if self.visible.is_empty() {
            None
        } else {
            Some(self.cursor.unwrap_or(0).min(self.visible.len() - 1))
        };
    }
}

impl<T> Selectable<T> {
    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.cursor {
            Some(i) => {
                if i >= self.visible.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.cursor = Some(i);
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.cursor {
            Some(i) => {
                if i == 0 {
                    self.visible.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.cursor = Some(i);
    }

    pub fn selected(&self) -> Option<&T> {
        self.cursor
            .and_then(|i| self.visible.get(i))
            .and_then(|&row| self.rows.get(row))
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &T> {
        self.visible.iter().filter_map(|&i| self.rows.get(i))
    }

    pub fn all_rows(&self) -> &[T] {
        &self.rows
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Toggles the multi-selection mark on the row under the cursor
    pub fn toggle_mark(&mut self) {
        if let Some(&row) = self.cursor.and_then(|i| self.visible.get(i)) {
            if !self.marked.remove(&row) {
                self.marked.insert(row);
            }
        }
    }

    pub fn mark_all_visible(&mut self) {
        if self.marked.len() == self.visible.len() {
            self.marked.clear();
        } else {
            self.marked = self.visible.iter().copied().collect();
        }
    }

    pub fn is_marked(&self, visible_index: usize) -> bool {
        self.visible.get(visible_index).map_or(false, |row| self.marked.contains(row))
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Marked rows, or the row under the cursor when nothing is marked
    pub fn marked_or_selected(&self) -> Vec<&T> {
        if self.marked.is_empty() {
            self.selected().into_iter().collect()
        } else {
            self.marked.iter().filter_map(|&i| self.rows.get(i)).collect()
        }
    }

    pub fn list_state(&self) -> ListState {
        let mut state = ListState::default();
        state.select(self.cursor);
        state
    }

    pub fn table_state(&self) -> TableState {
        let mut state = TableState::default();
        state.select(self.cursor);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str);

    impl Filterable for Row {
        fn search_text(&self) -> String {
            self.0.to_string()
        }
    }

    fn list() -> Selectable<Row> {
        Selectable::new(vec![Row("alpha"), Row("beta"), Row("alphabet"), Row("gamma")])
    }

    #[test]
    fn cursor_wraps_both_ways() {
        let mut list = list();
        assert_eq!(list.selected().map(|r| r.0), Some("alpha"));
        list.previous();
        assert_eq!(list.selected().map(|r| r.0), Some("gamma"));
        list.next();
        assert_eq!(list.selected().map(|r| r.0), Some("alpha"));
    }

    #[test]
    fn query_narrows_visible_rows_and_clamps_cursor() {
        let mut list = list();
        list.next();
        list.next();
        list.next();
        list.set_query("alpha");
        assert_eq!(list.visible_len(), 2);
        assert_eq!(list.selected().map(|r| r.0), Some("alphabet"));
    }

    #[test]
    fn empty_result_has_no_selection() {
        let mut list = list();
        list.set_query("zeta");
        assert!(list.selected().is_none());
        list.next();
        assert!(list.selected().is_none());
        assert!(list.marked_or_selected().is_empty());
    }

    #[test]
    fn marks_follow_rows_and_drop_when_filtered_out() {
        let mut list = list();
        list.toggle_mark();
        list.next();
        list.toggle_mark();
        assert_eq!(list.marked_count(), 2);

        list.set_query("alpha");
        assert_eq!(list.marked_count(), 1);
        assert_eq!(list.marked_or_selected().iter().map(|r| r.0).collect::<Vec<_>>(), vec!["alpha"]);
    }

    #[test]
    fn mark_all_toggles() {
        let mut list = list();
        list.mark_all_visible();
        assert_eq!(list.marked_count(), 4);
        list.mark_all_visible();
        assert_eq!(list.marked_count(), 0);
        assert_eq!(list.marked_or_selected().len(), 1);
    }
}
