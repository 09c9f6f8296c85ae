//! Result presentation model.
//!
//! Translates request states into list-level events and maintains the
//! materialized row list. This is the only piece that talks to the
//! presentation layer; everything it emits is one of four events.

use crate::categories::Category;
use crate::coordinator::QUERY_EXHAUSTED;
use crate::row::Row;
use larder_core::{Recipe, Resource};

/// A list-level change the frontend applies to its view.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    /// Replace the whole list with these rows.
    Replace(Vec<Row>),
    /// Append the loading marker at the end of the list.
    AppendLoading,
    /// Remove the loading marker.
    RemoveLoading,
    /// Append the terminal exhausted marker.
    AppendExhausted,
}

/// Maintains the presented row list and derives [`ListEvent`]s from
/// request state transitions.
#[derive(Debug, Default)]
pub struct ResultPresenter {
    rows: Vec<Row>,
    loading_shown: bool,
}

impl ResultPresenter {
    /// Creates a presenter with an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the currently presented rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Handles one request state for the given page, returning the
    /// events applied to the list, in order.
    pub fn on_resource(&mut self, page: u32, resource: &Resource<Vec<Recipe>>) -> Vec<ListEvent> {
        match resource {
            Resource::Loading(_) => {
                if page <= 1 {
                    // First page: nothing worth keeping on screen.
                    vec![self.apply(ListEvent::Replace(vec![Row::Loading]))]
                } else if !self.loading_shown {
                    vec![self.apply(ListEvent::AppendLoading)]
                } else {
                    Vec::new()
                }
            }
            Resource::Success(items) => {
                let rows = items.iter().cloned().map(Row::Recipe).collect();
                vec![self.apply(ListEvent::Replace(rows))]
            }
            Resource::Error { message, .. } if message == QUERY_EXHAUSTED => {
                let mut events = Vec::new();
                if self.loading_shown {
                    events.push(self.apply(ListEvent::RemoveLoading));
                }
                events.push(self.apply(ListEvent::AppendExhausted));
                events
            }
            Resource::Error { .. } => {
                // Genuine failure: keep the last known list on screen.
                if self.loading_shown {
                    vec![self.apply(ListEvent::RemoveLoading)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Replaces the list with category placeholder rows.
    pub fn show_categories(&mut self, categories: &[Category]) -> Vec<ListEvent> {
        let rows = categories
            .iter()
            .map(|category| Row::Category {
                label: category.label.clone(),
                image_key: category.image_key.clone(),
            })
            .collect();
        vec![self.apply(ListEvent::Replace(rows))]
    }

    fn apply(&mut self, event: ListEvent) -> ListEvent {
        match &event {
            ListEvent::Replace(rows) => {
                self.rows = rows.clone();
                self.loading_shown = self.rows.iter().any(Row::is_loading);
            }
            ListEvent::AppendLoading => {
                self.rows.push(Row::Loading);
                self.loading_shown = true;
            }
            ListEvent::RemoveLoading => {
                self.rows.retain(|row| !row.is_loading());
                self.loading_shown = false;
            }
            ListEvent::AppendExhausted => {
                self.rows.push(Row::Exhausted);
            }
        }
        event
    }
}
