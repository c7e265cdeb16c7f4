use rusqlite::ToSql;

use crate::error::{AppError, AppResult};

/// Builds the SET clause of a partial UPDATE from whichever fields the
/// caller actually supplied. Placeholders are positional (`?1`, `?2`, ...)
/// with the WHERE key slotted in after the last SET value.
#[derive(Default)]
pub struct PartialUpdate {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl PartialUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include `column` in the SET clause when `value` is present.
    pub fn set<T: ToSql + 'static>(&mut self, column: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.columns.push(column);
            self.values.push(Box::new(value));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `"first_name = ?1, email = ?2"`
    pub fn set_clause(&self) -> String {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Placeholder index for the WHERE key, one past the SET values.
    pub fn key_index(&self) -> usize {
        self.values.len() + 1
    }

    /// SET values followed by the WHERE key, ready for `params_from_iter`.
    pub fn params_with<'a>(&'a self, key: &'a dyn ToSql) -> Vec<&'a dyn ToSql> {
        self.values
            .iter()
            .map(|v| v.as_ref())
            .chain(std::iter::once(key))
            .collect()
    }

    /// Fail with BadRequest when no fields were supplied.
    pub fn require_fields(&self) -> AppResult<()> {
        if self.is_empty() {
            Err(AppError::BadRequest("No data".into()))
        } else {
            Ok(())
        }
    }
}
