use crate::error::{OrmError, OrmResult};
use serde_json::Value;

/// Start position and width of one named slice of a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub start: usize,
    pub count: usize,
}

/// Offset table over flat result rows.
///
/// Slices are registered once, back to back, then every fetched row is
/// [`load`](Self::load)ed and cut into its registered slices.
#[derive(Debug, Clone, Default)]
pub struct RowCursor {
    offsets: Vec<(String, Offset)>,
    width: usize,
    row: Option<Vec<Value>>,
}

impl RowCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slice of `count` columns after everything registered so far.
    pub fn register(&mut self, name: impl Into<String>, count: usize) -> Offset {
        let offset = Offset {
            start: self.width,
            count,
        };
        self.offsets.push((name.into(), offset));
        self.width += count;
        offset
    }

    pub fn offset(&self, name: &str) -> Option<Offset> {
        self.offsets
            .iter()
            .find_map(|(n, offset)| (n == name).then_some(*offset))
    }

    /// Total number of columns a row must carry.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Replace the current row.
    pub fn load(&mut self, row: Vec<Value>) -> OrmResult<()> {
        if row.len() < self.width {
            return Err(OrmError::hydration(format!(
                "row has {} values, offsets cover {}",
                row.len(),
                self.width
            )));
        }
        self.row = Some(row);
        Ok(())
    }

    pub fn slice(&self, name: &str) -> OrmResult<&[Value]> {
        let row = self
            .row
            .as_deref()
            .ok_or_else(|| OrmError::hydration("no row loaded"))?;
        let offset = self
            .offset(name)
            .ok_or_else(|| OrmError::hydration(format!("no offset registered for '{name}'")))?;
        Ok(&row[offset.start..offset.start + offset.count])
    }

    /// The first value of a slice; used for single-slot entries such as a window total.
    pub fn get(&self, name: &str) -> OrmResult<&Value> {
        self.slice(name)?
            .first()
            .ok_or_else(|| OrmError::hydration(format!("slice '{name}' is empty")))
    }
}
