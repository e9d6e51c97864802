use crate::services::excel::ProcessedSheet;
use moka::sync::Cache;
use std::sync::Arc;

/// In-memory stand-in for the document store, keyed by (file id, sheet name).
/// A `get` miss followed by `insert` is not atomic; concurrent parses of the
/// same key may both run.
#[derive(Clone)]
pub struct SheetStore {
    sheets: Cache<(String, String), Arc<ProcessedSheet>>,
}

impl SheetStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            sheets: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn get(&self, file_id: &str, sheet_name: &str) -> Option<Arc<ProcessedSheet>> {
        self.sheets.get(&(file_id.to_string(), sheet_name.to_string()))
    }

    /// Replaces whatever was stored for the same file and sheet.
    pub fn insert(&self, file_id: &str, sheet: ProcessedSheet) -> Arc<ProcessedSheet> {
        let sheet = Arc::new(sheet);
        tracing::debug!("Storing processed sheet {} for file {}", sheet.sheet_name, file_id);
        self.sheets
            .insert((file_id.to_string(), sheet.sheet_name.clone()), Arc::clone(&sheet));
        sheet
    }

    /// Drops every sheet stored for `file_id`.
    pub fn invalidate_file(&self, file_id: &str) {
        let file_id = file_id.to_string();
        for (key, _) in self.sheets.iter() {
            if key.0 == file_id {
                self.sheets.invalidate(key.as_ref());
            }
        }
    }
}
