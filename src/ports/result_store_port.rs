//! Saved-results registry port trait.

use crate::domain::error::BiasTraderError;
use crate::domain::saved::SavedRecord;

/// Symbol-keyed store of winning parameters.
pub trait ResultStorePort {
    /// Inserts or replaces the record for `record.symbol`. An existing
    /// record's starred flag is kept.
    fn save(&self, record: &SavedRecord) -> Result<(), BiasTraderError>;

    fn load(&self, symbol: &str) -> Result<Option<SavedRecord>, BiasTraderError>;

    /// All records, actionable first and then by profit percent.
    fn list(&self) -> Result<Vec<SavedRecord>, BiasTraderError>;

    /// Returns false when no record existed.
    fn remove(&self, symbol: &str) -> Result<bool, BiasTraderError>;

    /// Returns false when no record existed.
    fn set_starred(&self, symbol: &str, starred: bool) -> Result<bool, BiasTraderError>;

    fn clear(&self) -> Result<(), BiasTraderError>;
}
