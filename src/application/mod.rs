pub mod query;
pub mod selection;
pub mod settings;
pub mod table;

// Re-export key types for convenience
pub use query::{
    AccumulatorSnapshot, DebouncedQuery, DedupSource, InfiniteQuery, LoadOutcome, LoadState,
    PageAccumulator, QueryBinding, Viewport,
};
pub use selection::SelectionSet;
pub use settings::{parse_reason_list, ReasonSettings, SettingsError};
pub use table::{PagedTable, TableTicket};
