//! Core dashboard logic: pivot grids, filtered paging, session and kinds

pub mod error;
pub mod export;
pub mod fetcher;
pub mod kinds;
pub mod models;
pub mod pivot;
pub mod query;
pub mod session;
pub mod time;

pub use error::{
    CoreError, CoreResult, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorLogger,
    ErrorSeverity, FetchError,
};
pub use export::{export_pivot_csv, write_pivot_csv, ExportOptions};
pub use fetcher::{FetchStatus, FnSource, Notice, PageSource, PagedFetcher, ViewState};
pub use kinds::{ActivityItem, ActivityKind, KindStyle, ReminderKind};
pub use models::{FetchResult, PageResponse, Pagination, TransactionRecord};
pub use pivot::{PivotChild, PivotGroup, PivotMemo, PivotTable};
pub use query::{FilterState, FilterUpdate, PageQuery, SortSpec};
pub use session::{Session, SessionContext};
pub use time::{CalendarMonth, DateRange};
