//! Launch accounts: decoding, normalization and the catalogue views

pub mod amount;
pub mod catalog;
pub mod contribution;
pub mod normalize;
pub mod raw;
pub mod source;
pub mod state;

pub use catalog::{
    refresh_detail, refresh_record, Catalog, CatalogFilter, ContributeFilter, RefreshOutcome, SortDirection,
    SortField,
};
pub use normalize::{normalize, normalize_at, CampaignRecord, DisplayMeta};
pub use raw::{LaunchAccountEntry, RawLaunch};
pub use source::{AccountSource, JsonSnapshotSource, SourceError};
pub use state::{LaunchState, LaunchVersion};
