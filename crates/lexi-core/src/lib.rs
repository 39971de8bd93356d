#![deny(clippy::all, warnings)]

//! Data plane for the lexi word game: durable document stores, the
//! content-addressed provider import pipeline, and the language registry
//! that activates imported word pools for live traffic.

pub mod catalog;
pub mod config;
pub mod data_plane;
pub mod docstore;
pub mod fsx;
pub mod import;
pub mod pipeline;
pub mod registry;
pub mod stores;
pub(crate) mod timefmt;

pub use lexi_domain::manifest::FilterMode;
pub use lexi_domain::store::{
    AppConfigState, ImportJob, JobStatus, JobsState, LanguageEntry, LeaderboardState,
    RegistryState,
};
pub use lexi_domain::{ChecksumHex, CommitId, Variant};

pub use catalog::{Catalog, CatalogLanguage, CatalogSnapshot};
pub use config::{Config, DataLocation, NetworkConfig, UpstreamConfig};
pub use data_plane::DataPlane;
pub use docstore::{DocStore, StoreSchema};
pub use fsx::{write_atomic, WriteError};
pub use import::{run_import, ImportReport, ImportRequest};
pub use pipeline::{
    expand::expand_forms,
    fetch::{fetch_and_verify, FetchOutcome, FetchRequest, Fetcher, SystemFetcher},
    filter::filter_answers,
    paths::CommitDir,
    pool::derive_pools,
    PipelineError,
};
pub use registry::RegistryStore;
pub use stores::{AppConfigStore, JobsStore, LeaderboardStore};
