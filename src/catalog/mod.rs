//! The video catalog: merged view of the external feed and persisted
//! uploads, plus the upload and delete pipelines.

pub mod delete;
pub mod entry;
pub mod external;
pub mod filter;
pub mod orphan;
pub mod projection;
pub mod service;
pub mod upload;

pub use entry::VideoEntry;
pub use external::ExternalFeed;
pub use filter::{filter, ALL_CATEGORIES};
pub use orphan::OrphanPolicyKind;
pub use projection::CatalogProjection;
pub use service::CatalogService;
pub use upload::{UploadRequest, VideoFile};
