//! Filesystem persistence for aggregate reports.
//!
//! One JSON document per report, laid out as
//! `{data_dir}/reports/{owner_id|anonymous}/{owner}/{repo}/{commit}.json`.
//! The path is the key: writing the same `(owner_id, owner, repo, commit)`
//! again replaces the document, which makes webhook re-delivery
//! idempotent without any index.
//!
//! Writes go through a sibling temp file and a rename, so readers never
//! observe a half-written report.

pub mod store;

pub use store::ReportStore;
