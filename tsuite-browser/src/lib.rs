//! TSuite result browser
//!
//! This crate turns test-suite telemetry into browsable views. It includes:
//! - Aggregation of run records into per-test summaries
//! - Change tracking against earlier test sets
//! - HTML rendering (treemap, change chart and table, client views, heat grid)
//! - A dashboard server and a static report writer
//! - Disk error collection for the sensor heat grid

pub mod aggregate;
pub mod archive;
pub mod color;
pub mod generate;
pub mod history;
pub mod render;
pub mod report;
pub mod sense;
pub mod server;
pub mod source;
pub mod utils;

pub use aggregate::{color_intensity, summarize, summarize_set, SetTotals, Summary};
pub use archive::{ArchiveStatistics, TestArchive, TestSetListing};
pub use color::{color_shade, Rgb};
pub use history::{classify_change, display_set, ChangeClass, DisplaySet, TestChange};
pub use render::{Failure, LinkStyle, PageContext};
pub use report::{ReportConfig, ReportConfigBuilder, ReportGenerator, ReportManifest};
pub use source::DataSource;
