//! Static HTML report generation
//!
//! Writes the same views the dashboard serves as plain files: `index.html`
//! for one test set, `tests/<test>.html` per test and, when sensor readings
//! are given, `sense.html`. A `manifest.json` records what was written.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tsuite_common::{DisplayConfig, Result, SensorReadings, TestSetId};

use crate::archive::TestArchive;
use crate::render::{sense_page, summary_page, test_page, Failure, LinkStyle, PageContext, RenderedPage};
use crate::utils::file_slug;

/// Configuration for report generation
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub display: DisplayConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./tsuite-report"),
            display: DisplayConfig::default(),
        }
    }
}

/// Builder for [`ReportConfig`]
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.config.display.site_title = title.into();
        self
    }

    pub fn change_threshold(mut self, threshold: f64) -> Self {
        self.config.display.change_threshold = threshold;
        self
    }

    pub fn display(mut self, display: DisplayConfig) -> Self {
        self.config.display = display;
        self
    }

    pub fn build(self) -> ReportConfig {
        self.config
    }
}

/// What a report run wrote
#[derive(Debug, Clone, Serialize)]
pub struct ReportManifest {
    pub generated_at: DateTime<Utc>,
    pub tsid: Option<TestSetId>,
    pub pages: Vec<PathBuf>,
    /// Failures shown as placeholders somewhere in the report
    pub failures: Vec<Failure>,
}

impl ReportManifest {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes static reports
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Write the report for set `tsid` (latest when `None`).
    ///
    /// Load failures passed in become placeholders; only file system errors
    /// fail the call.
    pub fn generate(
        &self,
        archive: std::result::Result<&TestArchive, &Failure>,
        tsid: Option<TestSetId>,
        sensors: Option<std::result::Result<&SensorReadings, &Failure>>,
    ) -> Result<ReportManifest> {
        let out = &self.config.output_dir;
        fs::create_dir_all(out.join("tests"))?;

        let root = PageContext::new(&self.config.display, LinkStyle::Static { depth: 0 });
        let nested = root.at_depth(1);

        let selected = archive
            .ok()
            .and_then(|a| tsid.map_or_else(|| a.latest(), |id| a.get(id)));

        let mut manifest = ReportManifest {
            generated_at: Utc::now(),
            tsid: selected.map(|s| s.tsid),
            pages: Vec::new(),
            failures: Vec::new(),
        };

        let index = summary_page(&root, archive, tsid);
        self.write_page(&mut manifest, PathBuf::from("index.html"), index)?;

        if let (Ok(archive), Some(set)) = (archive, selected) {
            for group in &set.groups {
                let page = test_page(&nested, Ok(archive), set.tsid, &group.name);
                let relative = PathBuf::from("tests").join(format!("{}.html", file_slug(&group.name)));
                self.write_page(&mut manifest, relative, page)?;
            }
        }

        if let Some(readings) = sensors {
            let page = sense_page(&root, readings);
            self.write_page(&mut manifest, PathBuf::from("sense.html"), page)?;
        }

        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        fs::write(out.join("manifest.json"), manifest_json)?;

        if manifest.is_complete() {
            info!("Report with {} pages written to {}", manifest.pages.len(), out.display());
        } else {
            warn!(
                "Report written to {} with {} placeholder failures",
                out.display(),
                manifest.failures.len()
            );
        }
        Ok(manifest)
    }

    fn write_page(&self, manifest: &mut ReportManifest, relative: PathBuf, page: RenderedPage) -> Result<()> {
        let path = self.config.output_dir.join(&relative);
        debug!("Writing {} ({})", path.display(), page.title);
        fs::write(&path, page.html)?;
        if let Some(failure) = page.failure {
            manifest.failures.push(failure);
        }
        manifest.pages.push(relative);
        Ok(())
    }
}
