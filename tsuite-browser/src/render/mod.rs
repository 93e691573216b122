//! HTML rendering for the result browser
//!
//! Every view binds to a container with a stable id. Chart layout is handed
//! to Google Charts through embedded data tables; tables and the sensor heat
//! grid are rendered here. A view whose data could not be loaded renders a
//! placeholder in its container instead of staying empty.

pub mod charts;
pub mod heatgrid;
pub mod layout;
pub mod pages;
pub mod tables;

use serde::Serialize;
use tsuite_common::{DisplayConfig, TestSetId, TsuiteError};

use crate::utils::{escape_html, file_slug};

pub use pages::{sense_page, summary_page, test_page, RenderedPage};

/// Container ids shared by the pages and their scripts
pub mod containers {
    pub const SIDEBAR: &str = "sidebar";
    pub const CHANGE_TABLE: &str = "change_table";
    pub const CHANGE_CHART: &str = "chart_div";
    pub const CLIENT_TREEMAP: &str = "client_treemap";
    pub const CLIENT_BLOB: &str = "client_blob";
    pub const CLIENT_BREAKDOWN: &str = "client_breakdown";
    pub const HISTORY: &str = "test_history";
    pub const HEAT_GRID: &str = "main";
}

/// How pages link to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// Routes of the dashboard server
    Server,
    /// Files of a static report; `depth` is the page's directory depth
    /// below the report root.
    Static { depth: usize },
}

/// Everything a renderer needs besides the data itself
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub display: &'a DisplayConfig,
    pub links: LinkStyle,
}

impl<'a> PageContext<'a> {
    pub fn new(display: &'a DisplayConfig, links: LinkStyle) -> Self {
        Self { display, links }
    }

    /// Same context for a page `depth` directories below the report root
    pub fn at_depth(self, depth: usize) -> Self {
        match self.links {
            LinkStyle::Server => self,
            LinkStyle::Static { .. } => Self {
                links: LinkStyle::Static { depth },
                ..self
            },
        }
    }

    fn root(&self) -> String {
        match self.links {
            LinkStyle::Server => "/".to_string(),
            LinkStyle::Static { depth } => "../".repeat(depth),
        }
    }

    pub fn home_url(&self) -> String {
        match self.links {
            LinkStyle::Server => "/".to_string(),
            LinkStyle::Static { .. } => format!("{}index.html", self.root()),
        }
    }

    /// Static reports hold a single test set, so every set links home there
    pub fn set_url(&self, tsid: TestSetId) -> String {
        match self.links {
            LinkStyle::Server => format!("/tsets/{}", tsid),
            LinkStyle::Static { .. } => self.home_url(),
        }
    }

    pub fn test_url(&self, tsid: TestSetId, test_name: &str) -> String {
        match self.links {
            LinkStyle::Server => format!("/tsets/{}/tests/{}", tsid, urlencoding::encode(test_name)),
            LinkStyle::Static { .. } => format!("{}tests/{}.html", self.root(), file_slug(test_name)),
        }
    }

    pub fn sense_url(&self) -> String {
        match self.links {
            LinkStyle::Server => "/sense".to_string(),
            LinkStyle::Static { .. } => format!("{}sense.html", self.root()),
        }
    }
}

/// Why a container could not be filled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub code: &'static str,
    pub message: String,
}

impl Failure {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&TsuiteError> for Failure {
    fn from(error: &TsuiteError) -> Self {
        Failure::new(error.code(), error.to_string())
    }
}

impl From<TsuiteError> for Failure {
    fn from(error: TsuiteError) -> Self {
        Failure::from(&error)
    }
}

/// Wrap rendered markup in its container
pub fn container(id: &str, class: &str, inner: &str) -> String {
    format!(
        r#"<div id="{}" class="{}">{}</div>"#,
        escape_html(id),
        escape_html(class),
        inner
    )
}

/// Visible stand-in for a container whose data failed to load
pub fn placeholder(id: &str, failure: &Failure) -> String {
    let heading = match failure.code {
        "fetch" | "io" => "Data could not be fetched",
        "malformed_data" => "Data is malformed",
        "not_found" => "Nothing to show",
        _ => "Rendering failed",
    };
    format!(
        r#"<div id="{}" class="placeholder alert alert-warning" data-error="{}">
    <strong><i class="fas fa-exclamation-triangle me-2"></i>{}</strong>
    <p class="mb-0">{}</p>
</div>"#,
        escape_html(id),
        failure.code,
        heading,
        escape_html(&failure.message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_and_static_links() {
        let display = DisplayConfig::default();
        let server = PageContext::new(&display, LinkStyle::Server);
        assert_eq!(server.set_url(4), "/tsets/4");
        assert_eq!(server.test_url(4, "huge seek"), "/tsets/4/tests/huge%20seek");
        assert_eq!(server.test_url(4, "a/b"), "/tsets/4/tests/a%2Fb");

        let root = PageContext::new(&display, LinkStyle::Static { depth: 0 });
        assert_eq!(root.test_url(4, "read"), "tests/read.html");
        assert_eq!(root.test_url(4, "huge seek"), "tests/huge.20seek.html");
        let nested = root.at_depth(1);
        assert_eq!(nested.home_url(), "../index.html");
        assert_eq!(nested.sense_url(), "../sense.html");
    }

    #[test]
    fn test_placeholder_is_visible_and_escaped() {
        let failure = Failure::from(TsuiteError::MalformedData("<bad> field".to_string()));
        let html = placeholder("client_treemap", &failure);
        assert!(html.contains(r#"id="client_treemap""#));
        assert!(html.contains(r#"data-error="malformed_data""#));
        assert!(html.contains("Data is malformed"));
        assert!(html.contains("&lt;bad&gt; field"));
    }
}
