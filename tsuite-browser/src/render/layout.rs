//! Page shell shared by every view

use super::PageContext;
use crate::utils::escape_html;

const CHARTS_LOADER: &str = "https://www.gstatic.com/charts/loader.js";
const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css";
const FONT_AWESOME_CSS: &str = "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css";

/// Complete HTML document around `body`
pub fn page(ctx: &PageContext<'_>, title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - {site_title}</title>

    <!-- Bootstrap CSS -->
    <link href="{bootstrap}" rel="stylesheet">
    <!-- Font Awesome -->
    <link href="{font_awesome}" rel="stylesheet">
    <!-- Google Charts -->
    <script src="{loader}"></script>
    <script>
        google.charts.load('current', {{packages: ['corechart', 'treemap']}});
    </script>
    <style>{css}</style>
</head>
<body>
    <div class="container-fluid">
        {navbar}
        <div class="row mt-4">
{body}
        </div>
    </div>
</body>
</html>
"#,
        title = escape_html(title),
        site_title = escape_html(&ctx.display.site_title),
        bootstrap = BOOTSTRAP_CSS,
        font_awesome = FONT_AWESOME_CSS,
        loader = CHARTS_LOADER,
        css = inline_css(),
        navbar = navbar(ctx),
        body = body,
    )
}

fn navbar(ctx: &PageContext<'_>) -> String {
    format!(
        r#"<nav class="navbar navbar-expand-lg navbar-dark bg-primary">
            <div class="container-fluid">
                <a class="navbar-brand" href="{home}">
                    <i class="fas fa-vial me-2"></i>{nav_title}
                </a>
                <div class="navbar-nav ms-auto">
                    <a class="nav-link" href="{home}">Latest</a>
                    <a class="nav-link" href="{sense}">Disk Sensors</a>
                </div>
            </div>
        </nav>"#,
        home = escape_html(&ctx.home_url()),
        sense = escape_html(&ctx.sense_url()),
        nav_title = escape_html(&ctx.display.nav_title),
    )
}

/// Bootstrap card with a header around `inner`
pub fn card(icon: &str, heading: &str, inner: &str) -> String {
    format!(
        r#"
                <div class="card mb-4">
                    <div class="card-header">
                        <h5><i class="fas {} me-2"></i>{}</h5>
                    </div>
                    <div class="card-body">
                        {}
                    </div>
                </div>"#,
        icon,
        escape_html(heading),
        inner
    )
}

fn inline_css() -> &'static str {
    r#"
        .placeholder { min-height: 4rem; }
        .change-regressed { color: #A45A52; font-weight: bold; }
        .change-improved { color: #00703C; font-weight: bold; }
        .change-neutral { color: #0F4D92; }
        .test-fail { background-color: #f8d7da; }
        #client_treemap { width: 100%; height: 500px; }
        #chart_div { width: 100%; height: 350px; }
        .history-chart { width: 100%; height: 300px; }
        #sidebar .list-group-item.active a { color: #fff; }
    "#
}
