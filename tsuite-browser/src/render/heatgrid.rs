//! Disk sensor heat grid
//!
//! One panel per sensor, four panels per row. Inside a panel every disk is a
//! cell shaded from white (idle) to the base color (busiest disk of that
//! sensor).

use tsuite_common::{Result, SensorReadings};

use super::containers;
use crate::aggregate::color_intensity;
use crate::color::color_shade;
use crate::utils::{escape_html, natural_cmp};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 800.0;
const MARGIN: f64 = 10.0;
const PAD: f64 = 5.0;
const PANELS_PER_ROW: usize = 4;

const INNER_MARGIN: f64 = 5.0;
const INNER_X_PAD: f64 = 2.0;
const INNER_Y_PAD: f64 = 6.0;
const TEXT_PAD: f64 = 14.0;
const CELLS_PER_ROW: usize = 3;
const MIN_CELL_ROWS: usize = 4;

/// Position and size of a rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Panel rectangle of sensor number `index` among `count` sensors
pub fn panel_rect(index: usize, count: usize) -> Rect {
    let rows = count.div_ceil(PANELS_PER_ROW).max(1);
    let cols = PANELS_PER_ROW as f64;
    let width = (WIDTH - 2.0 * MARGIN - (cols - 1.0) * PAD) / cols;
    let height = (HEIGHT - 2.0 * MARGIN - (rows as f64 - 1.0) * PAD) / rows as f64;

    Rect {
        x: MARGIN + (index % PANELS_PER_ROW) as f64 * (width + PAD),
        y: MARGIN + (index / PANELS_PER_ROW) as f64 * (height + PAD),
        width,
        height,
    }
}

/// Cell rectangle of disk number `index` among `count` disks inside `panel`
pub fn cell_rect(panel: Rect, index: usize, count: usize) -> Rect {
    let rows = count.div_ceil(CELLS_PER_ROW).max(MIN_CELL_ROWS);
    let cols = CELLS_PER_ROW as f64;
    let top = panel.y + TEXT_PAD + INNER_MARGIN;
    let width = (panel.width - 2.0 * INNER_MARGIN - (cols - 1.0) * INNER_X_PAD) / cols;
    let height =
        (panel.y + panel.height - INNER_MARGIN - top - (rows as f64 - 1.0) * INNER_Y_PAD) / rows as f64;

    Rect {
        x: panel.x + INNER_MARGIN + (index % CELLS_PER_ROW) as f64 * (width + INNER_X_PAD),
        y: top + (index / CELLS_PER_ROW) as f64 * (height + INNER_Y_PAD),
        width,
        height,
    }
}

/// Render the heat grid as an SVG inside its container.
///
/// Fails only when `base_color` is not a valid hex color.
pub fn heat_grid(readings: &SensorReadings, base_color: &str) -> Result<String> {
    let mut sensors: Vec<&String> = readings.keys().collect();
    sensors.sort_by(|a, b| natural_cmp(a, b));

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = WIDTH,
        h = HEIGHT
    );

    for (index, sensor) in sensors.iter().enumerate() {
        let panel = panel_rect(index, sensors.len());
        let disks = &readings[*sensor];
        let intensity = color_intensity(disks.iter());

        let mut labels: Vec<&String> = disks.keys().collect();
        labels.sort_by(|a, b| natural_cmp(a, b));

        svg.push_str(&format!(
            r#"
    <g class="sensor" data-sensor="{name}">
        <rect x="{x}" y="{y}" width="{w}" height="{h}" fill="black"/>
        <text x="{tx}" y="{ty}" fill="white" font-size="12">{name}</text>
        <line x1="{x}" y1="{ly}" x2="{lx2}" y2="{ly}" stroke="white"/>"#,
            name = escape_html(sensor),
            x = panel.x,
            y = panel.y,
            w = panel.width,
            h = panel.height,
            tx = panel.x + INNER_MARGIN,
            ty = panel.y + TEXT_PAD - 2.0,
            ly = panel.y + TEXT_PAD,
            lx2 = panel.x + panel.width,
        ));

        for (cell_index, label) in labels.iter().enumerate() {
            let cell = cell_rect(panel, cell_index, labels.len());
            let level = intensity.get(*label).copied().unwrap_or(0.0);
            let fill = color_shade(base_color, 1.0 - level)?;
            let text_color = if level > 0.5 { "white" } else { "black" };

            svg.push_str(&format!(
                r#"
        <g class="disk" data-disk="{label}">
            <rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{fill}"/>
            <text x="{tx:.1}" y="{ty:.1}" fill="{text_color}" font-size="8">{label}</text>
            <text x="{tx:.1}" y="{ty2:.1}" fill="{text_color}" font-size="8">{value}</text>
        </g>"#,
                label = escape_html(label),
                x = cell.x,
                y = cell.y,
                w = cell.width,
                h = cell.height,
                fill = fill,
                tx = cell.x + 2.0,
                ty = cell.y + 9.0,
                ty2 = cell.y + 18.0,
                text_color = text_color,
                value = disks[*label],
            ));
        }

        svg.push_str("\n    </g>");
    }

    svg.push_str("\n</svg>");
    Ok(format!(r#"<div id="{}">{}</div>"#, containers::HEAT_GRID, svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tsuite_common::TsuiteError;

    fn readings() -> SensorReadings {
        let mut sense0 = BTreeMap::new();
        sense0.insert("sdiska0-front".to_string(), 10.0);
        sense0.insert("sdiska1-front".to_string(), 5.0);
        sense0.insert("sdiska10-front".to_string(), 0.0);
        let mut readings = BTreeMap::new();
        readings.insert("sense0".to_string(), sense0);
        readings.insert("sense1".to_string(), BTreeMap::new());
        readings
    }

    #[test]
    fn test_busiest_disk_is_base_color() {
        let html = heat_grid(&readings(), "#FF0000").unwrap();
        assert!(html.starts_with(r#"<div id="main"><svg"#));
        assert!(html.contains(r#"width="800" height="800""#));
        assert!(html.contains(r##"fill="#ff0000""##));
        assert!(html.contains(r##"fill="#ffffff""##));
        assert!(html.contains(r#"data-sensor="sense1""#));
    }

    #[test]
    fn test_labels_in_natural_order() {
        let html = heat_grid(&readings(), "#FF0000").unwrap();
        let one = html.find(r#"data-disk="sdiska1-front""#).unwrap();
        let ten = html.find(r#"data-disk="sdiska10-front""#).unwrap();
        assert!(one < ten);
    }

    #[test]
    fn test_invalid_base_color() {
        let result = heat_grid(&readings(), "red");
        assert!(matches!(result, Err(TsuiteError::InvalidColor(_))));
    }

    #[test]
    fn test_panel_layout() {
        let first = panel_rect(0, 8);
        let fifth = panel_rect(4, 8);
        assert_eq!(first.x, MARGIN);
        assert_eq!(fifth.x, MARGIN);
        assert!(fifth.y > first.y + first.height);

        let last = panel_rect(7, 8);
        assert!(last.x + last.width <= WIDTH - MARGIN + 1e-9);
        assert!(last.y + last.height <= HEIGHT - MARGIN + 1e-9);
    }

    #[test]
    fn test_cells_stay_inside_panel() {
        let panel = panel_rect(0, 8);
        for index in 0..22 {
            let cell = cell_rect(panel, index, 22);
            assert!(cell.x >= panel.x && cell.x + cell.width <= panel.x + panel.width + 1e-9);
            assert!(cell.y >= panel.y && cell.y + cell.height <= panel.y + panel.height + 1e-9);
        }
    }
}
