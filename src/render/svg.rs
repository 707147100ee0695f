//! SVG comparison figure.
//!
//! # Layout
//!
//! The canvas holds two panels side by side with width ratio 1:2 and no gap:
//! a label column on the left and an error-bar panel on the right. Entries
//! are stacked top to bottom in insertion order, one row each; the value
//! column `mu ± sigma` sits at the right edge of the error-bar panel. Only
//! the bottom spine of the error-bar panel is drawn.
//!
//! ```text
//!  +----------+--------------------+
//!  | LEP      |      |--■--|       | 80376 ± 33
//!  | ATLAS    |     |--■--|        | 80370 ± 19
//!  | Ours     |   ░░|-■-|░░        | 80370 ± 12
//!  +----------+--------------------+
//!                 80400   80500
//! ```

use std::fmt::{self, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::measurement::Measurements;

use super::config::RenderConfig;

// Panel margins as fractions of the canvas.
const MARGIN_LEFT: f64 = 0.05;
const MARGIN_RIGHT: f64 = 0.85;
const MARGIN_TOP: f64 = 0.95;
const MARGIN_BOTTOM: f64 = 0.2;

const ROW_FONT_SIZE: f64 = 14.0;
const FOOTNOTE_FONT_SIZE: f64 = 10.0;
const CAP_HALF_HEIGHT: f64 = 4.0;
const MARKER_SIZE: f64 = 6.0;
const TICK_LENGTH: f64 = 5.0;

/// One drawable row.
struct Row<'a> {
    mu: f64,
    sigma: f64,
    label: &'a str,
    color: &'a str,
    emphasize: bool,
}

/// Pixel geometry shared by every element.
struct Frame {
    label_left: f64,
    plot_left: f64,
    plot_right: f64,
    top: f64,
    bottom: f64,
    x_min: f64,
    x_max: f64,
    rows: usize,
}

impl Frame {
    fn x(&self, value: f64) -> f64 {
        self.plot_left + (value - self.x_min) / (self.x_max - self.x_min) * (self.plot_right - self.plot_left)
    }

    /// Row coordinate: 0 is the bottom row, the axis spans [-0.5, rows - 0.5].
    fn y(&self, row: f64) -> f64 {
        self.bottom - (row + 0.5) / self.rows.max(1) as f64 * (self.bottom - self.top)
    }
}

/// Writes the figure to `path`.
///
/// # Errors
///
/// As [`render_to_string`], plus [`Error::Io`] if the file cannot be written.
pub fn render(data: &Measurements, config: &RenderConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let svg = render_to_string(data, config)?;
    std::fs::write(path, svg)?;
    debug!(path = %path.display(), "wrote figure");
    Ok(())
}

/// Lays out the figure as an SVG document.
///
/// Entries with `plot == false` are skipped, as are entries missing `mu` or
/// `sigma` (with a warning).
///
/// # Errors
///
/// [`Error::Render`] if the x range is empty or non-finite, or if no range
/// is configured and there is nothing to derive one from.
///
/// # Examples
///
/// ```
/// use u_combine::measurement::{Measurement, Measurements};
/// use u_combine::render::{render_to_string, RenderConfig};
///
/// let mut data = Measurements::new();
/// data.insert("lep", Measurement::new(80376.0, 33.0).with_label("LEP"));
/// let svg = render_to_string(&data, &RenderConfig::default()).unwrap();
/// assert!(svg.starts_with("<svg"));
/// assert!(svg.contains("80376 ± 33"));
/// ```
pub fn render_to_string(data: &Measurements, config: &RenderConfig) -> Result<String> {
    let rows = collect_rows(data);
    let (x_min, x_max) = match config.x_range {
        Some(range) => range,
        None => auto_range(&rows)
            .ok_or_else(|| Error::Render("no plottable entries to derive an x range from".into()))?,
    };
    if !x_min.is_finite() || !x_max.is_finite() || x_min >= x_max {
        return Err(Error::Render(format!("invalid x range [{x_min}, {x_max}]")));
    }
    let ticks = match &config.x_ticks {
        Some(t) => t.clone(),
        None => nice_ticks(x_min, x_max),
    };

    let width = config.width;
    let height = config.height;
    let label_left = MARGIN_LEFT * width;
    let right = MARGIN_RIGHT * width;
    let frame = Frame {
        label_left,
        plot_left: label_left + (right - label_left) / 3.0,
        plot_right: right,
        top: (1.0 - MARGIN_TOP) * height,
        bottom: (1.0 - MARGIN_BOTTOM) * height,
        x_min,
        x_max,
        rows: rows.len(),
    };

    let svg = write_svg(&rows, &ticks, &frame, config)
        .map_err(|e| Error::Render(e.to_string()))?;
    debug!(rows = rows.len(), x_min, x_max, "laid out figure");
    Ok(svg)
}

fn collect_rows(data: &Measurements) -> Vec<Row<'_>> {
    data.iter()
        .filter(|(_, m)| m.plot)
        .filter_map(|(name, m)| match m.value() {
            Some((mu, sigma)) => Some(Row {
                mu,
                sigma,
                label: &m.label,
                color: &m.color,
                emphasize: m.emphasize,
            }),
            None => {
                warn!(entry = name, "skipping entry without mu and sigma");
                None
            }
        })
        .collect()
}

/// Data extent padded by 10% and widened to whole tick steps.
fn auto_range(rows: &[Row<'_>]) -> Option<(f64, f64)> {
    let lo = rows.iter().map(|r| r.mu - r.sigma).fold(f64::INFINITY, f64::min);
    let hi = rows.iter().map(|r| r.mu + r.sigma).fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let span = hi - lo;
    let pad = if span > 0.0 { 0.1 * span } else { lo.abs().max(1.0) * 0.01 };
    let (lo, hi) = (lo - pad, hi + pad);
    let step = nice_step((hi - lo) / 4.0);
    Some(((lo / step).floor() * step, (hi / step).ceil() * step))
}

/// Smallest of 1, 2, 5 × 10ᵏ that is at least `raw`.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn nice_ticks(x_min: f64, x_max: f64) -> Vec<f64> {
    let step = nice_step((x_max - x_min) / 4.0);
    let eps = step * 1e-9;
    let first = (x_min / step - 1e-9).ceil() as i64;
    let last = (x_max / step + 1e-9).floor() as i64;
    (first..=last)
        .map(|k| k as f64 * step)
        .filter(|&t| t >= x_min - eps && t <= x_max + eps)
        .collect()
}

/// Fewest decimals (up to 6) that print every tick exactly.
fn tick_decimals(ticks: &[f64]) -> usize {
    const MAX_DECIMALS: usize = 6;
    (0..MAX_DECIMALS)
        .find(|&d| {
            let scale = 10f64.powi(d as i32);
            ticks
                .iter()
                .filter(|t| t.is_finite())
                .all(|t| {
                    let scaled = t * scale;
                    (scaled - scaled.round()).abs() <= 1e-6 * scaled.abs().max(1.0)
                })
        })
        .unwrap_or(MAX_DECIMALS)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn weight(emphasize: bool) -> &'static str {
    if emphasize {
        "bold"
    } else {
        "normal"
    }
}

fn write_svg(
    rows: &[Row<'_>],
    ticks: &[f64],
    frame: &Frame,
    config: &RenderConfig,
) -> std::result::Result<String, fmt::Error> {
    let mut svg = String::new();
    let style = config.text_style;
    let n = rows.len();

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = config.width,
        h = config.height,
        font = style.font_family()
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<defs><clipPath id="plot-area"><rect x="{x}" y="{y}" width="{w}" height="{h}"/></clipPath></defs>"#,
        x = frame.plot_left,
        y = frame.top,
        w = frame.plot_right - frame.plot_left,
        h = frame.bottom - frame.top
    )?;

    // highlight bands go under everything else
    writeln!(svg, r#"<g clip-path="url(#plot-area)">"#)?;
    for row in rows.iter().filter(|r| r.emphasize) {
        let color = escape(row.color);
        let x0 = frame.x(row.mu - row.sigma);
        let x1 = frame.x(row.mu + row.sigma);
        writeln!(
            svg,
            r#"<rect x="{x0:.2}" y="{top:.2}" width="{w:.2}" height="{h:.2}" fill="{color}" fill-opacity="0.25"/>"#,
            top = frame.y(n as f64 - 0.5),
            w = x1 - x0,
            h = frame.y(-0.5) - frame.y(n as f64 - 0.5)
        )?;
        let xm = frame.x(row.mu);
        writeln!(
            svg,
            r#"<line x1="{xm:.2}" y1="{top:.2}" x2="{xm:.2}" y2="{bottom:.2}" stroke="{color}" stroke-width="1" stroke-dasharray="6 4" stroke-opacity="0.5"/>"#,
            top = frame.top,
            bottom = frame.bottom
        )?;
    }

    // first entry on top
    for (i, row) in rows.iter().rev().enumerate() {
        let color = escape(row.color);
        let y = frame.y(i as f64);
        let x0 = frame.x(row.mu - row.sigma);
        let x1 = frame.x(row.mu + row.sigma);
        let xm = frame.x(row.mu);
        writeln!(
            svg,
            r#"<line x1="{x0:.2}" y1="{y:.2}" x2="{x1:.2}" y2="{y:.2}" stroke="{color}" stroke-width="1.5"/>"#
        )?;
        for cap in [x0, x1] {
            writeln!(
                svg,
                r#"<line x1="{cap:.2}" y1="{a:.2}" x2="{cap:.2}" y2="{b:.2}" stroke="{color}" stroke-width="1.5"/>"#,
                a = y - CAP_HALF_HEIGHT,
                b = y + CAP_HALF_HEIGHT
            )?;
        }
        writeln!(
            svg,
            r#"<rect x="{x:.2}" y="{my:.2}" width="{s}" height="{s}" fill="{color}"/>"#,
            x = xm - MARKER_SIZE / 2.0,
            my = y - MARKER_SIZE / 2.0,
            s = MARKER_SIZE
        )?;
    }
    writeln!(svg, "</g>")?;

    // label and value columns
    let value_x = frame.plot_right - (frame.plot_right - frame.plot_left) / 30.0;
    for (i, row) in rows.iter().rev().enumerate() {
        let color = escape(row.color);
        let y = frame.y(i as f64);
        let value = format!(
            "{:.*} ± {:.*}",
            config.value_decimals, row.mu, config.value_decimals, row.sigma
        );
        for (x, text) in [(frame.label_left, escape(row.label)), (value_x, escape(&value))] {
            writeln!(
                svg,
                r#"<text x="{x:.2}" y="{y:.2}" fill="{color}" font-size="{ROW_FONT_SIZE}" font-weight="{fw}" dominant-baseline="middle">{text}</text>"#,
                fw = weight(row.emphasize)
            )?;
        }
    }

    // bottom spine, ticks, axis label
    writeln!(
        svg,
        r#"<line x1="{l:.2}" y1="{b:.2}" x2="{r:.2}" y2="{b:.2}" stroke="black" stroke-width="1"/>"#,
        l = frame.plot_left,
        r = frame.plot_right,
        b = frame.bottom
    )?;
    let decimals = tick_decimals(ticks);
    let axis_size = style.axis_font_size();
    for (k, &t) in ticks.iter().enumerate() {
        if t < frame.x_min || t > frame.x_max {
            continue;
        }
        let x = frame.x(t);
        writeln!(
            svg,
            r#"<line x1="{x:.2}" y1="{b:.2}" x2="{x:.2}" y2="{e:.2}" stroke="black" stroke-width="1"/>"#,
            b = frame.bottom,
            e = frame.bottom + TICK_LENGTH
        )?;
        let blank = ticks.len() > 2 && (k == 0 || k == ticks.len() - 1);
        if !blank {
            writeln!(
                svg,
                r#"<text x="{x:.2}" y="{y:.2}" font-size="{axis_size}" text-anchor="middle" dominant-baseline="hanging">{t:.decimals$}</text>"#,
                y = frame.bottom + TICK_LENGTH + 3.0
            )?;
        }
    }
    if !config.x_label.is_empty() {
        writeln!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" font-size="{axis_size}" text-anchor="middle" dominant-baseline="hanging">{label}</text>"#,
            x = (frame.plot_left + frame.plot_right) / 2.0,
            y = frame.bottom + TICK_LENGTH + 3.0 + 1.6 * axis_size,
            label = escape(&config.x_label)
        )?;
    }

    if let Some(footnote) = &config.footnote {
        let y = frame.y(-3.0).min(config.height - FOOTNOTE_FONT_SIZE);
        writeln!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" font-size="{FOOTNOTE_FONT_SIZE}">{text}</text>"#,
            x = frame.label_left,
            text = escape(footnote)
        )?;
    }

    writeln!(svg, "</svg>")?;
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::Measurement;
    use crate::render::TextStyle;

    fn sample() -> Measurements {
        let mut data = Measurements::new();
        data.insert("lep", Measurement::new(80376.0, 33.0).with_label("LEP"));
        data.insert("d0", Measurement::new(80375.0, 23.0).with_label("D0 <2.2/fb>"));
        data.insert(
            "ours",
            Measurement::new(80370.4, 11.6)
                .with_label("Combination")
                .with_color("red")
                .with_emphasize(true)
                .with_combine(false),
        );
        data
    }

    fn w_mass_config() -> RenderConfig {
        RenderConfig::default()
            .with_x_range(80300.0, 80600.0)
            .with_x_ticks(vec![80300.0, 80400.0, 80500.0, 80600.0])
            .with_x_label("M_W [MeV]")
    }

    #[test]
    fn rows_follow_insertion_order_top_down() {
        let svg = render_to_string(&sample(), &w_mass_config()).expect("should render");
        let lep = svg.find(">LEP<").expect("LEP label");
        let ours = svg.find(">Combination<").expect("combination label");
        // written bottom row first
        assert!(ours < lep);
    }

    #[test]
    fn value_column_rounds() {
        let svg = render_to_string(&sample(), &w_mass_config()).expect("should render");
        assert!(svg.contains("80376 ± 33"));
        assert!(svg.contains("80370 ± 12"));
    }

    #[test]
    fn emphasized_entry_gets_band_and_bold_text() {
        let svg = render_to_string(&sample(), &w_mass_config()).expect("should render");
        assert!(svg.contains(r#"fill="red" fill-opacity="0.25""#));
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains(r#"font-weight="bold""#));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = render_to_string(&sample(), &w_mass_config()).expect("should render");
        assert!(svg.contains("D0 &lt;2.2/fb&gt;"));
    }

    #[test]
    fn outer_tick_labels_blank() {
        let svg = render_to_string(&sample(), &w_mass_config()).expect("should render");
        assert!(svg.contains(">80400<"));
        assert!(svg.contains(">80500<"));
        assert!(!svg.contains(">80300<"));
        assert!(!svg.contains(">80600<"));
        assert!(svg.contains(">M_W [MeV]<"));
    }

    #[test]
    fn hidden_and_incomplete_entries_skipped() {
        let mut data = sample();
        data.insert("sm", Measurement::new(80357.0, 6.0).with_label("SM").with_plot(false));
        data.insert("empty", Measurement::default().with_label("Placeholder"));
        let svg = render_to_string(&data, &w_mass_config()).expect("should render");
        assert!(!svg.contains(">SM<"));
        assert!(!svg.contains(">Placeholder<"));
    }

    #[test]
    fn text_style_selects_font() {
        let serif = render_to_string(&sample(), &w_mass_config().with_text_style(TextStyle::Typeset))
            .expect("should render");
        assert!(serif.contains(r#"font-family="serif""#));
        let plain = render_to_string(&sample(), &w_mass_config()).expect("should render");
        assert!(plain.contains(r#"font-family="sans-serif""#));
    }

    #[test]
    fn footnote_rendered() {
        let config = w_mass_config().with_footnote("* excludes 13.5 MeV shift");
        let svg = render_to_string(&sample(), &config).expect("should render");
        assert!(svg.contains(">* excludes 13.5 MeV shift<"));
    }

    #[test]
    fn auto_range_covers_data() {
        let svg = render_to_string(&sample(), &RenderConfig::default()).expect("should render");
        assert!(svg.ends_with("</svg>\n"));

        let data = sample();
        let rows = collect_rows(&data);
        let (lo, hi) = auto_range(&rows).expect("range");
        assert!(lo <= 80376.0 - 33.0 && hi >= 80376.0 + 33.0, "[{lo}, {hi}]");
    }

    #[test]
    fn invalid_ranges_rejected() {
        let empty = Measurements::new();
        assert!(matches!(
            render_to_string(&empty, &RenderConfig::default()),
            Err(Error::Render(_))
        ));
        for (lo, hi) in [(1.0, 1.0), (2.0, 1.0), (f64::NAN, 1.0)] {
            let config = RenderConfig::default().with_x_range(lo, hi);
            assert!(matches!(render_to_string(&sample(), &config), Err(Error::Render(_))));
        }
    }

    #[test]
    fn empty_collection_with_range_renders_axis() {
        let svg = render_to_string(&Measurements::new(), &w_mass_config()).expect("should render");
        assert!(svg.contains(">80400<"));
    }

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(75.0), 100.0);
        assert_eq!(nice_step(30.0), 50.0);
        assert!((nice_step(0.15) - 0.2).abs() < 1e-12);
        assert_eq!(nice_ticks(80300.0, 80600.0), vec![80300.0, 80400.0, 80500.0, 80600.0]);
    }

    #[test]
    fn tick_labels_keep_needed_decimals() {
        assert_eq!(tick_decimals(&[0.0, 0.5, 1.0]), 1);
        assert_eq!(tick_decimals(&[0.0, 0.05, 0.1]), 2);
        assert_eq!(tick_decimals(&[100.0, 200.0]), 0);
        assert_eq!(tick_decimals(&[0.0, 0.25, 0.5, 0.75, 1.0]), 2);
        assert_eq!(tick_decimals(&nice_ticks(0.0, 0.8)), 1);
    }

    #[test]
    fn quarter_step_ticks_print_in_full() {
        let config = RenderConfig::default()
            .with_x_range(0.0, 1.0)
            .with_x_ticks(vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        let svg = render_to_string(&Measurements::new(), &config).expect("should render");
        assert!(svg.contains(">0.25<"), "{svg}");
        assert!(svg.contains(">0.50<"));
        assert!(!svg.contains(">0.2<"));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("figure.svg");
        render(&sample(), &w_mass_config(), &path).expect("should write");
        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.contains("80375 ± 23"));
    }
}
