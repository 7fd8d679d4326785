//! Bar charts as standalone SVG files

use migralog_core::{Chart, ChartArtifact, ChartRenderer};
use std::fmt::Write as _;
use std::path::Path;
use tracing::instrument;

use crate::{ArtifactDir, SinkResult};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 70.0;
const BAR_GAP: f64 = 0.2;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Draw `chart` as SVG markup. The y axis starts at zero and tops out at
/// the largest bar or overlay value.
pub fn render_svg(chart: &Chart) -> SinkResult<String> {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;

    let peak = chart
        .bars
        .iter()
        .map(|(_, v)| *v)
        .chain(chart.overlay)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let y_max = if peak > 0.0 { peak } else { 1.0 };
    let scale = |v: f64| plot_h * (v.max(0.0) / y_max);

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    )?;
    writeln!(svg, r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<text x="{:.1}" y="24" text-anchor="middle" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        escape(&chart.title)
    )?;

    // axes
    writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{baseline}" stroke="black"/>"#
    )?;
    writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{baseline}" x2="{:.1}" y2="{baseline}" stroke="black"/>"#,
        WIDTH - MARGIN_RIGHT
    )?;
    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10">0</text>"#,
        MARGIN_LEFT - 6.0,
        baseline + 4.0
    )?;
    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10">{}</text>"#,
        MARGIN_LEFT - 6.0,
        MARGIN_TOP + 4.0,
        tick(y_max)
    )?;

    if !chart.bars.is_empty() {
        let slot = plot_w / chart.bars.len() as f64;
        let bar_w = slot * (1.0 - BAR_GAP);
        for (i, (label, value)) in chart.bars.iter().enumerate() {
            let h = scale(*value);
            let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
            writeln!(
                svg,
                r#"<rect x="{x:.1}" y="{:.1}" width="{bar_w:.1}" height="{h:.1}" fill="steelblue"><title>{}: {}</title></rect>"#,
                baseline - h,
                escape(label),
                tick(*value)
            )?;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10">{}</text>"#,
                x + bar_w / 2.0,
                baseline + 14.0,
                escape(label)
            )?;
        }
    }

    if let Some(avg) = chart.overlay.filter(|v| v.is_finite()) {
        let y = baseline - scale(avg);
        writeln!(
            svg,
            r#"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="red" stroke-dasharray="6 4"/>"#,
            WIDTH - MARGIN_RIGHT
        )?;
    }

    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 20.0,
        escape(&chart.x_label)
    )?;
    writeln!(
        svg,
        r#"<text x="16" y="{:.1}" text-anchor="middle" font-size="12" transform="rotate(-90 16 {:.1})">{}</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0,
        escape(&chart.y_label)
    )?;
    svg.push_str("</svg>\n");
    Ok(svg)
}

fn tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Writes each chart to `<name>.svg` in the artifact directory
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    dir: ArtifactDir,
}

impl SvgChartRenderer {
    pub fn new(dir: ArtifactDir) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

impl ChartRenderer for SvgChartRenderer {
    #[instrument(skip_all, fields(chart = %chart.name))]
    fn render(&mut self, chart: &Chart) -> anyhow::Result<ChartArtifact> {
        let svg = render_svg(chart)?;
        let path = self.dir.write(&format!("{}.svg", chart.name), svg.as_bytes())?;
        Ok(ChartArtifact {
            title: chart.title.clone(),
            path,
        })
    }
}
