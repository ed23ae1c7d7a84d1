//! Aggregate -> PNG bytes.
//!
//! `render_png` is a pure function of its inputs: every call draws into its
//! own pixel buffer, so reports never share drawing state.

use anyhow::{Context, Result, bail};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::TAU;
use tally_core::{Aggregate, ChartKind, DenseGrid, ReportDef, ReportId, SeriesPoint};

use crate::fonts::{self, FONT};
use crate::palette;

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const TITLE_SIZE: i32 = 24;
const MAX_X_LABELS: usize = 24;
/// matplotlib's `startangle=140`
const PIE_START_DEG: f64 = 140.0;
const DONUT_HOLE: f64 = 0.55;

/// Presentation knobs that are not part of a report's data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPolicy {
    /// Donut slices at or below this share (in percent) are drawn without
    /// a percentage label
    pub pie_label_min_pct: f64,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            pie_label_min_pct: 5.0,
        }
    }
}

/// Draw `aggregate` as the chart `def` declares and encode it as PNG.
pub fn render_png(aggregate: &Aggregate, def: &ReportDef, policy: &RenderPolicy) -> Result<Vec<u8>> {
    fonts::ensure_registered()?;

    let (width, height) = def.size;
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root, aggregate, def, policy)
            .with_context(|| format!("drawing {}", def.id))?;
        root.present()?;
    }

    encode_png(&pixels, width, height)
}

fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .context("encoding png")?;
    Ok(out)
}

fn draw(root: &Canvas<'_>, aggregate: &Aggregate, def: &ReportDef, policy: &RenderPolicy) -> Result<()> {
    if aggregate.is_empty() {
        return draw_empty(root, def);
    }

    match (def.chart, aggregate) {
        (ChartKind::Line, Aggregate::Series(points)) => line_chart(root, def, points),
        (ChartKind::HorizontalBar, Aggregate::Series(points)) => horizontal_bars(root, def, points),
        (ChartKind::Bar, Aggregate::Series(points)) => vertical_bars(root, def, points),
        (ChartKind::Donut, Aggregate::Series(points)) => donut(root, def, points, policy),
        (ChartKind::Heatmap, Aggregate::Grid(grid)) => heatmap(root, def, grid),
        (ChartKind::StackedArea, Aggregate::Grid(grid)) => stacked_area(root, def, grid),
        (kind, _) => bail!("a {kind:?} chart cannot be drawn from this aggregate shape"),
    }
}

fn draw_empty(root: &Canvas<'_>, def: &ReportDef) -> Result<()> {
    let area = root.titled(def.title, (FONT, TITLE_SIZE))?;
    let (w, h) = area.dim_in_pixel();
    let style = (FONT, 18)
        .into_font()
        .color(&RGBColor(120, 120, 120))
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new("No data", (w as i32 / 2, h as i32 / 2), style))?;
    Ok(())
}

fn line_chart(root: &Canvas<'_>, def: &ReportDef, points: &[SeriesPoint]) -> Result<()> {
    let n = points.len();
    let (y_min, y_max) = value_range(points.iter().map(|p| p.value));
    let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();

    let mut chart = ChartBuilder::on(root)
        .caption(def.title, (FONT, TITLE_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d((0..n).into_segmented(), y_min..y_max)?;

    let x_fmt = |v: &SegmentValue<usize>| segment_label(v, &labels);
    chart
        .configure_mesh()
        .x_labels(n.min(MAX_X_LABELS))
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&|v| format!("{v:.0}"))
        .x_desc(def.x_label)
        .y_desc(def.y_label)
        .draw()?;

    let color = palette::TAB10[0];
    chart.draw_series(LineSeries::new(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (SegmentValue::CenterOf(i), p.value)),
        color.stroke_width(2),
    ))?;
    chart.draw_series(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| Circle::new((SegmentValue::CenterOf(i), p.value), 4, color.filled())),
    )?;

    Ok(())
}

fn horizontal_bars(root: &Canvas<'_>, def: &ReportDef, points: &[SeriesPoint]) -> Result<()> {
    let n = points.len();
    let (x_min, x_max) = value_range(points.iter().map(|p| p.value));
    // Slot 0 is the bottom of the chart; the first group goes on top
    let labels: Vec<&str> = points.iter().rev().map(|p| p.label.as_str()).collect();
    let widest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(root)
        .caption(def.title, (FONT, TITLE_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(label_area_width(widest))
        .build_cartesian_2d(x_min..x_max, (0..n).into_segmented())?;

    let y_fmt = |v: &SegmentValue<usize>| segment_label(v, &labels);
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&y_fmt)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .x_desc(def.x_label)
        .y_desc(def.y_label)
        .draw()?;

    let colors = match def.id {
        ReportId::PaymentModes => palette::sample(&palette::COOLWARM, n),
        _ => palette::sample(&palette::VIRIDIS, n),
    };
    chart.draw_series(points.iter().enumerate().map(|(i, p)| {
        let slot = n - 1 - i;
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(slot)),
                (p.value, segment_edge(slot + 1, n)),
            ],
            colors[i].filled(),
        );
        bar.set_margin(3, 3, 0, 0);
        bar
    }))?;

    Ok(())
}

fn vertical_bars(root: &Canvas<'_>, def: &ReportDef, points: &[SeriesPoint]) -> Result<()> {
    let n = points.len();
    let (y_min, y_max) = value_range(points.iter().map(|p| p.value));
    let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();

    let mut chart = ChartBuilder::on(root)
        .caption(def.title, (FONT, TITLE_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d((0..n).into_segmented(), y_min..y_max)?;

    let x_fmt = |v: &SegmentValue<usize>| segment_label(v, &labels);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.min(MAX_X_LABELS))
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&|v| format!("{v:.0}"))
        .x_desc(def.x_label)
        .y_desc(def.y_label)
        .draw()?;

    let colors = palette::cycle(&palette::PASTEL, n);
    chart.draw_series(points.iter().enumerate().map(|(i, p)| {
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (segment_edge(i + 1, n), p.value)],
            colors[i].filled(),
        );
        bar.set_margin(0, 0, 10, 10);
        bar
    }))?;

    Ok(())
}

fn heatmap(root: &Canvas<'_>, def: &ReportDef, grid: &DenseGrid) -> Result<()> {
    let (nr, nc) = (grid.rows.len(), grid.columns.len());
    let max = grid.max_cell();
    // First row (earliest year) on top
    let row_labels: Vec<&str> = grid.rows.iter().rev().map(String::as_str).collect();
    let col_labels: Vec<&str> = grid.columns.iter().map(String::as_str).collect();

    let mut chart = ChartBuilder::on(root)
        .caption(def.title, (FONT, TITLE_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0..nc).into_segmented(), (0..nr).into_segmented())?;

    let x_fmt = |v: &SegmentValue<usize>| segment_label(v, &col_labels);
    let y_fmt = |v: &SegmentValue<usize>| segment_label(v, &row_labels);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(nc)
        .y_labels(nr)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(def.x_label)
        .y_desc(def.y_label)
        .draw()?;

    let intensity = |v: f64| if max > 0.0 { v / max } else { 0.0 };
    let cells: Vec<(usize, usize, f64)> = (0..nr)
        .flat_map(|r| (0..nc).map(move |c| (r, c)))
        .map(|(r, c)| (nr - 1 - r, c, grid.get(r, c)))
        .collect();

    chart.draw_series(cells.iter().map(|&(slot, c, value)| {
        let mut cell = Rectangle::new(
            [
                (SegmentValue::Exact(c), SegmentValue::Exact(slot)),
                (segment_edge(c + 1, nc), segment_edge(slot + 1, nr)),
            ],
            palette::ramp(&palette::YLGNBU, intensity(value)).filled(),
        );
        cell.set_margin(1, 1, 1, 1);
        cell
    }))?;

    chart.draw_series(cells.iter().map(|&(slot, c, value)| {
        let ink = if intensity(value) > 0.6 { WHITE } else { BLACK };
        let style = (FONT, 13)
            .into_font()
            .color(&ink)
            .pos(Pos::new(HPos::Center, VPos::Center));
        Text::new(
            format!("{value:.0}"),
            (SegmentValue::CenterOf(c), SegmentValue::CenterOf(slot)),
            style,
        )
    }))?;

    Ok(())
}

/// One donut wedge, in drawing order
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    /// Share of the total, 0..=100
    pub percent: f64,
    pub show_percent: bool,
}

/// Slice shares for a proportional chart. Negative values count as zero.
pub fn pie_slices(points: &[SeriesPoint], policy: &RenderPolicy) -> Vec<Slice> {
    let total: f64 = points.iter().map(|p| p.value.max(0.0)).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    points
        .iter()
        .map(|p| {
            let percent = p.value.max(0.0) * 100.0 / total;
            Slice {
                label: p.label.clone(),
                percent,
                show_percent: percent > policy.pie_label_min_pct,
            }
        })
        .collect()
}

fn donut(root: &Canvas<'_>, def: &ReportDef, points: &[SeriesPoint], policy: &RenderPolicy) -> Result<()> {
    let slices = pie_slices(points, policy);
    if slices.is_empty() {
        return draw_empty(root, def);
    }

    let area = root.titled(def.title, (FONT, TITLE_SIZE))?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.34;
    let colors = palette::cycle(&palette::PASTEL, slices.len());

    let mut start = PIE_START_DEG.to_radians();
    let mut mids = Vec::with_capacity(slices.len());
    for (slice, color) in slices.iter().zip(&colors) {
        let end = start + slice.percent / 100.0 * TAU;
        if slice.percent > 0.0 {
            let outline = wedge(center, radius, start, end);
            area.draw(&Polygon::new(outline.clone(), color.filled()))?;
            area.draw(&PathElement::new(outline, BLACK.stroke_width(1)))?;
        }
        mids.push((start + end) / 2.0);
        start = end;
    }

    let hole = (radius * DONUT_HOLE) as i32;
    area.draw(&Circle::new(center, hole, WHITE.filled()))?;
    area.draw(&Circle::new(center, hole, BLACK.stroke_width(1)))?;

    for (slice, mid) in slices.iter().zip(mids) {
        let anchor = if mid.cos() >= 0.0 { HPos::Left } else { HPos::Right };
        let name_style = (FONT, 14).into_font().color(&BLACK).pos(Pos::new(anchor, VPos::Center));
        area.draw(&Text::new(
            slice.label.clone(),
            polar(center, radius * 1.08, mid),
            name_style,
        ))?;

        if slice.show_percent {
            let pct_style = (FONT, 13)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            area.draw(&Text::new(
                format!("{:.1}%", slice.percent),
                polar(center, radius * (1.0 + DONUT_HOLE) / 2.0, mid),
                pct_style,
            ))?;
        }
    }

    Ok(())
}

fn stacked_area(root: &Canvas<'_>, def: &ReportDef, grid: &DenseGrid) -> Result<()> {
    let (nr, nc) = (grid.rows.len(), grid.columns.len());
    let peak = grid.row_totals().into_iter().fold(0.0, f64::max);
    let (y_min, y_max) = value_range(std::iter::once(peak));
    let labels: Vec<&str> = grid.rows.iter().map(String::as_str).collect();

    let mut chart = ChartBuilder::on(root)
        .caption(def.title, (FONT, TITLE_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d((0..nr).into_segmented(), y_min..y_max)?;

    let x_fmt = |v: &SegmentValue<usize>| segment_label(v, &labels);
    chart
        .configure_mesh()
        .x_labels(nr.min(MAX_X_LABELS))
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&|v| format!("{v:.0}"))
        .x_desc(def.x_label)
        .y_desc(def.y_label)
        .draw()?;

    let colors = palette::cycle(&palette::TAB10, nc);
    let mut lower = vec![0.0; nr];
    for (c, name) in grid.columns.iter().enumerate() {
        let upper: Vec<f64> = (0..nr).map(|r| lower[r] + grid.get(r, c)).collect();
        let mut outline: Vec<(SegmentValue<usize>, f64)> = (0..nr)
            .map(|r| (SegmentValue::CenterOf(r), upper[r]))
            .collect();
        outline.extend((0..nr).rev().map(|r| (SegmentValue::CenterOf(r), lower[r])));

        let color = colors[c];
        chart
            .draw_series(std::iter::once(Polygon::new(outline, color.mix(0.7).filled())))?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        lower = upper;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// Axis range that always includes zero and leaves headroom above the data.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let hi = if hi <= lo { lo + 1.0 } else { hi };
    let pad = (hi - lo) * 0.08;
    (if lo < 0.0 { lo - pad } else { lo }, hi + pad)
}

fn segment_label(v: &SegmentValue<usize>, labels: &[&str]) -> String {
    match v {
        SegmentValue::CenterOf(i) => labels.get(*i).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}

/// Right/top edge of segment `i - 1`; the final edge is `Last`.
fn segment_edge(i: usize, n: usize) -> SegmentValue<usize> {
    if i >= n { SegmentValue::Last } else { SegmentValue::Exact(i) }
}

fn label_area_width(chars: usize) -> u32 {
    (chars as u32 * 8 + 24).clamp(60, 260)
}

fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 - (radius * angle.sin()).round() as i32,
    )
}

/// Closed outline of a pie wedge from `start` to `end` (radians, counter-clockwise).
fn wedge(center: (i32, i32), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = ((end - start).to_degrees().ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 3);
    points.push(center);
    for k in 0..=steps {
        let angle = start + (end - start) * k as f64 / steps as f64;
        points.push(polar(center, radius, angle));
    }
    points.push(center);
    points
}
