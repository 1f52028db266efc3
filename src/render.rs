use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::prelude::*;

use crate::aggregate::{AggregateTable, VictimBreakdown};
use crate::chart::ChartData;
use crate::normalize::VictimCategory;
use crate::palette::{parse_hex, victim_color};
use crate::scale::{ColorRamp, LinearScale};
use crate::RenderOptions;

const FALLBACK_SERIES_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);

/// Render the yearly trend as a multi-series line chart.
pub fn render_line_chart(chart: &ChartData, options: &RenderOptions) -> Result<Vec<u8>> {
    if chart.categories.is_empty() {
        anyhow::bail!("line chart requires at least one category");
    }

    let n = chart.categories.len();
    let y_max = chart
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut buffer = vec![0u8; rgb_len(options)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut ctx = ChartBuilder::on(&root)
            .margin(10)
            .caption(&chart.title, ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..(y_max * 1.05))
            .context("Failed to build chart")?;

        let categories = chart.categories.clone();
        ctx.configure_mesh()
            .x_labels(n)
            .x_label_formatter(&move |x| {
                let idx = x.round();
                if idx >= 0.0 && (idx as usize) < categories.len() {
                    categories[idx as usize].clone()
                } else {
                    String::new()
                }
            })
            .draw()
            .context("Failed to draw mesh")?;

        for series in &chart.series {
            let color = series
                .color
                .as_deref()
                .and_then(parse_hex)
                .unwrap_or(FALLBACK_SERIES_COLOR);
            let points: Vec<(f64, f64)> = series
                .values
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, v as f64))
                .collect();

            ctx.draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .context("Failed to draw line series")?
                .label(series.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

            ctx.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )
            .context("Failed to draw points")?;
        }

        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .context("Failed to draw legend")?;

        root.present().context("Failed to present drawing")?;
    }

    encode_png(&buffer, options)
}

/// Render the daily profile as a radar chart: one spoke per time bin, the
/// single series drawn as a closed, semi-transparent polygon over four level
/// rings.
pub fn render_radar(chart: &ChartData, options: &RenderOptions) -> Result<Vec<u8>> {
    let Some(series) = chart.series.first() else {
        anyhow::bail!("radar chart requires a series");
    };
    if chart.categories.is_empty() {
        anyhow::bail!("radar chart requires at least one axis");
    }

    let levels = 4;
    let max_value = series.values.iter().copied().max().unwrap_or(0) as f64;
    // Degenerate max collapses every point to the center, never panics.
    let r_scale = LinearScale::new((0.0, max_value), (0.0, 1.0));
    let axes = chart.categories.len();
    let angle = |i: usize| {
        (i as f64) * std::f64::consts::TAU / (axes as f64) - std::f64::consts::FRAC_PI_2
    };

    let mut buffer = vec![0u8; rgb_len(options)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut ctx = ChartBuilder::on(&root)
            .margin(10)
            .caption(&chart.title, ("sans-serif", 20))
            .build_cartesian_2d(-1.4f64..1.4f64, -1.4f64..1.4f64)
            .context("Failed to build chart")?;

        // Level rings.
        for level in 1..=levels {
            let r = f64::from(level) / f64::from(levels);
            let ring: Vec<(f64, f64)> = (0..=64)
                .map(|i| {
                    let a = (i as f64) * std::f64::consts::TAU / 64.0;
                    (r * a.cos(), r * a.sin())
                })
                .collect();
            ctx.draw_series(std::iter::once(PathElement::new(ring, BLACK.mix(0.2))))
                .context("Failed to draw level ring")?;
        }

        // Spokes and axis labels.
        for (i, label) in chart.categories.iter().enumerate() {
            let a = angle(i);
            ctx.draw_series(std::iter::once(PathElement::new(
                vec![(0.0, 0.0), (a.cos(), a.sin())],
                BLACK.mix(0.4),
            )))
            .context("Failed to draw spoke")?;
            ctx.draw_series(std::iter::once(Text::new(
                label.clone(),
                (1.15 * a.cos(), 1.15 * a.sin()),
                ("sans-serif", 12).into_font(),
            )))
            .context("Failed to draw axis label")?;
        }

        // Closed value polygon.
        let mut outline: Vec<(f64, f64)> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let r = r_scale.apply(v as f64);
                let a = angle(i);
                (r * a.cos(), r * a.sin())
            })
            .collect();
        if let Some(first) = outline.first().copied() {
            outline.push(first);
        }

        let color = series
            .color
            .as_deref()
            .and_then(parse_hex)
            .unwrap_or(FALLBACK_SERIES_COLOR);
        ctx.draw_series(std::iter::once(Polygon::new(outline.clone(), color.mix(0.3))))
            .context("Failed to fill radar area")?;
        ctx.draw_series(std::iter::once(PathElement::new(
            outline.clone(),
            color.stroke_width(2),
        )))
        .context("Failed to stroke radar outline")?;
        ctx.draw_series(
            outline
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
        )
        .context("Failed to draw radar dots")?;

        root.present().context("Failed to present drawing")?;
    }

    encode_png(&buffer, options)
}

/// Render the month-by-vehicle table as a heat grid. An all-zero table has a
/// `[0, 0]` color domain and renders entirely at the ramp floor.
pub fn render_matrix(table: &AggregateTable, options: &RenderOptions) -> Result<Vec<u8>> {
    if table.is_empty() {
        anyhow::bail!("matrix has no rows or columns to draw");
    }

    let nrows = table.outer_labels().len();
    let ncols = table.inner_labels().len();
    let ramp = ColorRamp::heat(table.max_cell());
    let midpoint = table.max_cell() / 2;

    let mut buffer = vec![0u8; rgb_len(options)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut ctx = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(0f64..ncols as f64, 0f64..nrows as f64)
            .context("Failed to build chart")?;

        let col_labels = table.inner_labels().to_vec();
        let row_labels = table.outer_labels().to_vec();
        ctx.configure_mesh()
            .disable_mesh()
            .x_labels(ncols)
            .y_labels(nrows)
            .x_label_formatter(&move |x| grid_label(&col_labels, *x))
            .y_label_formatter(&move |y| {
                // Row 0 draws at the top.
                grid_label_reversed(&row_labels, *y)
            })
            .draw()
            .context("Failed to draw axis labels")?;

        for row in 0..nrows {
            for col in 0..ncols {
                let value = table.value_at(row, col);
                let y_top = (nrows - row) as f64;
                ctx.draw_series(std::iter::once(Rectangle::new(
                    [(col as f64, y_top - 1.0), (col as f64 + 1.0, y_top)],
                    ramp.color(value).filled(),
                )))
                .context("Failed to draw cell")?;
                ctx.draw_series(std::iter::once(Rectangle::new(
                    [(col as f64, y_top - 1.0), (col as f64 + 1.0, y_top)],
                    WHITE.stroke_width(1),
                )))
                .context("Failed to draw cell border")?;

                let text_color = if value > midpoint && midpoint > 0 {
                    WHITE
                } else {
                    BLACK
                };
                ctx.draw_series(std::iter::once(Text::new(
                    value.to_string(),
                    (col as f64 + 0.35, y_top - 0.55),
                    ("sans-serif", 12).into_font().color(&text_color),
                )))
                .context("Failed to draw cell value")?;
            }
        }

        root.present().context("Failed to present drawing")?;
    }

    encode_png(&buffer, options)
}

/// Render a victim-category pie. The all-zero distribution is the caller's
/// cue to suppress the chart entirely, so rendering one is an error here.
pub fn render_pie(breakdown: &VictimBreakdown, options: &RenderOptions) -> Result<Vec<u8>> {
    if breakdown.is_empty() {
        anyhow::bail!("refusing to render an all-zero distribution");
    }

    let values = breakdown.values();
    let total: u64 = values.iter().sum();

    let mut buffer = vec![0u8; rgb_len(options)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let mut ctx = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(-1.4f64..1.4f64, -1.4f64..1.4f64)
            .context("Failed to build chart")?;

        let mut start = -std::f64::consts::FRAC_PI_2;
        for (category, &value) in VictimCategory::ALL.iter().zip(&values) {
            if value == 0 {
                continue;
            }
            let sweep = (value as f64 / total as f64) * std::f64::consts::TAU;
            let end = start + sweep;

            let mut sector = vec![(0.0, 0.0)];
            let steps = ((sweep / std::f64::consts::TAU) * 96.0).ceil().max(2.0) as usize;
            for i in 0..=steps {
                let a = start + sweep * (i as f64) / (steps as f64);
                sector.push((a.cos(), a.sin()));
            }
            ctx.draw_series(std::iter::once(Polygon::new(
                sector,
                victim_color(*category).filled(),
            )))
            .context("Failed to draw pie sector")?;

            let mid = (start + end) / 2.0;
            let share = 100.0 * value as f64 / total as f64;
            ctx.draw_series(std::iter::once(Text::new(
                format!("{}: {} ({:.0}%)", category.label(), value, share),
                (1.1 * mid.cos(), 1.1 * mid.sin()),
                ("sans-serif", 13).into_font(),
            )))
            .context("Failed to draw slice label")?;

            start = end;
        }

        root.present().context("Failed to present drawing")?;
    }

    encode_png(&buffer, options)
}

fn grid_label(labels: &[String], position: f64) -> String {
    let idx = position.floor();
    if idx >= 0.0 && (idx as usize) < labels.len() {
        labels[idx as usize].clone()
    } else {
        String::new()
    }
}

fn grid_label_reversed(labels: &[String], position: f64) -> String {
    let idx = position.floor();
    if idx >= 0.0 && (idx as usize) < labels.len() {
        labels[labels.len() - 1 - idx as usize].clone()
    } else {
        String::new()
    }
}

fn rgb_len(options: &RenderOptions) -> usize {
    (options.width * options.height * 3) as usize
}

/// Encode the RGB buffer as PNG bytes.
fn encode_png(buffer: &[u8], options: &RenderOptions) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                buffer,
                options.width,
                options.height,
                image::ColorType::Rgb8,
            )
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}
