// plotters backend: executes a SceneGraph into PNG or SVG bytes

use crate::ir::{DrawCommand, PanelScene, SceneGraph};
use crate::scale::tick_label;
use crate::OutputFormat;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};

/// Style configuration for line layers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineStyle {
    pub color: Option<String>,
    pub width: Option<f64>,
    pub alpha: Option<f64>,
}

/// Style configuration for point layers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointStyle {
    pub color: Option<String>,
    pub alpha: Option<f64>,
}

/// Style configuration for bar layers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarStyle {
    pub color: Option<String>,
    pub alpha: Option<f64>,
}

/// Style configuration for free-standing text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
}

/// Finalize a scene into encoded image bytes
pub fn render_scene(scene: &SceneGraph, format: &OutputFormat) -> Result<Vec<u8>> {
    if scene.width == 0 || scene.height == 0 {
        anyhow::bail!("Cannot render a {}x{} image", scene.width, scene.height);
    }

    match format {
        OutputFormat::Png => {
            let mut buffer = vec![0u8; (scene.width * scene.height * 3) as usize];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height))
                    .into_drawing_area();
                draw_scene(&root, scene)?;
                root.present().context("Failed to present drawing")?;
            }

            let mut png_bytes = Vec::new();
            image::codecs::png::PngEncoder::new(&mut png_bytes)
                .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
            Ok(png_bytes)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height))
                    .into_drawing_area();
                draw_scene(&root, scene)?;
                root.present().context("Failed to present drawing")?;
            }
            Ok(svg.into_bytes())
        }
    }
}

fn draw_scene<DB>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    let body = match &scene.title {
        Some(title) => root
            .titled(title, font(22.0))
            .context("Failed to draw title")?,
        None => root.clone(),
    };

    let areas = body.split_evenly((scene.nrow.max(1), scene.ncol.max(1)));
    for panel in &scene.panels {
        let slot = panel.row * scene.ncol.max(1) + panel.col;
        let area = areas
            .get(slot)
            .with_context(|| format!("Panel ({}, {}) is outside the grid", panel.row, panel.col))?;
        draw_panel(area, panel)?;
    }
    Ok(())
}

fn draw_panel<DB>(area: &DrawingArea<DB, Shift>, panel: &PanelScene) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = panel.x_scale.domain;
    let (y_min, y_max) = panel.y_scale.domain;

    let y_label_area = if panel.y_scale.is_categorical {
        let longest = panel.y_scale.ticks.iter().map(|t| t.label.chars().count()).max().unwrap_or(0);
        (longest as u32 * 7 + 20).clamp(50, 200)
    } else {
        50
    };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(y_label_area);
    if let Some(title) = &panel.title {
        builder.caption(title, ("sans-serif", 16));
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .context("Failed to build chart")?;

    let x_ticks = &panel.x_scale.ticks;
    let y_ticks = &panel.y_scale.ticks;
    let x_formatter = |v: &f64| tick_label(x_ticks, *v);
    let y_formatter = |v: &f64| tick_label(y_ticks, *v);

    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh();
        if panel.x_scale.is_categorical {
            // enough key points that every integer position is one of them
            mesh.x_labels((x_max - x_min).ceil() as usize * 2 + 1)
                .x_label_formatter(&x_formatter);
        }
        if panel.y_scale.is_categorical {
            mesh.y_labels((y_max - y_min).ceil() as usize * 2 + 1)
                .y_label_formatter(&y_formatter);
        }
        if let Some(label) = &panel.x_label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &panel.y_label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw().context("Failed to draw mesh")?;
    }

    let mut has_legend = false;

    for command in &panel.commands {
        match command {
            DrawCommand::DrawLine { points, style, legend } => {
                let color = resolve_color(&style.color, BLUE).mix(style.alpha.unwrap_or(1.0));
                let width = style.width.unwrap_or(1.0).max(1.0) as u32;
                let anno = chart
                    .draw_series(LineSeries::new(points.clone(), color.stroke_width(width)))
                    .context("Failed to draw line series")?;
                if let Some(label) = legend {
                    has_legend = true;
                    anno.label(label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
                    });
                }
            }
            DrawCommand::DrawPoint { points, sizes, style, legend } => {
                let color = resolve_color(&style.color, RED).mix(style.alpha.unwrap_or(1.0));
                let anno = chart
                    .draw_series(points.iter().enumerate().map(|(i, &(x, y))| {
                        let diameter = sizes.get(i).copied().unwrap_or(6.0);
                        Circle::new((x, y), (diameter / 2.0).max(1.0) as i32, color.filled())
                    }))
                    .context("Failed to draw point series")?;
                if let Some(label) = legend {
                    has_legend = true;
                    anno.label(label.as_str())
                        .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
                }
            }
            DrawCommand::DrawRect { tl, br, style, legend } => {
                let color = resolve_color(&style.color, BLUE).mix(style.alpha.unwrap_or(1.0));
                let anno = chart
                    .draw_series(std::iter::once(Rectangle::new([*tl, *br], color.filled())))
                    .context("Failed to draw bar")?;
                if let Some(label) = legend {
                    has_legend = true;
                    anno.label(label.as_str()).legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled())
                    });
                }
            }
            DrawCommand::DrawText { text, at, style } => {
                let color = resolve_color(&style.color, BLACK);
                let size = style.size.unwrap_or(12.0);
                chart
                    .draw_series(std::iter::once(Text::new(
                        text.clone(),
                        *at,
                        font(size).color(&color),
                    )))
                    .context("Failed to draw annotation")?;
            }
        }
    }

    if has_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .context("Failed to draw legend")?;
    }

    Ok(())
}

fn font(size: f64) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
}

fn resolve_color(color: &Option<String>, fallback: RGBColor) -> RGBColor {
    color.as_deref().and_then(parse_color).unwrap_or(fallback)
}

/// Parse a color string into RGBColor, supporting hex (#RRGGBB, #RGB) and named colors
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "steelblue" => Some(RGBColor(70, 130, 180)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        _ => None,
    }
}

/// Parse hex color (#RRGGBB or #RGB)
fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}
