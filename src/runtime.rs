// Runtime executor: session views to chart bytes, JSON and text tables

use crate::compiler;
use crate::data::Column;
use crate::filter::{PriceRange, ResolvedRange};
use crate::frequency::{attribute_table, brand_assortment, FrequencyTable};
use crate::graph;
use crate::session::Session;
use crate::OutputFormat;
use anyhow::{anyhow, Context, Result};
use std::fmt::Write;

/// The two dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    Layout,
    Frequency,
}

/// Render one chart for the session's current selection
pub fn render_chart(session: &Session, chart: Chart, format: &OutputFormat) -> Result<Vec<u8>> {
    let options = &session.config().render;
    log::debug!("rendering {:?} chart as {:?}", chart, format);

    let scene = match chart {
        Chart::Layout => {
            let view = session.dashboard()?;
            compiler::compile_layout(&view.layout, &layout_title(&view.range), options)
        }
        Chart::Frequency => {
            let range = session.resolved_range()?;
            let comparison = session.frequency_view()?;
            compiler::compile_frequency(&comparison, &range, options)
        }
    };

    graph::render_scene(&scene, format).context("Failed to render chart")
}

pub fn layout_title(range: &ResolvedRange) -> String {
    format!("Product Type Comparison (Price Range: {})", range)
}

/// Serialize a chart's underlying data instead of drawing it
pub fn chart_json(session: &Session, chart: Chart) -> Result<String> {
    let json = match chart {
        Chart::Layout => serde_json::to_string_pretty(&session.dashboard()?.layout),
        Chart::Frequency => serde_json::to_string_pretty(&session.frequency_view()?),
    };
    json.context("Failed to serialize chart data")
}

/// Full dashboard (range, frequencies, layout) as one JSON document
pub fn dashboard_json(session: &Session) -> Result<String> {
    let view = session.dashboard()?;
    serde_json::to_string_pretty(&view).context("Failed to serialize dashboard")
}

// =============================================================================
// Text reports
// =============================================================================

/// Overall and in-range frequency tables over the shared category axis
pub fn frequency_report(session: &Session) -> Result<String> {
    let range = session.resolved_range()?;
    let comparison = session.frequency_view()?;

    let mut out = String::new();
    write_table(
        &mut out,
        "Overall Product Type Frequencies",
        "Product Type",
        &comparison.categories,
        &comparison.overall,
    )?;
    writeln!(out)?;
    write_table(
        &mut out,
        &format!("Frequencies in Range {}", range),
        "Product Type",
        &comparison.categories,
        &comparison.filtered,
    )?;
    Ok(out)
}

/// Distribution tables for arbitrary columns over the selected range
pub fn attribute_report(session: &Session, columns: &[String]) -> Result<String> {
    let range = session.resolved_range()?;
    let rows = session.filtered_rows()?;

    let mut out = String::new();
    for (i, name) in columns.iter().enumerate() {
        let column = resolve_column(session, name)?;
        let table = attribute_table(&rows, column);
        let labels: Vec<String> = table.rows.iter().map(|r| r.label.clone()).collect();

        if i > 0 {
            writeln!(out)?;
        }
        write_table(
            &mut out,
            &format!("{} Distribution (Price Range: {})", name, range),
            name,
            &labels,
            &table,
        )?;
    }
    Ok(out)
}

/// Per-brand share of each category of `column` within the selected range
pub fn assortment_report(session: &Session, column_name: &str) -> Result<String> {
    let range = session.resolved_range()?;
    let column = resolve_column(session, column_name)?;
    let rows = session.filtered_rows()?;
    let cells = brand_assortment(&rows, column);

    let brand_width = cells.iter().map(|c| c.brand.len()).max().unwrap_or(0).max(5);
    let category_width = cells
        .iter()
        .map(|c| c.category.len())
        .max()
        .unwrap_or(0)
        .max(column_name.len());

    let mut out = String::new();
    writeln!(out, "Brand Assortment by {} (Price Range: {})", column_name, range)?;
    writeln!(
        out,
        "{:<bw$}  {:<cw$}  {:>5}  {:>7}",
        "Brand",
        column_name,
        "Count",
        "Share",
        bw = brand_width,
        cw = category_width
    )?;
    for cell in &cells {
        writeln!(
            out,
            "{:<bw$}  {:<cw$}  {:>5}  {:>6.2}%",
            cell.brand,
            cell.category,
            cell.count,
            cell.share,
            bw = brand_width,
            cw = category_width
        )?;
    }
    Ok(out)
}

/// The standard price buckets with how many products each holds
pub fn buckets_report(session: &Session) -> Result<String> {
    let catalog = session.catalog()?;

    let mut out = String::new();
    writeln!(out, "{:<8}  {:>14}  {:>8}", "Bucket", "Bounds", "Products")?;
    for bucket in PriceRange::standard_buckets() {
        let resolved = bucket.resolve(catalog);
        let count = catalog.records.iter().filter(|r| resolved.contains(r.price)).count();
        writeln!(
            out,
            "{:<8}  {:>14}  {:>8}",
            bucket.to_string(),
            resolved.to_string(),
            count
        )?;
    }
    Ok(out)
}

fn resolve_column(session: &Session, name: &str) -> Result<Column> {
    let catalog = session.catalog()?;
    catalog.column(name, session.config()).ok_or_else(|| {
        let mut available = vec![
            session.config().brand_column.clone(),
            session.config().product_type_column.clone(),
        ];
        available.extend(catalog.extra_headers.iter().cloned());
        anyhow!(
            "Column '{}' not found. Available columns: {}",
            name,
            available.join(", ")
        )
    })
}

fn write_table(
    out: &mut String,
    title: &str,
    header: &str,
    labels: &[String],
    table: &FrequencyTable,
) -> std::fmt::Result {
    let width = labels.iter().map(|l| l.len()).max().unwrap_or(0).max(header.len());

    writeln!(out, "{}", title)?;
    writeln!(out, "{:<w$}  {:>5}  {:>10}", header, "Count", "Percentage", w = width)?;
    for label in labels {
        let count = table.count(label).unwrap_or(0);
        writeln!(
            out,
            "{:<w$}  {:>5}  {:>9.2}%",
            label,
            count,
            table.percentage(count),
            w = width
        )?;
    }
    writeln!(out, "{:<w$}  {:>5}", "Total", table.total, w = width)
}
