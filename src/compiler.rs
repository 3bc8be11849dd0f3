use crate::filter::ResolvedRange;
use crate::frequency::{FrequencyComparison, FrequencyTable};
use crate::graph::{BarStyle, LabelStyle, LineStyle, PointStyle};
use crate::ir::{DrawCommand, PanelScene, SceneGraph};
use crate::layout::{Layout, BAND_FRACTION};
use crate::scale::{brand_axis, categorical_axis, count_axis};
use crate::RenderOptions;

/// Width reserved right of the last category for the price annotations
const ANNOTATION_GUTTER: f64 = 1.5;

const BAR_WIDTH: f64 = 0.8;

// =============================================================================
// Brand / product-type layout
// =============================================================================

/// Lower a layout to one panel. Scene y-coordinates are in row units
/// (layout y divided by brand spacing) so brand ticks land on integers.
pub fn compile_layout(layout: &Layout, title: &str, options: &RenderOptions) -> SceneGraph {
    let spacing = layout.brand_spacing;
    let to_row = |y: f64| y / spacing;

    let mut commands = Vec::new();

    for row in &layout.rows {
        let points: Vec<(f64, f64)> = row.points.iter().map(|p| (p.x, to_row(p.y))).collect();

        if points.len() > 1 {
            commands.push(DrawCommand::DrawLine {
                points: points.clone(),
                style: LineStyle {
                    color: Some("blue".to_string()),
                    width: Some(2.0),
                    alpha: None,
                },
                legend: None,
            });
        }

        commands.push(DrawCommand::DrawPoint {
            points,
            sizes: row.points.iter().map(|p| p.marker_size).collect(),
            style: PointStyle {
                color: Some("red".to_string()),
                alpha: None,
            },
            legend: None,
        });
    }

    for annotation in &layout.annotations {
        commands.push(DrawCommand::DrawText {
            text: annotation.text.clone(),
            at: (annotation.x, to_row(annotation.y)),
            style: LabelStyle {
                color: Some("black".to_string()),
                size: Some(12.0),
            },
        });
    }

    let brands = layout.brands();
    let height = options.height.max(150 + 50 * brands.len() as u32);

    SceneGraph {
        width: options.width,
        height,
        title: Some(title.to_string()),
        nrow: 1,
        ncol: 1,
        panels: vec![PanelScene {
            row: 0,
            col: 0,
            title: None,
            x_label: Some("Product Types".to_string()),
            y_label: Some("Brands".to_string()),
            x_scale: categorical_axis(&layout.axis, ANNOTATION_GUTTER),
            y_scale: brand_axis(&brands, BAND_FRACTION),
            commands,
        }],
    }
}

// =============================================================================
// Frequency comparison
// =============================================================================

/// Two bar panels side by side: the whole catalog and the selected price range
pub fn compile_frequency(
    comparison: &FrequencyComparison,
    range: &ResolvedRange,
    options: &RenderOptions,
) -> SceneGraph {
    let overall = frequency_panel(
        0,
        "Overall Product Type Distribution".to_string(),
        &comparison.categories,
        &comparison.overall,
        "steelblue",
        "Overall",
    );
    let filtered = frequency_panel(
        1,
        format!("Distribution in Price Range {}", range),
        &comparison.categories,
        &comparison.filtered,
        "orange",
        &format!("Range {}", range),
    );

    SceneGraph {
        width: options.width,
        height: options.height,
        title: Some("Product Type Frequency Comparison".to_string()),
        nrow: 1,
        ncol: 2,
        panels: vec![overall, filtered],
    }
}

fn frequency_panel(
    col: usize,
    title: String,
    categories: &[String],
    table: &FrequencyTable,
    color: &str,
    legend: &str,
) -> PanelScene {
    let half = BAR_WIDTH / 2.0;
    let mut commands = Vec::new();
    let mut max_count = 0;

    for (i, category) in categories.iter().enumerate() {
        let count = table.count(category).unwrap_or(0);
        max_count = max_count.max(count);
        let x = i as f64;
        commands.push(DrawCommand::DrawRect {
            tl: (x - half, count as f64),
            br: (x + half, 0.0),
            style: BarStyle {
                color: Some(color.to_string()),
                alpha: None,
            },
            legend: if i == 0 { Some(legend.to_string()) } else { None },
        });
    }

    PanelScene {
        row: 0,
        col,
        title: Some(title),
        x_label: None,
        y_label: Some("Count".to_string()),
        x_scale: categorical_axis(categories, 0.0),
        y_scale: count_axis(max_count),
        commands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerSizing;
    use crate::frequency::{bucket_frequencies, BucketingOptions};
    use crate::layout::{compute_layout, LayoutParams, Observation};
    use crate::data::ProductRecord;

    fn obs(brand: &str, product_type: &str, price: f64, frequency: usize) -> Observation {
        Observation {
            brand: brand.to_string(),
            product_type: product_type.to_string(),
            price,
            frequency,
        }
    }

    fn sample_layout() -> Layout {
        let input = vec![
            obs("BrandA", "Shoe", 50.0, 3),
            obs("BrandA", "Boot", 90.0, 1),
            obs("BrandB", "Shoe", 60.0, 2),
        ];
        let axis = vec!["Shoe".to_string(), "Boot".to_string()];
        let params = LayoutParams { brand_spacing: 5.0, marker: MarkerSizing::default() };
        compute_layout(&input, &axis, &params).unwrap()
    }

    #[test]
    fn test_compile_layout_commands() {
        let scene = compile_layout(&sample_layout(), "Product Type Comparison", &RenderOptions::default());
        assert_eq!(scene.panels.len(), 1);
        let panel = &scene.panels[0];

        let lines = panel.commands.iter().filter(|c| matches!(c, DrawCommand::DrawLine { .. })).count();
        let markers = panel.commands.iter().filter(|c| matches!(c, DrawCommand::DrawPoint { .. })).count();
        let texts = panel.commands.iter().filter(|c| matches!(c, DrawCommand::DrawText { .. })).count();
        // BrandB has a single point: marker but no line
        assert_eq!((lines, markers, texts), (1, 2, 2));

        if let DrawCommand::DrawLine { points, .. } = &panel.commands[0] {
            assert_eq!(points, &vec![(0.0, 0.0), (1.0, 0.8)]);
        } else {
            panic!("Expected DrawLine");
        }
        assert_eq!(panel.y_scale.ticks[1].label, "BrandB");
        assert_eq!(panel.y_scale.ticks[1].value, 1.0);
    }

    #[test]
    fn test_compile_layout_height_grows_with_brands() {
        let options = RenderOptions { width: 800, height: 200, ..RenderOptions::default() };
        let scene = compile_layout(&sample_layout(), "t", &options);
        assert_eq!(scene.height, 250);
        let tall = RenderOptions { width: 800, height: 700, ..RenderOptions::default() };
        assert_eq!(compile_layout(&sample_layout(), "t", &tall).height, 700);
    }

    #[test]
    fn test_compile_empty_layout() {
        let layout = compute_layout(
            &[],
            &[],
            &LayoutParams { brand_spacing: 5.0, marker: MarkerSizing::default() },
        )
        .unwrap();
        let scene = compile_layout(&layout, "empty", &RenderOptions::default());
        assert!(scene.panels[0].commands.is_empty());
    }

    #[test]
    fn test_compile_frequency_panels() {
        let records: Vec<ProductRecord> = [("A", 50.0, "Shoe"), ("A", 150.0, "Boot"), ("B", 60.0, "Shoe")]
            .iter()
            .map(|&(b, p, t)| ProductRecord {
                brand: b.to_string(),
                price: p,
                product_type: t.to_string(),
                extras: vec![],
            })
            .collect();
        let all: Vec<&ProductRecord> = records.iter().collect();
        let filtered: Vec<&ProductRecord> = records.iter().filter(|r| r.price <= 100.0).collect();
        let options = BucketingOptions { include_others: true, ..Default::default() };
        let cmp = bucket_frequencies(&all, &filtered, &options);
        let range = ResolvedRange { min: 0.0, max: 100.0 };

        let scene = compile_frequency(&cmp, &range, &RenderOptions::default());
        assert_eq!((scene.nrow, scene.ncol), (1, 2));
        assert_eq!(scene.panels[1].title.as_deref(), Some("Distribution in Price Range $0-100"));

        // categories: Shoe, Others
        assert_eq!(scene.panels[0].commands.len(), 2);
        if let DrawCommand::DrawRect { tl, br, legend, .. } = &scene.panels[0].commands[1] {
            assert_eq!(tl.1, 1.0);
            assert_eq!(br.1, 0.0);
            assert!(legend.is_none());
        } else {
            panic!("Expected DrawRect");
        }
    }
}
