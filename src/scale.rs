use crate::ir::{Scale, Tick};

/// Product types at 0..n-1, with `trailing` extra units on the right for annotations
pub fn categorical_axis(categories: &[String], trailing: f64) -> Scale {
    let n = categories.len() as f64;
    Scale {
        domain: (-0.5, (n - 0.5 + trailing).max(0.5)),
        is_categorical: true,
        ticks: categories
            .iter()
            .enumerate()
            .map(|(i, label)| Tick { value: i as f64, label: label.clone() })
            .collect(),
    }
}

/// Brand rows in row units: baseline of row i sits at i, its band tops out at i + band
pub fn brand_axis(brands: &[&str], band: f64) -> Scale {
    let n = brands.len() as f64;
    let top = if brands.is_empty() { 1.0 } else { n - 1.0 + band };
    let (min, max) = pad_range(0.0, top);
    Scale {
        domain: (min.min(-0.5), max.max(top + 0.2)),
        is_categorical: true,
        ticks: brands
            .iter()
            .enumerate()
            .map(|(i, brand)| Tick { value: i as f64, label: brand.to_string() })
            .collect(),
    }
}

/// Continuous count axis, always anchored at zero
pub fn count_axis(max_count: usize) -> Scale {
    let max = if max_count == 0 { 1.0 } else { max_count as f64 * 1.1 };
    Scale {
        domain: (0.0, max),
        is_categorical: false,
        ticks: Vec::new(),
    }
}

pub fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

/// Label of the tick at `value`, or empty when no tick sits there
pub fn tick_label(ticks: &[Tick], value: f64) -> String {
    ticks
        .iter()
        .find(|t| (t.value - value).abs() < 1e-6)
        .map(|t| t.label.clone())
        .unwrap_or_default()
}
