// Frequency bucketing and tabular breakdowns

use crate::data::{Column, ProductRecord};
use serde::Serialize;
use std::collections::HashMap;

/// Label used for blank attribute cells in distribution tables
pub const UNSPECIFIED: &str = "Unspecified";

#[derive(Debug, Clone)]
pub struct BucketingOptions {
    pub top_n: usize,
    pub include_others: bool,
    pub others_label: String,
}

impl Default for BucketingOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            include_others: false,
            others_label: "Others".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub label: String,
    pub count: usize,
}

/// Category counts over one population. Percentages are derived from
/// `count` and `total` on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub rows: Vec<FrequencyRow>,
    /// Rows in the population, including any not listed
    pub total: usize,
}

impl FrequencyTable {
    pub fn count(&self, label: &str) -> Option<usize> {
        self.rows.iter().find(|r| r.label == label).map(|r| r.count)
    }

    /// count / total * 100, rounded to 2 decimals; 0 for an empty population
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round2(count as f64 / self.total as f64 * 100.0)
    }

    pub fn with_percentages(&self) -> Vec<(String, usize, f64)> {
        self.rows
            .iter()
            .map(|r| (r.label.clone(), r.count, self.percentage(r.count)))
            .collect()
    }

    pub fn listed_total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }
}

/// Overall and filtered tables sharing one category axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyComparison {
    /// Retained categories in descending filtered frequency, then "Others" if used
    pub categories: Vec<String>,
    pub overall: FrequencyTable,
    pub filtered: FrequencyTable,
    /// Present only when at least one row was re-attributed
    pub others_label: Option<String>,
}

impl FrequencyComparison {
    /// Map a raw product type onto the shared axis
    pub fn bucket_of<'a>(&'a self, product_type: &'a str) -> Option<&'a str> {
        if self.categories.iter().any(|c| c == product_type && Some(c) != self.others_label.as_ref()) {
            Some(product_type)
        } else {
            self.others_label.as_deref()
        }
    }
}

/// Counts per distinct value, highest first. Ties keep first-appearance order.
pub fn value_counts<'a, I>(values: I) -> Vec<FrequencyRow>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut rows: Vec<FrequencyRow> = Vec::new();

    for value in values {
        match index.get(value) {
            Some(&i) => rows[i].count += 1,
            None => {
                index.insert(value, rows.len());
                rows.push(FrequencyRow { label: value.to_string(), count: 1 });
            }
        }
    }

    // stable: equal counts stay in encounter order
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Reduce the product-type column of both populations to the top-N types of
/// the filtered population, optionally folding the rest into "Others".
pub fn bucket_frequencies(
    overall: &[&ProductRecord],
    filtered: &[&ProductRecord],
    options: &BucketingOptions,
) -> FrequencyComparison {
    // with bucketing on, rows already labelled like the bucket always fold into it,
    // so the axis never carries the label twice
    let folded = if options.include_others {
        Some(options.others_label.as_str())
    } else {
        None
    };

    let ranked = value_counts(filtered.iter().map(|r| r.product_type.as_str()));
    let mut categories: Vec<String> = ranked
        .into_iter()
        .filter(|r| Some(r.label.as_str()) != folded)
        .take(options.top_n)
        .map(|r| r.label)
        .collect();

    let retained = |label: &str| categories.iter().any(|c| c == label);
    let reattributed = overall
        .iter()
        .chain(filtered.iter())
        .any(|r| !retained(&r.product_type));

    let others_label = if options.include_others && reattributed {
        Some(options.others_label.clone())
    } else {
        None
    };

    let overall_table = tabulate(overall, &categories, others_label.as_deref());
    let filtered_table = tabulate(filtered, &categories, others_label.as_deref());

    if let Some(label) = &others_label {
        categories.push(label.clone());
    }

    log::debug!(
        "bucketed {} overall / {} filtered rows into {} categories",
        overall.len(),
        filtered.len(),
        categories.len()
    );

    FrequencyComparison {
        categories,
        overall: overall_table,
        filtered: filtered_table,
        others_label,
    }
}

fn tabulate(records: &[&ProductRecord], retained: &[String], others: Option<&str>) -> FrequencyTable {
    let mut counts = vec![0usize; retained.len()];
    let mut other_count = 0usize;

    for record in records {
        match retained.iter().position(|c| *c == record.product_type) {
            Some(i) => counts[i] += 1,
            None => other_count += 1,
        }
    }

    let mut rows: Vec<FrequencyRow> = retained
        .iter()
        .zip(counts)
        .map(|(label, count)| FrequencyRow { label: label.clone(), count })
        .collect();

    if let Some(label) = others {
        rows.push(FrequencyRow { label: label.to_string(), count: other_count });
    }

    FrequencyTable { rows, total: records.len() }
}

/// Distribution of any column across a population, blanks as "Unspecified"
pub fn attribute_table(records: &[&ProductRecord], column: Column) -> FrequencyTable {
    let rows = value_counts(records.iter().map(|r| {
        let value = r.value(column).trim();
        if value.is_empty() {
            UNSPECIFIED
        } else {
            value
        }
    }));
    FrequencyTable { rows, total: records.len() }
}

/// One cell of the brand assortment comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssortmentCell {
    pub brand: String,
    pub category: String,
    pub count: usize,
    /// Share of the brand's own products, in percent
    pub share: f64,
}

/// How each brand's products split across the categories of `column`.
/// Brands appear in encounter order, categories by descending count within a brand.
pub fn brand_assortment(records: &[&ProductRecord], column: Column) -> Vec<AssortmentCell> {
    let mut brand_order: Vec<&str> = Vec::new();
    let mut by_brand: HashMap<&str, Vec<&ProductRecord>> = HashMap::new();
    for record in records {
        by_brand
            .entry(record.brand.as_str())
            .or_insert_with(|| {
                brand_order.push(record.brand.as_str());
                Vec::new()
            })
            .push(record);
    }

    let mut cells = Vec::new();
    for brand in brand_order {
        let rows = &by_brand[brand];
        let table = attribute_table(rows, column);
        for row in &table.rows {
            cells.push(AssortmentCell {
                brand: brand.to_string(),
                category: row.label.clone(),
                count: row.count,
                share: table.percentage(row.count),
            });
        }
    }
    cells
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
