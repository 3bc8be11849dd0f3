use crate::config::{DashboardConfig, InvalidPricePolicy};
use crate::csv_reader::CsvData;
use crate::error::{CatalogError, PriceIssue};
use crate::frequency::UNSPECIFIED;
use crate::normalize::LabelNormalizer;

/// One catalog row after schema validation.
/// Columns beyond the required three are carried verbatim in `extras`,
/// aligned with `Catalog::extra_headers`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub brand: String,
    pub price: f64,
    pub product_type: String,
    pub extras: Vec<String>,
}

/// The loaded dataset for a session. Replaced wholesale on re-upload.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub records: Vec<ProductRecord>,
    pub extra_headers: Vec<String>,
    /// Rows dropped under `InvalidPricePolicy::Exclude`
    pub rejected: Vec<PriceIssue>,
}

/// A column a table or assortment breakdown can be computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Brand,
    ProductType,
    Extra(usize),
}

impl ProductRecord {
    pub fn value<'a>(&'a self, column: Column) -> &'a str {
        match column {
            Column::Brand => &self.brand,
            Column::ProductType => &self.product_type,
            Column::Extra(idx) => self.extras.get(idx).map(String::as_str).unwrap_or(""),
        }
    }
}

impl Catalog {
    /// Validate a raw table against the configured schema and coerce prices.
    pub fn from_csv(csv: CsvData, config: &DashboardConfig) -> Result<Self, CatalogError> {
        let required = config.required_columns();
        let missing: Vec<String> = required
            .iter()
            .filter(|name| csv.column_index(name).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::MissingColumns { missing, required });
        }

        // Presence checked above
        let brand_idx = csv.column_index(&config.brand_column).unwrap_or_default();
        let price_idx = csv.column_index(&config.price_column).unwrap_or_default();
        let type_idx = csv.column_index(&config.product_type_column).unwrap_or_default();

        let extra_indices: Vec<usize> = (0..csv.headers.len())
            .filter(|i| ![brand_idx, price_idx, type_idx].contains(i))
            .collect();
        let extra_headers = extra_indices.iter().map(|&i| csv.headers[i].clone()).collect();

        let normalizer = LabelNormalizer::new(&config.label_aliases);
        let expected = csv.headers.len();

        let mut records = Vec::with_capacity(csv.rows.len());
        let mut issues = Vec::new();

        for (row_idx, row) in csv.rows.into_iter().enumerate() {
            let row_no = row_idx + 1;
            if row.len() != expected {
                return Err(CatalogError::RaggedRow { row: row_no, expected, found: row.len() });
            }

            let price = match parse_price(&row[price_idx]) {
                Some(p) => p,
                None => {
                    issues.push(PriceIssue { row: row_no, value: row[price_idx].clone() });
                    continue;
                }
            };

            let mut product_type = normalizer.normalize(&row[type_idx]);
            if product_type.is_empty() {
                product_type = UNSPECIFIED.to_string();
            }

            records.push(ProductRecord {
                brand: row[brand_idx].trim().to_string(),
                price,
                product_type,
                extras: extra_indices.iter().map(|&i| row[i].clone()).collect(),
            });
        }

        if !issues.is_empty() {
            match config.invalid_price {
                InvalidPricePolicy::Fail => return Err(CatalogError::InvalidPrice(issues)),
                InvalidPricePolicy::Exclude => {
                    for issue in &issues {
                        log::warn!("excluding row {}: price '{}' is not a number", issue.row, issue.value);
                    }
                }
            }
        }

        log::info!(
            "loaded catalog: {} records, {} extra columns, {} rejected",
            records.len(),
            extra_indices.len(),
            issues.len()
        );

        Ok(Self { records, extra_headers, rejected: issues })
    }

    /// Resolve a column by header name (case-insensitive).
    pub fn column(&self, name: &str, config: &DashboardConfig) -> Option<Column> {
        let name = name.trim();
        if name.eq_ignore_ascii_case(config.brand_column.trim()) {
            return Some(Column::Brand);
        }
        if name.eq_ignore_ascii_case(config.product_type_column.trim()) {
            return Some(Column::ProductType);
        }
        self.extra_headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .map(Column::Extra)
    }

    pub fn max_price(&self) -> Option<f64> {
        self.records.iter().map(|r| r.price).fold(None, |acc, p| match acc {
            Some(m) if m >= p => Some(m),
            _ => Some(p),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Coerce a price cell: tolerates surrounding whitespace, a leading currency
/// symbol and thousands separators. Empty and non-finite values fail.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(&['$', '£', '€', '₹'][..])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}
