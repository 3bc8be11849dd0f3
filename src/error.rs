use thiserror::Error;

/// A single price cell that could not be coerced to a number.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceIssue {
    /// 1-based data row (header excluded)
    pub row: usize,
    pub value: String,
}

/// Failures while turning raw tabular input into a typed catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(
        "Missing required column(s): {}. Please upload a CSV file with columns: {}",
        .missing.join(", "),
        .required.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        required: Vec<String>,
    },

    #[error("{} row(s) have a non-numeric price (first: row {}, value '{}')", .0.len(), .0[0].row, .0[0].value)]
    InvalidPrice(Vec<PriceIssue>),

    #[error("Row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Input data must contain at least one data row")]
    Empty,

    #[error("Input data must be a JSON array of objects: {0}")]
    Json(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum RangeError {
    #[error("Invalid price range '{0}' (expected e.g. \"0-100\", \"500+\" or \"all\")")]
    Syntax(String),

    #[error("Price range '{0}' has a lower bound above its upper bound")]
    Inverted(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Brand spacing must be a positive number, got {0}")]
    InvalidSpacing(f64),

    #[error("Product type '{product_type}' of brand '{brand}' is not on the axis")]
    UnknownProductType { brand: String, product_type: String },

    #[error("Brand '{brand}' has more than one observation for product type '{product_type}'")]
    DuplicateObservation { brand: String, product_type: String },

    #[error("Observation price for brand '{brand}' is not finite")]
    NonFinitePrice { brand: String },

    #[error("Marker sizing needs finite values with min <= max, got scale {scale}, min {min}, max {max}")]
    InvalidMarker { scale: f64, min: f64, max: f64 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No dataset loaded. Please upload a CSV file with columns: {0}")]
    NoDataset(String),
}
