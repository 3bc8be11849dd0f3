// Price-range selection: "0-100", "500+", "all"

use crate::data::{Catalog, ProductRecord};
use crate::error::RangeError;
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, multispace0},
    combinator::{eof, map, opt},
    number::complete::double,
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult,
};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A price bucket as chosen by the user. An open upper bound means
/// "up to the most expensive product in the loaded catalog".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: Option<f64>,
}

/// Bounds after resolving an open upper end against a catalog
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn bounded(min: f64, max: f64) -> Self {
        Self { min, max: Some(max) }
    }

    pub fn open(min: f64) -> Self {
        Self { min, max: None }
    }

    pub fn all() -> Self {
        Self::open(0.0)
    }

    /// The selector offered by the dashboard: 0-100, 100-200, ... 400-500, 500+
    pub fn standard_buckets() -> Vec<PriceRange> {
        let mut buckets: Vec<PriceRange> = (0..5)
            .map(|i| PriceRange::bounded(i as f64 * 100.0, (i + 1) as f64 * 100.0))
            .collect();
        buckets.push(PriceRange::open(500.0));
        buckets
    }

    pub fn resolve(&self, catalog: &Catalog) -> ResolvedRange {
        let max = match self.max {
            Some(m) => m,
            None => catalog.max_price().unwrap_or(self.min),
        };
        ResolvedRange { min: self.min, max }
    }
}

impl ResolvedRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }

    /// Rows whose price falls within the bounds, both ends inclusive
    pub fn apply<'a>(&self, records: &'a [ProductRecord]) -> Vec<&'a ProductRecord> {
        let selected: Vec<&ProductRecord> =
            records.iter().filter(|r| self.contains(r.price)).collect();
        log::debug!(
            "price filter {}: {} of {} rows selected",
            self,
            selected.len(),
            records.len()
        );
        selected
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{}", format_amount(self.min), format_amount(max)),
            None => write!(f, "{}+", format_amount(self.min)),
        }
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}-{}", format_amount(self.min), format_amount(self.max))
    }
}

impl FromStr for PriceRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, range) = parse_price_range(s).map_err(|_| RangeError::Syntax(s.to_string()))?;
        if let Some(max) = range.max {
            if max < range.min {
                return Err(RangeError::Inverted(s.to_string()));
            }
        }
        Ok(range)
    }
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn amount(input: &str) -> IResult<&str, f64> {
    preceded(opt(char('$')), double)(input)
}

fn parse_price_range(input: &str) -> IResult<&str, PriceRange> {
    let (input, range) = ws(alt((
        map(tag_no_case("all"), |_| PriceRange::all()),
        map(
            separated_pair(ws(amount), char('-'), ws(amount)),
            |(min, max)| PriceRange::bounded(min, max),
        ),
        map(
            terminated(ws(amount), char('+')),
            PriceRange::open,
        ),
    )))(input)?;
    let (input, _) = eof(input)?;
    Ok((input, range))
}

/// Render an amount without a trailing ".0" for whole numbers
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
