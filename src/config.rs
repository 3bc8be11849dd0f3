// Dashboard configuration: column names, bucketing, layout constants, rendering

use crate::error::LayoutError;
use crate::normalize::default_aliases;
use crate::RenderOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// The two dashboard variants the catalog tooling ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum Preset {
    /// top 10 types, no "Others", spacing 5, marker clamp(f, 10, 25)
    #[serde(rename = "standard")]
    #[default]
    Standard,
    /// top 10 types plus "Others", spacing 3, marker clamp(2f, 10, 20)
    #[serde(rename = "compact")]
    Compact,
}

/// How raw row prices collapse into one price per (brand, product type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum PriceAggregate {
    #[serde(rename = "max")]
    #[default]
    Max,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "mean")]
    Mean,
}

/// What ingestion does with a price cell that is not a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum InvalidPricePolicy {
    /// abort ingestion, listing every offending row
    #[serde(rename = "fail")]
    #[default]
    Fail,
    /// drop the rows but keep them on the catalog's rejected ledger
    #[serde(rename = "exclude")]
    Exclude,
}

/// Marker size = clamp(frequency * scale, min, max)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarkerSizing {
    pub scale: f64,
    pub min: f64,
    pub max: f64,
}

impl MarkerSizing {
    /// Callers must have passed `validate`; `f64::clamp` panics on min > max or NaN bounds
    pub fn size_for(&self, frequency: usize) -> f64 {
        (frequency as f64 * self.scale).clamp(self.min, self.max)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let finite = self.scale.is_finite() && self.min.is_finite() && self.max.is_finite();
        if !finite || self.min > self.max {
            return Err(LayoutError::InvalidMarker {
                scale: self.scale,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for MarkerSizing {
    fn default() -> Self {
        Self { scale: 1.0, min: 10.0, max: 25.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_brand_column")]
    pub brand_column: String,
    #[serde(default = "default_price_column")]
    pub price_column: String,
    #[serde(default = "default_product_type_column")]
    pub product_type_column: String,

    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub include_others: bool,
    #[serde(default = "default_others_label")]
    pub others_label: String,

    #[serde(default = "default_brand_spacing")]
    pub brand_spacing: f64,
    #[serde(default)]
    pub marker: MarkerSizing,
    #[serde(default)]
    pub price_aggregate: PriceAggregate,

    #[serde(default = "default_aliases")]
    pub label_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub invalid_price: InvalidPricePolicy,

    #[serde(default)]
    pub render: RenderOptions,
}

fn default_brand_column() -> String { "Brand".to_string() }
fn default_price_column() -> String { "Price".to_string() }
fn default_product_type_column() -> String { "Product type".to_string() }
fn default_top_n() -> usize { 10 }
fn default_others_label() -> String { "Others".to_string() }
fn default_brand_spacing() -> f64 { 5.0 }

impl DashboardConfig {
    pub fn preset(preset: Preset) -> Self {
        let base = Self {
            brand_column: default_brand_column(),
            price_column: default_price_column(),
            product_type_column: default_product_type_column(),
            top_n: default_top_n(),
            include_others: false,
            others_label: default_others_label(),
            brand_spacing: default_brand_spacing(),
            marker: MarkerSizing::default(),
            price_aggregate: PriceAggregate::Max,
            label_aliases: default_aliases(),
            invalid_price: InvalidPricePolicy::Fail,
            render: RenderOptions::default(),
        };

        match preset {
            Preset::Standard => base,
            Preset::Compact => Self {
                include_others: true,
                brand_spacing: 3.0,
                marker: MarkerSizing { scale: 2.0, min: 10.0, max: 20.0 },
                ..base
            },
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("Failed to parse dashboard config")?;
        config.validate().context("Invalid dashboard config")?;
        Ok(config)
    }

    /// Reject layout constants the layout engine cannot place markers with
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !self.brand_spacing.is_finite() || self.brand_spacing <= 0.0 {
            return Err(LayoutError::InvalidSpacing(self.brand_spacing));
        }
        self.marker.validate()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Columns every input file must carry
    pub fn required_columns(&self) -> Vec<String> {
        vec![
            self.brand_column.clone(),
            self.price_column.clone(),
            self.product_type_column.clone(),
        ]
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::preset(Preset::Standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_preset() {
        let cfg = DashboardConfig::preset(Preset::Standard);
        assert_eq!(cfg.top_n, 10);
        assert!(!cfg.include_others);
        assert_eq!(cfg.brand_spacing, 5.0);
        assert_eq!(cfg.marker.size_for(3), 10.0);
        assert_eq!(cfg.marker.size_for(17), 17.0);
        assert_eq!(cfg.marker.size_for(40), 25.0);
    }

    #[test]
    fn test_compact_preset() {
        let cfg = DashboardConfig::preset(Preset::Compact);
        assert!(cfg.include_others);
        assert_eq!(cfg.brand_spacing, 3.0);
        assert_eq!(cfg.marker.size_for(3), 10.0);
        assert_eq!(cfg.marker.size_for(7), 14.0);
        assert_eq!(cfg.marker.size_for(11), 20.0);
    }

    #[test]
    fn test_empty_json_matches_standard() {
        let cfg = DashboardConfig::from_json_str("{}").unwrap();
        let std = DashboardConfig::default();
        assert_eq!(cfg.brand_column, std.brand_column);
        assert_eq!(cfg.top_n, std.top_n);
        assert_eq!(cfg.brand_spacing, std.brand_spacing);
        assert_eq!(cfg.marker, std.marker);
        assert_eq!(cfg.label_aliases, std.label_aliases);
        assert_eq!(cfg.render.width, 800);
    }

    #[test]
    fn test_json_overrides() {
        let cfg = DashboardConfig::from_json_str(
            r#"{
                "brand_column": "Brand_D2C",
                "top_n": 5,
                "include_others": true,
                "marker": {"scale": 2.0, "min": 10, "max": 20},
                "price_aggregate": "mean",
                "invalid_price": "exclude",
                "render": {"width": 1200, "type": "svg"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.brand_column, "Brand_D2C");
        assert_eq!(cfg.top_n, 5);
        assert!(cfg.include_others);
        assert_eq!(cfg.marker.size_for(4), 10.0);
        assert_eq!(cfg.price_aggregate, PriceAggregate::Mean);
        assert_eq!(cfg.invalid_price, InvalidPricePolicy::Exclude);
        assert_eq!(cfg.render.width, 1200);
        assert_eq!(cfg.render.height, 600);
        assert!(matches!(cfg.render.format, crate::OutputFormat::Svg));
    }

    #[test]
    fn test_marker_partial_override_keeps_defaults() {
        let cfg = DashboardConfig::from_json_str(r#"{"marker": {"scale": 2}}"#).unwrap();
        assert_eq!(cfg.marker, MarkerSizing { scale: 2.0, min: 10.0, max: 25.0 });
    }

    #[test]
    fn test_marker_min_above_max_rejected() {
        let err = DashboardConfig::from_json_str(r#"{"marker": {"scale": 1.0, "min": 30, "max": 10}}"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("min <= max"));
    }

    #[test]
    fn test_marker_validate() {
        assert!(MarkerSizing::default().validate().is_ok());
        let nan = MarkerSizing { scale: f64::NAN, min: 10.0, max: 25.0 };
        assert!(matches!(nan.validate(), Err(LayoutError::InvalidMarker { .. })));
        let inf = MarkerSizing { scale: 1.0, min: 10.0, max: f64::INFINITY };
        assert!(inf.validate().is_err());
    }

    #[test]
    fn test_non_positive_spacing_rejected() {
        assert!(DashboardConfig::from_json_str(r#"{"brand_spacing": 0}"#).is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(DashboardConfig::from_json_str("{\"top_n\": \"ten\"}").is_err());
    }
}
