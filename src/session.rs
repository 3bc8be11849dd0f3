// Explicit dashboard state: the loaded catalog and the current selection

use crate::config::DashboardConfig;
use crate::data::{Catalog, ProductRecord};
use crate::error::SessionError;
use crate::filter::{PriceRange, ResolvedRange};
use crate::frequency::{bucket_frequencies, BucketingOptions, FrequencyComparison};
use crate::layout::{aggregate_observations, compute_layout, Layout, LayoutParams};
use anyhow::Result;
use serde::Serialize;

/// Everything one render pass derives from the session
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub range: ResolvedRange,
    pub frequencies: FrequencyComparison,
    pub layout: Layout,
}

/// Holds the dataset for the lifetime of an interactive session.
/// Every view is recomputed from scratch; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Session {
    config: DashboardConfig,
    catalog: Option<Catalog>,
    selection: PriceRange,
}

impl Session {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            catalog: None,
            selection: PriceRange::standard_buckets()[0],
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn selection(&self) -> PriceRange {
        self.selection
    }

    /// Replace the dataset wholesale
    pub fn load(&mut self, catalog: Catalog) {
        log::info!("session dataset replaced ({} records)", catalog.len());
        self.catalog = Some(catalog);
    }

    pub fn select_range(&mut self, range: PriceRange) {
        log::debug!("price range selection: {}", range);
        self.selection = range;
    }

    pub fn catalog(&self) -> Result<&Catalog, SessionError> {
        self.catalog
            .as_ref()
            .ok_or_else(|| SessionError::NoDataset(self.config.required_columns().join(", ")))
    }

    pub fn resolved_range(&self) -> Result<ResolvedRange, SessionError> {
        Ok(self.selection.resolve(self.catalog()?))
    }

    pub fn overall_rows(&self) -> Result<Vec<&ProductRecord>, SessionError> {
        Ok(self.catalog()?.records.iter().collect())
    }

    pub fn filtered_rows(&self) -> Result<Vec<&ProductRecord>, SessionError> {
        let catalog = self.catalog()?;
        let rows = self.selection.resolve(catalog).apply(&catalog.records);
        if rows.is_empty() {
            log::warn!("no products in price range {}", self.selection);
        }
        Ok(rows)
    }

    pub fn bucketing_options(&self) -> BucketingOptions {
        BucketingOptions {
            top_n: self.config.top_n,
            include_others: self.config.include_others,
            others_label: self.config.others_label.clone(),
        }
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            brand_spacing: self.config.brand_spacing,
            marker: self.config.marker,
        }
    }

    pub fn frequency_view(&self) -> Result<FrequencyComparison> {
        let overall = self.overall_rows()?;
        let filtered = self.filtered_rows()?;
        Ok(bucket_frequencies(&overall, &filtered, &self.bucketing_options()))
    }

    /// Full recomputation of both views for the current selection
    pub fn dashboard(&self) -> Result<DashboardView> {
        let range = self.resolved_range()?;
        let overall = self.overall_rows()?;
        let filtered = self.filtered_rows()?;

        let frequencies = bucket_frequencies(&overall, &filtered, &self.bucketing_options());
        let observations =
            aggregate_observations(&filtered, &frequencies, self.config.price_aggregate);
        let layout = compute_layout(&observations, &frequencies.categories, &self.layout_params())?;

        Ok(DashboardView { range, frequencies, layout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use crate::csv_reader::read_csv;

    const CATALOG: &str = "\
Brand,Price,Product type
Acme,50,Shoe
Acme,90,Boot
Zed,60,Shoe
Zed,150,Boot
Orb,650,Lace Up Trainers
Orb,700,Lace up
";

    fn loaded(preset: Preset) -> Session {
        let config = DashboardConfig::preset(preset);
        let catalog = Catalog::from_csv(read_csv(CATALOG.as_bytes()).unwrap(), &config).unwrap();
        let mut session = Session::new(config);
        session.load(catalog);
        session
    }

    #[test]
    fn test_no_dataset() {
        let session = Session::new(DashboardConfig::default());
        let err = session.dashboard().unwrap_err();
        assert!(err.to_string().contains("No dataset loaded"));
    }

    #[test]
    fn test_default_selection_is_first_bucket() {
        let session = loaded(Preset::Standard);
        let view = session.dashboard().unwrap();
        assert_eq!(view.range, ResolvedRange { min: 0.0, max: 100.0 });
        assert_eq!(view.frequencies.categories, vec!["Shoe", "Boot"]);
        assert_eq!(view.layout.brands(), vec!["Acme", "Zed"]);
        // Zed has a single product under 100
        assert_eq!(view.layout.rows[1].points.len(), 1);
        assert_eq!(view.layout.rows[1].points[0].y, 5.0);
    }

    #[test]
    fn test_open_range_and_normalized_labels() {
        let mut session = loaded(Preset::Standard);
        session.select_range("500+".parse().unwrap());
        let view = session.dashboard().unwrap();
        assert_eq!(view.range.max, 700.0);
        assert_eq!(view.frequencies.categories, vec!["Lace Up"]);
        assert_eq!(view.frequencies.filtered.count("Lace Up"), Some(2));
        assert_eq!(view.layout.rows.len(), 1);
        assert_eq!(view.layout.rows[0].points[0].frequency, 2);
    }

    #[test]
    fn test_empty_selection_degrades_gracefully() {
        let mut session = loaded(Preset::Compact);
        session.select_range("300-400".parse().unwrap());
        let view = session.dashboard().unwrap();
        assert!(view.layout.rows.is_empty());
        assert!(view.layout.annotations.is_empty());
        assert_eq!(view.frequencies.filtered.total, 0);
        assert_eq!(view.frequencies.categories, vec!["Others"]);
        assert_eq!(view.frequencies.overall.count("Others"), Some(6));
    }

    #[test]
    fn test_inverted_marker_is_an_error() {
        let mut config = DashboardConfig::default();
        config.marker = crate::config::MarkerSizing { scale: 1.0, min: 30.0, max: 10.0 };
        let catalog = Catalog::from_csv(
            read_csv("Brand,Price,Product type\nSolo,10,Clog\n".as_bytes()).unwrap(),
            &config,
        )
        .unwrap();
        let mut session = Session::new(config);
        session.load(catalog);
        let err = session.dashboard().unwrap_err();
        assert!(err.to_string().contains("min <= max"));
    }

    #[test]
    fn test_reload_replaces_dataset() {
        let mut session = loaded(Preset::Standard);
        let config = session.config().clone();
        let smaller = Catalog::from_csv(
            read_csv("Brand,Price,Product type\nSolo,10,Clog\n".as_bytes()).unwrap(),
            &config,
        )
        .unwrap();
        session.load(smaller);
        let view = session.dashboard().unwrap();
        assert_eq!(view.layout.brands(), vec!["Solo"]);
        assert_eq!(view.frequencies.overall.total, 1);
    }
}
