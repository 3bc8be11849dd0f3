//! Brand / product-type layout.
//!
//! Brands become horizontal rows ordered by their cheapest observation; each
//! brand's products sit on the shared product-type axis and are lifted within
//! the brand's row in proportion to where their price falls inside the
//! brand's own price range.

use crate::config::{MarkerSizing, PriceAggregate};
use crate::data::ProductRecord;
use crate::error::LayoutError;
use crate::filter::format_amount;
use crate::frequency::FrequencyComparison;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Share of a brand row's vertical band used for price variation
pub const BAND_FRACTION: f64 = 0.8;

/// One (brand, product type) aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub brand: String,
    pub product_type: String,
    pub price: f64,
    pub frequency: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    pub brand_spacing: f64,
    pub marker: MarkerSizing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPoint {
    pub product_type: String,
    pub x: f64,
    pub y: f64,
    pub price: f64,
    pub frequency: usize,
    pub marker_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandRow {
    pub brand: String,
    pub index: usize,
    pub baseline: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Ordered by x so the connecting line never doubles back
    pub points: Vec<LayoutPoint>,
}

impl BrandRow {
    pub fn price_range(&self) -> f64 {
        self.max_price - self.min_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub axis: Vec<String>,
    pub brand_spacing: f64,
    pub rows: Vec<BrandRow>,
    pub annotations: Vec<Annotation>,
}

impl Layout {
    pub fn point_count(&self) -> usize {
        self.rows.iter().map(|r| r.points.len()).sum()
    }

    pub fn brands(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.brand.as_str()).collect()
    }
}

/// Collapse filtered rows into one observation per (brand, axis category).
///
/// Product types are mapped through the comparison's axis; types that fall
/// outside it are dropped unless an "Others" bucket exists. Brands and
/// categories keep their encounter order.
pub fn aggregate_observations(
    records: &[&ProductRecord],
    axis: &FrequencyComparison,
    aggregate: PriceAggregate,
) -> Vec<Observation> {
    struct Acc {
        brand: String,
        product_type: String,
        min: f64,
        max: f64,
        sum: f64,
        count: usize,
    }

    let mut slots: HashMap<(&str, &str), usize> = HashMap::new();
    let mut accs: Vec<Acc> = Vec::new();

    for record in records {
        let Some(bucket) = axis.bucket_of(&record.product_type) else {
            continue;
        };
        let key = (record.brand.as_str(), bucket);
        match slots.get(&key) {
            Some(&i) => {
                let acc = &mut accs[i];
                acc.min = acc.min.min(record.price);
                acc.max = acc.max.max(record.price);
                acc.sum += record.price;
                acc.count += 1;
            }
            None => {
                slots.insert(key, accs.len());
                accs.push(Acc {
                    brand: record.brand.clone(),
                    product_type: bucket.to_string(),
                    min: record.price,
                    max: record.price,
                    sum: record.price,
                    count: 1,
                });
            }
        }
    }

    accs.into_iter()
        .map(|acc| {
            let price = match aggregate {
                PriceAggregate::Max => acc.max,
                PriceAggregate::Min => acc.min,
                PriceAggregate::Mean => acc.sum / acc.count as f64,
            };
            Observation {
                brand: acc.brand,
                product_type: acc.product_type,
                price,
                frequency: acc.count,
            }
        })
        .collect()
}

/// Compute plot coordinates, brand ordering and price annotations.
///
/// Pure and deterministic: the same observations in the same order always
/// produce the same layout. An empty input yields an empty layout.
pub fn compute_layout(
    observations: &[Observation],
    axis_order: &[String],
    params: &LayoutParams,
) -> Result<Layout, LayoutError> {
    let spacing = params.brand_spacing;
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(LayoutError::InvalidSpacing(spacing));
    }
    params.marker.validate()?;

    let axis_index: HashMap<&str, usize> = axis_order
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    // 1. group by brand, encounter order
    let mut brand_order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Observation>> = HashMap::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();

    for obs in observations {
        if !obs.price.is_finite() {
            return Err(LayoutError::NonFinitePrice { brand: obs.brand.clone() });
        }
        if !axis_index.contains_key(obs.product_type.as_str()) {
            return Err(LayoutError::UnknownProductType {
                brand: obs.brand.clone(),
                product_type: obs.product_type.clone(),
            });
        }
        if !seen.insert((obs.brand.as_str(), obs.product_type.as_str())) {
            return Err(LayoutError::DuplicateObservation {
                brand: obs.brand.clone(),
                product_type: obs.product_type.clone(),
            });
        }
        groups
            .entry(obs.brand.as_str())
            .or_insert_with(|| {
                brand_order.push(obs.brand.as_str());
                Vec::new()
            })
            .push(obs);
    }

    // 2-3. rank by cheapest observation; sort_by is stable so ties keep input order
    let mut ranked: Vec<(&str, f64, f64)> = brand_order
        .iter()
        .map(|&brand| {
            let prices = groups[brand].iter().map(|o| o.price);
            let min = prices.clone().fold(f64::INFINITY, f64::min);
            let max = prices.fold(f64::NEG_INFINITY, f64::max);
            (brand, min, max)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let trailing_x = axis_order.len() as f64;
    let mut rows = Vec::with_capacity(ranked.len());
    let mut annotations = Vec::with_capacity(ranked.len());

    // 4-5. place each brand's products inside its band
    for (idx, (brand, min_price, max_price)) in ranked.into_iter().enumerate() {
        let baseline = idx as f64 * spacing;
        let price_range = max_price - min_price;

        let mut points: Vec<LayoutPoint> = groups[brand]
            .iter()
            .map(|obs| {
                let y = if price_range == 0.0 {
                    baseline
                } else {
                    baseline + ((obs.price - min_price) / price_range) * (spacing * BAND_FRACTION)
                };
                LayoutPoint {
                    product_type: obs.product_type.clone(),
                    x: axis_index[obs.product_type.as_str()] as f64,
                    y,
                    price: obs.price,
                    frequency: obs.frequency,
                    marker_size: params.marker.size_for(obs.frequency),
                }
            })
            .collect();
        points.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        // 6. price summary to the right of the last category
        annotations.push(Annotation {
            text: price_label(min_price, max_price),
            x: trailing_x,
            y: baseline,
        });

        rows.push(BrandRow {
            brand: brand.to_string(),
            index: idx,
            baseline,
            min_price,
            max_price,
            points,
        });
    }

    log::debug!(
        "layout: {} brands, {} points over {} categories",
        rows.len(),
        rows.iter().map(|r| r.points.len()).sum::<usize>(),
        axis_order.len()
    );

    Ok(Layout {
        axis: axis_order.to_vec(),
        brand_spacing: spacing,
        rows,
        annotations,
    })
}

/// "$min" for a single price point, "$min - $max" otherwise
pub fn price_label(min: f64, max: f64) -> String {
    if min == max {
        format!("${}", format_amount(min))
    } else {
        format!("${} - ${}", format_amount(min), format_amount(max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{bucket_frequencies, BucketingOptions};

    fn obs(brand: &str, product_type: &str, price: f64, frequency: usize) -> Observation {
        Observation {
            brand: brand.to_string(),
            product_type: product_type.to_string(),
            price,
            frequency,
        }
    }

    fn axis(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn params(spacing: f64) -> LayoutParams {
        LayoutParams { brand_spacing: spacing, marker: MarkerSizing::default() }
    }

    fn rec(brand: &str, price: f64, product_type: &str) -> ProductRecord {
        ProductRecord {
            brand: brand.to_string(),
            price,
            product_type: product_type.to_string(),
            extras: vec![],
        }
    }

    #[test]
    fn test_two_brand_scenario() {
        let input = vec![
            obs("BrandA", "Shoe", 50.0, 3),
            obs("BrandA", "Boot", 90.0, 1),
            obs("BrandB", "Shoe", 60.0, 2),
        ];
        let layout = compute_layout(&input, &axis(&["Shoe", "Boot"]), &params(5.0)).unwrap();

        assert_eq!(layout.brands(), vec!["BrandA", "BrandB"]);

        let a = &layout.rows[0];
        assert_eq!(a.index, 0);
        assert_eq!(a.price_range(), 40.0);
        assert_eq!(a.points.len(), 2);
        assert_eq!((a.points[0].product_type.as_str(), a.points[0].x, a.points[0].y), ("Shoe", 0.0, 0.0));
        assert_eq!((a.points[1].product_type.as_str(), a.points[1].x, a.points[1].y), ("Boot", 1.0, 4.0));

        let b = &layout.rows[1];
        assert_eq!(b.points.len(), 1);
        assert_eq!(b.points[0].y, 5.0);

        assert_eq!(layout.annotations.len(), 2);
        assert_eq!(layout.annotations[0], Annotation { text: "$50 - $90".to_string(), x: 2.0, y: 0.0 });
        assert_eq!(layout.annotations[1], Annotation { text: "$60".to_string(), x: 2.0, y: 5.0 });
    }

    #[test]
    fn test_empty_input() {
        let layout = compute_layout(&[], &axis(&["Shoe"]), &params(5.0)).unwrap();
        assert_eq!(layout.point_count(), 0);
        assert!(layout.rows.is_empty());
        assert!(layout.annotations.is_empty());

        let layout = compute_layout(&[], &[], &params(5.0)).unwrap();
        assert!(layout.rows.is_empty());
    }

    #[test]
    fn test_brands_sorted_by_min_price_stable() {
        let input = vec![
            obs("Late", "Shoe", 30.0, 1),
            obs("Pricey", "Shoe", 300.0, 1),
            obs("Tie1", "Boot", 20.0, 1),
            obs("Tie2", "Shoe", 20.0, 1),
            obs("Late", "Boot", 10.0, 1),
        ];
        let layout = compute_layout(&input, &axis(&["Shoe", "Boot"]), &params(5.0)).unwrap();
        // Late's minimum is 10 once its Boot is seen
        assert_eq!(layout.brands(), vec!["Late", "Tie1", "Tie2", "Pricey"]);
        for pair in layout.rows.windows(2) {
            assert!(pair[0].min_price <= pair[1].min_price);
        }
    }

    #[test]
    fn test_flat_brand_shares_baseline() {
        let input = vec![
            obs("Flat", "Shoe", 70.0, 1),
            obs("Flat", "Boot", 70.0, 4),
            obs("Flat", "Sandal", 70.0, 2),
        ];
        let layout = compute_layout(&input, &axis(&["Shoe", "Boot", "Sandal"]), &params(5.0)).unwrap();
        let row = &layout.rows[0];
        assert!(row.points.iter().all(|p| p.y == row.baseline));
        assert_eq!(layout.annotations[0].text, "$70");
    }

    #[test]
    fn test_y_within_band() {
        let input = vec![
            obs("Cheap", "Shoe", 10.0, 1),
            obs("Wide", "Shoe", 100.0, 1),
            obs("Wide", "Boot", 1000.0, 1),
            obs("Wide", "Sandal", 550.0, 1),
        ];
        let spacing = 3.0;
        let layout = compute_layout(&input, &axis(&["Shoe", "Boot", "Sandal"]), &params(spacing)).unwrap();
        let wide = &layout.rows[1];
        let lo = wide.index as f64 * spacing;
        let hi = lo + spacing * BAND_FRACTION;
        for p in &wide.points {
            assert!(p.y >= lo && p.y <= hi, "y = {}", p.y);
        }
        let max_y = wide.points.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert!((max_y - hi).abs() < 1e-9);
    }

    #[test]
    fn test_points_ordered_by_x() {
        let input = vec![
            obs("A", "Sandal", 30.0, 1),
            obs("A", "Shoe", 10.0, 1),
            obs("A", "Boot", 20.0, 1),
        ];
        let layout = compute_layout(&input, &axis(&["Shoe", "Boot", "Sandal"]), &params(5.0)).unwrap();
        let xs: Vec<f64> = layout.rows[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_marker_sizes_follow_config() {
        let input = vec![obs("A", "Shoe", 1.0, 3), obs("A", "Boot", 2.0, 12), obs("A", "Mule", 3.0, 90)];
        let standard = compute_layout(&input, &axis(&["Shoe", "Boot", "Mule"]), &params(5.0)).unwrap();
        let sizes: Vec<f64> = standard.rows[0].points.iter().map(|p| p.marker_size).collect();
        assert_eq!(sizes, vec![10.0, 12.0, 25.0]);

        let compact = LayoutParams {
            brand_spacing: 3.0,
            marker: MarkerSizing { scale: 2.0, min: 10.0, max: 20.0 },
        };
        let layout = compute_layout(&input, &axis(&["Shoe", "Boot", "Mule"]), &compact).unwrap();
        let sizes: Vec<f64> = layout.rows[0].points.iter().map(|p| p.marker_size).collect();
        assert_eq!(sizes, vec![10.0, 20.0, 20.0]);
    }

    #[test]
    fn test_rejects_bad_spacing() {
        let input = vec![obs("A", "Shoe", 1.0, 1)];
        assert_eq!(
            compute_layout(&input, &axis(&["Shoe"]), &params(0.0)),
            Err(LayoutError::InvalidSpacing(0.0))
        );
        assert!(compute_layout(&input, &axis(&["Shoe"]), &params(f64::NAN)).is_err());
    }

    #[test]
    fn test_rejects_inverted_marker_bounds() {
        let input = vec![obs("A", "Shoe", 1.0, 1)];
        let inverted = LayoutParams {
            brand_spacing: 5.0,
            marker: MarkerSizing { scale: 1.0, min: 30.0, max: 10.0 },
        };
        assert_eq!(
            compute_layout(&input, &axis(&["Shoe"]), &inverted),
            Err(LayoutError::InvalidMarker { scale: 1.0, min: 30.0, max: 10.0 })
        );
    }

    #[test]
    fn test_rejects_off_axis_and_duplicate() {
        let off_axis = vec![obs("A", "Clog", 1.0, 1)];
        assert!(matches!(
            compute_layout(&off_axis, &axis(&["Shoe"]), &params(5.0)),
            Err(LayoutError::UnknownProductType { .. })
        ));

        let dup = vec![obs("A", "Shoe", 1.0, 1), obs("A", "Shoe", 2.0, 1)];
        assert!(matches!(
            compute_layout(&dup, &axis(&["Shoe"]), &params(5.0)),
            Err(LayoutError::DuplicateObservation { .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let input = vec![
            obs("B", "Boot", 80.0, 2),
            obs("A", "Shoe", 50.0, 3),
            obs("A", "Boot", 90.0, 1),
        ];
        let axis = axis(&["Shoe", "Boot"]);
        let first = compute_layout(&input, &axis, &params(5.0)).unwrap();
        let second = compute_layout(&input, &axis, &params(5.0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_aggregate_observations() {
        let records = vec![
            rec("A", 50.0, "Shoe"),
            rec("A", 70.0, "Shoe"),
            rec("A", 90.0, "Boot"),
            rec("B", 60.0, "Shoe"),
            rec("B", 65.0, "Clog"),
        ];
        let refs: Vec<&ProductRecord> = records.iter().collect();
        let options = BucketingOptions { top_n: 2, include_others: false, ..Default::default() };
        let cmp = bucket_frequencies(&refs, &refs, &options);
        assert_eq!(cmp.categories, vec!["Shoe", "Boot"]);

        let observations = aggregate_observations(&refs, &cmp, PriceAggregate::Max);
        assert_eq!(
            observations,
            vec![obs("A", "Shoe", 70.0, 2), obs("A", "Boot", 90.0, 1), obs("B", "Shoe", 60.0, 1)]
        );

        let means = aggregate_observations(&refs, &cmp, PriceAggregate::Mean);
        assert_eq!(means[0].price, 60.0);
        let mins = aggregate_observations(&refs, &cmp, PriceAggregate::Min);
        assert_eq!(mins[0].price, 50.0);
    }

    #[test]
    fn test_aggregate_folds_tail_into_others() {
        let records = vec![rec("A", 50.0, "Shoe"), rec("A", 20.0, "Clog"), rec("A", 30.0, "Mule")];
        let refs: Vec<&ProductRecord> = records.iter().collect();
        let options = BucketingOptions { top_n: 1, include_others: true, ..Default::default() };
        let cmp = bucket_frequencies(&refs, &refs, &options);
        let observations = aggregate_observations(&refs, &cmp, PriceAggregate::Max);
        assert_eq!(observations, vec![obs("A", "Shoe", 50.0, 1), obs("A", "Others", 30.0, 2)]);

        // every observation lands on the axis
        let layout = compute_layout(&observations, &cmp.categories, &params(5.0)).unwrap();
        assert_eq!(layout.rows[0].points[1].x, 1.0);
    }

    #[test]
    fn test_price_label() {
        assert_eq!(price_label(50.0, 50.0), "$50");
        assert_eq!(price_label(49.99, 120.0), "$49.99 - $120");
    }
}
