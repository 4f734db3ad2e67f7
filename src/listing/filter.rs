use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Listing, ListingType, PropertyType};

/// One of the five fixed price bands, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceRange {
    /// 0 to 5 lakh
    Below5Lakh,
    /// 5 lakh to 10 lakh
    Lakh5To10,
    /// 10 lakh to 50 lakh
    Lakh10To50,
    /// 50 lakh to 1 crore
    Lakh50To1Crore,
    /// 1 crore to 10 crore
    Above1Crore,
}

impl PriceRange {
    pub const ALL: [PriceRange; 5] = [
        PriceRange::Below5Lakh,
        PriceRange::Lakh5To10,
        PriceRange::Lakh10To50,
        PriceRange::Lakh50To1Crore,
        PriceRange::Above1Crore,
    ];

    pub fn bounds(&self) -> (f64, f64) {
        match self {
            PriceRange::Below5Lakh => (0.0, 500_000.0),
            PriceRange::Lakh5To10 => (500_001.0, 1_000_000.0),
            PriceRange::Lakh10To50 => (1_000_001.0, 5_000_000.0),
            PriceRange::Lakh50To1Crore => (5_000_001.0, 10_000_000.0),
            PriceRange::Above1Crore => (10_000_001.0, 100_000_000.0),
        }
    }

    /// NaN prices fall in no band
    pub fn contains(&self, price: f64) -> bool {
        let (min, max) = self.bounds();
        price >= min && price <= max
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::Below5Lakh => "0-500000",
            PriceRange::Lakh5To10 => "500001-1000000",
            PriceRange::Lakh10To50 => "1000001-5000000",
            PriceRange::Lakh50To1Crore => "5000001-10000000",
            PriceRange::Above1Crore => "10000001-100000000",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceRange::Below5Lakh => "Below ₹5 Lakh",
            PriceRange::Lakh5To10 => "₹5L–₹10L",
            PriceRange::Lakh10To50 => "₹10L–₹50L",
            PriceRange::Lakh50To1Crore => "₹50L–₹1Cr",
            PriceRange::Above1Crore => "₹1Cr+",
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceRange::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("unknown price range: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Newest,
    Oldest,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Newest => f.write_str("newest"),
            SortOrder::Oldest => f.write_str("oldest"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// View-local filter state. Empty query and `None` fields filter nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub query: String,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub price_range: Option<PriceRange>,
    pub sort: Option<SortOrder>,
}

impl FilterCriteria {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
            && self.property_type.is_none()
            && self.listing_type.is_none()
            && self.price_range.is_none()
            && self.sort.is_none()
    }
}

/// Narrow `listings` by `criteria`, then sort if asked.
///
/// The result only ever holds elements of `listings`. Without a sort order
/// they keep their fetch order.
pub fn filter_listings<'a>(listings: &'a [Listing], criteria: &FilterCriteria) -> Vec<&'a Listing> {
    let mut result: Vec<&Listing> = listings.iter().collect();

    if !criteria.query.trim().is_empty() {
        let query = criteria.query.to_lowercase();
        result.retain(|l| matches_query(l, &query));
    }

    if let Some(property_type) = criteria.property_type {
        result.retain(|l| l.property_type == Some(property_type));
    }

    if let Some(listing_type) = criteria.listing_type {
        result.retain(|l| l.listing_type == Some(listing_type));
    }

    if let Some(range) = criteria.price_range {
        result.retain(|l| range.contains(l.price));
    }

    if let Some(order) = criteria.sort {
        // sort_by is stable; undated listings go last either way
        result.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => match order {
                SortOrder::Oldest => x.cmp(&y),
                SortOrder::Newest => y.cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    result
}

fn matches_query(listing: &Listing, lowered_query: &str) -> bool {
    listing.title.to_lowercase().contains(lowered_query)
        || listing.description.to_lowercase().contains(lowered_query)
        || listing.location.to_lowercase().contains(lowered_query)
        || listing.price_text().contains(lowered_query)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    PropertyType,
    ListingType,
    Price,
    Sort,
}

/// A selected facet, shown as a removable chip
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterChoice {
    PropertyType(PropertyType),
    ListingType(ListingType),
    Price(PriceRange),
    Sort(SortOrder),
}

impl FilterChoice {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterChoice::PropertyType(_) => FilterKind::PropertyType,
            FilterChoice::ListingType(_) => FilterKind::ListingType,
            FilterChoice::Price(_) => FilterKind::Price,
            FilterChoice::Sort(_) => FilterKind::Sort,
        }
    }
}

impl fmt::Display for FilterChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterChoice::PropertyType(t) => write!(f, "Type: {t}"),
            FilterChoice::ListingType(t) => write!(f, "Listing: {t}"),
            FilterChoice::Price(r) => write!(f, "Price: {}", r.label()),
            FilterChoice::Sort(s) => write!(f, "Sort: {s}"),
        }
    }
}

/// Ordered set of chips, at most one per kind, kept in step with criteria
#[derive(Debug, Clone, Default)]
pub struct ActiveFilters {
    chips: Vec<FilterChoice>,
}

impl ActiveFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a facet: a chip of the same kind is replaced in place,
    /// otherwise a new chip is appended.
    pub fn select(&mut self, criteria: &mut FilterCriteria, choice: FilterChoice) {
        match choice {
            FilterChoice::PropertyType(t) => criteria.property_type = Some(t),
            FilterChoice::ListingType(t) => criteria.listing_type = Some(t),
            FilterChoice::Price(r) => criteria.price_range = Some(r),
            FilterChoice::Sort(s) => criteria.sort = Some(s),
        }

        match self.chips.iter_mut().find(|c| c.kind() == choice.kind()) {
            Some(existing) => *existing = choice,
            None => self.chips.push(choice),
        }
    }

    /// Drop the chip of `kind` and clear the matching criterion
    pub fn remove(&mut self, criteria: &mut FilterCriteria, kind: FilterKind) {
        match kind {
            FilterKind::PropertyType => criteria.property_type = None,
            FilterKind::ListingType => criteria.listing_type = None,
            FilterKind::Price => criteria.price_range = None,
            FilterKind::Sort => criteria.sort = None,
        }
        self.chips.retain(|c| c.kind() != kind);
    }

    pub fn chips(&self) -> &[FilterChoice] {
        &self.chips
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn listing(id: &str, title: &str, price: f64, day: Option<u32>) -> Listing {
        Listing {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            property_type: None,
            listing_type: None,
            location: String::new(),
            price,
            bedrooms: None,
            carpet_area: None,
            build_up_area: None,
            contact_number: None,
            images: Vec::new(),
            created_at: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()),
        }
    }

    fn ids(result: &[&Listing]) -> Vec<String> {
        result.iter().map(|l| l.id.clone()).collect()
    }

    #[test]
    fn test_empty_criteria_keeps_fetch_order() {
        let all = vec![listing("b", "", 1.0, Some(2)), listing("a", "", 1.0, Some(1))];
        assert_eq!(ids(&filter_listings(&all, &FilterCriteria::default())), vec!["b", "a"]);
    }

    #[test]
    fn test_whitespace_query_filters_nothing() {
        let all = vec![listing("a", "Flat", 1.0, None)];
        assert_eq!(filter_listings(&all, &FilterCriteria::with_query("   ")).len(), 1);
    }

    #[test]
    fn test_query_matches_price_text() {
        let all = vec![
            listing("a", "Flat", 400_000.0, None),
            listing("b", "Flat", 2_000_000.0, None),
        ];
        assert_eq!(ids(&filter_listings(&all, &FilterCriteria::with_query("4000"))), vec!["a"]);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let all = vec![listing("a", "Sea View Villa", 1.0, None)];
        assert_eq!(filter_listings(&all, &FilterCriteria::with_query("VIEW")).len(), 1);
    }

    #[test]
    fn test_price_bucket_bounds_are_inclusive() {
        let all = vec![
            listing("lo", "", 500_000.0, None),
            listing("hi", "", 500_001.0, None),
            listing("nan", "", f64::NAN, None),
        ];
        let criteria = FilterCriteria {
            price_range: Some(PriceRange::Below5Lakh),
            ..Default::default()
        };
        assert_eq!(ids(&filter_listings(&all, &criteria)), vec!["lo"]);
    }

    #[test]
    fn test_sort_is_stable_and_puts_undated_last() {
        let all = vec![
            listing("u1", "", 1.0, None),
            listing("d1", "", 1.0, Some(1)),
            listing("d3a", "", 1.0, Some(3)),
            listing("u2", "", 1.0, None),
            listing("d3b", "", 1.0, Some(3)),
        ];

        let newest = FilterCriteria {
            sort: Some(SortOrder::Newest),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_listings(&all, &newest)),
            vec!["d3a", "d3b", "d1", "u1", "u2"]
        );

        let oldest = FilterCriteria {
            sort: Some(SortOrder::Oldest),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_listings(&all, &oldest)),
            vec!["d1", "d3a", "d3b", "u1", "u2"]
        );
    }

    #[test]
    fn test_price_range_round_trips_through_str() {
        for range in PriceRange::ALL {
            assert_eq!(range.as_str().parse::<PriceRange>().unwrap(), range);
        }
        assert!("1-2".parse::<PriceRange>().is_err());
    }

    #[test]
    fn test_active_filters_replace_and_remove() {
        let mut criteria = FilterCriteria::default();
        let mut active = ActiveFilters::new();

        active.select(&mut criteria, FilterChoice::Price(PriceRange::Lakh5To10));
        active.select(&mut criteria, FilterChoice::Sort(SortOrder::Newest));
        active.select(&mut criteria, FilterChoice::Price(PriceRange::Above1Crore));

        assert_eq!(
            active.chips(),
            &[
                FilterChoice::Price(PriceRange::Above1Crore),
                FilterChoice::Sort(SortOrder::Newest)
            ]
        );
        assert_eq!(criteria.price_range, Some(PriceRange::Above1Crore));

        active.remove(&mut criteria, FilterKind::Price);
        assert_eq!(criteria.price_range, None);
        assert_eq!(active.chips(), &[FilterChoice::Sort(SortOrder::Newest)]);
    }
}
