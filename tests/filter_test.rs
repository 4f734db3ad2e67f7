//! Listing search and filter laws, checked over a spread of generated
//! listings and criteria

mod common;

use std::collections::HashSet;

use common::listing;
use estate_market::listing::{filter_listings, FilterCriteria, ListingBoard, PriceRange, SortOrder};
use estate_market::models::{Listing, ListingType, PropertyType};

const TITLES: [&str; 6] = [
    "Sea view flat",
    "Farmhouse with orchard",
    "Office near metro",
    "Budget hostel",
    "Corner plot",
    "Heritage hotel",
];

const PRICES: [f64; 8] = [
    0.0,
    450_000.0,
    500_000.0,
    500_001.0,
    2_000_000.0,
    9_999_999.5,
    25_000_000.0,
    f64::NAN,
];

/// Deterministic mix of titles, prices, types and dates
fn sample() -> Vec<Listing> {
    (0..48)
        .map(|i| {
            let day = if i % 7 == 0 { None } else { Some((i * 5 % 28 + 1) as u32) };
            let mut l = listing(
                &format!("p{i}"),
                TITLES[i % TITLES.len()],
                PRICES[i % PRICES.len()],
                day,
            );
            l.property_type = Some(PropertyType::ALL[i % PropertyType::ALL.len()]);
            l.listing_type = match i % 3 {
                0 => Some(ListingType::Sale),
                1 => Some(ListingType::Rent),
                _ => None,
            };
            l
        })
        .collect()
}

fn criteria_grid() -> Vec<FilterCriteria> {
    let queries = ["", "flat", "PLOT", "500", "bengaluru", "zzz"];
    let mut grid = Vec::new();
    for (i, q) in queries.iter().enumerate() {
        for (j, range) in [None, Some(PriceRange::Below5Lakh), Some(PriceRange::Lakh10To50)]
            .into_iter()
            .enumerate()
        {
            for sort in [None, Some(SortOrder::Newest), Some(SortOrder::Oldest)] {
                grid.push(FilterCriteria {
                    query: q.to_string(),
                    property_type: (i % 2 == 1).then(|| PropertyType::ALL[i]),
                    listing_type: (j == 1).then_some(ListingType::Sale),
                    price_range: range,
                    sort,
                });
            }
        }
    }
    grid
}

#[test]
fn test_result_is_always_a_subset() {
    let all = sample();
    let ids: HashSet<&str> = all.iter().map(|l| l.id.as_str()).collect();

    for criteria in criteria_grid() {
        let result = filter_listings(&all, &criteria);
        assert!(result.len() <= all.len());
        let mut seen = HashSet::new();
        for l in result {
            assert!(ids.contains(l.id.as_str()));
            assert!(seen.insert(l.id.as_str()), "duplicate {}", l.id);
        }
    }
}

#[test]
fn test_every_match_contains_the_query() {
    let all = sample();
    for q in ["flat", "OFFICE", "500", "bengaluru", "o"] {
        let lowered = q.to_lowercase();
        for l in filter_listings(&all, &FilterCriteria::with_query(q)) {
            let hit = l.title.to_lowercase().contains(&lowered)
                || l.description.to_lowercase().contains(&lowered)
                || l.location.to_lowercase().contains(&lowered)
                || l.price.to_string().contains(&lowered);
            assert!(hit, "{} does not contain {q}", l.id);
        }
    }
}

#[test]
fn test_sorted_results_are_monotonic() {
    let all = sample();
    for criteria in criteria_grid() {
        let Some(order) = criteria.sort else { continue };
        let dates: Vec<_> = filter_listings(&all, &criteria)
            .iter()
            .filter_map(|l| l.created_at)
            .collect();
        for pair in dates.windows(2) {
            match order {
                SortOrder::Newest => assert!(pair[0] >= pair[1]),
                SortOrder::Oldest => assert!(pair[0] <= pair[1]),
            }
        }
    }
}

#[test]
fn test_unsorted_results_keep_fetch_order() {
    let all = sample();
    let position = |id: &str| all.iter().position(|l| l.id == id).unwrap();

    for criteria in criteria_grid().into_iter().filter(|c| c.sort.is_none()) {
        let positions: Vec<usize> = filter_listings(&all, &criteria)
            .iter()
            .map(|l| position(&l.id))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_price_bucket_scenario() {
    let all = vec![
        listing("cheap", "Studio", 400_000.0, Some(1)),
        listing("dear", "Penthouse", 2_000_000.0, Some(2)),
    ];
    let criteria = FilterCriteria {
        price_range: Some("0-500000".parse().unwrap()),
        ..Default::default()
    };

    let result = filter_listings(&all, &criteria);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, "cheap");
}

#[test]
fn test_listing_type_filter_is_case_insensitive_on_the_wire() {
    let records = serde_json::json!([
        { "_id": "a", "price": 1, "listingType": "Sell" },
        { "_id": "b", "price": 1, "listingType": "sale" },
        { "_id": "c", "price": 1, "listingType": "Rent" },
    ]);
    let all: Vec<Listing> = serde_json::from_value(records).unwrap();
    let criteria = FilterCriteria {
        listing_type: Some(ListingType::Sale),
        ..Default::default()
    };

    let ids: Vec<&str> = filter_listings(&all, &criteria)
        .iter()
        .map(|l| l.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_board_refilters_after_local_delete() {
    let mut board = ListingBoard::new();
    board.load(sample());
    board.set_query("flat");
    let before = board.visible().len();
    let victim = board.visible()[0].id.clone();

    board.remove_local(&victim);

    assert_eq!(board.visible().len(), before - 1);
    assert!(board.visible().iter().all(|l| l.id != victim));
}
