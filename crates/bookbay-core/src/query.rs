//! Catalog filter engine.
//!
//! Facets combine with AND; the selections inside one facet combine with OR.
//! Every call re-evaluates the whole catalog; catalogs are small and static.

use crate::model::Book;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const PRICE_FLOOR: f64 = 0.0;
pub const PRICE_CEILING: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    /// Catalog order; no scoring.
    #[default]
    Relevance,
    PriceLowHigh,
    PriceHighLow,
    Newest,
}

impl SortBy {
    /// Unknown keys fall back to relevance.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "price-low-high" => SortBy::PriceLowHigh,
            "price-high-low" => SortBy::PriceHighLow,
            "newest" => SortBy::Newest,
            _ => SortBy::Relevance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub lo: f64,
    pub hi: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            lo: PRICE_FLOOR,
            hi: PRICE_CEILING,
        }
    }
}

impl PriceRange {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }.normalized()
    }

    /// Clamps both bounds into the slider range and swaps inverted bounds.
    pub fn normalized(self) -> Self {
        let clamp = |v: f64, fallback: f64| {
            if v.is_nan() {
                fallback
            } else {
                v.clamp(PRICE_FLOOR, PRICE_CEILING)
            }
        };
        let lo = clamp(self.lo, PRICE_FLOOR);
        let hi = clamp(self.hi, PRICE_CEILING);
        if lo > hi {
            Self { lo: hi, hi: lo }
        } else {
            Self { lo, hi }
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.lo <= price && price <= self.hi
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub category: BTreeSet<String>,
    #[serde(default)]
    pub condition: BTreeSet<String>,
    #[serde(default)]
    pub price_range: PriceRange,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl FilterState {
    pub fn toggle_category(&mut self, tag: &str) {
        toggle(&mut self.category, tag);
    }

    pub fn toggle_condition(&mut self, condition: &str) {
        toggle(&mut self.condition, condition);
    }

    pub fn set_price_range(&mut self, lo: f64, hi: f64) {
        self.price_range = PriceRange::new(lo, hi);
    }

    pub fn set_sort(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether any facet narrows the catalog. Sort order does not count.
    pub fn has_active_filters(&self) -> bool {
        !self.category.is_empty() || !self.condition.is_empty() || !self.price_range.is_default()
    }

    fn matches(&self, book: &Book) -> bool {
        if !self.category.is_empty() && !book.has_any_category(&self.category) {
            return false;
        }
        if !self.condition.is_empty() && !self.condition.contains(book.condition.as_str()) {
            return false;
        }
        self.price_range.normalized().contains(book.price)
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

fn matches_text(book: &Book, needle: &str) -> bool {
    book.title.to_lowercase().contains(needle)
        || book.author.to_lowercase().contains(needle)
        || book.description.to_lowercase().contains(needle)
}

/// Returns the books matching `query` and `filters`, ordered per `filters.sort_by`.
pub fn filter(catalog: &[Book], query: &str, filters: &FilterState) -> Vec<Book> {
    let needle = query.to_lowercase();
    let mut out: Vec<Book> = catalog
        .iter()
        .filter(|b| needle.is_empty() || matches_text(b, &needle))
        .filter(|b| filters.matches(b))
        .cloned()
        .collect();
    // sort_by is stable, so ties keep catalog order
    match filters.sort_by {
        SortBy::PriceLowHigh => out.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortBy::PriceHighLow => out.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortBy::Newest => out.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
        SortBy::Relevance => {}
    }
    out
}

/// Search request as carried in a query string.
///
/// `category` and `condition` take comma-separated lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

impl SearchParams {
    pub fn filters(&self) -> FilterState {
        FilterState {
            category: split_list(self.category.as_deref()),
            condition: split_list(self.condition.as_deref()),
            price_range: PriceRange::new(
                self.min_price.unwrap_or(PRICE_FLOOR),
                self.max_price.unwrap_or(PRICE_CEILING),
            ),
            sort_by: self
                .sort
                .as_deref()
                .map(SortBy::parse_lenient)
                .unwrap_or_default(),
        }
    }

    /// Parameters written back to the page URL. Multi-selections, sort and price stay out.
    pub fn mirror(query: &str, filters: &FilterState) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        if !query.is_empty() {
            out.insert("q".to_string(), query.to_string());
        }
        if let (1, Some(c)) = (filters.category.len(), filters.category.iter().next()) {
            out.insert("category".to_string(), c.clone());
        }
        if let (1, Some(c)) = (filters.condition.len(), filters.condition.iter().next()) {
            out.insert("condition".to_string(), c.clone());
        }
        out
    }
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_books;
    use crate::model::Condition;
    use pretty_assertions::assert_eq;

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    fn with_categories(tags: &[&str]) -> FilterState {
        let mut f = FilterState::default();
        for t in tags {
            f.toggle_category(t);
        }
        f
    }

    #[test]
    fn query_matches_title_author_or_description() {
        let books = sample_books();
        let f = FilterState::default();
        assert_eq!(titles(&filter(&books, "atomic", &f)), vec!["Atomic Habits"]);
        assert_eq!(titles(&filter(&books, "WEIR", &f)), vec!["Project Hail Mary"]);
        assert_eq!(titles(&filter(&books, "shepherd", &f)), vec!["The Alchemist"]);
        assert!(filter(&books, "no such phrase", &f).is_empty());
    }

    #[test]
    fn default_filters_keep_catalog_order() {
        let books = sample_books();
        let out = filter(&books, "", &FilterState::default());
        assert_eq!(out, books);
    }

    #[test]
    fn fiction_and_new_gives_project_hail_mary() {
        let books = sample_books();
        let mut f = with_categories(&["fiction"]);
        f.toggle_condition("new");
        assert_eq!(titles(&filter(&books, "", &f)), vec!["Project Hail Mary"]);
    }

    #[test]
    fn categories_combine_with_or() {
        let books = sample_books();
        let union = filter(&books, "", &with_categories(&["business", "memoir"]));
        assert_eq!(titles(&union), vec!["Educated", "The Psychology of Money"]);
    }

    #[test]
    fn facets_combine_with_and() {
        let books = sample_books();
        let mut f = with_categories(&["fiction", "non-fiction"]);
        f.toggle_condition("good");
        f.set_price_range(0.0, 12.0);
        let out = filter(&books, "", &f);
        assert_eq!(titles(&out), vec!["The Alchemist"]);
        for b in &out {
            assert!(b.has_any_category(&f.category));
            assert_eq!(b.condition, Condition::Good);
            assert!(b.price <= 12.0);
        }
    }

    #[test]
    fn price_ceiling_of_twelve() {
        let books = sample_books();
        let mut f = FilterState::default();
        f.set_price_range(0.0, 12.0);
        let out = filter(&books, "", &f);
        assert_eq!(titles(&out), vec!["The Great Gatsby", "The Alchemist"]);
        assert!(out.iter().all(|b| b.price <= 12.0));
    }

    #[test]
    fn unknown_facet_values_match_nothing() {
        let books = sample_books();
        assert!(filter(&books, "", &with_categories(&["cookbooks"])).is_empty());
        let mut f = FilterState::default();
        f.toggle_condition("mint");
        assert!(filter(&books, "", &f).is_empty());
    }

    #[test]
    fn price_sorts_are_monotonic() {
        let books = sample_books();
        let mut f = FilterState::default();
        f.set_sort(SortBy::PriceLowHigh);
        let asc = filter(&books, "", &f);
        assert!(asc.windows(2).all(|w| w[0].price <= w[1].price));
        assert_eq!(asc[0].title, "The Great Gatsby");

        f.set_sort(SortBy::PriceHighLow);
        let desc = filter(&books, "", &f);
        assert!(desc.windows(2).all(|w| w[0].price >= w[1].price));
        assert_eq!(desc[0].title, "Project Hail Mary");
    }

    #[test]
    fn newest_sorts_by_date_added() {
        let books = sample_books();
        let mut f = FilterState::default();
        f.set_sort(SortBy::Newest);
        let out = filter(&books, "", &f);
        assert!(out.windows(2).all(|w| w[0].date_added >= w[1].date_added));
        assert_eq!(out[0].title, "The Midnight Library");
        assert_eq!(out[7].title, "The Great Gatsby");
    }

    #[test]
    fn result_is_subsequence_and_idempotent() {
        let books = sample_books();
        let mut f = with_categories(&["fiction", "self-help"]);
        f.set_price_range(10.0, 20.0);
        for q in ["", "the", "a", "habit"] {
            let once = filter(&books, q, &f);
            let mut it = books.iter();
            assert!(once.iter().all(|b| it.any(|c| c == b)));
            assert_eq!(filter(&once, q, &f), once);
        }
    }

    #[test]
    fn malformed_price_range_is_clamped() {
        assert_eq!(PriceRange::new(-5.0, 500.0), PriceRange::default());
        assert_eq!(PriceRange::new(30.0, 10.0), PriceRange { lo: 10.0, hi: 30.0 });
        assert_eq!(PriceRange::new(f64::NAN, 20.0), PriceRange { lo: 0.0, hi: 20.0 });
    }

    #[test]
    fn toggles_and_clear() {
        let mut f = FilterState::default();
        assert!(!f.has_active_filters());
        f.toggle_category("fiction");
        assert!(f.has_active_filters());
        f.toggle_category("fiction");
        assert!(!f.has_active_filters());
        f.set_sort(SortBy::Newest);
        assert!(!f.has_active_filters());
        f.set_price_range(5.0, 50.0);
        assert!(f.has_active_filters());
        f.clear();
        assert_eq!(f, FilterState::default());
    }

    #[test]
    fn params_parse_lists_and_mirror_single_values() {
        let p = SearchParams {
            q: "the".into(),
            category: Some("fiction, fantasy".into()),
            condition: Some("good".into()),
            sort: Some("bogus".into()),
            min_price: Some(5.0),
            max_price: None,
        };
        let f = p.filters();
        assert_eq!(f.category.len(), 2);
        assert_eq!(f.sort_by, SortBy::Relevance);
        assert_eq!(f.price_range, PriceRange { lo: 5.0, hi: 100.0 });

        let mirror = SearchParams::mirror(&p.q, &f);
        assert_eq!(mirror.get("q").map(String::as_str), Some("the"));
        assert_eq!(mirror.get("category"), None);
        assert_eq!(mirror.get("condition").map(String::as_str), Some("good"));
    }
}
