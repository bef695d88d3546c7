//! Filter, sort and paginate catalog records.
//!
//! The storefront keeps the active catalog in memory and answers listing
//! queries with [`list`]. Filtering is a conjunction of independent
//! predicates; sorting is a single stable comparator chosen by [`SortMode`];
//! pagination is 1-based offset/limit slicing.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, Service};
use crate::types::Price;
use crate::validation::ValidationErrors;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";
pub const DEFAULT_LIMIT: u32 = 12;
pub const MAX_LIMIT: u32 = 100;

/// A record that can be filtered and sorted by [`list`].
pub trait Listable {
    fn name(&self) -> &str;
    fn category_slug(&self) -> &str;
    fn brand(&self) -> Option<&str>;
    /// Text fields searched by the free-text filter.
    fn search_fields(&self) -> Vec<&str>;
    fn price(&self) -> Price;
    fn is_featured(&self) -> bool;
    fn is_active(&self) -> bool;
    fn in_stock(&self) -> bool;
    fn rating(&self) -> f32;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Listable for Product {
    fn name(&self) -> &str {
        &self.name
    }

    fn category_slug(&self) -> &str {
        self.category.slug()
    }

    fn brand(&self) -> Option<&str> {
        Some(&self.brand)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.brand, &self.description, &self.sku]
    }

    fn price(&self) -> Price {
        self.price
    }

    fn is_featured(&self) -> bool {
        self.is_featured
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn in_stock(&self) -> bool {
        self.stock > 0
    }

    fn rating(&self) -> f32 {
        self.rating
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Listable for Service {
    fn name(&self) -> &str {
        &self.name
    }

    fn category_slug(&self) -> &str {
        self.category.slug()
    }

    fn brand(&self) -> Option<&str> {
        None
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.description.as_str()];
        fields.extend(self.features.iter().map(String::as_str));
        fields
    }

    fn price(&self) -> Price {
        self.price
    }

    fn is_featured(&self) -> bool {
        self.is_featured
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn in_stock(&self) -> bool {
        true
    }

    fn rating(&self) -> f32 {
        0.0
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Sort order for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Featured records first; otherwise input order.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    /// Highest rating first.
    Rating,
    RatingAsc,
    /// Name A to Z, case-insensitive.
    Name,
    NameDesc,
    /// Most recently created first.
    Newest,
    Oldest,
}

impl SortMode {
    /// Parse a named mode such as `price-asc`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "featured" => Some(Self::Featured),
            "price-asc" | "price_asc" => Some(Self::PriceAsc),
            "price-desc" | "price_desc" => Some(Self::PriceDesc),
            "rating" | "rating-desc" | "rating_desc" => Some(Self::Rating),
            "rating-asc" | "rating_asc" => Some(Self::RatingAsc),
            "name" | "name-asc" | "name_asc" => Some(Self::Name),
            "name-desc" | "name_desc" => Some(Self::NameDesc),
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            _ => None,
        }
    }

    /// Map REST `sortBy`/`sortOrder` parameters onto a mode.
    ///
    /// Both are case-insensitive. Without `sortOrder` each field keeps its
    /// natural direction: price and name ascending, rating and creation time
    /// descending. Unknown fields fall back to [`SortMode::Featured`].
    #[must_use]
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let order = sort_order.map(|o| o.trim().to_ascii_lowercase());
        let descending = match order.as_deref() {
            Some("desc" | "descending") => Some(true),
            Some("asc" | "ascending") => Some(false),
            _ => None,
        };
        let Some(field) = sort_by.map(|f| f.trim().to_ascii_lowercase()) else {
            return Self::Featured;
        };
        match (field.as_str(), descending) {
            ("price", Some(true)) => Self::PriceDesc,
            ("price", _) => Self::PriceAsc,
            ("rating", Some(false)) => Self::RatingAsc,
            ("rating", _) => Self::Rating,
            ("name", Some(true)) => Self::NameDesc,
            ("name", _) => Self::Name,
            ("createdat" | "created_at" | "newest", Some(false)) => Self::Oldest,
            ("createdat" | "created_at" | "newest", _) => Self::Newest,
            (other, _) => Self::parse(other).unwrap_or_default(),
        }
    }

    fn compare<T: Listable>(self, a: &T, b: &T) -> Ordering {
        match self {
            Self::Featured => b.is_featured().cmp(&a.is_featured()),
            Self::PriceAsc => a.price().cmp(&b.price()),
            Self::PriceDesc => b.price().cmp(&a.price()),
            Self::Rating => b.rating().total_cmp(&a.rating()),
            Self::RatingAsc => a.rating().total_cmp(&b.rating()),
            Self::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
            Self::NameDesc => b.name().to_lowercase().cmp(&a.name().to_lowercase()),
            Self::Newest => b.created_at().cmp(&a.created_at()),
            Self::Oldest => a.created_at().cmp(&b.created_at()),
        }
    }
}

/// Filter, sort and page parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    /// Category slug; `None`, empty or `"All"` disables the filter.
    pub category: Option<String>,
    /// Case-insensitive brand equality.
    pub brand: Option<String>,
    /// Case-insensitive substring over the record's search fields.
    pub search: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub featured_only: bool,
    pub in_stock_only: bool,
    /// `Some(true)` keeps active records, `Some(false)` inactive ones.
    pub active: Option<bool>,
    pub sort: SortMode,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl ListingQuery {
    /// Page number, at least 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size clamped to `1..=MAX_LIMIT`; zero means the default.
    #[must_use]
    pub fn limit(&self) -> u32 {
        if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit.min(MAX_LIMIT)
        }
    }

    fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
    }

    /// Whether a record passes every active filter.
    #[must_use]
    pub fn matches<T: Listable>(&self, record: &T) -> bool {
        if let Some(category) = self.category_filter()
            && record.category_slug() != category
        {
            return false;
        }

        if let Some(brand) = self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty())
            && !record.brand().is_some_and(|b| b.eq_ignore_ascii_case(brand))
        {
            return false;
        }

        if let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let needle = needle.to_lowercase();
            if !record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        let price = record.price();
        if self.min_price.is_some_and(|min| price < min)
            || self.max_price.is_some_and(|max| price > max)
        {
            return false;
        }

        if self.featured_only && !record.is_featured() {
            return false;
        }
        if self.in_stock_only && !record.in_stock() {
            return false;
        }

        self.active.is_none_or(|active| record.is_active() == active)
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
    pub total: u32,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Transform the items, keeping the pagination.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Number of pages needed for `total` records at `limit` per page.
#[must_use]
pub const fn page_count(total: u32, limit: u32) -> u32 {
    if limit == 0 { 0 } else { total.div_ceil(limit) }
}

/// Filter and sort without paginating.
pub fn filter_and_sort<'a, T, I>(records: I, query: &ListingQuery) -> Vec<&'a T>
where
    T: Listable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut matched: Vec<&T> = records.into_iter().filter(|r| query.matches(*r)).collect();
    // sort_by is stable, so ties keep input order
    matched.sort_by(|a, b| query.sort.compare(*a, *b));
    matched
}

/// Filter, sort and paginate `records`. Pages past the end are empty.
pub fn list<'a, T, I>(records: I, query: &ListingQuery) -> Page<&'a T>
where
    T: Listable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let matched = filter_and_sort(records, query);
    let page = query.page();
    let limit = query.limit();
    let total = u32::try_from(matched.len()).unwrap_or(u32::MAX);

    let offset = usize::try_from(u64::from(page - 1) * u64::from(limit)).unwrap_or(usize::MAX);
    let items = matched
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect();

    Page {
        items,
        pagination: Pagination {
            page,
            limit,
            pages: page_count(total, limit),
            total,
        },
    }
}

/// Listing parameters as they arrive in a query string.
///
/// Prices and flags are kept as text so that a malformed value is reported
/// as a field error rather than a generic rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub is_featured: Option<String>,
    pub in_stock: Option<String>,
    pub is_active: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    /// Named sort mode such as `price-desc`; wins over `sortBy`.
    pub sort: Option<String>,
}

fn blank_to_none(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_flag(errors: &mut ValidationErrors, field: &str, value: Option<&String>) -> Option<bool> {
    match blank_to_none(value)?.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => {
            errors.add(field, "must be true or false");
            None
        }
    }
}

fn parse_bound(errors: &mut ValidationErrors, field: &str, value: Option<&String>) -> Option<Price> {
    let raw = blank_to_none(value)?;
    match raw.parse::<Decimal>().map(Price::new) {
        Ok(Ok(price)) => Some(price),
        Ok(Err(e)) => {
            errors.add(field, e.to_string());
            None
        }
        Err(_) => {
            errors.add(field, "must be a number");
            None
        }
    }
}

fn parse_count(errors: &mut ValidationErrors, field: &str, value: Option<&String>) -> u32 {
    blank_to_none(value).map_or(0, |raw| {
        raw.parse::<u32>().unwrap_or_else(|_| {
            errors.add(field, "must be a positive whole number");
            0
        })
    })
}

impl ListingParams {
    /// Convert to a [`ListingQuery`].
    ///
    /// `default_active` applies when `isActive` is absent: the storefront
    /// passes `Some(true)`, the back office `None`.
    ///
    /// # Errors
    ///
    /// Returns field errors for malformed flags, prices and page numbers,
    /// or a price range whose minimum exceeds its maximum.
    pub fn into_query(self, default_active: Option<bool>) -> Result<ListingQuery, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let featured_only = parse_flag(&mut errors, "isFeatured", self.is_featured.as_ref());
        let in_stock_only = parse_flag(&mut errors, "inStock", self.in_stock.as_ref());
        let active = parse_flag(&mut errors, "isActive", self.is_active.as_ref()).or(default_active);
        let min_price = parse_bound(&mut errors, "minPrice", self.min_price.as_ref());
        let max_price = parse_bound(&mut errors, "maxPrice", self.max_price.as_ref());
        let page = parse_count(&mut errors, "page", self.page.as_ref());
        let limit = parse_count(&mut errors, "limit", self.limit.as_ref());

        if let (Some(min), Some(max)) = (min_price, max_price)
            && min > max
        {
            errors.add("minPrice", "must not exceed maxPrice");
        }

        let sort = blank_to_none(self.sort.as_ref())
            .and_then(SortMode::parse)
            .unwrap_or_else(|| {
                SortMode::from_params(
                    blank_to_none(self.sort_by.as_ref()),
                    blank_to_none(self.sort_order.as_ref()),
                )
            });

        errors.into_result(ListingQuery {
            category: self.category,
            brand: self.brand,
            search: self.search,
            min_price,
            max_price,
            featured_only: featured_only.unwrap_or(false),
            in_stock_only: in_stock_only.unwrap_or(false),
            active,
            sort,
            page,
            limit,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::{ProductCategory, Specifications};
    use crate::types::ProductId;

    fn product(id: i32, name: &str, category: ProductCategory, cents: u64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            slug: name.to_lowercase(),
            description: format!("{name} description"),
            brand: if id % 2 == 0 { "Fender" } else { "Gibson" }.to_owned(),
            category,
            sku: format!("SKU-{id:03}"),
            price: Price::from_cents(cents),
            compare_at_price: None,
            stock: id % 3,
            is_active: true,
            is_featured: id % 4 == 0,
            rating: f32::from(u8::try_from(id % 5).unwrap()),
            review_count: 0,
            images: Vec::new(),
            ingredients: Vec::new(),
            tags: Vec::new(),
            specifications: Specifications::Unspecified,
            created_at: Utc.timestamp_opt(1_700_000_000 + i64::from(id), 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    fn catalog() -> Vec<Product> {
        let categories = ProductCategory::ALL;
        (1..=27)
            .map(|id| {
                let index = usize::try_from(id).unwrap() % categories.len();
                let cents = 1000 * u64::try_from(id).unwrap();
                product(id, &format!("Item {id:02}"), *categories.get(index).unwrap(), cents)
            })
            .collect()
    }

    fn ids(page: &Page<&Product>) -> Vec<i32> {
        page.items.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_all_category_is_unfiltered() {
        let products = catalog();
        let query = ListingQuery {
            category: Some(ALL_CATEGORIES.to_owned()),
            limit: MAX_LIMIT,
            ..ListingQuery::default()
        };
        assert_eq!(list(&products, &query).pagination.total, 27);
    }

    #[test]
    fn test_specific_category_matches_exactly() {
        let products = catalog();
        let query = ListingQuery {
            category: Some("amplifiers".to_owned()),
            limit: MAX_LIMIT,
            ..ListingQuery::default()
        };
        let page = list(&products, &query);
        assert!(!page.items.is_empty());
        assert!(
            page.items
                .iter()
                .all(|p| p.category == ProductCategory::Amplifiers)
        );
    }

    #[test]
    fn test_concatenated_pages_reproduce_full_list() {
        let products = catalog();
        let base = ListingQuery {
            sort: SortMode::PriceDesc,
            brand: Some("fender".to_owned()),
            limit: 4,
            ..ListingQuery::default()
        };
        let full: Vec<i32> = filter_and_sort(&products, &base)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();

        let pages = list(&products, &base).pagination.pages;
        assert_eq!(pages, page_count(u32::try_from(full.len()).unwrap(), 4));

        let mut concatenated = Vec::new();
        for page in 1..=pages {
            let query = ListingQuery { page, ..base.clone() };
            concatenated.extend(ids(&list(&products, &query)));
        }
        assert_eq!(concatenated, full);

        let past_end = ListingQuery {
            page: pages + 1,
            ..base
        };
        assert!(list(&products, &past_end).items.is_empty());
    }

    #[test]
    fn test_featured_first_is_stable() {
        let products = catalog();
        let page = list(
            &products,
            &ListingQuery {
                limit: MAX_LIMIT,
                ..ListingQuery::default()
            },
        );
        let featured: Vec<i32> = ids(&page).into_iter().take(6).collect();
        assert_eq!(featured, [4, 8, 12, 16, 20, 24]);
        assert_eq!(page.items.get(6).unwrap().id.as_i32(), 1);
    }

    #[test]
    fn test_search_and_price_range() {
        let products = catalog();
        let query = ListingQuery {
            search: Some("sku-01".to_owned()),
            min_price: Some(Price::from_units(120)),
            max_price: Some(Price::from_units(180)),
            sort: SortMode::PriceAsc,
            ..ListingQuery::default()
        };
        assert_eq!(ids(&list(&products, &query)), [12, 13, 14, 15, 16, 17, 18]);
    }

    #[test]
    fn test_in_stock_and_featured_filters() {
        let products = catalog();
        let query = ListingQuery {
            in_stock_only: true,
            featured_only: true,
            limit: MAX_LIMIT,
            ..ListingQuery::default()
        };
        let page = list(&products, &query);
        assert!(page.items.iter().all(|p| p.stock > 0 && p.is_featured));
    }

    #[test]
    fn test_limit_clamping() {
        let query = ListingQuery {
            limit: 1000,
            page: 0,
            ..ListingQuery::default()
        };
        assert_eq!(query.limit(), MAX_LIMIT);
        assert_eq!(query.page(), 1);
        assert_eq!(ListingQuery::default().limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_sort_params() {
        assert_eq!(SortMode::from_params(Some("price"), Some("desc")), SortMode::PriceDesc);
        assert_eq!(SortMode::from_params(Some("price"), None), SortMode::PriceAsc);
        assert_eq!(SortMode::from_params(Some("createdAt"), Some("desc")), SortMode::Newest);
        assert_eq!(SortMode::from_params(Some("price-desc"), None), SortMode::PriceDesc);
        assert_eq!(SortMode::from_params(Some("bogus"), None), SortMode::Featured);
        assert_eq!(SortMode::parse("Rating"), Some(SortMode::Rating));
    }

    #[test]
    fn test_sort_params_case_and_direction() {
        assert_eq!(SortMode::from_params(Some("Price"), Some("DESC")), SortMode::PriceDesc);
        assert_eq!(SortMode::from_params(Some(" NAME "), None), SortMode::Name);
        assert_eq!(SortMode::from_params(Some("name"), Some("desc")), SortMode::NameDesc);
        assert_eq!(SortMode::from_params(Some("rating"), None), SortMode::Rating);
        assert_eq!(SortMode::from_params(Some("rating"), Some("asc")), SortMode::RatingAsc);
        assert_eq!(SortMode::from_params(Some("createdAt"), Some("asc")), SortMode::Oldest);
        assert_eq!(SortMode::from_params(None, Some("desc")), SortMode::Featured);
    }

    #[test]
    fn test_reversed_sorts() {
        let products = catalog();
        let sorted = |sort| {
            let query = ListingQuery {
                sort,
                limit: MAX_LIMIT,
                ..ListingQuery::default()
            };
            ids(&list(&products, &query))
        };

        assert_eq!(sorted(SortMode::NameDesc).first(), Some(&27));
        assert_eq!(sorted(SortMode::Oldest).first(), Some(&1));
        let by_rating = sorted(SortMode::RatingAsc);
        // Ratings are id % 5, so the multiples of five rate zero.
        assert_eq!(by_rating.get(..5), Some(&[5, 10, 15, 20, 25][..]));
    }

    #[test]
    fn test_name_and_newest_sorts() {
        let mut products = catalog();
        products.push(product(40, "acoustic", ProductCategory::Guitars, 100));
        let by_name = list(
            &products,
            &ListingQuery {
                sort: SortMode::Name,
                ..ListingQuery::default()
            },
        );
        assert_eq!(by_name.items.first().unwrap().name, "acoustic");

        let newest = list(
            &products,
            &ListingQuery {
                sort: SortMode::Newest,
                ..ListingQuery::default()
            },
        );
        assert_eq!(newest.items.first().unwrap().id.as_i32(), 40);
    }

    #[test]
    fn test_params_into_query() {
        let params = ListingParams {
            category: Some("guitars".to_owned()),
            is_featured: Some("true".to_owned()),
            min_price: Some("100".to_owned()),
            max_price: Some("2500.50".to_owned()),
            page: Some("2".to_owned()),
            limit: Some("500".to_owned()),
            sort_by: Some("price".to_owned()),
            sort_order: Some("desc".to_owned()),
            ..ListingParams::default()
        };
        let query = params.into_query(Some(true)).unwrap();
        assert!(query.featured_only);
        assert!(!query.in_stock_only);
        assert_eq!(query.active, Some(true));
        assert_eq!(query.min_price, Some(Price::from_units(100)));
        assert_eq!(query.sort, SortMode::PriceDesc);
        assert_eq!(query.page(), 2);
        assert_eq!(query.limit(), MAX_LIMIT);
    }

    #[test]
    fn test_params_named_sort_wins() {
        let params = ListingParams {
            sort: Some("newest".to_owned()),
            sort_by: Some("price".to_owned()),
            ..ListingParams::default()
        };
        assert_eq!(params.into_query(None).unwrap().sort, SortMode::Newest);
    }

    #[test]
    fn test_params_report_bad_values() {
        let params = ListingParams {
            in_stock: Some("maybe".to_owned()),
            min_price: Some("-5".to_owned()),
            max_price: Some("cheap".to_owned()),
            page: Some("-1".to_owned()),
            ..ListingParams::default()
        };
        let errors = params.into_query(None).unwrap_err();
        assert!(errors.has("inStock"));
        assert!(errors.has("minPrice"));
        assert!(errors.has("maxPrice"));
        assert!(errors.has("page"));
    }

    #[test]
    fn test_params_inverted_range() {
        let params = ListingParams {
            min_price: Some("500".to_owned()),
            max_price: Some("100".to_owned()),
            ..ListingParams::default()
        };
        assert!(params.into_query(None).unwrap_err().has("minPrice"));
    }
}
