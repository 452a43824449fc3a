//! Filter, sort and pagination parameters shared by the notice and event lists.
//!
//! Query parameters arrive as raw strings so that a malformed value never
//! rejects the request. [`ListQuery::normalize`] turns them into typed
//! criteria plus user-facing warnings; anything unusable is dropped and
//! cleared from the echoed parameters.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: i64 = 10;

/// Highest page number whose offset still fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<SortOrder> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn reversed(&self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// A sortable column of one listing.
pub trait SortKey: Copy + std::fmt::Debug + PartialEq {
    const DEFAULT: Self;
    const DEFAULT_ORDER: SortOrder;
    /// Whether the listing accepts a `category` filter.
    const HAS_CATEGORY: bool;

    fn parse(s: &str) -> Option<Self>;
    fn as_str(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSortKey {
    Date,
    Title,
    Department,
}

impl SortKey for NoticeSortKey {
    const DEFAULT: Self = NoticeSortKey::Date;
    const DEFAULT_ORDER: SortOrder = SortOrder::Desc;
    const HAS_CATEGORY: bool = false;

    fn parse(s: &str) -> Option<Self> {
        match s {
            "date" => Some(NoticeSortKey::Date),
            "title" => Some(NoticeSortKey::Title),
            "department" => Some(NoticeSortKey::Department),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            NoticeSortKey::Date => "date",
            NoticeSortKey::Title => "title",
            NoticeSortKey::Department => "department",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSortKey {
    Date,
    Title,
    Department,
    Category,
}

impl SortKey for EventSortKey {
    const DEFAULT: Self = EventSortKey::Date;
    const DEFAULT_ORDER: SortOrder = SortOrder::Asc;
    const HAS_CATEGORY: bool = true;

    fn parse(s: &str) -> Option<Self> {
        match s {
            "date" => Some(EventSortKey::Date),
            "title" => Some(EventSortKey::Title),
            "department" => Some(EventSortKey::Department),
            "category" => Some(EventSortKey::Category),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            EventSortKey::Date => "date",
            EventSortKey::Title => "title",
            EventSortKey::Department => "department",
            EventSortKey::Category => "category",
        }
    }
}

/// Raw list query parameters, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub department_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
}

/// Inclusive calendar-date window. The end date matches through the end of that day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.start.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// First instant after the window: midnight of the day following `end`.
    pub fn upper_bound_exclusive(&self) -> Option<DateTime<Utc>> {
        self.end
            .map(|d| (d + Duration::days(1)).and_time(NaiveTime::MIN).and_utc())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.lower_bound().map_or(true, |lo| at >= lo)
            && self.upper_bound_exclusive().map_or(true, |hi| at < hi)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListCriteria<K: SortKey> {
    pub department_id: Option<i64>,
    pub dates: DateRange,
    pub category: Option<String>,
    pub sort_by: K,
    pub sort_order: SortOrder,
    pub page: i64,
}

pub type NoticeCriteria = ListCriteria<NoticeSortKey>;
pub type EventCriteria = ListCriteria<EventSortKey>;

impl<K: SortKey> Default for ListCriteria<K> {
    fn default() -> Self {
        Self {
            department_id: None,
            dates: DateRange::default(),
            category: None,
            sort_by: K::DEFAULT,
            sort_order: K::DEFAULT_ORDER,
            page: 1,
        }
    }
}

impl<K: SortKey> ListCriteria<K> {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(PAGE_SIZE)
    }

    /// The normalized parameters to echo back into filter controls and page links.
    pub fn params(&self) -> ListingParams {
        ListingParams {
            department_id: self.department_id.unwrap_or(0),
            start_date: self.dates.start.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            end_date: self.dates.end.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            category: self.category.clone().unwrap_or_default(),
            sort_by: self.sort_by.as_str().to_string(),
            sort_order: self.sort_order.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalized<K: SortKey> {
    pub criteria: ListCriteria<K>,
    pub warnings: Vec<String>,
}

impl ListQuery {
    pub fn notice_criteria(&self) -> Normalized<NoticeSortKey> {
        self.normalize()
    }

    pub fn event_criteria(&self) -> Normalized<EventSortKey> {
        self.normalize()
    }

    /// Syntactic normalization only; department existence is checked against the store later.
    pub fn normalize<K: SortKey>(&self) -> Normalized<K> {
        let mut warnings = Vec::new();

        let department_id = match non_empty(&self.department_id) {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(0) => None,
                Ok(id) => Some(id),
                Err(_) => {
                    warnings.push("Invalid Department ID provided.".to_string());
                    None
                }
            },
        };

        let start = parse_date(&self.start_date, "start", &mut warnings);
        let end = parse_date(&self.end_date, "end", &mut warnings);

        let category = if K::HAS_CATEGORY {
            non_empty(&self.category).map(str::to_string)
        } else {
            None
        };

        let sort_by = non_empty(&self.sort_by)
            .and_then(K::parse)
            .unwrap_or(K::DEFAULT);

        let sort_order = non_empty(&self.sort_order)
            .and_then(SortOrder::parse)
            .unwrap_or(K::DEFAULT_ORDER);

        let page = non_empty(&self.page)
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(MAX_PAGE))
            .unwrap_or(1);

        Normalized {
            criteria: ListCriteria {
                department_id,
                dates: DateRange { start, end },
                category,
                sort_by,
                sort_order,
                page,
            },
            warnings,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(value: &Option<String>, which: &str, warnings: &mut Vec<String>) -> Option<NaiveDate> {
    let raw = non_empty(value)?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warnings.push(format!("Invalid {} date format. Please use YYYY-MM-DD.", which));
            None
        }
    }
}

/// Normalized filter/sort parameters as echoed to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingParams {
    pub department_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub category: String,
    pub sort_by: String,
    pub sort_order: String,
}

#[derive(Serialize)]
struct PageLinkQuery<'a> {
    #[serde(skip_serializing_if = "is_zero")]
    department_id: i64,
    #[serde(skip_serializing_if = "str::is_empty")]
    start_date: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    end_date: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    category: &'a str,
    sort_by: &'a str,
    sort_order: &'a str,
    page: i64,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl ListingParams {
    /// Query string for `page` that keeps the current filters and sort.
    pub fn query_for_page(&self, page: i64) -> String {
        let query = PageLinkQuery {
            department_id: self.department_id,
            start_date: &self.start_date,
            end_date: &self.end_date,
            category: &self.category,
            sort_by: &self.sort_by,
            sort_order: &self.sort_order,
            page,
        };
        serde_urlencoded::to_string(&query).unwrap_or_else(|_| format!("page={}", page))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, total: i64) -> Self {
        Self { items, page, per_page: PAGE_SIZE, total }
    }

    pub fn empty(page: i64) -> Self {
        Self::new(Vec::new(), page, 0)
    }

    pub fn pages(&self) -> i64 {
        if self.total <= 0 {
            0
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn prev_num(&self) -> i64 {
        (self.page - 1).max(1)
    }

    pub fn next_num(&self) -> i64 {
        self.page.saturating_add(1)
    }

    /// Page numbers to link, with `None` marking an elided gap.
    pub fn page_links(&self) -> Vec<Option<i64>> {
        const EDGE: i64 = 2;
        const BEFORE_CURRENT: i64 = 2;
        const AFTER_CURRENT: i64 = 4;

        let mut links = Vec::new();
        let mut last = 0;
        for num in 1..=self.pages() {
            let near_edge = num <= EDGE || num > self.pages() - EDGE;
            let near_current = num >= self.page - BEFORE_CURRENT && num <= self.page.saturating_add(AFTER_CURRENT);
            if near_edge || near_current {
                if last + 1 != num {
                    links.push(None);
                }
                links.push(Some(num));
                last = num;
            }
        }
        links
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}
