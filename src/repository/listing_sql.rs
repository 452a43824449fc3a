use sqlx::{QueryBuilder, Sqlite};

use crate::domain::listing::{ListCriteria, SortKey, SortOrder};

/// Column names of one listed table, qualified by its query alias.
pub(crate) struct ListingColumns {
    pub id: &'static str,
    pub department: &'static str,
    pub date: &'static str,
    pub category: Option<&'static str>,
}

pub(crate) fn push_filters<K: SortKey>(
    qb: &mut QueryBuilder<'_, Sqlite>,
    columns: &ListingColumns,
    criteria: &ListCriteria<K>,
) {
    qb.push(" WHERE 1 = 1");

    if let Some(department_id) = criteria.department_id {
        qb.push(format!(" AND {} = ", columns.department))
            .push_bind(department_id);
    }

    if let Some(from) = criteria.dates.lower_bound() {
        qb.push(format!(" AND {} >= ", columns.date))
            .push_bind(from.naive_utc());
    }

    if let Some(until) = criteria.dates.upper_bound_exclusive() {
        qb.push(format!(" AND {} < ", columns.date))
            .push_bind(until.naive_utc());
    }

    if let (Some(column), Some(category)) = (columns.category, criteria.category.as_ref()) {
        qb.push(format!(" AND {} = ", column))
            .push_bind(category.clone());
    }
}

/// Orders by `key`, then by id in the same direction so the order is total.
/// Nullable keys put NULLs last in either direction.
pub(crate) fn push_order(
    qb: &mut QueryBuilder<'_, Sqlite>,
    columns: &ListingColumns,
    key: &str,
    nullable: bool,
    order: SortOrder,
) {
    qb.push(" ORDER BY ");
    if nullable {
        qb.push(format!("({} IS NULL) ASC, ", key));
    }
    qb.push(format!("{} {}, {} {}", key, order.sql(), columns.id, order.sql()));
}

pub(crate) fn push_page<K: SortKey>(qb: &mut QueryBuilder<'_, Sqlite>, criteria: &ListCriteria<K>) {
    qb.push(" LIMIT ")
        .push_bind(crate::domain::PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind(criteria.offset());
}
