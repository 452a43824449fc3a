use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::{
    domain::{
        listing::{EventCriteria, EventSortKey},
        Event, EventCategory, EventDetail, EventInput, EventSummary, MediaOwner, Page,
    },
    error::{AppError, Result},
    repository::{
        listing_sql::{push_filters, push_order, push_page, ListingColumns},
        media_file_repository::media_files_for,
        EventRepository,
    },
};

const COLUMNS: ListingColumns = ListingColumns {
    id: "e.id",
    department: "e.department_id",
    date: "e.event_date",
    category: Some("e.category"),
};

const EVENT_SELECT: &str = r#"
    SELECT e.id, e.title, e.description, e.event_date, e.venue, e.category,
           e.user_id, e.department_id, e.last_edited_by_id, e.last_edited_at
    FROM events e"#;

const SUMMARY_SELECT: &str = r#"
    SELECT e.id, e.title, e.description, e.event_date, e.venue, e.category,
           e.user_id, e.department_id, e.last_edited_by_id, e.last_edited_at,
           u.username AS organizer, d.name AS department_name
    FROM events e
    JOIN users u ON u.id = e.user_id
    LEFT JOIN departments d ON d.id = e.department_id"#;

#[derive(FromRow)]
struct EventRow {
    id: i64,
    title: String,
    description: String,
    event_date: NaiveDateTime,
    venue: String,
    category: Option<String>,
    user_id: i64,
    department_id: Option<i64>,
    last_edited_by_id: Option<i64>,
    last_edited_at: Option<NaiveDateTime>,
}

#[derive(FromRow)]
struct EventSummaryRow {
    #[sqlx(flatten)]
    event: EventRow,
    organizer: String,
    department_name: Option<String>,
}

#[derive(FromRow)]
struct EventDetailRow {
    #[sqlx(flatten)]
    event: EventRow,
    organizer: String,
    department_name: Option<String>,
    last_editor: Option<String>,
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: EventRow) -> Result<Event> {
        let category = row.category
            .as_deref()
            .map(|c| {
                EventCategory::parse(c)
                    .ok_or_else(|| AppError::Database(format!("Invalid event category: {}", c)))
            })
            .transpose()?;

        Ok(Event {
            id: row.id,
            title: row.title,
            description: row.description,
            event_date: DateTime::from_naive_utc_and_offset(row.event_date, Utc),
            venue: row.venue,
            category,
            user_id: row.user_id,
            department_id: row.department_id,
            last_edited_by_id: row.last_edited_by_id,
            last_edited_at: row.last_edited_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        })
    }

    fn row_to_summary(row: EventSummaryRow) -> Result<EventSummary> {
        Ok(EventSummary {
            event: Self::row_to_event(row.event)?,
            organizer: row.organizer,
            department: row.department_name,
        })
    }

    fn sort_column(key: EventSortKey) -> (&'static str, bool) {
        match key {
            EventSortKey::Date => ("e.event_date", false),
            EventSortKey::Title => ("e.title", false),
            EventSortKey::Department => ("d.name", true),
            EventSortKey::Category => ("e.category", true),
        }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn create(&self, organizer_id: i64, input: &EventInput) -> Result<Event> {
        let id = sqlx::query(
            r#"
            INSERT INTO events (title, description, event_date, venue, category, user_id, department_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.event_date.naive_utc())
        .bind(&input.venue)
        .bind(input.category.map(|c| c.as_str()))
        .bind(organizer_id)
        .bind(input.department_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .last_insert_rowid();

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created event".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        let sql = format!("{} WHERE e.id = ?", EVENT_SELECT);
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_event(r)?)),
            None => Ok(None)
        }
    }

    async fn find_detail(&self, id: i64) -> Result<Option<EventDetail>> {
        let row = sqlx::query_as::<_, EventDetailRow>(
            r#"
            SELECT e.id, e.title, e.description, e.event_date, e.venue, e.category,
                   e.user_id, e.department_id, e.last_edited_by_id, e.last_edited_at,
                   u.username AS organizer, d.name AS department_name,
                   editor.username AS last_editor
            FROM events e
            JOIN users u ON u.id = e.user_id
            LEFT JOIN departments d ON d.id = e.department_id
            LEFT JOIN users editor ON editor.id = e.last_edited_by_id
            WHERE e.id = ?
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let media_files = media_files_for(&self.pool, MediaOwner::Event(id)).await?;

        Ok(Some(EventDetail {
            event: Self::row_to_event(row.event)?,
            organizer: row.organizer,
            department: row.department_name,
            last_editor: row.last_editor,
            media_files,
        }))
    }

    async fn search(&self, criteria: &EventCriteria) -> Result<Page<EventSummary>> {
        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM events e");
        push_filters(&mut count_query, &COLUMNS, criteria);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SUMMARY_SELECT);
        push_filters(&mut query, &COLUMNS, criteria);
        let (key, nullable) = Self::sort_column(criteria.sort_by);
        push_order(&mut query, &COLUMNS, key, nullable, criteria.sort_order);
        push_page(&mut query, criteria);

        let rows = query
            .build_query_as::<EventSummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let items = rows.into_iter()
            .map(Self::row_to_summary)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, criteria.page, total))
    }

    async fn list_upcoming(&self, from: DateTime<Utc>, limit: i64) -> Result<Vec<EventSummary>> {
        let sql = format!(
            "{} WHERE e.event_date >= ? ORDER BY e.event_date ASC, e.id ASC LIMIT ?",
            SUMMARY_SELECT
        );
        let rows = sqlx::query_as::<_, EventSummaryRow>(&sql)
            .bind(from.naive_utc())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_summary)
            .collect()
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Event>> {
        let sql = format!("{} WHERE e.user_id = ? ORDER BY e.event_date ASC, e.id ASC", EVENT_SELECT);
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_event)
            .collect()
    }

    async fn update(&self, id: i64, input: &EventInput, editor_id: i64, edited_at: DateTime<Utc>) -> Result<Event> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = ?, description = ?, event_date = ?, venue = ?, category = ?,
                department_id = ?, last_edited_by_id = ?, last_edited_at = ?
            WHERE id = ?
            "#
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.event_date.naive_utc())
        .bind(&input.venue)
        .bind(input.category.map(|c| c.as_str()))
        .bind(input.department_id)
        .bind(editor_id)
        .bind(edited_at.naive_utc())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated event".to_string())
        })
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM media_files WHERE event_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}
