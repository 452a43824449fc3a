use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::{
    domain::{
        listing::{NoticeCriteria, NoticeSortKey},
        MediaOwner, Notice, NoticeDetail, NoticeInput, NoticeSummary, Page,
    },
    error::{AppError, Result},
    repository::{
        listing_sql::{push_filters, push_order, push_page, ListingColumns},
        media_file_repository::media_files_for,
        NoticeRepository,
    },
};

const COLUMNS: ListingColumns = ListingColumns {
    id: "n.id",
    department: "n.department_id",
    date: "n.issue_date",
    category: None,
};

const NOTICE_SELECT: &str = r#"
    SELECT n.id, n.title, n.content, n.issue_date, n.user_id, n.department_id,
           n.last_edited_by_id, n.last_edited_at
    FROM notices n"#;

const SUMMARY_SELECT: &str = r#"
    SELECT n.id, n.title, n.content, n.issue_date, n.user_id, n.department_id,
           n.last_edited_by_id, n.last_edited_at,
           u.username AS publisher, d.name AS department_name
    FROM notices n
    JOIN users u ON u.id = n.user_id
    LEFT JOIN departments d ON d.id = n.department_id"#;

#[derive(FromRow)]
struct NoticeRow {
    id: i64,
    title: String,
    content: String,
    issue_date: NaiveDateTime,
    user_id: i64,
    department_id: Option<i64>,
    last_edited_by_id: Option<i64>,
    last_edited_at: Option<NaiveDateTime>,
}

#[derive(FromRow)]
struct NoticeSummaryRow {
    #[sqlx(flatten)]
    notice: NoticeRow,
    publisher: String,
    department_name: Option<String>,
}

#[derive(FromRow)]
struct NoticeDetailRow {
    #[sqlx(flatten)]
    notice: NoticeRow,
    publisher: String,
    department_name: Option<String>,
    last_editor: Option<String>,
}

pub struct SqliteNoticeRepository {
    pool: SqlitePool,
}

impl SqliteNoticeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_notice(row: NoticeRow) -> Notice {
        Notice {
            id: row.id,
            title: row.title,
            content: row.content,
            issue_date: DateTime::from_naive_utc_and_offset(row.issue_date, Utc),
            user_id: row.user_id,
            department_id: row.department_id,
            last_edited_by_id: row.last_edited_by_id,
            last_edited_at: row.last_edited_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        }
    }

    fn row_to_summary(row: NoticeSummaryRow) -> NoticeSummary {
        NoticeSummary {
            notice: Self::row_to_notice(row.notice),
            publisher: row.publisher,
            department: row.department_name,
        }
    }

    fn sort_column(key: NoticeSortKey) -> (&'static str, bool) {
        match key {
            NoticeSortKey::Date => ("n.issue_date", false),
            NoticeSortKey::Title => ("n.title", false),
            NoticeSortKey::Department => ("d.name", true),
        }
    }
}

#[async_trait]
impl NoticeRepository for SqliteNoticeRepository {
    async fn create(&self, publisher_id: i64, input: &NoticeInput, issue_date: DateTime<Utc>) -> Result<Notice> {
        let id = sqlx::query(
            r#"
            INSERT INTO notices (title, content, issue_date, user_id, department_id)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(issue_date.naive_utc())
        .bind(publisher_id)
        .bind(input.department_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .last_insert_rowid();

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created notice".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notice>> {
        let sql = format!("{} WHERE n.id = ?", NOTICE_SELECT);
        let row = sqlx::query_as::<_, NoticeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(Self::row_to_notice))
    }

    async fn find_detail(&self, id: i64) -> Result<Option<NoticeDetail>> {
        let row = sqlx::query_as::<_, NoticeDetailRow>(
            r#"
            SELECT n.id, n.title, n.content, n.issue_date, n.user_id, n.department_id,
                   n.last_edited_by_id, n.last_edited_at,
                   u.username AS publisher, d.name AS department_name,
                   editor.username AS last_editor
            FROM notices n
            JOIN users u ON u.id = n.user_id
            LEFT JOIN departments d ON d.id = n.department_id
            LEFT JOIN users editor ON editor.id = n.last_edited_by_id
            WHERE n.id = ?
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let media_files = media_files_for(&self.pool, MediaOwner::Notice(id)).await?;

        Ok(Some(NoticeDetail {
            notice: Self::row_to_notice(row.notice),
            publisher: row.publisher,
            department: row.department_name,
            last_editor: row.last_editor,
            media_files,
        }))
    }

    async fn search(&self, criteria: &NoticeCriteria) -> Result<Page<NoticeSummary>> {
        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM notices n");
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
            .build_query_as::<NoticeSummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let items = rows.into_iter().map(Self::row_to_summary).collect();
        Ok(Page::new(items, criteria.page, total))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<NoticeSummary>> {
        let sql = format!("{} ORDER BY n.issue_date DESC, n.id DESC LIMIT ?", SUMMARY_SELECT);
        let rows = sqlx::query_as::<_, NoticeSummaryRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::row_to_summary).collect())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Notice>> {
        let sql = format!("{} WHERE n.user_id = ? ORDER BY n.issue_date DESC, n.id DESC", NOTICE_SELECT);
        let rows = sqlx::query_as::<_, NoticeRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::row_to_notice).collect())
    }

    async fn update(&self, id: i64, input: &NoticeInput, editor_id: i64, edited_at: DateTime<Utc>) -> Result<Notice> {
        let result = sqlx::query(
            r#"
            UPDATE notices
            SET title = ?, content = ?, department_id = ?,
                last_edited_by_id = ?, last_edited_at = ?
            WHERE id = ?
            "#
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.department_id)
        .bind(editor_id)
        .bind(edited_at.naive_utc())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notice not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated notice".to_string())
        })
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM media_files WHERE notice_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM notices WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(AppError::NotFound("Notice not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}
