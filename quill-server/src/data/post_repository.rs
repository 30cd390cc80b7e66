use crate::domain::{DomainError, Post, PostFields};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(
        &self,
        author_id: i64,
        fields: PostFields,
        cover: Option<String>,
    ) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    /// `cover: None` keeps the stored cover.
    async fn update(
        &self,
        id: i64,
        fields: PostFields,
        cover: Option<String>,
    ) -> Result<Post, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    /// Newest first; returns the page and the current total count.
    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64), DomainError>;
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        content: row.try_get("content")?,
        cover: row.try_get("cover")?,
        author_id: row.try_get("author_id")?,
        author_username: row.try_get("author_username")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(
        &self,
        author_id: i64,
        fields: PostFields,
        cover: Option<String>,
    ) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO posts (title, summary, content, cover, author_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
                RETURNING *
            )
            SELECT p.id, p.title, p.summary, p.content, p.cover, p.author_id,
                   u.username AS author_username, p.created_at, p.updated_at
            FROM inserted p
            JOIN users u ON u.id = p.author_id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.summary)
        .bind(&fields.content)
        .bind(&cover)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(post_from_row(&row)?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.title, p.summary, p.content, p.cover, p.author_id,
                   u.username AS author_username, p.created_at, p.updated_at
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(post_from_row(&row)?),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn update(
        &self,
        id: i64,
        fields: PostFields,
        cover: Option<String>,
    ) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            WITH updated AS (
                UPDATE posts
                SET
                    title = $1,
                    summary = $2,
                    content = $3,
                    cover = COALESCE($4, cover),
                    updated_at = NOW()
                WHERE id = $5
                RETURNING *
            )
            SELECT p.id, p.title, p.summary, p.content, p.cover, p.author_id,
                   u.username AS author_username, p.created_at, p.updated_at
            FROM updated p
            JOIN users u ON u.id = p.author_id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.summary)
        .bind(&fields.content)
        .bind(&cover)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(post_from_row(&row)?),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64), DomainError> {
        // Считаем заново на каждый запрос, без кэша
        let count_row = sqlx::query("SELECT COUNT(*) AS count FROM posts")
            .fetch_one(&self.pool)
            .await?;

        let total: i64 = count_row.try_get("count")?;

        let rows = sqlx::query(
            r#"
            SELECT p.id, p.title, p.summary, p.content, p.cover, p.author_id,
                   u.username AS author_username, p.created_at, p.updated_at
            FROM posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let posts = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<Post>, sqlx::Error>>()?;

        Ok((posts, total))
    }
}
