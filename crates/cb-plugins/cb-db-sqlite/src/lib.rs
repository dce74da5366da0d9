//! # cb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `cb-core` domain models.

mod schema;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use cb_core::models::{
    Club, NewClub, NewResponse, NewThread, Response, SearchHit, SortMode, Thread, ThreadSummary,
};
use cb_core::traits::ClubRepo;
use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row, Sqlite};

const RESPONSE_COLUMNS: &str = "id, thread_id, text, name, created_at, anon_id, ip_address, delete_password, image_filename";

pub struct SqliteClubRepo {
    pool: SqlitePool,
}

impl SqliteClubRepo {
    /// Opens (creating if missing) the database and applies the schema.
    ///
    /// `sqlite::memory:` gets a single long-lived connection, since every
    /// connection to an in-memory database sees its own empty database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        let repo = Self { pool };
        repo.migrate().await?;
        info!("SQLite store ready at {url}");
        Ok(repo)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in schema::SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Waits for in-flight queries and closes every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// Row mapping helpers

fn row_to_club(row: &SqliteRow) -> sqlx::Result<Club> {
    Ok(Club {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn row_to_thread(row: &SqliteRow) -> sqlx::Result<Thread> {
    Ok(Thread {
        id: row.try_get("id")?,
        club_id: row.try_get("club_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        delete_password: row.try_get("delete_password")?,
    })
}

fn row_to_summary(row: &SqliteRow) -> sqlx::Result<ThreadSummary> {
    Ok(ThreadSummary {
        id: row.try_get("id")?,
        club_id: row.try_get("club_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        response_count: row.try_get("response_count")?,
    })
}

fn row_to_response(row: &SqliteRow) -> sqlx::Result<Response> {
    Ok(Response {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        text: row.try_get("text")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        anon_id: row.try_get("anon_id")?,
        ip_address: row.try_get("ip_address")?,
        delete_password: row.try_get("delete_password")?,
        image_filename: row.try_get("image_filename")?,
    })
}

fn row_to_hit(row: &SqliteRow) -> sqlx::Result<SearchHit> {
    Ok(SearchHit {
        thread_id: row.try_get("id")?,
        club_id: row.try_get("club_id")?,
        club_name: row.try_get("club_name")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

/// SQLite's LIKE and lower() only fold ASCII, so matching happens here with
/// full Unicode lowercasing.
fn folded_contains(haystack: &str, folded_needle: &str) -> bool {
    haystack.to_lowercase().contains(folded_needle)
}

async fn insert_response<'e, E>(executor: E, thread_id: i64, response: NewResponse) -> anyhow::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO responses (thread_id, text, name, created_at, anon_id, ip_address, delete_password, image_filename) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(thread_id)
    .bind(response.text)
    .bind(response.name)
    .bind(response.created_at)
    .bind(response.anon_id)
    .bind(response.ip_address)
    .bind(response.delete_password)
    .bind(response.image_filename)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

#[async_trait]
impl ClubRepo for SqliteClubRepo {
    async fn list_clubs(&self) -> anyhow::Result<Vec<Club>> {
        let rows = sqlx::query("SELECT id, name, description FROM clubs ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_club).collect::<sqlx::Result<_>>()?)
    }

    async fn get_club(&self, id: i64) -> anyhow::Result<Option<Club>> {
        let row = sqlx::query("SELECT id, name, description FROM clubs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_club).transpose()?)
    }

    async fn find_club_by_name(&self, name: &str) -> anyhow::Result<Option<Club>> {
        let row = sqlx::query("SELECT id, name, description FROM clubs WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_club).transpose()?)
    }

    async fn create_club(&self, club: NewClub) -> anyhow::Result<i64> {
        let result = sqlx::query("INSERT INTO clubs (name, description) VALUES (?, ?)")
            .bind(club.name())
            .bind(club.description())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn seed_clubs(&self, clubs: Vec<NewClub>) -> anyhow::Result<usize> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clubs")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(0);
        }

        for club in &clubs {
            sqlx::query("INSERT INTO clubs (name, description) VALUES (?, ?)")
                .bind(club.name())
                .bind(club.description())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(clubs.len())
    }

    async fn count_threads(&self, club_id: i64, since: Option<NaiveDateTime>) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM threads WHERE club_id = ?1 AND (?2 IS NULL OR created_at >= ?2)",
        )
        .bind(club_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Response counts come from a LEFT JOIN so the ranking always reflects
    /// the rows actually present.
    async fn list_threads(
        &self,
        club_id: i64,
        sort: SortMode,
        since: Option<NaiveDateTime>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ThreadSummary>> {
        let order_by = match sort {
            SortMode::Newest => "t.created_at DESC, t.id DESC",
            SortMode::Popular => "response_count DESC, t.created_at DESC, t.id DESC",
        };
        let sql = format!(
            "SELECT t.id, t.club_id, t.title, t.description, t.created_at, COUNT(r.id) AS response_count
             FROM threads t
             LEFT JOIN responses r ON r.thread_id = t.id
             WHERE t.club_id = ?1 AND (?2 IS NULL OR t.created_at >= ?2)
             GROUP BY t.id
             ORDER BY {order_by}
             LIMIT ?3 OFFSET ?4"
        );
        let rows = sqlx::query(&sql)
            .bind(club_id)
            .bind(since)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_summary).collect::<sqlx::Result<_>>()?)
    }

    async fn find_thread(&self, id: i64) -> anyhow::Result<Option<Thread>> {
        let row = sqlx::query(
            "SELECT id, club_id, title, description, created_at, delete_password FROM threads WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_thread).transpose()?)
    }

    /// Retrieves a thread and all its responses in a single logical operation.
    async fn get_thread(&self, id: i64) -> anyhow::Result<Option<(Thread, Vec<Response>)>> {
        let Some(thread) = self.find_thread(id).await? else {
            return Ok(None);
        };
        let responses = self.list_responses(id).await?;
        Ok(Some((thread, responses)))
    }

    /// Atomic operation to create a thread and its opening response.
    ///
    /// # Developer Note
    /// Using a Transaction (tx) ensures we don't end up with "ghost threads"
    /// that have no opening post if the second insert fails.
    async fn create_thread(&self, thread: NewThread, opening: NewResponse) -> anyhow::Result<i64> {
        let mut tx = self.pool.begin().await?;

        // 1. Insert Thread
        let result = sqlx::query(
            "INSERT INTO threads (club_id, title, description, created_at, delete_password) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(thread.club_id)
        .bind(thread.title)
        .bind(thread.description)
        .bind(thread.created_at)
        .bind(thread.delete_password)
        .execute(&mut *tx)
        .await?;
        let thread_id = result.last_insert_rowid();

        // 2. Insert opening Response
        insert_response(&mut *tx, thread_id, opening).await?;

        tx.commit().await?;
        Ok(thread_id)
    }

    /// Responses go first, then the thread, inside one transaction.
    async fn delete_thread(&self, id: i64) -> anyhow::Result<Option<Vec<String>>> {
        let mut tx = self.pool.begin().await?;

        let images = sqlx::query_scalar::<_, String>(
            "SELECT image_filename FROM responses WHERE thread_id = ? AND image_filename IS NOT NULL",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM responses WHERE thread_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(images))
    }

    /// Rows stream newest first and stop once `limit` matches are collected.
    async fn search_threads(&self, keyword: &str, limit: i64) -> anyhow::Result<Vec<SearchHit>> {
        let cap = usize::try_from(limit).unwrap_or(0);
        let needle = keyword.to_lowercase();
        let mut hits = Vec::new();
        if cap == 0 {
            return Ok(hits);
        }

        let mut rows = sqlx::query(
            "SELECT t.id, t.club_id, c.name AS club_name, t.title, t.description, t.created_at
             FROM threads t
             JOIN clubs c ON c.id = t.club_id
             ORDER BY t.created_at DESC, t.id DESC",
        )
        .fetch(&self.pool);

        while let Some(row) = rows.try_next().await? {
            let hit = row_to_hit(&row)?;
            if folded_contains(&hit.title, &needle) || folded_contains(&hit.description, &needle) {
                hits.push(hit);
                if hits.len() == cap {
                    break;
                }
            }
        }
        Ok(hits)
    }

    async fn create_response(&self, thread_id: i64, response: NewResponse) -> anyhow::Result<i64> {
        insert_response(&self.pool, thread_id, response).await
    }

    async fn get_response(&self, id: i64) -> anyhow::Result<Option<Response>> {
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM responses WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_response).transpose()?)
    }

    async fn list_responses(&self, thread_id: i64) -> anyhow::Result<Vec<Response>> {
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM responses WHERE thread_id = ? ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_response).collect::<sqlx::Result<_>>()?)
    }

    async fn opening_response_id(&self, thread_id: i64) -> anyhow::Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, Option<i64>>("SELECT MIN(id) FROM responses WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn delete_response(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM responses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
