//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::{
    Club, NewClub, NewResponse, NewThread, Response, SearchHit, SortMode, Thread, ThreadSummary,
};

/// Data persistence contract for clubs, threads, and responses.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ClubRepo: Send + Sync {
    // Club Operations
    async fn list_clubs(&self) -> anyhow::Result<Vec<Club>>;
    async fn get_club(&self, id: i64) -> anyhow::Result<Option<Club>>;
    async fn find_club_by_name(&self, name: &str) -> anyhow::Result<Option<Club>>;
    async fn create_club(&self, club: NewClub) -> anyhow::Result<i64>;
    /// Inserts `clubs` in one transaction, but only while no club exists.
    /// Returns how many rows were added.
    async fn seed_clubs(&self, clubs: Vec<NewClub>) -> anyhow::Result<usize>;

    // Thread Operations
    /// Counts a club's threads, optionally only those created at or after `since`.
    async fn count_threads(&self, club_id: i64, since: Option<NaiveDateTime>) -> anyhow::Result<i64>;
    async fn list_threads(
        &self,
        club_id: i64,
        sort: SortMode,
        since: Option<NaiveDateTime>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ThreadSummary>>;
    async fn find_thread(&self, id: i64) -> anyhow::Result<Option<Thread>>;
    /// Thread plus its responses in id order.
    async fn get_thread(&self, id: i64) -> anyhow::Result<Option<(Thread, Vec<Response>)>>;
    /// Inserts the thread and its opening response as one unit; returns the thread id.
    async fn create_thread(&self, thread: NewThread, opening: NewResponse) -> anyhow::Result<i64>;
    /// Removes the thread and every response under it as one unit.
    /// Returns the image references the removed responses held, or `None`
    /// when no thread row was removed.
    async fn delete_thread(&self, id: i64) -> anyhow::Result<Option<Vec<String>>>;
    /// Case-insensitive (full Unicode) substring match over titles and
    /// descriptions, newest first.
    async fn search_threads(&self, keyword: &str, limit: i64) -> anyhow::Result<Vec<SearchHit>>;

    // Response Operations
    async fn create_response(&self, thread_id: i64, response: NewResponse) -> anyhow::Result<i64>;
    async fn get_response(&self, id: i64) -> anyhow::Result<Option<Response>>;
    async fn list_responses(&self, thread_id: i64) -> anyhow::Result<Vec<Response>>;
    /// Id of the response that opened the thread (the mirrored description).
    async fn opening_response_id(&self, thread_id: i64) -> anyhow::Result<Option<i64>>;
    /// Returns false when no row was removed.
    async fn delete_response(&self, id: i64) -> anyhow::Result<bool>;
}

/// Media storage contract for uploaded images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Normalizes and saves raw bytes; returns the reference kept on the Response.
    async fn store(&self, data: Vec<u8>, original_name: &str) -> anyhow::Result<String>;
    /// Deletes a stored asset.
    async fn remove(&self, reference: &str) -> anyhow::Result<()>;
    /// Returns the URL the asset is served under.
    fn public_url(&self, reference: &str) -> String;
}

/// Identity and moderation contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    /// Daily pseudonym for a poster (e.g., 3fa2c91b)
    fn anon_id(&self, ip: &str, date: &str) -> String;

    /// The one place delete passwords are compared.
    fn verify_delete_password(&self, supplied: &str, stored: &str) -> bool;
}
