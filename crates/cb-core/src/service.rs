//! # Board Service
//!
//! The thread/response workflow. Handlers call into this; it validates,
//! stamps identity and time, and talks to the ports.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::clock::{Clock, PostInstant};
use crate::error::{AppError, Result};
use crate::models::{
    total_pages, Club, ImageUpload, NewClub, NewResponse, NewThread, ReplyDraft, Response,
    SearchHit, SortMode, Thread, ThreadDraft, ThreadPage, DEFAULT_NAME,
};
use crate::traits::{ClubRepo, IdentityProvider, MediaStore};

/// Tunables for the workflow.
#[derive(Debug)]
pub struct BoardSettings {
    pub page_size: u32,
    /// Only threads younger than this compete in the `popular` sort
    pub popular_window: chrono::Duration,
    /// Upper bound for each storage or media call
    pub op_timeout: Duration,
    pub default_name: String,
    pub search_limit: i64,
    /// Club creation is refused while this is unset
    pub admin_password: Option<SecretString>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            popular_window: chrono::Duration::hours(24),
            op_timeout: Duration::from_secs(10),
            default_name: DEFAULT_NAME.to_string(),
            search_limit: 50,
            admin_password: None,
        }
    }
}

/// A thread with its responses in posting order.
#[derive(Debug, Clone)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub responses: Vec<Response>,
}

/// Outcome of a successful thread deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedThread {
    pub thread_id: i64,
    pub club_id: i64,
}

pub struct BoardService {
    repo: Arc<dyn ClubRepo>,
    media: Arc<dyn MediaStore>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    settings: BoardSettings,
}

impl BoardService {
    pub fn new(
        repo: Arc<dyn ClubRepo>,
        media: Arc<dyn MediaStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        settings: BoardSettings,
    ) -> Self {
        Self {
            repo,
            media,
            identity,
            clock,
            settings,
        }
    }

    pub fn media(&self) -> &dyn MediaStore {
        self.media.as_ref()
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    // ── Clubs ────────────────────────────────────────────────────────────────

    pub async fn list_clubs(&self) -> Result<Vec<Club>> {
        self.storage("list clubs", self.repo.list_clubs()).await
    }

    pub async fn get_club(&self, club_id: i64) -> Result<Club> {
        self.storage("load club", self.repo.get_club(club_id))
            .await?
            .ok_or_else(|| AppError::not_found("Club", club_id))
    }

    /// Admin-gated club creation.
    pub async fn create_club(&self, club: NewClub, admin_password: &str) -> Result<i64> {
        let Some(expected) = self.settings.admin_password.as_ref() else {
            return Err(AppError::PermissionDenied(
                "club creation is disabled".to_string(),
            ));
        };
        if !self
            .identity
            .verify_delete_password(admin_password, expected.expose_secret())
        {
            return Err(AppError::PermissionDenied("wrong admin password".to_string()));
        }
        let existing = self
            .storage("check club name", self.repo.find_club_by_name(club.name()))
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(format!(
                "a club named {:?} already exists",
                club.name()
            )));
        }
        let name = club.name().to_string();
        let id = self.storage("create club", self.repo.create_club(club)).await?;
        info!("Created club {id} ({name})");
        Ok(id)
    }

    /// Inserts `defaults` when no club exists yet. Returns how many were added.
    pub async fn seed_clubs(&self, defaults: &[(&str, &str)]) -> Result<usize> {
        let clubs = defaults
            .iter()
            .map(|(name, description)| NewClub::new(name, description))
            .collect::<Result<Vec<_>>>()?;
        let added = self.storage("seed clubs", self.repo.seed_clubs(clubs)).await?;
        if added > 0 {
            info!("Seeded {added} default clubs");
        }
        Ok(added)
    }

    // ── Listing ──────────────────────────────────────────────────────────────

    /// One page of a club's threads. Pages past the end are empty, not errors.
    pub async fn list_threads(&self, club_id: i64, sort: SortMode, page: u32) -> Result<(Club, ThreadPage)> {
        let club = self.get_club(club_id).await?;
        let page = page.max(1);
        let page_size = self.settings.page_size.max(1);

        let since = match sort {
            SortMode::Newest => None,
            SortMode::Popular => Some(self.clock.instant().created_at - self.settings.popular_window),
        };

        let total = self
            .storage("count threads", self.repo.count_threads(club_id, since))
            .await?
            .max(0) as u64;
        let total_pages = total_pages(total, page_size);

        let threads = if page > total_pages {
            Vec::new()
        } else {
            let offset = i64::from(page - 1) * i64::from(page_size);
            self.storage(
                "list threads",
                self.repo
                    .list_threads(club_id, sort, since, i64::from(page_size), offset),
            )
            .await?
        };

        Ok((
            club,
            ThreadPage {
                threads,
                sort,
                page,
                page_size,
                total,
                total_pages,
            },
        ))
    }

    pub async fn thread_detail(&self, thread_id: i64) -> Result<ThreadDetail> {
        let (thread, responses) = self
            .storage("load thread", self.repo.get_thread(thread_id))
            .await?
            .ok_or_else(|| AppError::not_found("Thread", thread_id))?;
        Ok(ThreadDetail { thread, responses })
    }

    pub async fn find_thread(&self, thread_id: i64) -> Result<Thread> {
        self.storage("load thread", self.repo.find_thread(thread_id))
            .await?
            .ok_or_else(|| AppError::not_found("Thread", thread_id))
    }

    // ── Posting ──────────────────────────────────────────────────────────────

    /// Creates a thread together with its opening response; returns the thread id.
    pub async fn create_thread(&self, club_id: i64, draft: ThreadDraft, requester_ip: &str) -> Result<i64> {
        self.get_club(club_id).await?;

        let instant = self.clock.instant();
        let image_filename = self.store_image(draft.image).await?;

        let thread = NewThread {
            club_id,
            title: draft.title,
            description: draft.description.clone(),
            created_at: instant.created_at,
            delete_password: draft.delete_password.clone(),
        };
        let opening = self.stamp_response(
            &instant,
            requester_ip,
            None,
            draft.description,
            Some(draft.delete_password),
            image_filename.clone(),
        );

        match self
            .storage("create thread", self.repo.create_thread(thread, opening))
            .await
        {
            Ok(thread_id) => {
                info!("Created thread {thread_id} in club {club_id}");
                Ok(thread_id)
            }
            Err(err) => {
                self.discard_image(image_filename.as_deref()).await;
                Err(err)
            }
        }
    }

    /// Appends a reply; returns the new response id.
    pub async fn post_response(&self, thread_id: i64, draft: ReplyDraft, requester_ip: &str) -> Result<i64> {
        self.find_thread(thread_id).await?;

        let instant = self.clock.instant();
        let image_filename = self.store_image(draft.image).await?;
        let response = self.stamp_response(
            &instant,
            requester_ip,
            draft.name,
            draft.content,
            Some(draft.delete_password),
            image_filename.clone(),
        );

        match self
            .storage("post response", self.repo.create_response(thread_id, response))
            .await
        {
            Ok(id) => {
                debug!("Posted response {id} to thread {thread_id}");
                Ok(id)
            }
            Err(err) => {
                self.discard_image(image_filename.as_deref()).await;
                Err(err)
            }
        }
    }

    // ── Deletion ─────────────────────────────────────────────────────────────

    /// Deletes one response; returns the removed row.
    pub async fn delete_response(&self, response_id: i64, supplied_password: &str) -> Result<Response> {
        let response = self
            .storage("load response", self.repo.get_response(response_id))
            .await?
            .ok_or_else(|| AppError::not_found("Response", response_id))?;

        let opening = self
            .storage(
                "load opening response",
                self.repo.opening_response_id(response.thread_id),
            )
            .await?;
        if opening == Some(response_id) {
            return Err(AppError::NotDeletable(
                "the opening response can only be removed by deleting the thread".to_string(),
            ));
        }

        let stored = match response.delete_password.as_deref() {
            Some(pw) if !pw.is_empty() => pw,
            _ => {
                return Err(AppError::NotDeletable(format!(
                    "response {response_id} has no delete password"
                )))
            }
        };
        if !self.identity.verify_delete_password(supplied_password, stored) {
            return Err(AppError::PermissionDenied(
                "delete password does not match".to_string(),
            ));
        }

        let removed = self
            .storage("delete response", self.repo.delete_response(response_id))
            .await?;
        if !removed {
            return Err(AppError::not_found("Response", response_id));
        }
        info!("Deleted response {response_id} from thread {}", response.thread_id);

        self.discard_image(response.image_filename.as_deref()).await;
        Ok(response)
    }

    /// Deletes a thread and all of its responses.
    pub async fn delete_thread(&self, thread_id: i64, supplied_password: &str) -> Result<DeletedThread> {
        let thread = self.find_thread(thread_id).await?;
        if !self
            .identity
            .verify_delete_password(supplied_password, &thread.delete_password)
        {
            return Err(AppError::PermissionDenied(
                "delete password does not match".to_string(),
            ));
        }

        let images = self
            .storage("delete thread", self.repo.delete_thread(thread_id))
            .await?
            .ok_or_else(|| AppError::not_found("Thread", thread_id))?;
        info!("Deleted thread {thread_id} from club {}", thread.club_id);

        for image in &images {
            self.discard_image(Some(image.as_str())).await;
        }
        Ok(DeletedThread {
            thread_id,
            club_id: thread.club_id,
        })
    }

    // ── Search ───────────────────────────────────────────────────────────────

    /// Case-insensitive substring search over titles and descriptions.
    pub async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        self.storage(
            "search threads",
            self.repo.search_threads(keyword, self.settings.search_limit),
        )
        .await
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn stamp_response(
        &self,
        instant: &PostInstant,
        requester_ip: &str,
        name: Option<String>,
        text: String,
        delete_password: Option<String>,
        image_filename: Option<String>,
    ) -> NewResponse {
        NewResponse {
            text,
            name: name.unwrap_or_else(|| self.settings.default_name.clone()),
            created_at: instant.created_at,
            anon_id: self.identity.anon_id(requester_ip, &instant.date_key),
            ip_address: requester_ip.to_string(),
            delete_password,
            image_filename,
        }
    }

    async fn store_image(&self, image: Option<ImageUpload>) -> Result<Option<String>> {
        let Some(upload) = image else {
            return Ok(None);
        };
        let fut = self.media.store(upload.bytes, &upload.original_name);
        match tokio::time::timeout(self.settings.op_timeout, fut).await {
            Ok(Ok(reference)) => Ok(Some(reference)),
            Ok(Err(err)) => Err(AppError::UploadFailure(format!("{err:#}"))),
            Err(_) => Err(AppError::Timeout("store image".to_string())),
        }
    }

    /// Best-effort asset removal after the owning row is gone.
    async fn discard_image(&self, reference: Option<&str>) {
        let Some(reference) = reference else {
            return;
        };
        match tokio::time::timeout(self.settings.op_timeout, self.media.remove(reference)).await {
            Ok(Ok(())) => debug!("Removed image {reference}"),
            Ok(Err(err)) => warn!("Failed to remove image {reference}: {err:#}"),
            Err(_) => warn!("Timed out removing image {reference}"),
        }
    }

    async fn storage<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.settings.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(AppError::StorageFailure(format!("{what}: {err:#}"))),
            Err(_) => Err(AppError::Timeout(what.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::traits::{MockClubRepo, MockIdentityProvider, MockMediaStore};
    use chrono::NaiveDate;
    use mockall::predicate::*;

    fn clock() -> Arc<FixedClock> {
        let local = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Arc::new(FixedClock::at_tokyo(local).unwrap())
    }

    fn identity() -> MockIdentityProvider {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_anon_id()
            .returning(|ip, date| format!("{ip}@{date}"));
        identity
            .expect_verify_delete_password()
            .returning(|supplied, stored| supplied == stored);
        identity
    }

    fn service(repo: MockClubRepo, media: MockMediaStore) -> BoardService {
        BoardService::new(
            Arc::new(repo),
            Arc::new(media),
            Arc::new(identity()),
            clock(),
            BoardSettings::default(),
        )
    }

    fn club() -> Club {
        Club {
            id: 1,
            name: "Study Club".into(),
            description: "Let's study together".into(),
        }
    }

    fn thread(password: &str) -> Thread {
        Thread {
            id: 7,
            club_id: 1,
            title: "Finals".into(),
            description: "Who is ready?".into(),
            created_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            delete_password: password.into(),
        }
    }

    fn response(password: Option<&str>, image: Option<&str>) -> Response {
        Response {
            id: 3,
            thread_id: 7,
            text: "me".into(),
            name: DEFAULT_NAME.into(),
            created_at: thread("x").created_at,
            anon_id: "abcd1234".into(),
            ip_address: "10.0.0.1".into(),
            delete_password: password.map(str::to_string),
            image_filename: image.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_thread_mirrors_description_into_opening_post() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_club().with(eq(1)).returning(|_| Ok(Some(club())));
        repo.expect_create_thread()
            .withf(|thread, opening| {
                thread.club_id == 1
                    && thread.title == "Finals"
                    && opening.text == thread.description
                    && opening.name == DEFAULT_NAME
                    && opening.anon_id == "192.0.2.4@2024-05-01"
                    && opening.ip_address == "192.0.2.4"
                    && opening.created_at == thread.created_at
                    && opening.delete_password.as_deref() == Some("pw")
            })
            .times(1)
            .returning(|_, _| Ok(7));

        let svc = service(repo, MockMediaStore::new());
        let draft = ThreadDraft::new("Finals", "Who is ready?", "pw", None).unwrap();
        let id = svc.create_thread(1, draft, "192.0.2.4").await.unwrap();
        assert_eq!(id, 7);
    }

    #[tokio::test]
    async fn create_thread_in_unknown_club_is_not_found() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_club().returning(|_| Ok(None));
        repo.expect_create_thread().never();

        let svc = service(repo, MockMediaStore::new());
        let draft = ThreadDraft::new("t", "d", "pw", None).unwrap();
        let err = svc.create_thread(99, draft, "127.0.0.1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn failed_insert_discards_the_stored_image() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_club().returning(|_| Ok(Some(club())));
        repo.expect_create_thread()
            .withf(|_, opening| opening.image_filename.as_deref() == Some("abc.jpg"))
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));

        let mut media = MockMediaStore::new();
        media
            .expect_store()
            .returning(|_, _| Ok("abc.jpg".to_string()));
        media
            .expect_remove()
            .with(eq("abc.jpg"))
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(repo, media);
        let upload = ImageUpload {
            bytes: vec![1, 2, 3],
            original_name: "cat.png".into(),
        };
        let draft = ThreadDraft::new("t", "d", "pw", Some(upload)).unwrap();
        let err = svc.create_thread(1, draft, "127.0.0.1").await.unwrap_err();
        assert!(matches!(err, AppError::StorageFailure(_)));
    }

    #[tokio::test]
    async fn upload_errors_surface_as_upload_failure() {
        let mut repo = MockClubRepo::new();
        repo.expect_find_thread().returning(|_| Ok(Some(thread("pw"))));
        repo.expect_create_response().never();

        let mut media = MockMediaStore::new();
        media
            .expect_store()
            .returning(|_, _| Err(anyhow::anyhow!("not an image")));

        let svc = service(repo, media);
        let upload = ImageUpload {
            bytes: b"plain text".to_vec(),
            original_name: "notes.txt".into(),
        };
        let draft = ReplyDraft::new(None, "look", "pw", Some(upload)).unwrap();
        let err = svc.post_response(7, draft, "127.0.0.1").await.unwrap_err();
        assert!(matches!(err, AppError::UploadFailure(_)));
    }

    #[tokio::test]
    async fn reply_uses_supplied_name_and_default_otherwise() {
        let mut repo = MockClubRepo::new();
        repo.expect_find_thread().returning(|_| Ok(Some(thread("pw"))));
        repo.expect_create_response()
            .withf(|thread_id, r| *thread_id == 7 && r.name == "Taro")
            .times(1)
            .returning(|_, _| Ok(10));
        repo.expect_create_response()
            .withf(|_, r| r.name == DEFAULT_NAME)
            .times(1)
            .returning(|_, _| Ok(11));

        let svc = service(repo, MockMediaStore::new());
        let named = ReplyDraft::new(Some("Taro"), "hi", "pw", None).unwrap();
        assert_eq!(svc.post_response(7, named, "127.0.0.1").await.unwrap(), 10);
        let anonymous = ReplyDraft::new(None, "hi", "pw", None).unwrap();
        assert_eq!(svc.post_response(7, anonymous, "127.0.0.1").await.unwrap(), 11);
    }

    #[tokio::test]
    async fn reply_to_missing_thread_is_not_found() {
        let mut repo = MockClubRepo::new();
        repo.expect_find_thread().returning(|_| Ok(None));
        repo.expect_create_response().never();

        let svc = service(repo, MockMediaStore::new());
        let draft = ReplyDraft::new(None, "hi", "pw", None).unwrap();
        let err = svc.post_response(404, draft, "127.0.0.1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn wrong_password_leaves_response_in_place() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_response()
            .returning(|_| Ok(Some(response(Some("abc"), None))));
        repo.expect_opening_response_id().returning(|_| Ok(Some(1)));
        repo.expect_delete_response().never();

        let svc = service(repo, MockMediaStore::new());
        let err = svc.delete_response(3, "xyz").await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn legacy_response_without_password_is_not_deletable() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_response()
            .returning(|_| Ok(Some(response(None, None))));
        repo.expect_opening_response_id().returning(|_| Ok(Some(1)));
        repo.expect_delete_response().never();

        let svc = service(repo, MockMediaStore::new());
        let err = svc.delete_response(3, "anything").await.unwrap_err();
        assert!(matches!(err, AppError::NotDeletable(_)));
    }

    #[tokio::test]
    async fn deleting_response_removes_its_image_and_survives_removal_errors() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_response()
            .returning(|_| Ok(Some(response(Some("abc"), Some("img.jpg")))));
        repo.expect_opening_response_id()
            .with(eq(7))
            .returning(|_| Ok(Some(1)));
        repo.expect_delete_response().with(eq(3)).returning(|_| Ok(true));

        let mut media = MockMediaStore::new();
        media
            .expect_remove()
            .with(eq("img.jpg"))
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("already gone")));

        let svc = service(repo, media);
        let removed = svc.delete_response(3, "abc").await.unwrap();
        assert_eq!(removed.thread_id, 7);
    }

    #[tokio::test]
    async fn opening_response_is_refused_even_with_the_right_password() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_response()
            .returning(|_| Ok(Some(response(Some("abc"), None))));
        repo.expect_opening_response_id()
            .with(eq(7))
            .returning(|_| Ok(Some(3)));
        repo.expect_delete_response().never();

        let svc = service(repo, MockMediaStore::new());
        let err = svc.delete_response(3, "abc").await.unwrap_err();
        assert!(matches!(err, AppError::NotDeletable(msg) if msg.contains("deleting the thread")));
    }

    #[tokio::test]
    async fn thread_removed_concurrently_is_not_found() {
        let mut repo = MockClubRepo::new();
        repo.expect_find_thread().returning(|_| Ok(Some(thread("pw"))));
        repo.expect_delete_thread().returning(|_| Ok(None));

        let svc = service(repo, MockMediaStore::new());
        assert!(matches!(
            svc.delete_thread(7, "pw").await,
            Err(AppError::NotFound(_, _))
        ));
    }

    #[tokio::test]
    async fn thread_deletion_checks_password_and_reports_club() {
        let mut repo = MockClubRepo::new();
        repo.expect_find_thread().returning(|_| Ok(Some(thread("secret"))));
        repo.expect_delete_thread()
            .with(eq(7))
            .times(1)
            .returning(|_| Ok(Some(vec![])));

        let svc = service(repo, MockMediaStore::new());
        assert!(matches!(
            svc.delete_thread(7, "Secret").await,
            Err(AppError::PermissionDenied(_))
        ));
        let deleted = svc.delete_thread(7, "secret").await.unwrap();
        assert_eq!(deleted, DeletedThread { thread_id: 7, club_id: 1 });
    }

    #[tokio::test]
    async fn empty_search_does_not_touch_storage() {
        let mut repo = MockClubRepo::new();
        repo.expect_search_threads().never();

        let svc = service(repo, MockMediaStore::new());
        assert!(svc.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_page_skips_the_query() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_club().returning(|_| Ok(Some(club())));
        repo.expect_count_threads().returning(|_, _| Ok(15));
        repo.expect_list_threads().never();

        let svc = service(repo, MockMediaStore::new());
        let (_, page) = svc.list_threads(1, SortMode::Newest, 3).await.unwrap();
        assert!(page.threads.is_empty());
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn popular_sort_passes_the_window_start() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_club().returning(|_| Ok(Some(club())));
        let window_start = NaiveDate::from_ymd_opt(2024, 4, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        repo.expect_count_threads()
            .withf(move |_, since| *since == Some(window_start))
            .returning(|_, _| Ok(1));
        repo.expect_list_threads()
            .withf(move |_, sort, since, limit, offset| {
                *sort == SortMode::Popular && *since == Some(window_start) && *limit == 10 && *offset == 0
            })
            .returning(|_, _, _, _, _| Ok(vec![]));

        let svc = service(repo, MockMediaStore::new());
        svc.list_threads(1, SortMode::Popular, 1).await.unwrap();
    }

    #[tokio::test]
    async fn seeding_hands_every_default_to_one_repo_call() {
        let mut repo = MockClubRepo::new();
        repo.expect_seed_clubs()
            .withf(|clubs| clubs.len() == 2 && clubs[1].name() == "Comedy Club")
            .times(1)
            .returning(|clubs| Ok(clubs.len()));
        repo.expect_create_club().never();

        let svc = service(repo, MockMediaStore::new());
        let added = svc
            .seed_clubs(&[("Study Club", "Books"), ("Comedy Club", "Jokes")])
            .await
            .unwrap();
        assert_eq!(added, 2);
    }

    #[tokio::test]
    async fn invalid_default_club_is_rejected_before_storage() {
        let mut repo = MockClubRepo::new();
        repo.expect_seed_clubs().never();

        let svc = service(repo, MockMediaStore::new());
        let err = svc.seed_clubs(&[("Study Club", "Books"), ("  ", "nameless")]).await;
        assert!(matches!(err, Err(AppError::ValidationError(_))));
    }

    struct SlowMedia;

    #[async_trait::async_trait]
    impl MediaStore for SlowMedia {
        async fn store(&self, _data: Vec<u8>, _original_name: &str) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late.jpg".to_string())
        }

        async fn remove(&self, _reference: &str) -> anyhow::Result<()> {
            Ok(())
        }

        fn public_url(&self, reference: &str) -> String {
            format!("/uploads/{reference}")
        }
    }

    #[tokio::test]
    async fn slow_image_store_times_out_before_any_insert() {
        let mut repo = MockClubRepo::new();
        repo.expect_get_club().returning(|_| Ok(Some(club())));
        repo.expect_create_thread().never();

        let settings = BoardSettings {
            op_timeout: Duration::from_millis(20),
            ..BoardSettings::default()
        };
        let svc = BoardService::new(
            Arc::new(repo),
            Arc::new(SlowMedia),
            Arc::new(identity()),
            clock(),
            settings,
        );
        let upload = ImageUpload {
            bytes: vec![0xff, 0xd8],
            original_name: "cat.jpg".into(),
        };
        let draft = ThreadDraft::new("t", "d", "pw", Some(upload)).unwrap();

        let started = std::time::Instant::now();
        let err = svc.create_thread(1, draft, "127.0.0.1").await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(ref what) if what == "store image"));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(err.is_server_fault());
    }

    #[tokio::test]
    async fn club_creation_requires_configured_admin_password() {
        let mut repo = MockClubRepo::new();
        repo.expect_create_club().never();
        let svc = service(repo, MockMediaStore::new());
        let club = NewClub::new("Chess Club", "Checkmate").unwrap();
        assert!(matches!(
            svc.create_club(club, "anything").await,
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn club_creation_refuses_duplicate_names() {
        let mut repo = MockClubRepo::new();
        repo.expect_find_club_by_name()
            .returning(|_| Ok(Some(club())));
        repo.expect_create_club().never();

        let settings = BoardSettings {
            admin_password: Some(SecretString::from("root".to_string())),
            ..BoardSettings::default()
        };
        let svc = BoardService::new(
            Arc::new(repo),
            Arc::new(MockMediaStore::new()),
            Arc::new(identity()),
            clock(),
            settings,
        );
        let club = NewClub::new("Study Club", "again").unwrap();
        assert!(matches!(
            svc.create_club(club, "root").await,
            Err(AppError::ValidationError(_))
        ));
    }
}
