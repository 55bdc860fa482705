//! In-memory store fakes shared by unit tests.
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::post_repo::{NewPost, PostChanges, PostRow, PostStore};
use crate::repos::user_repo::{DEFAULT_STATUS, NewUser, UserRow, UserStore};
use crate::services::auth::{JwtService, TokenVerifier};
use crate::services::id_codec::IdCodec;
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-secret";

pub fn test_jwt() -> Arc<JwtService> {
    Arc::new(JwtService::new(TEST_SECRET, 3600, 0))
}

pub fn test_id_codec() -> IdCodec {
    IdCodec::new(
        10,
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
    )
    .unwrap()
}

pub fn test_state(users: Arc<dyn UserStore>, posts: Arc<dyn PostStore>) -> AppState {
    let jwt = test_jwt();
    AppState::new(users, posts, jwt.clone(), jwt, test_id_codec(), 2)
}

/// Same as `test_state`, but the gate checks tokens with `verifier`.
pub fn test_state_with_verifier(verifier: Arc<dyn TokenVerifier>) -> AppState {
    let users = Arc::new(MemoryUserStore::default());
    let posts = Arc::new(MemoryPostStore::new(users.clone()));
    AppState::new(users, posts, test_jwt(), verifier, test_id_codec(), 2)
}

/// Memory-backed state where post writes keep the users' post lists in step.
pub fn memory_state() -> AppState {
    let users = Arc::new(MemoryUserStore::default());
    let posts = Arc::new(MemoryPostStore::new(users.clone()));
    test_state(users, posts)
}

fn store_down() -> RepoError {
    RepoError::Db(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, UserRow>>,
    fail_post_list_updates: AtomicBool,
}

impl MemoryUserStore {
    /// Insert a user directly, bypassing signup.
    pub fn seed(&self, email: &str, password_hash: &str, name: &str) -> UserRow {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.to_string(),
            status: DEFAULT_STATUS.to_string(),
            post_ids: Vec::new(),
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().insert(row.id, row.clone());
        row
    }

    pub fn get(&self, user_id: Uuid) -> Option<UserRow> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }

    /// From now on, every change to a user's post list fails as a store error.
    pub fn fail_post_list_updates(&self) {
        self.fail_post_list_updates.store(true, Ordering::SeqCst);
    }

    fn check_post_list_writable(&self) -> RepoResult<()> {
        if self.fail_post_list_updates.load(Ordering::SeqCst) {
            return Err(store_down());
        }
        Ok(())
    }

    fn push_post(&self, user_id: Uuid, post_id: i64) -> RepoResult<Option<UserRow>> {
        self.check_post_list_writable()?;
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&user_id).map(|u| {
            u.post_ids.push(post_id);
            u.clone()
        }))
    }

    fn pull_post(&self, user_id: Uuid, post_id: i64) {
        if let Some(u) = self.users.lock().unwrap().get_mut(&user_id) {
            u.post_ids.retain(|id| *id != post_id);
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRow>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<UserRow>> {
        Ok(self.get(user_id))
    }

    async fn create(&self, new_user: NewUser) -> RepoResult<UserRow> {
        if self.find_by_email(&new_user.email).await?.is_some() {
            return Err(RepoError::Conflict);
        }
        Ok(self.seed(&new_user.email, &new_user.password_hash, &new_user.name))
    }

    async fn update_status(&self, user_id: Uuid, status: &str) -> RepoResult<Option<UserRow>> {
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&user_id).map(|u| {
            u.status = status.to_string();
            u.clone()
        }))
    }
}

/// Every call fails as if the database were unreachable.
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_email(&self, _email: &str) -> RepoResult<Option<UserRow>> {
        Err(store_down())
    }

    async fn find_by_id(&self, _user_id: Uuid) -> RepoResult<Option<UserRow>> {
        Err(store_down())
    }

    async fn create(&self, _new_user: NewUser) -> RepoResult<UserRow> {
        Err(store_down())
    }

    async fn update_status(&self, _user_id: Uuid, _status: &str) -> RepoResult<Option<UserRow>> {
        Err(store_down())
    }
}

/// Post store sharing its users with a `MemoryUserStore`, like the FK in postgres.
pub struct MemoryPostStore {
    users: Arc<MemoryUserStore>,
    posts: Mutex<BTreeMap<i64, PostRow>>,
    next_id: AtomicI64,
}

impl MemoryPostStore {
    pub fn new(users: Arc<MemoryUserStore>) -> Self {
        Self {
            users,
            posts: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn list(&self, limit: i64, offset: i64) -> RepoResult<Vec<PostRow>> {
        let posts = self.posts.lock().unwrap();
        // ids are monotonic, so reverse id order is newest first
        Ok(posts
            .values()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.len() as i64)
    }

    async fn create_for_creator(
        &self,
        new_post: NewPost,
    ) -> RepoResult<Option<(PostRow, UserRow)>> {
        if self.users.get(new_post.creator_id).is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        let row = PostRow {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: new_post.title,
            content: new_post.content,
            image_url: new_post.image_url,
            creator_id: new_post.creator_id,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().insert(row.id, row.clone());

        match self.users.push_post(row.creator_id, row.id) {
            Ok(Some(creator)) => Ok(Some((row, creator))),
            other => {
                // rollback
                self.posts.lock().unwrap().remove(&row.id);
                other.map(|_| None)
            }
        }
    }

    async fn get(&self, post_id: i64) -> RepoResult<Option<PostRow>> {
        Ok(self.posts.lock().unwrap().get(&post_id).cloned())
    }

    async fn update(&self, post_id: i64, changes: PostChanges) -> RepoResult<Option<PostRow>> {
        let mut posts = self.posts.lock().unwrap();
        Ok(posts.get_mut(&post_id).map(|p| {
            p.title = changes.title;
            p.content = changes.content;
            p.image_url = changes.image_url;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn delete_for_creator(&self, post_id: i64, creator_id: Uuid) -> RepoResult<bool> {
        self.users.check_post_list_writable()?;

        let mut posts = self.posts.lock().unwrap();
        let owned = posts.get(&post_id).is_some_and(|p| p.creator_id == creator_id);
        if !owned {
            return Ok(false);
        }
        posts.remove(&post_id);
        drop(posts);

        self.users.pull_post(creator_id, post_id);
        Ok(true)
    }
}

pub struct FailingPostStore;

#[async_trait]
impl PostStore for FailingPostStore {
    async fn list(&self, _limit: i64, _offset: i64) -> RepoResult<Vec<PostRow>> {
        Err(store_down())
    }

    async fn count(&self) -> RepoResult<i64> {
        Err(store_down())
    }

    async fn create_for_creator(
        &self,
        _new_post: NewPost,
    ) -> RepoResult<Option<(PostRow, UserRow)>> {
        Err(store_down())
    }

    async fn get(&self, _post_id: i64) -> RepoResult<Option<PostRow>> {
        Err(store_down())
    }

    async fn update(&self, _post_id: i64, _changes: PostChanges) -> RepoResult<Option<PostRow>> {
        Err(store_down())
    }

    async fn delete_for_creator(&self, _post_id: i64, _creator_id: Uuid) -> RepoResult<bool> {
        Err(store_down())
    }
}
