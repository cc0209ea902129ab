//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry with exponential backoff for transient failures
//! - Pool and query statistics
//! - Embedded migrations run on startup
//! - `ON DELETE CASCADE` from users to boxes to items
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

use crate::api::{BoxId, ItemId, PostId, UserId};
use crate::db::repository::{
    BoxRepository, ErrorContext, ItemRepository, PostRepository, RepositoryError,
    RepositoryResult, UserRepository,
};
use crate::models::{
    ApiToken, CardBox, CardBoxChanges, Item, ItemFilter, ItemTextChanges, NewCardBox, NewItem,
    NewPost, NewUser, Page, PageRequest, Post, PostChanges, ScheduleUpdate, User,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of idle connections kept open
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// Unparseable numeric values fall back to their defaults; a missing URL is an error.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub max_size: u32,
    /// Total queries attempted
    pub total_queries: u64,
    /// Total operations that ultimately failed
    pub failed_queries: u64,
    /// Total retry attempts
    pub retried_operations: u64,
}

#[derive(Debug, Default)]
struct QueryCounters {
    total: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    counters: Arc<QueryCounters>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        log::info!(
            "Postgres repository ready (pool max={}, min_idle={})",
            config.max_pool_size,
            config.min_pool_size
        );

        Ok(Self {
            pool,
            config,
            counters: Arc::new(QueryCounters::default()),
        })
    }

    /// Run `f` on a pooled connection inside `spawn_blocking`.
    ///
    /// Retryable errors (connection failures, timeouts, serialization failures) are
    /// retried up to `max_retries` times with exponential backoff.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let mut retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let counters = self.counters.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    counters.retried.fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "Retrying {} (attempt {}/{}) in {:?}",
                        operation,
                        attempt + 1,
                        max_retries + 1,
                        retry_delay
                    );
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        last_error = Some(RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new(operation)
                                .with_details(format!("attempt={}", attempt + 1)),
                        ));
                        continue;
                    }
                };

                counters.total.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() => last_error = Some(e),
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                }
            }

            counters.failed.fetch_add(1, Ordering::Relaxed);
            Err(last_error
                .unwrap_or_else(|| RepositoryError::internal("Max retries exceeded"))
                .with_operation(operation))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Current pool state and query statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.counters.total.load(Ordering::Relaxed),
            failed_queries: self.counters.failed.load(Ordering::Relaxed),
            retried_operations: self.counters.retried.load(Ordering::Relaxed),
        }
    }

    /// Returns `(is_healthy, latency_ms, error_message)`.
    pub async fn health_check_detailed(&self) -> (bool, u64, Option<String>) {
        let start = Instant::now();
        let outcome = self.health_check().await;
        let latency = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(true) => (true, latency, None),
            Ok(false) => (false, latency, Some("Health check returned false".to_string())),
            Err(e) => (false, latency, Some(e.to_string())),
        }
    }
}

/// Map a diesel error from a primary-key lookup, naming the missing record.
fn lookup_error(entity: &'static str, id: i64) -> impl Fn(diesel::result::Error) -> RepositoryError {
    move |err| match err {
        diesel::result::Error::NotFound => RepositoryError::entity_not_found(entity, id),
        other => RepositoryError::from(other),
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Items in boxes owned by `owner`, narrowed by `filter`.
fn owned_items<'a>(owner: UserId, filter: &ItemFilter) -> items::BoxedQuery<'a, Pg> {
    let owned_boxes = boxes::table
        .filter(boxes::user_id.eq(owner.0))
        .select(boxes::id);

    let mut query = items::table
        .filter(items::box_id.eq_any(owned_boxes))
        .into_boxed();
    if let Some(box_id) = filter.box_id {
        query = query.filter(items::box_id.eq(box_id.0));
    }
    if let Some(due_at) = filter.due_at {
        query = query.filter(items::show_date.le(due_at));
    }
    query
}

// =========================================================
// Users & tokens
// =========================================================

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let row = NewUserRow {
            name: user.name.clone(),
            email: user.email.to_lowercase(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        };
        self.with_conn("create_user", move |conn| {
            diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(conn)
                .map(User::from)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn get_user(&self, user_id: UserId) -> RepositoryResult<User> {
        self.with_conn("get_user", move |conn| {
            users::table
                .find(user_id.0)
                .select(UserRow::as_select())
                .first(conn)
                .map(User::from)
                .map_err(lookup_error("user", user_id.0))
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.to_lowercase();
        self.with_conn("find_user_by_email", move |conn| {
            users::table
                .filter(users::email.eq(&email))
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn store_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<ApiToken> {
        let row = NewApiTokenRow {
            user_id: user_id.0,
            token_hash: token_hash.to_string(),
            created_at,
        };
        self.with_conn("store_token", move |conn| {
            diesel::insert_into(api_tokens::table)
                .values(&row)
                .returning(ApiTokenRow::as_returning())
                .get_result(conn)
                .map(ApiToken::from)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn find_user_by_token(
        &self,
        token_hash: &str,
        used_at: DateTime<Utc>,
    ) -> RepositoryResult<Option<User>> {
        let token_hash = token_hash.to_string();
        self.with_conn("find_user_by_token", move |conn| {
            let owner: Option<i64> = diesel::update(
                api_tokens::table.filter(api_tokens::token_hash.eq(&token_hash)),
            )
            .set(api_tokens::last_used_at.eq(Some(used_at)))
            .returning(api_tokens::user_id)
            .get_result(conn)
            .optional()
            .map_err(RepositoryError::from)?;

            let Some(owner) = owner else {
                return Ok(None);
            };

            users::table
                .find(owner)
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(RepositoryError::from)
        })
        .await
    }
}

// =========================================================
// Boxes
// =========================================================

#[async_trait]
impl BoxRepository for PostgresRepository {
    async fn create_box(&self, new_box: &NewCardBox) -> RepositoryResult<CardBox> {
        let row = NewBoxRow {
            user_id: new_box.user_id.0,
            title: new_box.title.clone(),
            description: new_box.description.clone(),
            created_at: new_box.created_at,
            updated_at: new_box.created_at,
        };
        self.with_conn("create_box", move |conn| {
            diesel::insert_into(boxes::table)
                .values(&row)
                .returning(BoxRow::as_returning())
                .get_result(conn)
                .map(CardBox::from)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn get_box(&self, box_id: BoxId) -> RepositoryResult<CardBox> {
        self.with_conn("get_box", move |conn| {
            boxes::table
                .find(box_id.0)
                .select(BoxRow::as_select())
                .first(conn)
                .map(CardBox::from)
                .map_err(lookup_error("box", box_id.0))
        })
        .await
    }

    async fn list_boxes(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> RepositoryResult<Page<CardBox>> {
        self.with_conn("list_boxes", move |conn| {
            let total: i64 = boxes::table
                .filter(boxes::user_id.eq(owner.0))
                .count()
                .get_result(conn)
                .map_err(RepositoryError::from)?;

            let rows = boxes::table
                .filter(boxes::user_id.eq(owner.0))
                .order(boxes::id.asc())
                .limit(to_i64(page.limit()))
                .offset(to_i64(page.offset()))
                .select(BoxRow::as_select())
                .load(conn)
                .map_err(RepositoryError::from)?;

            Ok(Page::new(
                rows.into_iter().map(CardBox::from).collect(),
                page,
                total.max(0) as u64,
            ))
        })
        .await
    }

    async fn update_box(
        &self,
        box_id: BoxId,
        changes: &CardBoxChanges,
    ) -> RepositoryResult<CardBox> {
        let changeset = BoxChangeset {
            title: changes.title.clone(),
            description: changes.description.clone(),
            updated_at: changes.updated_at,
        };
        self.with_conn("update_box", move |conn| {
            diesel::update(boxes::table.find(box_id.0))
                .set(&changeset)
                .returning(BoxRow::as_returning())
                .get_result(conn)
                .map(CardBox::from)
                .map_err(lookup_error("box", box_id.0))
        })
        .await
    }

    async fn delete_box(&self, box_id: BoxId) -> RepositoryResult<bool> {
        // Items go with the box through the foreign key cascade.
        self.with_conn("delete_box", move |conn| {
            diesel::delete(boxes::table.find(box_id.0))
                .execute(conn)
                .map(|n| n > 0)
                .map_err(RepositoryError::from)
        })
        .await
    }
}

// =========================================================
// Items
// =========================================================

#[async_trait]
impl ItemRepository for PostgresRepository {
    async fn create_item(&self, new_item: &NewItem) -> RepositoryResult<Item> {
        let row = NewItemRow {
            box_id: new_item.box_id.0,
            text1: new_item.text1.clone(),
            text2: new_item.text2.clone(),
            level: new_item.level,
            show_date: new_item.show_date,
            created_at: new_item.created_at,
            updated_at: new_item.created_at,
        };
        self.with_conn("create_item", move |conn| {
            conn.transaction(|tx| {
                let box_exists: i64 = boxes::table
                    .find(row.box_id)
                    .count()
                    .get_result(tx)
                    .map_err(RepositoryError::from)?;
                if box_exists == 0 {
                    return Err(RepositoryError::entity_not_found("box", row.box_id));
                }

                diesel::insert_into(items::table)
                    .values(&row)
                    .returning(ItemRow::as_returning())
                    .get_result(tx)
                    .map(Item::from)
                    .map_err(RepositoryError::from)
            })
        })
        .await
    }

    async fn get_item(&self, item_id: ItemId) -> RepositoryResult<Item> {
        self.with_conn("get_item", move |conn| {
            items::table
                .find(item_id.0)
                .select(ItemRow::as_select())
                .first(conn)
                .map(Item::from)
                .map_err(lookup_error("item", item_id.0))
        })
        .await
    }

    async fn list_items(
        &self,
        owner: UserId,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Item>> {
        let filter = filter.clone();
        self.with_conn("list_items", move |conn| {
            let total: i64 = owned_items(owner, &filter)
                .count()
                .get_result(conn)
                .map_err(RepositoryError::from)?;

            let rows = owned_items(owner, &filter)
                .order((items::show_date.asc(), items::id.asc()))
                .limit(to_i64(page.limit()))
                .offset(to_i64(page.offset()))
                .select(ItemRow::as_select())
                .load(conn)
                .map_err(RepositoryError::from)?;

            Ok(Page::new(
                rows.into_iter().map(Item::from).collect(),
                page,
                total.max(0) as u64,
            ))
        })
        .await
    }

    async fn list_items_for_box(&self, box_id: BoxId) -> RepositoryResult<Vec<Item>> {
        self.with_conn("list_items_for_box", move |conn| {
            items::table
                .filter(items::box_id.eq(box_id.0))
                .order(items::id.asc())
                .select(ItemRow::as_select())
                .load(conn)
                .map(|rows| rows.into_iter().map(Item::from).collect())
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn update_item_texts(
        &self,
        item_id: ItemId,
        changes: &ItemTextChanges,
    ) -> RepositoryResult<Item> {
        if changes.text1.is_none() && changes.text2.is_none() && changes.updated_at.is_none() {
            return self.get_item(item_id).await;
        }

        let changeset = ItemTextChangeset {
            text1: changes.text1.clone(),
            text2: changes.text2.clone(),
            updated_at: changes.updated_at,
        };
        self.with_conn("update_item_texts", move |conn| {
            diesel::update(items::table.find(item_id.0))
                .set(&changeset)
                .returning(ItemRow::as_returning())
                .get_result(conn)
                .map(Item::from)
                .map_err(lookup_error("item", item_id.0))
        })
        .await
    }

    async fn reschedule_item(
        &self,
        item_id: ItemId,
        update: &ScheduleUpdate,
    ) -> RepositoryResult<Option<Item>> {
        let update = *update;
        self.with_conn("reschedule_item", move |conn| {
            let updated = diesel::update(
                items::table
                    .filter(items::id.eq(item_id.0))
                    .filter(items::level.eq(update.expected_level)),
            )
            .set((
                items::level.eq(update.level),
                items::show_date.eq(update.show_date),
                items::updated_at.eq(update.updated_at),
            ))
            .returning(ItemRow::as_returning())
            .get_result(conn)
            .optional()
            .map_err(RepositoryError::from)?;

            if let Some(row) = updated {
                return Ok(Some(Item::from(row)));
            }

            // Zero rows: either the item is gone or its level moved on.
            let exists: i64 = items::table
                .find(item_id.0)
                .count()
                .get_result(conn)
                .map_err(RepositoryError::from)?;
            if exists == 0 {
                Err(RepositoryError::entity_not_found("item", item_id.0))
            } else {
                Ok(None)
            }
        })
        .await
    }

    async fn delete_item(&self, item_id: ItemId) -> RepositoryResult<bool> {
        self.with_conn("delete_item", move |conn| {
            diesel::delete(items::table.find(item_id.0))
                .execute(conn)
                .map(|n| n > 0)
                .map_err(RepositoryError::from)
        })
        .await
    }
}

// =========================================================
// Posts
// =========================================================

#[async_trait]
impl PostRepository for PostgresRepository {
    async fn create_post(&self, new_post: &NewPost) -> RepositoryResult<Post> {
        let row = NewPostRow {
            user_id: new_post.user_id.0,
            title: new_post.title.clone(),
            body: new_post.body.clone(),
            created_at: new_post.created_at,
            updated_at: new_post.created_at,
        };
        self.with_conn("create_post", move |conn| {
            diesel::insert_into(posts::table)
                .values(&row)
                .returning(PostRow::as_returning())
                .get_result(conn)
                .map(Post::from)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn get_post(&self, post_id: PostId) -> RepositoryResult<Post> {
        self.with_conn("get_post", move |conn| {
            posts::table
                .find(post_id.0)
                .select(PostRow::as_select())
                .first(conn)
                .map(Post::from)
                .map_err(lookup_error("post", post_id.0))
        })
        .await
    }

    async fn list_posts(&self, page: PageRequest) -> RepositoryResult<Page<Post>> {
        self.with_conn("list_posts", move |conn| {
            let total: i64 = posts::table
                .count()
                .get_result(conn)
                .map_err(RepositoryError::from)?;

            let rows = posts::table
                .order(posts::id.asc())
                .limit(to_i64(page.limit()))
                .offset(to_i64(page.offset()))
                .select(PostRow::as_select())
                .load(conn)
                .map_err(RepositoryError::from)?;

            Ok(Page::new(
                rows.into_iter().map(Post::from).collect(),
                page,
                total.max(0) as u64,
            ))
        })
        .await
    }

    async fn update_post(&self, post_id: PostId, changes: &PostChanges) -> RepositoryResult<Post> {
        let changeset = PostChangeset {
            title: changes.title.clone(),
            body: changes.body.clone(),
            updated_at: changes.updated_at,
        };
        self.with_conn("update_post", move |conn| {
            diesel::update(posts::table.find(post_id.0))
                .set(&changeset)
                .returning(PostRow::as_returning())
                .get_result(conn)
                .map(Post::from)
                .map_err(lookup_error("post", post_id.0))
        })
        .await
    }

    async fn delete_post(&self, post_id: PostId) -> RepositoryResult<bool> {
        self.with_conn("delete_post", move |conn| {
            diesel::delete(posts::table.find(post_id.0))
                .execute(conn)
                .map(|n| n > 0)
                .map_err(RepositoryError::from)
        })
        .await
    }
}
