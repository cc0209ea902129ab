//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in memory using
//! HashMaps guarded by a single `parking_lot::RwLock`, which keeps every operation
//! (including the compare-and-set schedule write) atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{BoxId, ItemId, PostId, TokenId, UserId};
use crate::db::repository::*;
use crate::models::{
    ApiToken, CardBox, CardBoxChanges, Item, ItemFilter, ItemTextChanges, NewCardBox, NewItem,
    NewPost, NewUser, Page, PageRequest, Post, PostChanges, ScheduleUpdate, User,
};

/// In-memory local repository.
///
/// Cloning shares the underlying store.
///
/// # Example
/// ```
/// use recall_backend::db::repositories::LocalRepository;
/// use recall_backend::db::repository::UserRepository;
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// assert!(repo.health_check().await.unwrap());
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    users: HashMap<UserId, User>,
    tokens: HashMap<TokenId, ApiToken>,
    boxes: HashMap<BoxId, CardBox>,
    items: HashMap<ItemId, Item>,
    posts: HashMap<PostId, Post>,

    // ID counters
    next_user_id: i64,
    next_token_id: i64,
    next_box_id: i64,
    next_item_id: i64,
    next_post_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            tokens: HashMap::new(),
            boxes: HashMap::new(),
            items: HashMap::new(),
            posts: HashMap::new(),
            next_user_id: 1,
            next_token_id: 1,
            next_box_id: 1,
            next_item_id: 1,
            next_post_id: 1,
            is_healthy: true,
        }
    }
}

fn take_id(counter: &mut i64) -> i64 {
    let id = *counter;
    *counter += 1;
    id
}

impl LocalData {
    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection_with_context(
                "local repository marked unhealthy",
                ErrorContext::new(operation),
            ))
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy, every operation fails with a connection error and
    /// `health_check` returns `Ok(false)`.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository. ID counters restart at 1.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn user_count(&self) -> usize {
        self.data.read().users.len()
    }

    pub fn box_count(&self) -> usize {
        self.data.read().boxes.len()
    }

    pub fn item_count(&self) -> usize {
        self.data.read().items.len()
    }

    pub fn post_count(&self) -> usize {
        self.data.read().posts.len()
    }
}

// =========================================================
// Users & tokens
// =========================================================

#[async_trait]
impl UserRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let mut data = self.data.write();
        data.ensure_healthy("create_user")?;

        let email = user.email.to_lowercase();
        if data.users.values().any(|u| u.email == email) {
            return Err(RepositoryError::conflict("email already registered")
                .with_operation("create_user")
                .with_entity("user", &email));
        }

        let id = UserId(take_id(&mut data.next_user_id));
        let stored = User {
            id,
            name: user.name.clone(),
            email,
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        };
        data.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, user_id: UserId) -> RepositoryResult<User> {
        let data = self.data.read();
        data.ensure_healthy("get_user")?;
        data.users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RepositoryError::entity_not_found("user", user_id))
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let data = self.data.read();
        data.ensure_healthy("find_user_by_email")?;
        let email = email.to_lowercase();
        Ok(data.users.values().find(|u| u.email == email).cloned())
    }

    async fn store_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<ApiToken> {
        let mut data = self.data.write();
        data.ensure_healthy("store_token")?;
        if !data.users.contains_key(&user_id) {
            return Err(RepositoryError::entity_not_found("user", user_id));
        }

        let id = TokenId(take_id(&mut data.next_token_id));
        let token = ApiToken {
            id,
            user_id,
            token_hash: token_hash.to_string(),
            created_at,
            last_used_at: None,
        };
        data.tokens.insert(id, token.clone());
        Ok(token)
    }

    async fn find_user_by_token(
        &self,
        token_hash: &str,
        used_at: DateTime<Utc>,
    ) -> RepositoryResult<Option<User>> {
        let mut data = self.data.write();
        data.ensure_healthy("find_user_by_token")?;

        let Some(token) = data
            .tokens
            .values_mut()
            .find(|t| t.token_hash == token_hash)
        else {
            return Ok(None);
        };
        token.last_used_at = Some(used_at);
        let user_id = token.user_id;

        Ok(data.users.get(&user_id).cloned())
    }
}

// =========================================================
// Boxes
// =========================================================

#[async_trait]
impl BoxRepository for LocalRepository {
    async fn create_box(&self, new_box: &NewCardBox) -> RepositoryResult<CardBox> {
        let mut data = self.data.write();
        data.ensure_healthy("create_box")?;

        let id = BoxId(take_id(&mut data.next_box_id));
        let card_box = CardBox {
            id,
            user_id: new_box.user_id,
            title: new_box.title.clone(),
            description: new_box.description.clone(),
            created_at: new_box.created_at,
            updated_at: new_box.created_at,
        };
        data.boxes.insert(id, card_box.clone());
        Ok(card_box)
    }

    async fn get_box(&self, box_id: BoxId) -> RepositoryResult<CardBox> {
        let data = self.data.read();
        data.ensure_healthy("get_box")?;
        data.boxes
            .get(&box_id)
            .cloned()
            .ok_or_else(|| RepositoryError::entity_not_found("box", box_id))
    }

    async fn list_boxes(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> RepositoryResult<Page<CardBox>> {
        let data = self.data.read();
        data.ensure_healthy("list_boxes")?;

        let mut boxes: Vec<CardBox> = data
            .boxes
            .values()
            .filter(|b| b.user_id == owner)
            .cloned()
            .collect();
        boxes.sort_by_key(|b| b.id);
        Ok(Page::from_sorted(boxes, page))
    }

    async fn update_box(
        &self,
        box_id: BoxId,
        changes: &CardBoxChanges,
    ) -> RepositoryResult<CardBox> {
        let mut data = self.data.write();
        data.ensure_healthy("update_box")?;

        let card_box = data
            .boxes
            .get_mut(&box_id)
            .ok_or_else(|| RepositoryError::entity_not_found("box", box_id))?;
        card_box.title = changes.title.clone();
        card_box.description = changes.description.clone();
        card_box.updated_at = changes.updated_at;
        Ok(card_box.clone())
    }

    async fn delete_box(&self, box_id: BoxId) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.ensure_healthy("delete_box")?;

        if data.boxes.remove(&box_id).is_none() {
            return Ok(false);
        }
        data.items.retain(|_, item| item.box_id != box_id);
        Ok(true)
    }
}

// =========================================================
// Items
// =========================================================

#[async_trait]
impl ItemRepository for LocalRepository {
    async fn create_item(&self, new_item: &NewItem) -> RepositoryResult<Item> {
        let mut data = self.data.write();
        data.ensure_healthy("create_item")?;
        if !data.boxes.contains_key(&new_item.box_id) {
            return Err(RepositoryError::entity_not_found("box", new_item.box_id)
                .with_operation("create_item"));
        }

        let id = ItemId(take_id(&mut data.next_item_id));
        let item = Item {
            id,
            box_id: new_item.box_id,
            text1: new_item.text1.clone(),
            text2: new_item.text2.clone(),
            level: new_item.level,
            show_date: new_item.show_date,
            created_at: new_item.created_at,
            updated_at: new_item.created_at,
        };
        data.items.insert(id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, item_id: ItemId) -> RepositoryResult<Item> {
        let data = self.data.read();
        data.ensure_healthy("get_item")?;
        data.items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| RepositoryError::entity_not_found("item", item_id))
    }

    async fn list_items(
        &self,
        owner: UserId,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Item>> {
        let data = self.data.read();
        data.ensure_healthy("list_items")?;

        let owned = |box_id: &BoxId| {
            data.boxes
                .get(box_id)
                .is_some_and(|b| b.user_id == owner)
        };

        let mut items: Vec<Item> = data
            .items
            .values()
            .filter(|item| owned(&item.box_id))
            .filter(|item| filter.box_id.map_or(true, |b| item.box_id == b))
            .filter(|item| filter.due_at.map_or(true, |due| item.is_due(due)))
            .cloned()
            .collect();
        items.sort_by_key(|item| (item.show_date, item.id));
        Ok(Page::from_sorted(items, page))
    }

    async fn list_items_for_box(&self, box_id: BoxId) -> RepositoryResult<Vec<Item>> {
        let data = self.data.read();
        data.ensure_healthy("list_items_for_box")?;

        let mut items: Vec<Item> = data
            .items
            .values()
            .filter(|item| item.box_id == box_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    async fn update_item_texts(
        &self,
        item_id: ItemId,
        changes: &ItemTextChanges,
    ) -> RepositoryResult<Item> {
        let mut data = self.data.write();
        data.ensure_healthy("update_item_texts")?;

        let item = data
            .items
            .get_mut(&item_id)
            .ok_or_else(|| RepositoryError::entity_not_found("item", item_id))?;
        if let Some(text1) = &changes.text1 {
            item.text1 = text1.clone();
        }
        if let Some(text2) = &changes.text2 {
            item.text2 = text2.clone();
        }
        if let Some(updated_at) = changes.updated_at {
            item.updated_at = updated_at;
        }
        Ok(item.clone())
    }

    async fn reschedule_item(
        &self,
        item_id: ItemId,
        update: &ScheduleUpdate,
    ) -> RepositoryResult<Option<Item>> {
        let mut data = self.data.write();
        data.ensure_healthy("reschedule_item")?;

        let item = data
            .items
            .get_mut(&item_id)
            .ok_or_else(|| RepositoryError::entity_not_found("item", item_id))?;
        if item.level != update.expected_level {
            return Ok(None);
        }
        item.level = update.level;
        item.show_date = update.show_date;
        item.updated_at = update.updated_at;
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, item_id: ItemId) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.ensure_healthy("delete_item")?;
        Ok(data.items.remove(&item_id).is_some())
    }
}

// =========================================================
// Posts
// =========================================================

#[async_trait]
impl PostRepository for LocalRepository {
    async fn create_post(&self, new_post: &NewPost) -> RepositoryResult<Post> {
        let mut data = self.data.write();
        data.ensure_healthy("create_post")?;

        let id = PostId(take_id(&mut data.next_post_id));
        let post = Post {
            id,
            user_id: new_post.user_id,
            title: new_post.title.clone(),
            body: new_post.body.clone(),
            created_at: new_post.created_at,
            updated_at: new_post.created_at,
        };
        data.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, post_id: PostId) -> RepositoryResult<Post> {
        let data = self.data.read();
        data.ensure_healthy("get_post")?;
        data.posts
            .get(&post_id)
            .cloned()
            .ok_or_else(|| RepositoryError::entity_not_found("post", post_id))
    }

    async fn list_posts(&self, page: PageRequest) -> RepositoryResult<Page<Post>> {
        let data = self.data.read();
        data.ensure_healthy("list_posts")?;

        let mut posts: Vec<Post> = data.posts.values().cloned().collect();
        posts.sort_by_key(|p| p.id);
        Ok(Page::from_sorted(posts, page))
    }

    async fn update_post(&self, post_id: PostId, changes: &PostChanges) -> RepositoryResult<Post> {
        let mut data = self.data.write();
        data.ensure_healthy("update_post")?;

        let post = data
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| RepositoryError::entity_not_found("post", post_id))?;
        post.title = changes.title.clone();
        post.body = changes.body.clone();
        post.updated_at = changes.updated_at;
        Ok(post.clone())
    }

    async fn delete_post(&self, post_id: PostId) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.ensure_healthy("delete_post")?;
        Ok(data.posts.remove(&post_id).is_some())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
