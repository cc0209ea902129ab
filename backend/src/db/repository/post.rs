//! Post persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::PostId;
use crate::models::{NewPost, Page, PageRequest, Post, PostChanges};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, new_post: &NewPost) -> RepositoryResult<Post>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the post doesn't exist
    async fn get_post(&self, post_id: PostId) -> RepositoryResult<Post>;

    /// One page of all posts, ordered by ID.
    async fn list_posts(&self, page: PageRequest) -> RepositoryResult<Page<Post>>;

    async fn update_post(&self, post_id: PostId, changes: &PostChanges) -> RepositoryResult<Post>;

    async fn delete_post(&self, post_id: PostId) -> RepositoryResult<bool>;
}
