//! Box persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{BoxId, UserId};
use crate::models::{CardBox, CardBoxChanges, NewCardBox, Page, PageRequest};

/// Repository trait for boxes.
///
/// Ownership is not enforced here; callers compare `CardBox::user_id` themselves.
#[async_trait]
pub trait BoxRepository: Send + Sync {
    /// Persist a new box and return it with its assigned ID.
    async fn create_box(&self, new_box: &NewCardBox) -> RepositoryResult<CardBox>;

    /// Fetch a box by ID.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the box doesn't exist
    async fn get_box(&self, box_id: BoxId) -> RepositoryResult<CardBox>;

    /// One page of a user's boxes, ordered by ID.
    async fn list_boxes(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> RepositoryResult<Page<CardBox>>;

    /// Overwrite a box's title and description.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the box doesn't exist
    async fn update_box(&self, box_id: BoxId, changes: &CardBoxChanges)
        -> RepositoryResult<CardBox>;

    /// Delete a box together with all of its items.
    ///
    /// # Returns
    /// * `Ok(true)` if a box was removed, `Ok(false)` if none existed
    async fn delete_box(&self, box_id: BoxId) -> RepositoryResult<bool>;
}
