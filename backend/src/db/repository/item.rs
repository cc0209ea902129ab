//! Item persistence.
//!
//! Writes to an item's `level` and `show_date` go through
//! [`ItemRepository::reschedule_item`], which only applies when the stored level still
//! matches the level the caller computed from. Concurrent reviews of the same item
//! therefore cannot silently overwrite each other.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{BoxId, ItemId, UserId};
use crate::models::{Item, ItemFilter, ItemTextChanges, NewItem, Page, PageRequest, ScheduleUpdate};

/// Repository trait for review items.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Persist a new item.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the target box doesn't exist
    async fn create_item(&self, new_item: &NewItem) -> RepositoryResult<Item>;

    /// Fetch an item by ID.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the item doesn't exist
    async fn get_item(&self, item_id: ItemId) -> RepositoryResult<Item>;

    /// One page of the items in boxes owned by `owner`.
    ///
    /// Ordered by `show_date` ascending, then by ID.
    async fn list_items(
        &self,
        owner: UserId,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Item>>;

    /// Every item in a box, ordered by ID.
    async fn list_items_for_box(&self, box_id: BoxId) -> RepositoryResult<Vec<Item>>;

    /// Apply text changes. Absent sides are left as they are.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the item doesn't exist
    async fn update_item_texts(
        &self,
        item_id: ItemId,
        changes: &ItemTextChanges,
    ) -> RepositoryResult<Item>;

    /// Compare-and-set the item's schedule.
    ///
    /// # Returns
    /// * `Ok(Some(Item))` - The updated item
    /// * `Ok(None)` - If the stored level no longer equals `update.expected_level`
    /// * `Err(RepositoryError::NotFound)` - If the item doesn't exist
    async fn reschedule_item(
        &self,
        item_id: ItemId,
        update: &ScheduleUpdate,
    ) -> RepositoryResult<Option<Item>>;

    /// Delete an item.
    ///
    /// # Returns
    /// * `Ok(true)` if an item was removed, `Ok(false)` if none existed
    async fn delete_item(&self, item_id: ItemId) -> RepositoryResult<bool>;
}
