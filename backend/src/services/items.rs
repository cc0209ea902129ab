//! Item operations and review scheduling.
//!
//! An item belongs to a box, and the box's owner is the only user who may see or
//! change it. Reviews run the [`LevelScheduler`] and persist its output with a
//! compare-and-set on the level that was read. A review whose level moved underneath
//! it recomputes from the fresh level. Self-loop edges (5 correct, 1 incorrect) leave
//! the level unchanged, so concurrent reviews on them both succeed; the outcome still
//! equals applying them one after the other, since the scheduler reads only the level.

use super::boxes::owned_box;
use super::validation::{self, FieldErrors, MAX_STRING_LEN};
use super::{ensure_valid, not_found_as, ServiceError, ServiceResult};
use crate::api::{BoxId, ItemId};
use crate::db::repository::FullRepository;
use crate::models::{
    Clock, Item, ItemDraft, ItemFilter, ItemTextChanges, ItemUpdateDraft, NewItem, Page,
    PageRequest, ReviewDraft, ScheduleUpdate, User, INITIAL_LEVEL,
};
use crate::scheduler::LevelScheduler;

pub const ITEM_NOT_FOUND: &str = "Item not found";

/// Attempts at the compare-and-set before giving up with a conflict.
pub const MAX_REVIEW_ATTEMPTS: usize = 3;

const REVIEW_CONFLICT: &str = "The item was modified concurrently, please retry";

/// Load an item and check that its box belongs to `user`.
async fn owned_item<R>(repo: &R, user: &User, item_id: ItemId, action: &str) -> ServiceResult<Item>
where
    R: FullRepository + ?Sized,
{
    let item = repo
        .get_item(item_id)
        .await
        .map_err(not_found_as(ITEM_NOT_FOUND))?;
    let card_box = repo
        .get_box(item.box_id)
        .await
        .map_err(not_found_as(ITEM_NOT_FOUND))?;
    if !card_box.is_owned_by(user.id) {
        return Err(ServiceError::Forbidden(format!(
            "You do not have permission to {} this item",
            action
        )));
    }
    Ok(item)
}

/// The caller's items across all of their boxes, soonest due first.
///
/// A `box_id` filter must name one of the caller's boxes. With `due_only`, items whose
/// show date is still in the future are left out.
pub async fn list<R>(
    repo: &R,
    clock: &dyn Clock,
    user: &User,
    box_id: Option<BoxId>,
    due_only: bool,
    page: PageRequest,
) -> ServiceResult<Page<Item>>
where
    R: FullRepository + ?Sized,
{
    if let Some(box_id) = box_id {
        owned_box(repo, user, box_id, "view").await?;
    }
    let filter = ItemFilter {
        box_id,
        due_at: due_only.then(|| clock.now()),
    };
    Ok(repo.list_items(user.id, &filter, page).await?)
}

/// Add an item to one of the caller's boxes. It starts on level 1 and is due at once.
pub async fn create<R>(
    repo: &R,
    clock: &dyn Clock,
    user: &User,
    draft: ItemDraft,
) -> ServiceResult<Item>
where
    R: FullRepository + ?Sized,
{
    let mut errors = FieldErrors::new();
    let box_id = validation::required_id(&mut errors, "box_id", draft.box_id).map(BoxId);
    let text1 = validation::required_string(
        &mut errors,
        "text1",
        draft.text1.as_deref(),
        Some(MAX_STRING_LEN),
    );
    let text2 = validation::required_string(
        &mut errors,
        "text2",
        draft.text2.as_deref(),
        Some(MAX_STRING_LEN),
    );

    let mut card_box = None;
    if let Some(box_id) = box_id {
        match repo.get_box(box_id).await {
            Ok(found) => card_box = Some(found),
            Err(e) if e.is_not_found() => validation::invalid_selection(&mut errors, "box_id"),
            Err(e) => return Err(e.into()),
        }
    }
    ensure_valid(errors, "Validation failed")?;

    let (Some(card_box), Some(text1), Some(text2)) = (card_box, text1, text2) else {
        return Err(ServiceError::Internal("validated item is missing fields".to_string()));
    };
    if !card_box.is_owned_by(user.id) {
        return Err(ServiceError::Forbidden(
            "You do not have permission to add items to this box".to_string(),
        ));
    }

    let now = clock.now();
    let item = repo
        .create_item(&NewItem {
            box_id: card_box.id,
            text1,
            text2,
            level: INITIAL_LEVEL,
            show_date: now,
            created_at: now,
        })
        .await
        .map_err(not_found_as(super::boxes::BOX_NOT_FOUND))?;
    log::info!("User {} added item {} to box {}", user.id, item.id, card_box.id);
    Ok(item)
}

pub async fn show<R>(repo: &R, user: &User, item_id: ItemId) -> ServiceResult<Item>
where
    R: FullRepository + ?Sized,
{
    owned_item(repo, user, item_id, "view").await
}

/// Change either side of an item. Omitted sides keep their value.
pub async fn update<R>(
    repo: &R,
    clock: &dyn Clock,
    user: &User,
    item_id: ItemId,
    draft: ItemUpdateDraft,
) -> ServiceResult<Item>
where
    R: FullRepository + ?Sized,
{
    let mut errors = FieldErrors::new();
    let text1 = validation::optional_string(
        &mut errors,
        "text1",
        draft.text1.as_deref(),
        Some(MAX_STRING_LEN),
    );
    let text2 = validation::optional_string(
        &mut errors,
        "text2",
        draft.text2.as_deref(),
        Some(MAX_STRING_LEN),
    );
    ensure_valid(errors, "Validation failed")?;

    owned_item(repo, user, item_id, "update").await?;

    if text1.is_none() && text2.is_none() {
        return repo
            .get_item(item_id)
            .await
            .map_err(not_found_as(ITEM_NOT_FOUND));
    }

    repo.update_item_texts(
        item_id,
        &ItemTextChanges {
            text1,
            text2,
            updated_at: Some(clock.now()),
        },
    )
    .await
    .map_err(not_found_as(ITEM_NOT_FOUND))
}

pub async fn delete<R>(repo: &R, user: &User, item_id: ItemId) -> ServiceResult<()>
where
    R: FullRepository + ?Sized,
{
    owned_item(repo, user, item_id, "delete").await?;
    if !repo.delete_item(item_id).await? {
        return Err(ServiceError::NotFound(ITEM_NOT_FOUND.to_string()));
    }
    log::info!("User {} deleted item {}", user.id, item_id);
    Ok(())
}

/// Record a review outcome and move the item to its next level.
///
/// An unknown stored level fails with [`ServiceError::InvalidLevel`] and leaves the
/// item untouched. If another review changes the level between the read and the
/// write, the item is reloaded and the schedule recomputed, up to
/// [`MAX_REVIEW_ATTEMPTS`] times.
pub async fn record_review<R>(
    repo: &R,
    scheduler: &LevelScheduler,
    clock: &dyn Clock,
    user: &User,
    item_id: ItemId,
    draft: ReviewDraft,
) -> ServiceResult<Item>
where
    R: FullRepository + ?Sized,
{
    let mut errors = FieldErrors::new();
    let is_correct = validation::boolean(&mut errors, "is_true", draft.is_true.as_ref());
    ensure_valid(errors, "Validation failed")?;
    let Some(is_correct) = is_correct else {
        return Err(ServiceError::Internal("validated review has no outcome".to_string()));
    };

    let mut item = owned_item(repo, user, item_id, "update").await?;

    for attempt in 1..=MAX_REVIEW_ATTEMPTS {
        let now = clock.now();
        let next = scheduler.compute_next(item.level, is_correct, now)?;
        let update = ScheduleUpdate {
            expected_level: item.level,
            level: next.level,
            show_date: next.show_date,
            updated_at: now,
        };

        match repo
            .reschedule_item(item_id, &update)
            .await
            .map_err(not_found_as(ITEM_NOT_FOUND))?
        {
            Some(updated) => {
                log::info!(
                    "Item {} reviewed ({}): level {} -> {}, next show {}",
                    item_id,
                    if is_correct { "correct" } else { "incorrect" },
                    update.expected_level,
                    updated.level,
                    updated.show_date
                );
                return Ok(updated);
            }
            None => {
                log::warn!(
                    "Item {} changed level during review (attempt {}/{})",
                    item_id,
                    attempt,
                    MAX_REVIEW_ATTEMPTS
                );
                item = repo
                    .get_item(item_id)
                    .await
                    .map_err(not_found_as(ITEM_NOT_FOUND))?;
            }
        }
    }

    Err(ServiceError::Conflict(REVIEW_CONFLICT.to_string()))
}

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
