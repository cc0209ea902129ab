//! Box operations, scoped to the calling user.

use super::validation::{self, FieldErrors, MAX_STRING_LEN};
use super::{ensure_valid, not_found_as, ServiceError, ServiceResult};
use crate::api::BoxId;
use crate::db::repository::FullRepository;
use crate::models::{
    CardBox, CardBoxChanges, CardBoxDraft, CardBoxWithItems, Clock, NewCardBox, Page,
    PageRequest, User,
};

pub const BOX_NOT_FOUND: &str = "Box not found";

/// Both fields are required on create and on update.
fn validate_draft(draft: &CardBoxDraft) -> (FieldErrors, Option<(String, String)>) {
    let mut errors = FieldErrors::new();
    let title = validation::required_string(
        &mut errors,
        "title",
        draft.title.as_deref(),
        Some(MAX_STRING_LEN),
    );
    let description = validation::required_string(
        &mut errors,
        "description",
        draft.description.as_deref(),
        Some(MAX_STRING_LEN),
    );
    (errors, title.zip(description))
}

/// Load a box and check that `user` owns it.
///
/// `action` completes the 403 message: "view", "update" or "delete".
pub(crate) async fn owned_box<R>(
    repo: &R,
    user: &User,
    box_id: BoxId,
    action: &str,
) -> ServiceResult<CardBox>
where
    R: FullRepository + ?Sized,
{
    let card_box = repo
        .get_box(box_id)
        .await
        .map_err(not_found_as(BOX_NOT_FOUND))?;
    if !card_box.is_owned_by(user.id) {
        return Err(ServiceError::Forbidden(format!(
            "You do not have permission to {} this box",
            action
        )));
    }
    Ok(card_box)
}

pub async fn list<R>(repo: &R, user: &User, page: PageRequest) -> ServiceResult<Page<CardBox>>
where
    R: FullRepository + ?Sized,
{
    Ok(repo.list_boxes(user.id, page).await?)
}

pub async fn create<R>(
    repo: &R,
    clock: &dyn Clock,
    user: &User,
    draft: CardBoxDraft,
) -> ServiceResult<CardBox>
where
    R: FullRepository + ?Sized,
{
    let (errors, fields) = validate_draft(&draft);
    ensure_valid(errors, "All fields are required")?;
    let Some((title, description)) = fields else {
        return Err(ServiceError::Internal("validated box is missing fields".to_string()));
    };

    let card_box = repo
        .create_box(&NewCardBox {
            user_id: user.id,
            title,
            description,
            created_at: clock.now(),
        })
        .await?;
    log::info!("User {} created box {}", user.id, card_box.id);
    Ok(card_box)
}

/// A box with all of its items.
pub async fn show<R>(repo: &R, user: &User, box_id: BoxId) -> ServiceResult<CardBoxWithItems>
where
    R: FullRepository + ?Sized,
{
    let card_box = owned_box(repo, user, box_id, "view").await?;
    let items = repo.list_items_for_box(card_box.id).await?;
    Ok(CardBoxWithItems { card_box, items })
}

pub async fn update<R>(
    repo: &R,
    clock: &dyn Clock,
    user: &User,
    box_id: BoxId,
    draft: CardBoxDraft,
) -> ServiceResult<CardBox>
where
    R: FullRepository + ?Sized,
{
    owned_box(repo, user, box_id, "update").await?;

    let (errors, fields) = validate_draft(&draft);
    ensure_valid(errors, "Validation failed")?;
    let Some((title, description)) = fields else {
        return Err(ServiceError::Internal("validated box is missing fields".to_string()));
    };

    repo.update_box(
        box_id,
        &CardBoxChanges {
            title,
            description,
            updated_at: clock.now(),
        },
    )
    .await
    .map_err(not_found_as(BOX_NOT_FOUND))
}

/// Delete a box and, with it, all of its items.
pub async fn delete<R>(repo: &R, user: &User, box_id: BoxId) -> ServiceResult<()>
where
    R: FullRepository + ?Sized,
{
    owned_box(repo, user, box_id, "delete").await?;
    if !repo.delete_box(box_id).await? {
        return Err(ServiceError::NotFound(BOX_NOT_FOUND.to_string()));
    }
    log::info!("User {} deleted box {}", user.id, box_id);
    Ok(())
}

#[cfg(test)]
#[path = "boxes_tests.rs"]
mod tests;
