//! Posts are readable by every signed-in user and writable by their author.

use super::validation::{self, FieldErrors, MAX_STRING_LEN};
use super::{ensure_valid, not_found_as, ServiceError, ServiceResult};
use crate::api::PostId;
use crate::db::repository::FullRepository;
use crate::models::{Clock, NewPost, Page, PageRequest, Post, PostChanges, PostDraft, User};

pub const POST_NOT_FOUND: &str = "Post not found";
pub const NOT_AUTHOR: &str = "Authorization Failed";

fn validate_draft(draft: &PostDraft) -> (FieldErrors, Option<(String, String)>) {
    let mut errors = FieldErrors::new();
    let title = validation::required_string(
        &mut errors,
        "title",
        draft.title.as_deref(),
        Some(MAX_STRING_LEN),
    );
    let body = validation::required_string(&mut errors, "body", draft.body.as_deref(), None);
    (errors, title.zip(body))
}

async fn authored_post<R>(repo: &R, user: &User, post_id: PostId) -> ServiceResult<Post>
where
    R: FullRepository + ?Sized,
{
    let post = repo
        .get_post(post_id)
        .await
        .map_err(not_found_as(POST_NOT_FOUND))?;
    if !post.can_be_modified_by(user.id) {
        return Err(ServiceError::Forbidden(NOT_AUTHOR.to_string()));
    }
    Ok(post)
}

pub async fn list<R>(repo: &R, page: PageRequest) -> ServiceResult<Page<Post>>
where
    R: FullRepository + ?Sized,
{
    Ok(repo.list_posts(page).await?)
}

pub async fn show<R>(repo: &R, post_id: PostId) -> ServiceResult<Post>
where
    R: FullRepository + ?Sized,
{
    repo.get_post(post_id)
        .await
        .map_err(not_found_as(POST_NOT_FOUND))
}

pub async fn create<R>(
    repo: &R,
    clock: &dyn Clock,
    user: &User,
    draft: PostDraft,
) -> ServiceResult<Post>
where
    R: FullRepository + ?Sized,
{
    let (errors, fields) = validate_draft(&draft);
    ensure_valid(errors, "All fields are required")?;
    let Some((title, body)) = fields else {
        return Err(ServiceError::Internal("validated post is missing fields".to_string()));
    };

    let post = repo
        .create_post(&NewPost {
            user_id: user.id,
            title,
            body,
            created_at: clock.now(),
        })
        .await?;
    log::info!("User {} published post {}", user.id, post.id);
    Ok(post)
}

pub async fn update<R>(
    repo: &R,
    clock: &dyn Clock,
    user: &User,
    post_id: PostId,
    draft: PostDraft,
) -> ServiceResult<Post>
where
    R: FullRepository + ?Sized,
{
    authored_post(repo, user, post_id).await?;

    let (errors, fields) = validate_draft(&draft);
    ensure_valid(errors, "All fields are required")?;
    let Some((title, body)) = fields else {
        return Err(ServiceError::Internal("validated post is missing fields".to_string()));
    };

    repo.update_post(
        post_id,
        &PostChanges {
            title,
            body,
            updated_at: clock.now(),
        },
    )
    .await
    .map_err(not_found_as(POST_NOT_FOUND))
}

pub async fn delete<R>(repo: &R, user: &User, post_id: PostId) -> ServiceResult<()>
where
    R: FullRepository + ?Sized,
{
    authored_post(repo, user, post_id).await?;
    if !repo.delete_post(post_id).await? {
        return Err(ServiceError::NotFound(POST_NOT_FOUND.to_string()));
    }
    log::info!("User {} deleted post {}", user.id, post_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::services::test_support::{start, Fixture};

    fn draft(title: &str, body: &str) -> PostDraft {
        PostDraft {
            title: Some(title.to_string()),
            body: Some(body.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let fx = Fixture::new().await;
        let post = create(&fx.repo, &fx.clock, &fx.ada, draft("Hello", "First post"))
            .await
            .unwrap();
        assert_eq!(post.user_id, fx.ada.id);
        assert_eq!(post.created_at, start());

        // Any user may read any post.
        assert_eq!(show(&fx.repo, post.id).await.unwrap(), post);
        let page = list(&fx.repo, PageRequest::default()).await.unwrap();
        assert_eq!(page.data, vec![post]);
    }

    #[tokio::test]
    async fn test_body_has_no_length_limit_but_title_does() {
        let fx = Fixture::new().await;
        let long = "x".repeat(MAX_STRING_LEN + 1);

        create(&fx.repo, &fx.clock, &fx.ada, draft("Long read", &long))
            .await
            .unwrap();

        let err = create(&fx.repo, &fx.clock, &fx.ada, draft(&long, "short"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation { message, errors } => {
                assert_eq!(message, "All fields are required");
                assert!(errors.contains("title"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_only_the_author_may_change_a_post() {
        let fx = Fixture::new().await;
        let post = create(&fx.repo, &fx.clock, &fx.ada, draft("Hello", "First post"))
            .await
            .unwrap();

        let err = update(&fx.repo, &fx.clock, &fx.bob, post.id, PostDraft::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref m) if m == NOT_AUTHOR));

        let err = delete(&fx.repo, &fx.bob, post.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        fx.clock.advance(Duration::days(1));
        let updated = update(&fx.repo, &fx.clock, &fx.ada, post.id, draft("Hi", "Edited"))
            .await
            .unwrap();
        assert_eq!(updated.body, "Edited");
        assert_eq!(updated.updated_at, start() + Duration::days(1));

        delete(&fx.repo, &fx.ada, post.id).await.unwrap();
        let err = show(&fx.repo, post.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == POST_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_update_of_missing_post_is_not_found() {
        let fx = Fixture::new().await;
        let err = update(&fx.repo, &fx.clock, &fx.ada, PostId(5), PostDraft::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
