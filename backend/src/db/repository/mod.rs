//! Repository trait definitions for database operations.
//!
//! Persistence is split into focused traits, one per aggregate, so that each
//! backend implementation stays readable and services only name what they use.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`user`]: Accounts, bearer tokens and the health probe
//! - [`card_box`]: Per-user boxes
//! - [`item`]: Review items, including the compare-and-set schedule write
//! - [`post`]: Blog posts
//!
//! # Convenience Trait Bound
//!
//! For functions that need all repository capabilities, use the [`FullRepository`] trait bound:
//!
//! ```ignore
//! async fn create_box<R: FullRepository + ?Sized>(repo: &R, new_box: &NewCardBox) -> RepositoryResult<CardBox> {
//!     repo.create_box(new_box).await
//! }
//! ```

pub mod card_box;
pub mod error;
pub mod item;
pub mod post;
pub mod user;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use card_box::BoxRepository;
pub use item::ItemRepository;
pub use post::PostRepository;
pub use user::UserRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four repository traits.
pub trait FullRepository: UserRepository + BoxRepository + ItemRepository + PostRepository {}

// Blanket implementation: any type implementing all four traits automatically implements FullRepository
impl<T> FullRepository for T where T: UserRepository + BoxRepository + ItemRepository + PostRepository
{}
