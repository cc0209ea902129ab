pub mod card_box;
pub mod item;
pub mod macros;
pub mod pagination;
pub mod post;
pub mod time;
pub mod user;

pub use card_box::*;
pub use item::*;
pub use pagination::*;
pub use post::*;
pub use time::*;
pub use user::*;
