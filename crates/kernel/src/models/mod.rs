//! Database models.

pub mod blog_post;
pub mod category;
pub mod follow;
pub mod reply;
pub mod topic;
pub mod user;

pub use blog_post::{BlogPost, CreateBlogPost, UpdateBlogPost};
pub use category::{Category, CreateCategory, UpdateCategory};
pub use follow::{Follow, ProfileRef};
pub use reply::{CreateReply, Reply};
pub use topic::{CreateTopic, Topic, UpdateTopic};
pub use user::{CreateUser, UpdateProfile, User};
