//! Core types for the social graph and engagement model.

pub mod ids;
pub mod user;
pub mod edge;
pub mod post;
pub mod comment;
pub mod token;

pub use ids::{UserId, PostId, CommentId};
pub use user::{User, NewUser, UserInsert, UserSummary, Profile, ProfileChanges, ProfileView};
pub use edge::{FollowEdge, LikeEdge, FollowToggle, LikeToggle, FollowStats};
pub use post::{Post, NewPost, PostChanges, PostWithStats, PostFilter, PostQuery};
pub use comment::Comment;
pub use token::{AuthToken, TokenError};
