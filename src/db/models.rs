use serde::{Deserialize, Serialize};

/// A user row without the password hash. This is the shape every API
/// response uses; the hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Full user view: the user plus their posts, liked posts, and the
/// invites they sent and received.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<i64>,
    pub liked_posts: Vec<i64>,
    pub sent_invites: Vec<SentInvite>,
    pub received_invites: Vec<ReceivedInvite>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentInvite {
    pub post_id: i64,
    pub post_owner: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedInvite {
    pub username: String,
    pub post_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub item_name: String,
    pub username: String,
    pub post_date: String,
    pub city: Option<String>,
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub age_group: Option<String>,
}

/// List view of a post; the description is only returned on single-post
/// lookups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub item_name: String,
    pub username: String,
    pub post_date: String,
    pub city: Option<String>,
    pub img_url: Option<String>,
    pub category: Option<String>,
    pub age_group: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub username: String,
    pub post_id: i64,
    pub text: String,
    pub comment_date: String,
}
