//! Model-level tests for the store layer, run against a real on-disk
//! database in a temp directory.

use tempfile::TempDir;

use swapboard::db;
use swapboard::error::AppError;
use swapboard::state::DbPool;
use swapboard::store::posts::{NewPost, PostUpdate};
use swapboard::store::users::{NewUser, UserUpdate};
use swapboard::store::{posts, users};

const BCRYPT_COST: u32 = 4;

fn test_pool() -> (TempDir, DbPool) {
    let tmp = TempDir::new().unwrap();
    let pool = db::create_pool(&tmp.path().join("test.db")).unwrap();
    db::run_migrations(&pool).unwrap();
    (tmp, pool)
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: format!("password-{username}"),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: format!("{username}@email.com"),
        is_admin: false,
    }
}

fn new_post(item_name: &str, username: &str) -> NewPost {
    NewPost {
        item_name: item_name.to_string(),
        username: username.to_string(),
        city: Some("city1".to_string()),
        img_url: None,
        description: None,
        category: Some("toy".to_string()),
        age_group: Some("baby".to_string()),
    }
}

/// u1 and u2, a post each, u2 likes u1's post, u1 invites on u2's post,
/// u1 comments on u2's post. Returns (post1_id, post2_id, comment_id).
fn seed(pool: &DbPool) -> (i64, i64, i64) {
    users::register(pool, new_user("u1"), BCRYPT_COST).unwrap();
    users::register(pool, new_user("u2"), BCRYPT_COST).unwrap();
    let p1 = posts::create(pool, new_post("item1", "u1")).unwrap();
    let p2 = posts::create(pool, new_post("item2", "u2")).unwrap();
    users::like_post(pool, "u2", p1.id).unwrap();
    users::invite_post(pool, "u1", p2.id).unwrap();
    let comment = posts::add_comment(pool, "u1", p2.id, "good").unwrap();
    (p1.id, p2.id, comment.id)
}

// -- users --

#[test]
fn authenticate_returns_user_without_password() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let user = users::authenticate(&pool, "u1", "password-u1").unwrap();
    assert_eq!(user.username, "u1");
    assert_eq!(user.email, "u1@email.com");
    assert!(!user.is_admin);

    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("password").is_none());
}

#[test]
fn authenticate_rejects_wrong_password() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let err = users::authenticate(&pool, "u1", "wrong").unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[test]
fn authenticate_rejects_unknown_user() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let err = users::authenticate(&pool, "nobody", "password-u1").unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[test]
fn register_then_authenticate_round_trip() {
    let (_tmp, pool) = test_pool();

    let created = users::register(&pool, new_user("fresh"), BCRYPT_COST).unwrap();
    assert_eq!(created.username, "fresh");

    let user = users::authenticate(&pool, "fresh", "password-fresh").unwrap();
    assert_eq!(user.username, "fresh");
}

#[test]
fn register_duplicate_username_fails_and_leaves_row_unchanged() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let mut dup = new_user("u1");
    dup.email = "other@email.com".to_string();
    let err = users::register(&pool, dup, BCRYPT_COST).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Original row untouched
    let email = users::get_email(&pool, "u1").unwrap();
    assert_eq!(email, "u1@email.com");
}

#[test]
fn find_all_orders_by_username() {
    let (_tmp, pool) = test_pool();
    users::register(&pool, new_user("zed"), BCRYPT_COST).unwrap();
    users::register(&pool, new_user("amy"), BCRYPT_COST).unwrap();

    let all = users::find_all(&pool).unwrap();
    let names: Vec<_> = all.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["amy", "zed"]);
}

#[test]
fn get_returns_posts_likes_and_invites() {
    let (_tmp, pool) = test_pool();
    let (p1, p2, _) = seed(&pool);

    let detail = users::get(&pool, "u1").unwrap();
    assert_eq!(detail.user.username, "u1");
    assert_eq!(detail.posts, vec![p1]);
    assert!(detail.liked_posts.is_empty());
    assert_eq!(detail.sent_invites.len(), 1);
    assert_eq!(detail.sent_invites[0].post_id, p2);
    assert_eq!(detail.sent_invites[0].post_owner, "u2");
    // u1 owns p1, which nobody was invited about
    assert!(detail.received_invites.is_empty());

    let detail2 = users::get(&pool, "u2").unwrap();
    assert_eq!(detail2.liked_posts, vec![p1]);
    assert_eq!(detail2.received_invites.len(), 1);
    assert_eq!(detail2.received_invites[0].username, "u1");
    assert_eq!(detail2.received_invites[0].post_id, p2);
}

#[test]
fn get_unknown_user_is_not_found() {
    let (_tmp, pool) = test_pool();
    let err = users::get(&pool, "nobody").unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn update_changes_only_supplied_fields() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let updated = users::update(
        &pool,
        "u1",
        UserUpdate {
            first_name: Some("NewName".to_string()),
            ..Default::default()
        },
        BCRYPT_COST,
    )
    .unwrap();
    assert_eq!(updated.first_name, "NewName");
    assert_eq!(updated.last_name, "User");
    assert_eq!(updated.email, "u1@email.com");

    // Round trip: get returns the updated value
    let detail = users::get(&pool, "u1").unwrap();
    assert_eq!(detail.user.first_name, "NewName");
}

#[test]
fn empty_update_is_bad_request() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let err = users::update(&pool, "u1", UserUpdate::default(), BCRYPT_COST).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn update_unknown_user_is_not_found() {
    let (_tmp, pool) = test_pool();
    let err = users::update(
        &pool,
        "nobody",
        UserUpdate {
            first_name: Some("X".to_string()),
            ..Default::default()
        },
        BCRYPT_COST,
    )
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn update_password_rehashes() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    users::update(
        &pool,
        "u1",
        UserUpdate {
            password: Some("new-password".to_string()),
            ..Default::default()
        },
        BCRYPT_COST,
    )
    .unwrap();

    assert!(users::authenticate(&pool, "u1", "new-password").is_ok());
    assert!(users::authenticate(&pool, "u1", "password-u1").is_err());
}

#[test]
fn update_can_set_admin_flag() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let updated = users::update(
        &pool,
        "u1",
        UserUpdate {
            is_admin: Some(true),
            ..Default::default()
        },
        BCRYPT_COST,
    )
    .unwrap();
    assert!(updated.is_admin);
    assert_eq!(updated.first_name, "Test");
}

#[test]
fn remove_user_then_get_is_not_found() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    users::remove(&pool, "u2").unwrap();
    assert!(matches!(
        users::get(&pool, "u2").unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[test]
fn remove_unknown_user_is_not_found() {
    let (_tmp, pool) = test_pool();
    let err = users::remove(&pool, "nobody").unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// -- likes and invites --

#[test]
fn like_unknown_post_is_not_found() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let err = users::like_post(&pool, "u1", 999).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn like_by_unknown_user_is_not_found() {
    let (_tmp, pool) = test_pool();
    let (p1, _, _) = seed(&pool);

    let err = users::like_post(&pool, "nobody", p1).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn like_then_unlike_round_trip() {
    let (_tmp, pool) = test_pool();
    let (_, p2, _) = seed(&pool);

    users::like_post(&pool, "u1", p2).unwrap();
    assert_eq!(users::get(&pool, "u1").unwrap().liked_posts, vec![p2]);

    users::unlike_post(&pool, "u1", p2).unwrap();
    assert!(users::get(&pool, "u1").unwrap().liked_posts.is_empty());
}

#[test]
fn unlike_missing_relation_is_not_found() {
    let (_tmp, pool) = test_pool();
    let (_, p2, _) = seed(&pool);

    let err = users::unlike_post(&pool, "u1", p2).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn uninvite_missing_relation_is_not_found() {
    let (_tmp, pool) = test_pool();
    let (p1, _, _) = seed(&pool);

    let err = users::uninvite_post(&pool, "u2", p1).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// -- posts --

#[test]
fn create_post_generates_id_and_timestamp() {
    let (_tmp, pool) = test_pool();
    users::register(&pool, new_user("u1"), BCRYPT_COST).unwrap();

    let post = posts::create(
        &pool,
        NewPost {
            item_name: "crib".to_string(),
            username: "u1".to_string(),
            city: None,
            img_url: None,
            description: None,
            category: None,
            age_group: None,
        },
    )
    .unwrap();

    assert!(post.id > 0);
    // "YYYY-MM-DD HH:MM"
    assert_eq!(post.post_date.len(), 16);
    assert!(post.city.is_none());
    assert!(post.img_url.is_none());
    assert!(post.description.is_none());
    assert!(post.category.is_none());
    assert!(post.age_group.is_none());
}

#[test]
fn find_all_filters_by_item_name_case_insensitively() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let all = posts::find_all(&pool, None).unwrap();
    assert_eq!(all.len(), 2);

    let filtered = posts::find_all(&pool, Some("ITEM1")).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].item_name, "item1");

    let none = posts::find_all(&pool, Some("zzz")).unwrap();
    assert!(none.is_empty());
}

#[test]
fn get_post_includes_comments() {
    let (_tmp, pool) = test_pool();
    let (_, p2, comment_id) = seed(&pool);

    let detail = posts::get(&pool, p2).unwrap();
    assert_eq!(detail.post.item_name, "item2");
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].id, comment_id);
    assert_eq!(detail.comments[0].username, "u1");
    assert_eq!(detail.comments[0].text, "good");
}

#[test]
fn get_unknown_post_is_not_found() {
    let (_tmp, pool) = test_pool();
    let err = posts::get(&pool, 999).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn update_post_changes_only_supplied_fields() {
    let (_tmp, pool) = test_pool();
    let (p1, _, _) = seed(&pool);

    let updated = posts::update(
        &pool,
        p1,
        PostUpdate {
            city: Some("new-city".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.city.as_deref(), Some("new-city"));
    assert_eq!(updated.item_name, "item1");
    assert_eq!(updated.category.as_deref(), Some("toy"));
}

#[test]
fn empty_post_update_is_bad_request() {
    let (_tmp, pool) = test_pool();
    let (p1, _, _) = seed(&pool);

    let err = posts::update(&pool, p1, PostUpdate::default()).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn remove_post_cascades_to_relations() {
    let (_tmp, pool) = test_pool();
    let (p1, p2, comment_id) = seed(&pool);

    posts::remove(&pool, p2).unwrap();
    assert!(matches!(
        posts::get(&pool, p2).unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        posts::get_comment(&pool, comment_id).unwrap_err(),
        AppError::NotFound(_)
    ));
    // u1's invite on p2 is gone too
    assert!(users::get(&pool, "u1").unwrap().sent_invites.is_empty());

    posts::remove(&pool, p1).unwrap();
    assert!(users::get(&pool, "u2").unwrap().liked_posts.is_empty());
}

#[test]
fn remove_unknown_post_is_not_found() {
    let (_tmp, pool) = test_pool();
    let err = posts::remove(&pool, 999).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// -- comments --

#[test]
fn add_comment_to_unknown_post_is_not_found() {
    let (_tmp, pool) = test_pool();
    seed(&pool);

    let err = posts::add_comment(&pool, "u1", 999, "hello").unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn remove_comment_then_get_is_not_found() {
    let (_tmp, pool) = test_pool();
    let (_, _, comment_id) = seed(&pool);

    posts::remove_comment(&pool, comment_id).unwrap();
    assert!(matches!(
        posts::get_comment(&pool, comment_id).unwrap_err(),
        AppError::NotFound(_)
    ));
}
