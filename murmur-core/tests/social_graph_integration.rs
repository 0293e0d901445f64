use anyhow::Result;

use murmur_core::config::AdminCredentials;
use murmur_core::{Database, SocialError, SocialService};
use murmur_types::FeedScope;

fn fresh_service() -> Result<SocialService> {
    let db = Database::in_memory()?;
    db.initialize()?;
    let admin = AdminCredentials {
        username: "root".to_string(),
        password: "hunter2".to_string(),
    };
    Ok(SocialService::with_database(db, Some(admin)))
}

fn service_with_users(names: &[&str]) -> Result<SocialService> {
    let service = fresh_service()?;
    for name in names {
        service.register(name, &format!("{}-pass", name))?;
    }
    Ok(service)
}

#[test]
fn test_register_twice_is_duplicate() -> Result<()> {
    let service = fresh_service()?;
    let user = service.register("alice", "secret")?;
    assert_eq!(user.username, "alice");

    let err = service.register("alice", "other").unwrap_err();
    assert_eq!(err, SocialError::DuplicateUsername("alice".to_string()));

    // The original password still works, the second one never took
    assert!(service.authenticate("alice", "secret").is_ok());
    assert!(matches!(
        service.authenticate("alice", "other"),
        Err(SocialError::InvalidCredentials)
    ));
    Ok(())
}

#[test]
fn test_followed_feed_scenario() -> Result<()> {
    let service = service_with_users(&["alice", "bob", "carol"])?;

    assert!(service.follow("alice", "bob")?);
    let post = service.create_post("bob", "hello")?;

    let alice_feed = service.list_followed_posts("alice");
    assert_eq!(alice_feed.len(), 1);
    assert_eq!(alice_feed[0].id, post.id);
    assert_eq!(alice_feed[0].content, "hello");

    assert!(service.list_followed_posts("carol").is_empty());
    assert!(service.list_followed_posts("bob").is_empty());

    let decorated = service.feed("alice", FeedScope::Following);
    assert_eq!(decorated.len(), 1);
    assert!(decorated[0].viewer_follows_author);
    Ok(())
}

#[test]
fn test_follower_sees_followed_author_post() -> Result<()> {
    let service = service_with_users(&["alice", "bob"])?;

    let post = service.create_post("alice", "hello world")?;
    assert!(service.follow("bob", "alice")?);

    let bob_feed = service.list_followed_posts("bob");
    assert_eq!(bob_feed.len(), 1);
    assert_eq!(bob_feed[0].username, "alice");
    assert_eq!(bob_feed[0].content, "hello world");
    assert_eq!(bob_feed[0], post);

    assert!(service.list_followed_posts("alice").is_empty());
    Ok(())
}

#[test]
fn test_registration_trims_fields() -> Result<()> {
    let service = fresh_service()?;
    assert!(matches!(
        service.register("alice", "   "),
        Err(SocialError::Validation(_))
    ));

    let user = service.register(" alice ", "pw")?;
    assert_eq!(user.username, "alice");
    assert!(matches!(
        service.register("alice ", "pw"),
        Err(SocialError::DuplicateUsername(_))
    ));
    assert!(service.authenticate(" alice", "pw ").is_ok());
    Ok(())
}

#[test]
fn test_feeds_are_newest_first() -> Result<()> {
    let service = service_with_users(&["alice", "bob"])?;
    service.follow("alice", "bob")?;
    let first = service.create_post("bob", "first")?;
    let second = service.create_post("bob", "second")?;
    let third = service.create_post("alice", "third")?;

    let all: Vec<i64> = service.list_all_posts().iter().map(|p| p.id).collect();
    assert_eq!(all, vec![third.id, second.id, first.id]);

    let followed: Vec<i64> = service.list_followed_posts("alice").iter().map(|p| p.id).collect();
    assert_eq!(followed, vec![second.id, first.id]);
    Ok(())
}

#[test]
fn test_follow_twice_keeps_one_edge() -> Result<()> {
    let service = service_with_users(&["alice", "bob"])?;

    assert!(service.follow("alice", "bob")?);
    assert!(!service.follow("alice", "bob")?);
    assert_eq!(service.list_followers("bob"), vec!["alice".to_string()]);
    assert_eq!(service.list_following("alice"), vec!["bob".to_string()]);

    assert!(service.unfollow("alice", "bob")?);
    assert!(!service.unfollow("alice", "bob")?);
    assert!(!service.is_following("alice", "bob"));
    Ok(())
}

#[test]
fn test_follow_unknown_user() -> Result<()> {
    let service = service_with_users(&["alice"])?;
    assert!(matches!(
        service.follow("alice", "ghost"),
        Err(SocialError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn test_like_unlike_counts() -> Result<()> {
    let service = service_with_users(&["alice", "bob"])?;
    let post = service.create_post("alice", "like me")?;
    let before = service.like_count(post.id);

    assert!(service.like(post.id, "bob")?);
    assert!(!service.like(post.id, "bob")?);
    assert_eq!(service.like_count(post.id), before + 1);

    service.unlike(post.id, "bob")?;
    assert_eq!(service.like_count(post.id), before);
    Ok(())
}

#[test]
fn test_forbidden_delete_leaves_post_active() -> Result<()> {
    let service = service_with_users(&["alice", "bob"])?;
    let post = service.create_post("alice", "mine")?;

    assert!(matches!(
        service.delete_post(post.id, "bob"),
        Err(SocialError::Forbidden(_))
    ));
    assert_eq!(service.list_all_posts().len(), 1);

    // Nothing reached the archive either
    let admin = service.authenticate("root", "hunter2")?;
    assert!(service.admin_console(&admin)?.list_deleted_posts().is_empty());

    service.delete_post(post.id, "alice")?;
    assert!(service.list_all_posts().is_empty());
    assert!(matches!(
        service.delete_post(post.id, "alice"),
        Err(SocialError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn test_threaded_reply_scenario() -> Result<()> {
    let service = service_with_users(&["alice", "carol", "dave"])?;
    let post = service.create_post("alice", "what do you think?")?;

    let r1 = service.add_reply(post.id, "carol", "nice!", None)?;
    let r2 = service.add_reply(post.id, "dave", "agreed", Some(r1.id))?;

    let replies = service.list_replies(post.id);
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].id, r1.id);
    assert_eq!(replies[0].parent_username, "");
    assert_eq!(replies[1].id, r2.id);
    assert_eq!(replies[1].parent_username, "carol");

    assert!(matches!(
        service.add_reply(post.id, "dave", "  ", None),
        Err(SocialError::Validation(_))
    ));
    Ok(())
}

#[test]
fn test_reply_parent_on_other_post_rejected() -> Result<()> {
    let service = service_with_users(&["alice", "carol"])?;
    let first = service.create_post("alice", "first")?;
    let second = service.create_post("alice", "second")?;
    let elsewhere = service.add_reply(second.id, "carol", "on the second", None)?;

    assert!(matches!(
        service.add_reply(first.id, "carol", "misplaced", Some(elsewhere.id)),
        Err(SocialError::Validation(_))
    ));
    assert!(service.list_replies(first.id).is_empty());
    Ok(())
}

#[test]
fn test_message_inbox_scenario() -> Result<()> {
    let service = service_with_users(&["alice", "bob"])?;
    let message = service.send_message("alice", "bob", "hi")?;
    assert!(!message.is_read);

    let inbox = service.list_conversations_for("bob");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].other_user, "alice");
    assert_eq!(inbox[0].last_message, "hi");
    assert!(inbox[0].unread_count >= 1);

    let thread = service.list_conversation("bob", "alice");
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].sender, "alice");

    assert_eq!(service.mark_conversation_read("bob", "alice")?, 1);
    assert_eq!(service.list_conversations_for("bob")[0].unread_count, 0);
    Ok(())
}

#[test]
fn test_message_to_unknown_receiver() -> Result<()> {
    let service = service_with_users(&["alice"])?;
    assert!(matches!(
        service.send_message("alice", "ghost", "anyone?"),
        Err(SocialError::NotFound(_))
    ));
    assert!(service.list_conversations_for("alice").is_empty());
    Ok(())
}

#[test]
fn test_file_backed_database_persists() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("murmur.db");
    let settings = murmur_core::Settings::for_database(path.to_string_lossy());

    {
        let service = SocialService::new(&settings)?;
        service.register("alice", "pw")?;
        service.create_post("alice", "still here")?;
    }

    let reopened = SocialService::new(&settings)?;
    let posts = reopened.list_all_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content, "still here");
    Ok(())
}
