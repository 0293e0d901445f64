use murmur_types::{DeletedPost, DeletedUser, Identity, Post, User};

use crate::error::SocialResult;
use crate::service::SocialService;
use crate::snapshot::{Snapshot, SnapshotSink, SnapshotSummary};

/// Moderation console bound to an administrator identity
///
/// Only obtainable through [`SocialService::admin_console`], which admits
/// nothing but the configured administrator. Lifecycle of a user or post:
/// active -> archived (delete) -> active (recover) or gone (purge).
pub struct AdminConsole<'a> {
    service: &'a SocialService,
    admin: Identity,
}

impl<'a> AdminConsole<'a> {
    pub(crate) fn new(service: &'a SocialService, admin: Identity) -> Self {
        Self { service, admin }
    }

    pub fn list_users(&self) -> Vec<User> {
        self.service.users.list_all().unwrap_or_else(|e| {
            tracing::warn!("list_users failed, returning empty result: {}", e);
            Vec::new()
        })
    }

    pub fn list_posts(&self) -> Vec<Post> {
        self.service.list_all_posts()
    }

    /// Archive a user with their posts and remove their graph edges and
    /// messages. Returns the number of posts archived.
    pub fn delete_user(&self, username: &str) -> SocialResult<usize> {
        let archived = self.service.moderation.delete_user(username)?;
        tracing::info!(
            "Admin {} deleted user {} ({} posts archived)",
            self.admin.username,
            username,
            archived
        );
        Ok(archived)
    }

    pub fn delete_post(&self, post_id: i64) -> SocialResult<()> {
        self.service.moderation.delete_post(post_id)?;
        tracing::info!("Admin {} deleted post {}", self.admin.username, post_id);
        Ok(())
    }

    pub fn list_deleted_users(&self) -> Vec<DeletedUser> {
        self.service.moderation.list_deleted_users().unwrap_or_else(|e| {
            tracing::warn!("list_deleted_users failed, returning empty result: {}", e);
            Vec::new()
        })
    }

    pub fn list_deleted_posts(&self) -> Vec<DeletedPost> {
        self.service.moderation.list_deleted_posts().unwrap_or_else(|e| {
            tracing::warn!("list_deleted_posts failed, returning empty result: {}", e);
            Vec::new()
        })
    }

    /// Restore an archived user and their archived posts. Follows, likes and
    /// messages removed at deletion stay gone.
    pub fn recover_user(&self, username: &str) -> SocialResult<usize> {
        let restored = self.service.moderation.recover_user(username)?;
        tracing::info!(
            "Admin {} recovered user {} ({} posts restored)",
            self.admin.username,
            username,
            restored
        );
        Ok(restored)
    }

    pub fn recover_post(&self, post_id: i64) -> SocialResult<()> {
        self.service.moderation.recover_post(post_id)?;
        tracing::info!("Admin {} recovered post {}", self.admin.username, post_id);
        Ok(())
    }

    pub fn purge_user(&self, username: &str) -> SocialResult<bool> {
        let purged = self.service.moderation.purge_user(username)?;
        if purged {
            tracing::info!("Admin {} purged user {}", self.admin.username, username);
        } else {
            tracing::debug!("No archived user {} to purge", username);
        }
        Ok(purged)
    }

    pub fn purge_post(&self, post_id: i64) -> SocialResult<bool> {
        let purged = self.service.moderation.purge_post(post_id)?;
        if purged {
            tracing::info!("Admin {} purged post {}", self.admin.username, post_id);
        } else {
            tracing::debug!("No archived post {} to purge", post_id);
        }
        Ok(purged)
    }

    /// Dump every table and hand the document to `sink`
    pub fn export_snapshot(&self, sink: &dyn SnapshotSink) -> anyhow::Result<SnapshotSummary> {
        let snapshot = Snapshot::collect(&self.service.database().pool)?;
        sink.write(&snapshot)?;

        let summary = snapshot.summary(sink.describe());
        tracing::info!(
            "Admin {} exported snapshot {} to {}",
            self.admin.username,
            summary.export_id,
            summary.destination
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AdminCredentials;
    use crate::db::Database;
    use crate::error::SocialError;
    use crate::service::SocialService;
    use crate::snapshot::JsonFileSink;
    use murmur_types::Identity;

    fn service() -> SocialService {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        let admin = AdminCredentials {
            username: "root".to_string(),
            password: "hunter2".to_string(),
        };
        SocialService::with_database(db, Some(admin))
    }

    fn root(service: &SocialService) -> Identity {
        service.authenticate("root", "hunter2").unwrap()
    }

    #[test]
    fn test_delete_and_recover_user() {
        let service = service();
        let admin = root(&service);
        let console = service.admin_console(&admin).unwrap();
        let posts_before = service.list_posts_by("bob");

        console.delete_user("bob").unwrap();
        assert!(console.list_users().iter().all(|u| u.username != "bob"));
        assert!(service.list_posts_by("bob").is_empty());
        assert_eq!(console.list_deleted_users()[0].username, "bob");

        assert_eq!(console.recover_user("bob").unwrap(), posts_before.len());
        assert_eq!(service.list_posts_by("bob"), posts_before);
        assert!(console.list_deleted_users().is_empty());
    }

    #[test]
    fn test_admin_delete_ignores_ownership() {
        let service = service();
        let admin = root(&service);
        let console = service.admin_console(&admin).unwrap();
        let post = service.create_post("alice", "to be moderated").unwrap();

        console.delete_post(post.id).unwrap();
        assert_eq!(console.list_deleted_posts()[0].id, post.id);
        assert!(console.purge_post(post.id).unwrap());
        assert!(matches!(console.recover_post(post.id), Err(SocialError::NotFound(_))));
    }

    #[test]
    fn test_export_snapshot_to_file() {
        let service = service();
        let admin = root(&service);
        let console = service.admin_console(&admin).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("snapshot.json"));

        let summary = console.export_snapshot(&sink).unwrap();
        assert_eq!(summary.rows_per_table.len(), 9);
        assert_eq!(summary.rows_per_table["users"], 4);
        assert!(dir.path().join("snapshot.json").exists());
    }
}
