mod output;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use murmur_core::snapshot::{sink_from_settings, JsonFileSink, SnapshotSink};
use murmur_core::{Database, Settings, SocialService};
use murmur_types::{FeedScope, Identity};

/// Murmur command-line client
///
/// Every command runs directly against the configured database. Commands
/// acting on behalf of a user log in with --user/--password first.
#[derive(Parser, Debug)]
#[command(name = "murmur", version)]
#[command(about = "Post, follow, like, reply and message from the terminal", long_about = None)]
struct Cli {
    /// Settings file to use instead of ./settings.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database file (overrides settings)
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Username to log in as
    #[arg(short, long, global = true, env = "MURMUR_USER")]
    user: Option<String>,

    /// Password for --user
    #[arg(short, long, global = true, env = "MURMUR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema, optionally with demo data
    Init {
        #[arg(long)]
        seed: bool,
    },
    /// Create a new account
    Register {
        #[arg(value_name = "USERNAME")]
        new_username: String,
        #[arg(value_name = "PASSWORD")]
        new_password: String,
    },
    /// Check credentials and show the resulting role
    Login,
    /// Publish a post
    Post { content: String },
    /// Show the feed, decorated with likes and replies
    Feed {
        /// Which posts to show: everyone or following
        #[arg(long, default_value = "everyone", value_parser = parse_scope)]
        scope: FeedScope,
    },
    /// Show a user's profile (your own by default)
    Profile { username: Option<String> },
    Follow { username: String },
    Unfollow { username: String },
    Like { post_id: i64 },
    Unlike { post_id: i64 },
    /// Reply to a post, optionally quoting another reply
    Reply {
        post_id: i64,
        content: String,
        #[arg(long)]
        parent: Option<i64>,
    },
    /// List the replies on a post
    Replies { post_id: i64 },
    DeletePost { post_id: i64 },
    DeleteReply { reply_id: i64 },
    /// Send a direct message
    Message { to: String, content: String },
    /// List your conversations with the total unread count
    Inbox,
    /// Show a conversation and mark it read
    Thread { with: String },
    /// Moderation commands (administrator login required)
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Users,
    Posts,
    DeleteUser { username: String },
    DeletePost { post_id: i64 },
    DeletedUsers,
    DeletedPosts,
    RecoverUser { username: String },
    RecoverPost { post_id: i64 },
    PurgeUser { username: String },
    PurgePost { post_id: i64 },
    /// Export every table to the configured snapshot destination
    Snapshot {
        /// Write to this JSON file instead of the configured destination
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_scope(s: &str) -> Result<FeedScope, String> {
    FeedScope::parse(s).ok_or_else(|| format!("unknown feed scope '{}' (use everyone or following)", s))
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(path) = &cli.database {
        settings.database.path = path.clone();
    }
    Ok(settings)
}

fn login(service: &SocialService, cli: &Cli) -> Result<Identity> {
    let username = cli
        .user
        .as_deref()
        .context("this command needs --user (or MURMUR_USER)")?;
    let password = cli
        .password
        .as_deref()
        .context("this command needs --password (or MURMUR_PASSWORD)")?;
    Ok(service.authenticate(username, password)?)
}

fn report(json: bool, done: bool, yes: &str, no: &str) -> Result<()> {
    let message = if done { yes } else { no };
    output::emit(json, &serde_json::json!({ "changed": done, "message": message }), |_| {
        println!("{}", message)
    })
}

fn run(cli: &Cli, settings: &Settings, service: &SocialService) -> Result<()> {
    let json = cli.json;

    match &cli.command {
        Command::Init { seed } => {
            if *seed {
                service
                    .database()
                    .seed_demo_data()
                    .context("Failed to seed demo data")?;
                tracing::info!("Demo data seeded");
            }
            println!("Database ready at {}", settings.database.path);
        }
        Command::Register {
            new_username,
            new_password,
        } => {
            let user = service.register(new_username, new_password)?;
            output::emit(json, &user, |u| println!("Welcome, @{}!", u.username))?;
        }
        Command::Login => {
            let identity = login(service, cli)?;
            output::emit(json, &identity, |i| {
                println!("Logged in as @{} ({})", i.username, i.role.as_str())
            })?;
        }
        Command::Post { content } => {
            let me = login(service, cli)?;
            let post = service.create_post(me.username(), content)?;
            output::emit(json, &post, |p| println!("{}", output::post_line(p)))?;
        }
        Command::Feed { scope } => {
            let me = login(service, cli)?;
            let items = service.feed(me.username(), *scope);
            output::emit(json, items.as_slice(), output::print_feed)?;
        }
        Command::Profile { username } => {
            let me = login(service, cli)?;
            let target = username.as_deref().unwrap_or(me.username());
            let profile = service
                .profile(me.username(), target)
                .with_context(|| format!("no user named '{}'", target))?;
            output::emit(json, &profile, output::print_profile)?;
        }
        Command::Follow { username } => {
            let me = login(service, cli)?;
            let created = service.follow(me.username(), username)?;
            report(
                json,
                created,
                &format!("Now following @{}", username),
                &format!("Already following @{}", username),
            )?;
        }
        Command::Unfollow { username } => {
            let me = login(service, cli)?;
            let removed = service.unfollow(me.username(), username)?;
            report(
                json,
                removed,
                &format!("Unfollowed @{}", username),
                &format!("You were not following @{}", username),
            )?;
        }
        Command::Like { post_id } => {
            let me = login(service, cli)?;
            let liked = service.like(*post_id, me.username())?;
            report(
                json,
                liked,
                &format!("Liked post #{} ({} likes)", post_id, service.like_count(*post_id)),
                &format!("You already liked post #{}", post_id),
            )?;
        }
        Command::Unlike { post_id } => {
            let me = login(service, cli)?;
            service.unlike(*post_id, me.username())?;
            report(json, true, &format!("Unliked post #{}", post_id), "")?;
        }
        Command::Reply {
            post_id,
            content,
            parent,
        } => {
            let me = login(service, cli)?;
            let reply = service.add_reply(*post_id, me.username(), content, *parent)?;
            output::emit(json, &reply, |r| println!("{}", output::reply_line(r)))?;
        }
        Command::Replies { post_id } => {
            let replies = service.list_replies(*post_id);
            output::emit(json, replies.as_slice(), output::print_replies)?;
        }
        Command::DeletePost { post_id } => {
            let me = login(service, cli)?;
            service.delete_post(*post_id, me.username())?;
            report(json, true, &format!("Deleted post #{}", post_id), "")?;
        }
        Command::DeleteReply { reply_id } => {
            let me = login(service, cli)?;
            service.delete_reply(*reply_id, me.username())?;
            report(json, true, &format!("Deleted reply #{}", reply_id), "")?;
        }
        Command::Message { to, content } => {
            let me = login(service, cli)?;
            let message = service.send_message(me.username(), to, content)?;
            output::emit(json, &message, |m| println!("Sent to @{}", m.receiver))?;
        }
        Command::Inbox => {
            let me = login(service, cli)?;
            let inbox = output::InboxView {
                unread: service.unread_count(me.username()),
                conversations: service.inbox(me.username()),
            };
            output::emit(json, &inbox, output::print_inbox)?;
        }
        Command::Thread { with } => {
            let me = login(service, cli)?;
            let messages = service.open_thread(me.username(), with);
            output::emit(json, messages.as_slice(), output::print_thread)?;
        }
        Command::Admin { command } => {
            let me = login(service, cli)?;
            run_admin(command, json, settings, service, &me)?;
        }
    }

    Ok(())
}

fn run_admin(
    command: &AdminCommand,
    json: bool,
    settings: &Settings,
    service: &SocialService,
    me: &Identity,
) -> Result<()> {
    let console = service.admin_console(me)?;

    match command {
        AdminCommand::Users => {
            let users = console.list_users();
            output::emit(json, users.as_slice(), output::print_users)?;
        }
        AdminCommand::Posts => {
            let posts = console.list_posts();
            output::emit(json, posts.as_slice(), output::print_posts)?;
        }
        AdminCommand::DeleteUser { username } => {
            let archived = console.delete_user(username)?;
            report(
                json,
                true,
                &format!("Deleted @{} and archived {} posts", username, archived),
                "",
            )?;
        }
        AdminCommand::DeletePost { post_id } => {
            console.delete_post(*post_id)?;
            report(json, true, &format!("Deleted post #{}", post_id), "")?;
        }
        AdminCommand::DeletedUsers => {
            let users = console.list_deleted_users();
            output::emit(json, users.as_slice(), output::print_deleted_users)?;
        }
        AdminCommand::DeletedPosts => {
            let posts = console.list_deleted_posts();
            output::emit(json, posts.as_slice(), output::print_deleted_posts)?;
        }
        AdminCommand::RecoverUser { username } => {
            let restored = console.recover_user(username)?;
            report(
                json,
                true,
                &format!("Recovered @{} with {} posts", username, restored),
                "",
            )?;
        }
        AdminCommand::RecoverPost { post_id } => {
            console.recover_post(*post_id)?;
            report(json, true, &format!("Recovered post #{}", post_id), "")?;
        }
        AdminCommand::PurgeUser { username } => {
            let purged = console.purge_user(username)?;
            report(
                json,
                purged,
                &format!("Permanently removed @{}", username),
                &format!("@{} is not in the deleted users list", username),
            )?;
        }
        AdminCommand::PurgePost { post_id } => {
            let purged = console.purge_post(*post_id)?;
            report(
                json,
                purged,
                &format!("Permanently removed post #{}", post_id),
                &format!("Post #{} is not in the deleted posts list", post_id),
            )?;
        }
        AdminCommand::Snapshot { output: path } => {
            let sink: Box<dyn SnapshotSink> = match path {
                Some(path) => Box::new(JsonFileSink::new(path)),
                None => sink_from_settings(&settings.snapshot)?.context(
                    "snapshot export is not configured: set snapshot.url or snapshot.path, or pass --output",
                )?,
            };
            let summary = console.export_snapshot(sink.as_ref())?;
            output::emit(json, &summary, output::print_snapshot)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    telemetry::init_tracing();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let db = Database::new(&settings.database.path)
        .with_context(|| format!("Failed to open database at {}", settings.database.path))?;
    db.initialize()?;
    let service = SocialService::with_database(db, settings.admin.clone());

    run(&cli, &settings, &service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reply_with_parent() {
        let cli = Cli::try_parse_from([
            "murmur", "--user", "dave", "--password", "pw", "reply", "3", "agreed", "--parent", "1",
        ])
        .unwrap();
        match cli.command {
            Command::Reply {
                post_id,
                content,
                parent,
            } => {
                assert_eq!(post_id, 3);
                assert_eq!(content, "agreed");
                assert_eq!(parent, Some(1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.user.as_deref(), Some("dave"));
    }

    #[test]
    fn test_parse_admin_snapshot() {
        let cli =
            Cli::try_parse_from(["murmur", "admin", "snapshot", "--output", "out.json", "--json"])
                .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Admin {
                command: AdminCommand::Snapshot { output },
            } => assert_eq!(output, Some(PathBuf::from("out.json"))),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_feed_scope() {
        let cli = Cli::try_parse_from(["murmur", "feed", "--scope", "following"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Feed {
                scope: FeedScope::Following
            }
        ));

        let cli = Cli::try_parse_from(["murmur", "feed"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Feed {
                scope: FeedScope::Everyone
            }
        ));

        assert!(Cli::try_parse_from(["murmur", "feed", "--scope", "friends"]).is_err());
    }

    #[test]
    fn test_commands_run_against_service() {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        let service = SocialService::with_database(db, None);
        let settings = Settings::for_database(":memory:");

        let cli = Cli::try_parse_from([
            "murmur", "--user", "alice", "--password", "alice-pass", "post", "from the cli",
        ])
        .unwrap();
        run(&cli, &settings, &service).unwrap();
        assert!(service
            .list_posts_by("alice")
            .iter()
            .any(|p| p.content == "from the cli"));

        service.send_message("bob", "alice", "ping").unwrap();
        let before = service.unread_count("alice");
        assert!(before >= 1);
        for args in [
            ["murmur", "--user", "alice", "--password", "alice-pass", "--json", "inbox"].as_slice(),
            ["murmur", "--user", "alice", "--password", "alice-pass", "thread", "bob"].as_slice(),
        ] {
            let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
            run(&cli, &settings, &service).unwrap();
        }
        assert!(service.unread_count("alice") < before);

        // No administrator configured, so moderation is refused
        let cli = Cli::try_parse_from([
            "murmur", "--user", "alice", "--password", "alice-pass", "admin", "users",
        ])
        .unwrap();
        assert!(run(&cli, &settings, &service).is_err());
    }
}
