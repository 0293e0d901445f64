/// SQL schema for the Murmur database
/// Creates all tables, the server-side helper views, and the trigger that
/// maintains conversation aggregates
pub const SCHEMA: &str = r#"
-- Users table (username is the natural key)
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    password TEXT NOT NULL,
    joined_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- Posts table; AUTOINCREMENT keeps archived ids from being reused
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    content TEXT NOT NULL CHECK(length(trim(content)) > 0),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    FOREIGN KEY (username) REFERENCES users(username)
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_username ON posts(username);

-- Follows table (directed edges)
CREATE TABLE IF NOT EXISTS follows (
    follower_username TEXT NOT NULL,
    following_username TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    PRIMARY KEY (follower_username, following_username),
    FOREIGN KEY (follower_username) REFERENCES users(username),
    FOREIGN KEY (following_username) REFERENCES users(username)
);

CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_username);

-- Likes table
CREATE TABLE IF NOT EXISTS likes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    username TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    UNIQUE (post_id, username),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (username) REFERENCES users(username) ON DELETE CASCADE
);

-- Replies table; parent_reply_id has no foreign key, children of a deleted
-- reply keep the stale id
CREATE TABLE IF NOT EXISTS replies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    username TEXT NOT NULL,
    content TEXT NOT NULL CHECK(length(trim(content)) > 0),
    parent_reply_id INTEGER,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (username) REFERENCES users(username) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_replies_post_id ON replies(post_id);

-- Direct messages table
CREATE TABLE IF NOT EXISTS direct_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_username TEXT NOT NULL,
    receiver_username TEXT NOT NULL,
    content TEXT NOT NULL CHECK(length(trim(content)) > 0),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    is_read INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (sender_username) REFERENCES users(username),
    FOREIGN KEY (receiver_username) REFERENCES users(username)
);

CREATE INDEX IF NOT EXISTS idx_dms_sender ON direct_messages(sender_username);
CREATE INDEX IF NOT EXISTS idx_dms_receiver ON direct_messages(receiver_username);

-- Conversations keyed by the unordered participant pair, stored as (min, max)
CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user1_username TEXT NOT NULL,
    user2_username TEXT NOT NULL,
    last_message_at TEXT NOT NULL,
    UNIQUE (user1_username, user2_username),
    CHECK (user1_username <= user2_username)
);

-- Archive of soft-deleted users
CREATE TABLE IF NOT EXISTS recently_deleted_users (
    username TEXT PRIMARY KEY,
    password TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    deleted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- Archive of soft-deleted posts (original ids and timestamps preserved)
CREATE TABLE IF NOT EXISTS recently_deleted_posts (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_deleted_posts_username ON recently_deleted_posts(username);

-- ============================================================================
-- SERVER-SIDE HELPERS
-- ============================================================================

-- Posts visible in each follower's followed feed
CREATE VIEW IF NOT EXISTS followed_posts AS
    SELECT f.follower_username AS viewer, p.id, p.username, p.content, p.created_at
    FROM follows f
    JOIN posts p ON p.username = f.following_username;

-- One row per (owner, correspondent) with the latest message and unread count
CREATE VIEW IF NOT EXISTS conversation_summaries AS
    SELECT
        pair.owner,
        pair.other_user,
        pair.last_message_at,
        (SELECT m.content
           FROM direct_messages m
          WHERE (m.sender_username = pair.owner AND m.receiver_username = pair.other_user)
             OR (m.sender_username = pair.other_user AND m.receiver_username = pair.owner)
          ORDER BY m.created_at DESC, m.id DESC
          LIMIT 1) AS last_message,
        (SELECT COUNT(*)
           FROM direct_messages m
          WHERE m.sender_username = pair.other_user
            AND m.receiver_username = pair.owner
            AND m.is_read = 0) AS unread_count
    FROM (
        SELECT user1_username AS owner, user2_username AS other_user, last_message_at
        FROM conversations
        UNION ALL
        SELECT user2_username AS owner, user1_username AS other_user, last_message_at
        FROM conversations
        WHERE user1_username <> user2_username
    ) AS pair;

-- Sending a message creates or refreshes the conversation aggregate
CREATE TRIGGER IF NOT EXISTS trg_direct_messages_conversation
AFTER INSERT ON direct_messages
BEGIN
    INSERT OR IGNORE INTO conversations (user1_username, user2_username, last_message_at)
    VALUES (
        min(NEW.sender_username, NEW.receiver_username),
        max(NEW.sender_username, NEW.receiver_username),
        NEW.created_at
    );
    UPDATE conversations
       SET last_message_at = NEW.created_at
     WHERE user1_username = min(NEW.sender_username, NEW.receiver_username)
       AND user2_username = max(NEW.sender_username, NEW.receiver_username);
END;
"#;

/// Demo data for local development
/// - 4 users (alice, bob, carol, dave)
/// - A handful of posts, follows, likes, and a threaded reply chain
/// - One direct message conversation with an unread message
pub const DEMO_DATA: &str = r#"
-- ============================================================================
-- DEMO USERS
-- ============================================================================
INSERT OR IGNORE INTO users (username, password, joined_at) VALUES
    ('alice', 'alice-pass', '2024-01-01T09:00:00.000Z'),
    ('bob', 'bob-pass', '2024-01-02T09:00:00.000Z'),
    ('carol', 'carol-pass', '2024-01-03T09:00:00.000Z'),
    ('dave', 'dave-pass', '2024-01-04T09:00:00.000Z');

-- ============================================================================
-- DEMO POSTS
-- ============================================================================
INSERT OR IGNORE INTO posts (id, username, content, created_at) VALUES
    (1, 'alice', 'hello world', '2024-01-05T10:00:00.000Z'),
    (2, 'bob', 'Just set up my desk, finally', '2024-01-05T11:30:00.000Z'),
    (3, 'carol', 'Anyone reading anything good lately?', '2024-01-06T08:15:00.000Z'),
    (4, 'alice', 'Coffee first, opinions later', '2024-01-06T09:45:00.000Z');

-- ============================================================================
-- DEMO GRAPH AND ENGAGEMENT
-- ============================================================================
INSERT OR IGNORE INTO follows (follower_username, following_username, created_at) VALUES
    ('bob', 'alice', '2024-01-05T12:00:00.000Z'),
    ('carol', 'alice', '2024-01-05T12:05:00.000Z'),
    ('alice', 'carol', '2024-01-06T08:30:00.000Z'),
    ('dave', 'bob', '2024-01-06T09:00:00.000Z');

INSERT OR IGNORE INTO likes (post_id, username, created_at) VALUES
    (1, 'bob', '2024-01-05T12:01:00.000Z'),
    (1, 'carol', '2024-01-05T12:06:00.000Z'),
    (3, 'alice', '2024-01-06T08:31:00.000Z');

INSERT OR IGNORE INTO replies (id, post_id, username, content, parent_reply_id, created_at) VALUES
    (1, 3, 'carol', 'nice!', NULL, '2024-01-06T08:20:00.000Z'),
    (2, 3, 'dave', 'agreed', 1, '2024-01-06T08:40:00.000Z');

-- ============================================================================
-- DEMO MESSAGES (conversation rows come from the trigger)
-- ============================================================================
INSERT OR IGNORE INTO direct_messages (id, sender_username, receiver_username, content, created_at, is_read) VALUES
    (1, 'alice', 'bob', 'hi', '2024-01-06T10:00:00.000Z', 1),
    (2, 'bob', 'alice', 'hey alice, welcome!', '2024-01-06T10:02:00.000Z', 0);
"#;
