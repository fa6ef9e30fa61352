pub mod models;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

/// Returned by `create_user` when the insert hits the username unique
/// constraint; callers downcast it to report a field error.
#[derive(Debug, thiserror::Error)]
#[error("username already taken")]
pub struct UsernameTaken;

/// Persistence operations as the handlers see them. Object-safe so tests can
/// substitute an in-memory store.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> anyhow::Result<models::User>;
    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<models::User>>;
    async fn get_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<models::User>>;

    async fn create_chat(&self, user_id: Uuid, title: Option<&str>)
        -> anyhow::Result<models::Chat>;
    async fn list_chats(&self, user_id: Uuid) -> anyhow::Result<Vec<models::Chat>>;
    async fn get_chat(&self, chat_id: Uuid, user_id: Uuid)
        -> anyhow::Result<Option<models::Chat>>;
    async fn delete_chat(&self, chat_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    async fn update_chat_title(&self, chat_id: Uuid, title: &str) -> anyhow::Result<()>;

    async fn save_message(
        &self,
        chat_id: Uuid,
        role: &str,
        content: &str,
    ) -> anyhow::Result<models::Message>;
    async fn get_messages(&self, chat_id: Uuid) -> anyhow::Result<Vec<models::Message>>;
    async fn count_messages(&self, chat_id: Uuid) -> anyhow::Result<i64>;
    async fn last_message(&self, chat_id: Uuid) -> anyhow::Result<Option<models::Message>>;
    async fn delete_last_assistant_message(&self, chat_id: Uuid) -> anyhow::Result<Option<Uuid>>;

    async fn get_or_create_settings(&self, user_id: Uuid)
        -> anyhow::Result<models::UserSettings>;
    async fn update_theme(
        &self,
        user_id: Uuid,
        theme: &str,
    ) -> anyhow::Result<models::UserSettings>;
}

#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // Each CREATE TABLE must be a separate query (Postgres doesn't allow
        // multiple commands in a single prepared statement).

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL DEFAULT '',
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS chats (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL DEFAULT 'New Chat',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS messages (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                chat_id UUID NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS user_settings (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                theme TEXT NOT NULL DEFAULT 'light',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chats_user ON chats(user_id, updated_at DESC)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ChatStore for Database {
    // ── User Operations ────────────────────────────────────────────

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> anyhow::Result<models::User> {
        let result = sqlx::query_as::<_, models::User>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(anyhow::Error::new(UsernameTaken))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<models::User>> {
        let user = sqlx::query_as::<_, models::User>(
            "SELECT * FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<models::User>> {
        let user = sqlx::query_as::<_, models::User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // ── Chat Operations ────────────────────────────────────────────

    async fn create_chat(
        &self,
        user_id: Uuid,
        title: Option<&str>,
    ) -> anyhow::Result<models::Chat> {
        let chat = match title {
            Some(t) => {
                sqlx::query_as::<_, models::Chat>(
                    "INSERT INTO chats (user_id, title) VALUES ($1, $2) RETURNING *",
                )
                .bind(user_id)
                .bind(t)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, models::Chat>(
                    "INSERT INTO chats (user_id) VALUES ($1) RETURNING *",
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(chat)
    }

    async fn list_chats(&self, user_id: Uuid) -> anyhow::Result<Vec<models::Chat>> {
        let chats = sqlx::query_as::<_, models::Chat>(
            "SELECT * FROM chats WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(chats)
    }

    /// Fetch a chat only if it belongs to the given user.
    async fn get_chat(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<models::Chat>> {
        let chat = sqlx::query_as::<_, models::Chat>(
            "SELECT * FROM chats WHERE id = $1 AND user_id = $2",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(chat)
    }

    async fn delete_chat(&self, chat_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_chat_title(&self, chat_id: Uuid, title: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE chats SET title = $2, updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ── Message Operations ─────────────────────────────────────────

    async fn save_message(
        &self,
        chat_id: Uuid,
        role: &str,
        content: &str,
    ) -> anyhow::Result<models::Message> {
        let msg = sqlx::query_as::<_, models::Message>(
            r#"
            INSERT INTO messages (chat_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(chat_id)
        .bind(role)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        // Touch the chat's updated_at
        sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(msg)
    }

    async fn get_messages(&self, chat_id: Uuid) -> anyhow::Result<Vec<models::Message>> {
        let msgs = sqlx::query_as::<_, models::Message>(
            "SELECT * FROM messages WHERE chat_id = $1 ORDER BY created_at ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(msgs)
    }

    async fn count_messages(&self, chat_id: Uuid) -> anyhow::Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE chat_id = $1")
                .bind(chat_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    async fn last_message(&self, chat_id: Uuid) -> anyhow::Result<Option<models::Message>> {
        let msg = sqlx::query_as::<_, models::Message>(
            "SELECT * FROM messages WHERE chat_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(msg)
    }

    /// Delete the newest assistant message in the chat, returning its id.
    async fn delete_last_assistant_message(&self, chat_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            DELETE FROM messages
            WHERE id = (
                SELECT id FROM messages
                WHERE chat_id = $1 AND role = $2
                ORDER BY created_at DESC
                LIMIT 1
            )
            RETURNING id
            "#,
        )
        .bind(chat_id)
        .bind(models::ROLE_ASSISTANT)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
                .bind(chat_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(row.map(|r| r.0))
    }

    // ── Settings Operations ────────────────────────────────────────

    /// Get the user's settings row, creating a default one on first access.
    async fn get_or_create_settings(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<models::UserSettings> {
        let settings = sqlx::query_as::<_, models::UserSettings>(
            r#"
            INSERT INTO user_settings (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = user_settings.user_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn update_theme(
        &self,
        user_id: Uuid,
        theme: &str,
    ) -> anyhow::Result<models::UserSettings> {
        let settings = sqlx::query_as::<_, models::UserSettings>(
            r#"
            INSERT INTO user_settings (user_id, theme)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET theme = $2, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(theme)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }
}
