use crate::auth::repo_types::{Role, User, UserRow};
use crate::error::StoreError;
use sqlx::{Executor, Sqlite, SqlitePool};

impl User {
    /// Find a user by (normalized) email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, is_doctor
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(row.map(User::from))
    }

    /// Load a user by id, `NotFound` when absent.
    pub async fn get_by_id<'e, E>(db: E, id: i64) -> Result<User, StoreError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, is_doctor
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        row.map(User::from).ok_or(StoreError::NotFound)
    }

    /// Create a new user with an already hashed password.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash, is_doctor)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, email, password_hash, is_doctor
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role.is_doctor())
        .fetch_one(db)
        .await
        .map_err(StoreError::from_insert)?;
        Ok(row.into())
    }

    pub async fn list_doctors(db: &SqlitePool) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, is_doctor
            FROM users
            WHERE is_doctor = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn create_then_find_by_email_and_id() {
        let db = db::in_memory().await;
        let created = User::create(&db, "Dr. Who", "who@clinic.test", "hash", Role::Doctor)
            .await
            .expect("create");
        assert_eq!(created.role, Role::Doctor);

        let by_email = User::find_by_email(&db, "who@clinic.test")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.username, "Dr. Who");

        let by_id = User::get_by_id(&db, created.id).await.expect("present");
        assert_eq!(by_id.email, "who@clinic.test");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_uniqueness_error() {
        let db = db::in_memory().await;
        User::create(&db, "a", "same@clinic.test", "h1", Role::Patient)
            .await
            .expect("first insert");
        let err = User::create(&db, "b", "same@clinic.test", "h2", Role::Doctor)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Uniqueness));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&db)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn missing_id_is_not_found() {
        let db = db::in_memory().await;
        let err = User::get_by_id(&db, 42).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn list_doctors_skips_patients() {
        let db = db::in_memory().await;
        User::create(&db, "pat", "pat@clinic.test", "h", Role::Patient).await.unwrap();
        User::create(&db, "doc1", "doc1@clinic.test", "h", Role::Doctor).await.unwrap();
        User::create(&db, "doc2", "doc2@clinic.test", "h", Role::Doctor).await.unwrap();

        let doctors = User::list_doctors(&db).await.expect("list");
        let names: Vec<_> = doctors.iter().map(|d| d.username.as_str()).collect();
        assert_eq!(names, ["doc1", "doc2"]);
    }
}
