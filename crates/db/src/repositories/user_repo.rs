//! Repository for `users` and `access_levels`.

use almacen_core::error::CoreError;
use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::models::user::{AccessLevel, NewUser, User, UserChanges, UserProfile};
use crate::repositories::MySqlStore;
use crate::store::UserStore;
use crate::StoreResult;

const COLUMNS: &str = "\
    username, password_hash, first_name, paternal_surname, maternal_surname, access_code";

const PROFILE_COLUMNS: &str = "\
    username, first_name, paternal_surname, maternal_surname, access_code";

pub struct UserRepo;

impl UserRepo {
    pub async fn find(pool: &MySqlPool, username: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = ?");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &MySqlPool) -> Result<Vec<UserProfile>, sqlx::Error> {
        let query = format!(
            "SELECT {PROFILE_COLUMNS} FROM users ORDER BY first_name, paternal_surname"
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn insert(pool: &MySqlPool, input: &NewUser) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users \
                (username, password_hash, first_name, paternal_surname, maternal_surname, access_code) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(&input.first_name)
        .bind(&input.paternal_surname)
        .bind(&input.maternal_surname)
        .bind(&input.access_code)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// `None` fields keep their stored value.
    pub async fn update(
        pool: &MySqlPool,
        username: &str,
        changes: &UserChanges,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET \
                password_hash = COALESCE(?, password_hash), \
                first_name = COALESCE(?, first_name), \
                paternal_surname = COALESCE(?, paternal_surname), \
                maternal_surname = COALESCE(?, maternal_surname), \
                access_code = COALESCE(?, access_code) \
             WHERE username = ?",
        )
        .bind(&changes.password_hash)
        .bind(&changes.first_name)
        .bind(&changes.paternal_surname)
        .bind(&changes.maternal_surname)
        .bind(&changes.access_code)
        .bind(username)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &MySqlPool, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_access_levels(pool: &MySqlPool) -> Result<Vec<AccessLevel>, sqlx::Error> {
        sqlx::query_as::<_, AccessLevel>("SELECT code, name FROM access_levels ORDER BY code")
            .fetch_all(pool)
            .await
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find(self.pool(), username).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<UserProfile>> {
        Ok(UserRepo::list(self.pool()).await?)
    }

    async fn create_user(&self, input: NewUser) -> StoreResult<UserProfile> {
        if UserRepo::find(self.pool(), &input.username).await?.is_some() {
            return Err(CoreError::Conflict(format!(
                "User {} already exists",
                input.username
            ))
            .into());
        }
        UserRepo::insert(self.pool(), &input).await?;
        Ok(UserProfile {
            username: input.username,
            first_name: input.first_name,
            paternal_surname: input.paternal_surname,
            maternal_surname: input.maternal_surname,
            access_code: input.access_code,
        })
    }

    async fn update_user(&self, username: &str, changes: UserChanges) -> StoreResult<UserProfile> {
        if UserRepo::find(self.pool(), username).await?.is_none() {
            return Err(CoreError::not_found("Usuario", username).into());
        }
        UserRepo::update(self.pool(), username, &changes).await?;
        let user = UserRepo::find(self.pool(), username)
            .await?
            .ok_or_else(|| CoreError::not_found("Usuario", username))?;
        Ok(UserProfile::from(&user))
    }

    async fn delete_user(&self, username: &str) -> StoreResult<()> {
        if !UserRepo::delete(self.pool(), username).await? {
            return Err(CoreError::not_found("Usuario", username).into());
        }
        Ok(())
    }

    async fn list_access_levels(&self) -> StoreResult<Vec<AccessLevel>> {
        Ok(UserRepo::list_access_levels(self.pool()).await?)
    }
}
