//! User accounts and access levels.

use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table, including the password hash.
///
/// Never serialize this directly; convert to [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub access_code: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct UserProfile {
    #[serde(rename = "nombreUsuario")]
    pub username: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellidoPaterno")]
    pub paternal_surname: String,
    #[serde(rename = "apellidoMaterno")]
    pub maternal_surname: String,
    #[serde(rename = "acceso")]
    pub access_code: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            paternal_surname: user.paternal_surname.clone(),
            maternal_surname: user.maternal_surname.clone(),
            access_code: user.access_code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AccessLevel {
    #[serde(rename = "codigoAcceso")]
    pub code: String,
    #[serde(rename = "nombre")]
    pub name: String,
}

/// DTO for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub access_code: String,
}

/// DTO for updating a user; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub access_code: Option<String>,
}
