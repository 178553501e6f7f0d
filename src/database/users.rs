// src/database/users.rs
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{is_unique_violation, now};
use crate::auth;
use crate::config::BootstrapAdmin;
use crate::errors::{QuizError, Result};
use crate::models::{Role, User};

const USER_COLUMNS: &str = "id, name, email, mobile, password_hash, company, role, \
     first_login_required, access_flag, profile_image, last_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub company: String,
    pub role: Role,
    pub access_flag: bool,
    pub first_login_required: bool,
}

/// Fields an admin may change on a profile; `None` leaves the value alone.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub profile_image: Option<String>,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        mobile: row.try_get("mobile")?,
        password_hash: row.try_get("password_hash")?,
        company: row.try_get("company")?,
        role: role.parse()?,
        first_login_required: row.try_get("first_login_required")?,
        access_flag: row.try_get("access_flag")?,
        profile_image: row.try_get("profile_image")?,
        last_active: row.try_get("last_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Inserts a user, hashing the password. Emails are stored lower-case.
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
    let id = Uuid::new_v4().to_string();
    let stamp = now();
    let email = new_user.email.trim().to_lowercase();

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, name, email, mobile, password_hash, company, role,
                           first_login_required, access_flag, profile_image,
                           last_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, '', ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new_user.name.trim())
    .bind(&email)
    .bind(new_user.mobile.trim())
    .bind(auth::hash_password(&new_user.password)?)
    .bind(new_user.company.trim())
    .bind(new_user.role.as_str())
    .bind(new_user.first_login_required)
    .bind(new_user.access_flag)
    .bind(&stamp)
    .bind(&stamp)
    .bind(&stamp)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(QuizError::Conflict("Duplicate user".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| QuizError::NotFound("User not found".to_string()))
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

/// Case-insensitive lookup.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

/// Users with `role`, oldest first.
pub async fn list_by_role(pool: &SqlitePool, role: Role) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM users WHERE role = ? ORDER BY created_at ASC",
        USER_COLUMNS
    ))
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn set_password(
    pool: &SqlitePool,
    id: &str,
    new_password: &str,
    first_login_required: bool,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = ?, first_login_required = ?, updated_at = ? WHERE id = ?",
    )
    .bind(auth::hash_password(new_password)?)
    .bind(first_login_required)
    .bind(now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(QuizError::NotFound("User not found".to_string()));
    }
    Ok(())
}

pub async fn update_profile(pool: &SqlitePool, id: &str, update: &ProfileUpdate) -> Result<User> {
    let email = update.email.as_ref().map(|e| e.trim().to_lowercase());
    let result = sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            mobile = COALESCE(?, mobile),
            profile_image = COALESCE(?, profile_image),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.name)
    .bind(&email)
    .bind(&update.mobile)
    .bind(&update.profile_image)
    .bind(now())
    .bind(id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(QuizError::Conflict("Email is already in use".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| QuizError::NotFound("User not found".to_string()))
}

pub async fn touch_last_active(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE users SET last_active = ? WHERE id = ?")
        .bind(now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Creates the configured admin unless an account with that email exists.
/// Returns true when an account was created.
pub async fn ensure_admin(pool: &SqlitePool, admin: &BootstrapAdmin) -> Result<bool> {
    if find_by_email(pool, &admin.email).await?.is_some() {
        return Ok(false);
    }

    create_user(
        pool,
        &NewUser {
            name: admin.name.clone(),
            email: admin.email.clone(),
            mobile: String::new(),
            password: admin.password.clone(),
            company: String::new(),
            role: Role::Admin,
            access_flag: true,
            first_login_required: false,
        },
    )
    .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Asha Rao".to_string(),
            email: email.to_string(),
            mobile: "9876543210".to_string(),
            password: "AS3210".to_string(),
            company: "Acme".to_string(),
            role: Role::User,
            access_flag: true,
            first_login_required: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let pool = test_pool().await;
        let user = create_user(&pool, &new_user("Asha@Example.com")).await.unwrap();
        assert_eq!(user.email, "asha@example.com");
        assert!(auth::verify_password("AS3210", &user.password_hash));

        let found = find_by_email(&pool, "ASHA@example.COM").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(found.first_login_required);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = test_pool().await;
        create_user(&pool, &new_user("a@example.com")).await.unwrap();
        let err = create_user(&pool, &new_user("A@example.com")).await.unwrap_err();
        assert!(matches!(err, QuizError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_set_password_clears_first_login() {
        let pool = test_pool().await;
        let user = create_user(&pool, &new_user("b@example.com")).await.unwrap();
        set_password(&pool, &user.id, "n3w-secret", false).await.unwrap();

        let user = find_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert!(!user.first_login_required);
        assert!(auth::verify_password("n3w-secret", &user.password_hash));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_unset_fields() {
        let pool = test_pool().await;
        let user = create_user(&pool, &new_user("c@example.com")).await.unwrap();
        let updated = update_profile(
            &pool,
            &user.id,
            &ProfileUpdate {
                name: Some("Asha R.".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Asha R.");
        assert_eq!(updated.email, "c@example.com");
        assert_eq!(updated.mobile, "9876543210");
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let pool = test_pool().await;
        let admin = BootstrapAdmin {
            email: "admin@example.com".to_string(),
            password: "changeme".to_string(),
            name: "Admin".to_string(),
        };
        assert!(ensure_admin(&pool, &admin).await.unwrap());
        assert!(!ensure_admin(&pool, &admin).await.unwrap());
        assert_eq!(list_by_role(&pool, Role::Admin).await.unwrap().len(), 1);
        assert!(list_by_role(&pool, Role::User).await.unwrap().is_empty());
    }
}
