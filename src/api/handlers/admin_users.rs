// src/api/handlers/admin_users.rs
//! Bulk user import and the participant list.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, Result, web};
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::api::AppState;
use crate::api::auth::AdminUser;
use crate::api::multipart;
use crate::auth::temporary_password;
use crate::database::users::{self, NewUser};
use crate::errors::{self, QuizError};
use crate::models::Role;
use crate::roster::{self, ImportRow, RosterFormat};

const MAX_ROSTER_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, PartialEq)]
pub struct ImportIssue {
    pub email: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub success: usize,
    pub failure: usize,
    pub duplicates: usize,
    pub details: Vec<ImportIssue>,
}

fn cell(value: &Option<Value>) -> Option<String> {
    let text = match value.as_ref()? {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    Some(text).filter(|s| !s.is_empty())
}

/// Creates an account per row with a temporary password and the
/// first-login flag set. Rows missing a name, email or mobile fail; existing
/// emails count as duplicates. `AccessFlag` disables the account only when it
/// reads `false`.
pub async fn import_users(pool: &SqlitePool, rows: &[ImportRow]) -> errors::Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for row in rows {
        let (Some(name), Some(email), Some(mobile)) =
            (cell(&row.name), cell(&row.email), cell(&row.mobile))
        else {
            summary.failure += 1;
            summary.details.push(ImportIssue {
                email: cell(&row.email).unwrap_or_else(|| "Unknown".to_string()),
                error: "Missing mandatory fields".to_string(),
            });
            continue;
        };

        match users::find_by_email(pool, &email).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                summary.duplicates += 1;
                summary.details.push(ImportIssue {
                    email,
                    error: "Duplicate user".to_string(),
                });
                continue;
            }
            Err(e) => {
                log::warn!("User import: lookup for {} failed: {}", email, e);
                summary.failure += 1;
                summary.details.push(ImportIssue {
                    email,
                    error: e.to_string(),
                });
                continue;
            }
        }

        let new_user = NewUser {
            password: temporary_password(&name, &mobile),
            name,
            email: email.clone(),
            mobile,
            company: cell(&row.company).unwrap_or_default(),
            role: Role::User,
            access_flag: !cell(&row.access_flag).is_some_and(|f| f.eq_ignore_ascii_case("false")),
            first_login_required: true,
        };

        match users::create_user(pool, &new_user).await {
            Ok(_) => summary.success += 1,
            Err(QuizError::Conflict(_)) => {
                summary.duplicates += 1;
                summary.details.push(ImportIssue {
                    email,
                    error: "Duplicate user".to_string(),
                });
            }
            Err(e) => {
                summary.failure += 1;
                summary.details.push(ImportIssue {
                    email,
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "User import: {} created, {} duplicates, {} failed",
        summary.success,
        summary.duplicates,
        summary.failure
    );
    Ok(summary)
}

/// POST /api/admin/import (multipart field `file`, `.csv` or `.xlsx`)
pub async fn import(
    state: web::Data<AppState>,
    admin: AdminUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let file = multipart::read_file(payload, "file", MAX_ROSTER_BYTES)
        .await?
        .ok_or_else(|| QuizError::BadRequest("No file uploaded".to_string()))?;

    let format = RosterFormat::from_filename(&file.filename).ok_or_else(|| {
        QuizError::BadRequest("Only .csv and .xlsx files are supported".to_string())
    })?;

    let rows = roster::parse_roster(format, &file.bytes)?;
    log::info!(
        "{} importing {} rows from {}",
        admin.0.email,
        rows.len(),
        file.filename
    );

    let summary = import_users(&state.db_pool, &rows).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// GET /api/admin/users
pub async fn list_users(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
    let users = users::list_by_role(&state.db_pool, Role::User).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::database::test_pool;
    use serde_json::json;

    fn rows(value: Value) -> Vec<ImportRow> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_import_continues_when_lookup_fails() {
        let pool = test_pool().await;
        let input = rows(json!([
            {"Name": "Asha Rao", "Email": "asha@example.com", "Mobile": "9876543210"},
            {"Name": "Ravi", "Email": "ravi@example.com", "Mobile": "9123456789"}
        ]));
        pool.close().await;

        let summary = import_users(&pool, &input).await.unwrap();
        assert_eq!(summary.success, 0);
        assert_eq!(summary.failure, 2);
        assert_eq!(summary.details.len(), 2);
        assert_eq!(summary.details[1].email, "ravi@example.com");
    }

    #[tokio::test]
    async fn test_import_from_csv_roster() {
        let pool = test_pool().await;
        let csv = "Name,Email,Mobile,Company,AccessFlag
                   Asha Rao,asha@example.com,9876543210,Acme,true
                   Ravi,,9123456789,,
";
        let input = roster::parse_csv(csv.as_bytes()).unwrap();

        let summary = import_users(&pool, &input).await.unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failure, 1);
        assert_eq!(summary.details[0].email, "Unknown");
    }

    #[tokio::test]
    async fn test_import_summary() {
        let pool = test_pool().await;
        let input = rows(json!([
            {"Name": "Asha Rao", "Email": "asha@example.com", "Mobile": 9876543210u64, "Company": "Acme"},
            {"Name": "Ravi", "Email": "ravi@example.com", "Mobile": "9123456789", "AccessFlag": "FALSE"},
            {"Name": "Asha Again", "Email": "ASHA@example.com", "Mobile": "9000000000"},
            {"Name": "", "Email": "blank@example.com", "Mobile": "9000000000"},
            {"Mobile": "9000000000"}
        ]));

        let summary = import_users(&pool, &input).await.unwrap();
        assert_eq!(summary.success, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.failure, 2);
        assert_eq!(
            summary.details[2],
            ImportIssue {
                email: "Unknown".to_string(),
                error: "Missing mandatory fields".to_string()
            }
        );

        let asha = users::find_by_email(&pool, "asha@example.com").await.unwrap().unwrap();
        assert!(asha.first_login_required);
        assert!(asha.access_flag);
        assert_eq!(asha.mobile, "9876543210");
        assert!(verify_password("AS3210", &asha.password_hash));

        let ravi = users::find_by_email(&pool, "ravi@example.com").await.unwrap().unwrap();
        assert!(!ravi.access_flag);
    }
}
