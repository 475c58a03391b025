//! Authorization table (`users`). Emails are stored and compared lowercased.

use anyhow::Result;
use sqlx::Row;

use super::db::{unix_timestamp, InventoryDb};
use super::types::AdminRecord;

/// Role value that grants admin access.
pub const ADMIN_ROLE: &str = "admin";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InventoryDb {
    /// Number of rows granting `role = 'admin'` to this email.
    pub async fn count_admin_rows(&self, email: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n FROM users
            WHERE lower(email) = ?1 AND role = ?2
            "#,
        )
        .bind(normalize_email(email))
        .bind(ADMIN_ROLE)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("n"))
    }

    /// Give an email the admin role, inserting or updating its row.
    pub async fn grant_admin(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            anyhow::bail!("not an email address: {:?}", email);
        }
        sqlx::query(
            r#"
            INSERT INTO users (email, role, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(email) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(&email)
        .bind(ADMIN_ROLE)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;
        tracing::info!(email = %email, "admin granted");
        Ok(())
    }

    /// Remove the admin role. Returns false if the email was not an admin.
    pub async fn revoke_admin(&self, email: &str) -> Result<bool> {
        let done = sqlx::query(r#"DELETE FROM users WHERE lower(email) = ?1 AND role = ?2"#)
            .bind(normalize_email(email))
            .bind(ADMIN_ROLE)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminRecord>> {
        let rows = sqlx::query(
            r#"SELECT email, role, created_at FROM users WHERE role = ?1 ORDER BY email ASC"#,
        )
        .bind(ADMIN_ROLE)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| AdminRecord {
                email: r.get("email"),
                role: r.get("role"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
