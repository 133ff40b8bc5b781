//! Credential store schema and its versioned upgrade path.
//!
//! Each applied step is recorded in `schema_version`; running the
//! upgrade again only applies steps newer than the highest recorded one.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

/// Name of the unique index guarding `user.email`.
pub(crate) const USER_EMAIL_INDEX: &str = "idx_user_email";

const VERSION_TABLE: &str = "\
DEFINE TABLE IF NOT EXISTS schema_version SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE schema_version TYPE int;
DEFINE FIELD IF NOT EXISTS description ON TABLE schema_version TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE schema_version TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_schema_version ON TABLE schema_version \
    COLUMNS version UNIQUE;
";

/// Users keyed by UUID. Email uniqueness is enforced by the index, which
/// is what makes concurrent signups for one address safe.
const CREATE_USERS: &str = "\
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD secret_hash ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
";

struct Step {
    version: u32,
    description: &'static str,
    ddl: &'static str,
}

static STEPS: &[Step] = &[Step {
    version: 1,
    description: "create users",
    ddl: CREATE_USERS,
}];

#[derive(Debug, SurrealValue)]
struct AppliedVersion {
    version: u32,
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut response = db
        .query("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
        .await?;
    let rows: Vec<AppliedVersion> = response.take(0)?;
    Ok(rows.first().map_or(0, |row| row.version))
}

/// Bring the connected database up to the latest schema.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(VERSION_TABLE)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("version table: {e}")))?;

    let current = applied_version(db).await?;
    let pending = STEPS.iter().filter(|step| step.version > current);

    for step in pending {
        info!(version = step.version, description = step.description, "upgrading schema");

        db.query(step.ddl)
            .query("CREATE schema_version SET version = $version, description = $description")
            .bind(("version", step.version))
            .bind(("description", step.description))
            .await?
            .check()
            .map_err(|e| DbError::Migration(format!("step {}: {e}", step.version)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_index_is_unique() {
        assert!(CREATE_USERS.contains(&format!("{USER_EMAIL_INDEX} ON TABLE user COLUMNS email UNIQUE")));
    }

    #[test]
    fn steps_are_strictly_increasing() {
        assert!(STEPS.windows(2).all(|w| w[0].version < w[1].version));
        assert!(STEPS.iter().all(|s| s.version > 0));
    }
}
