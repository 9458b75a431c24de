use anyhow::{bail, Context, Result};
use rusqlite::{Connection, Transaction};

const CURRENT_SCHEMA_VERSION: i32 = 2;

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({}) is newer than supported schema ({})",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)
            .with_context(|| format!("migration to version {next_version} failed"))?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<()> {
    match version {
        1 => {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS captured_notifications (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     package_name TEXT NOT NULL,
                     app_name TEXT,
                     title TEXT,
                     text TEXT,
                     sub_text TEXT,
                     post_time INTEGER NOT NULL,
                     notification_key TEXT,
                     has_reopen_handle INTEGER NOT NULL DEFAULT 0,
                     is_ongoing INTEGER NOT NULL DEFAULT 0,
                     is_clearable INTEGER NOT NULL DEFAULT 1,
                     content_hash TEXT NOT NULL,
                     handled INTEGER NOT NULL DEFAULT 0,
                     captured_at INTEGER NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_captured_notifications_captured_at
                     ON captured_notifications(captured_at);
                 CREATE INDEX IF NOT EXISTS idx_captured_notifications_package
                     ON captured_notifications(package_name);

                 CREATE TABLE IF NOT EXISTS capture_rules (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     name TEXT NOT NULL,
                     kind TEXT NOT NULL,
                     is_active INTEGER NOT NULL DEFAULT 1,
                     app_filter_mode TEXT NOT NULL DEFAULT 'AllExcept',
                     selected_packages_csv TEXT NOT NULL DEFAULT '',
                     start_ms INTEGER,
                     end_ms INTEGER,
                     weekend_days_csv TEXT NOT NULL DEFAULT '6,7'
                 );

                 CREATE TABLE IF NOT EXISTS selected_apps (
                     package_name TEXT PRIMARY KEY
                 );",
            )
            .context("failed to create initial schema")?;
            Ok(())
        }
        2 => {
            // Fresh installs capture on weekends out of the box.
            tx.execute_batch(
                "INSERT INTO capture_rules (name, kind, is_active, app_filter_mode, selected_packages_csv, weekend_days_csv)
                 SELECT 'Weekend', 'WeekendRepeat', 1, 'AllExcept', '', '6,7'
                 WHERE NOT EXISTS (SELECT 1 FROM capture_rules);",
            )
            .context("failed to seed default weekend rule")?;
            Ok(())
        }
        other => bail!("no migration registered for version {other}"),
    }
}
