use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::oneshot;

mod migrations;

use crate::models::{AppFilterMode, CapturedNotification, Rule, RuleKind};
use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

fn kind_from_str(value: &str) -> Result<RuleKind> {
    match value {
        "DateRange" => Ok(RuleKind::DateRange),
        "WeekendRepeat" => Ok(RuleKind::WeekendRepeat),
        _ => Err(anyhow!("unknown rule kind '{value}'")),
    }
}

fn filter_mode_from_str(value: &str) -> Result<AppFilterMode> {
    match value {
        "AllExcept" => Ok(AppFilterMode::AllExcept),
        "OnlySelected" => Ok(AppFilterMode::OnlySelected),
        _ => Err(anyhow!("unknown app filter mode '{value}'")),
    }
}

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<CapturedNotification> {
    Ok(CapturedNotification {
        id: Some(row.get("id")?),
        package_name: row.get("package_name")?,
        app_name: row.get("app_name")?,
        title: row.get("title")?,
        text: row.get("text")?,
        sub_text: row.get("sub_text")?,
        post_time: row.get("post_time")?,
        notification_key: row.get("notification_key")?,
        has_reopen_handle: row.get("has_reopen_handle")?,
        is_ongoing: row.get("is_ongoing")?,
        is_clearable: row.get("is_clearable")?,
        content_hash: row.get("content_hash")?,
        handled: row.get("handled")?,
        captured_at: row.get("captured_at")?,
    })
}

fn row_to_rule(row: &Row<'_>) -> Result<Rule> {
    let kind: String = row.get("kind")?;
    let mode: String = row.get("app_filter_mode")?;
    Ok(Rule {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: kind_from_str(&kind)?,
        is_active: row.get("is_active")?,
        app_filter_mode: filter_mode_from_str(&mode)?,
        selected_packages_csv: row.get("selected_packages_csv")?,
        start_ms: row.get("start_ms")?,
        end_ms: row.get("end_ms")?,
        weekend_days_csv: row.get("weekend_days_csv")?,
    })
}

const NOTIFICATION_COLUMNS: &str = "id, package_name, app_name, title, text, sub_text, post_time, \
     notification_key, has_reopen_handle, is_ongoing, is_clearable, content_hash, handled, captured_at";

const RULE_COLUMNS: &str =
    "id, name, kind, is_active, app_filter_mode, selected_packages_csv, start_ms, end_ms, weekend_days_csv";

/// Filters for querying the vault; `None` fields are not applied.
#[derive(Debug, Clone, Default)]
pub struct VaultQuery {
    pub package_name: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("notivault-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("Failed to enable foreign keys: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    // --- captured notifications ---

    pub async fn insert_notification(&self, entity: &CapturedNotification) -> Result<i64> {
        let record = entity.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO captured_notifications
                 (package_name, app_name, title, text, sub_text, post_time, notification_key,
                  has_reopen_handle, is_ongoing, is_clearable, content_hash, handled, captured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    record.package_name,
                    record.app_name,
                    record.title,
                    record.text,
                    record.sub_text,
                    record.post_time,
                    record.notification_key,
                    record.has_reopen_handle,
                    record.is_ongoing,
                    record.is_clearable,
                    record.content_hash,
                    record.handled,
                    record.captured_at,
                ],
            )
            .with_context(|| "failed to insert captured notification")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// The single most recently stored row, the only predecessor the dedup
    /// check compares against.
    pub async fn latest_notification(&self) -> Result<Option<CapturedNotification>> {
        self.execute(|conn| {
            let sql = format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM captured_notifications ORDER BY id DESC LIMIT 1"
            );
            conn.query_row(&sql, [], row_to_notification)
                .optional()
                .with_context(|| "failed to query latest notification")
        })
        .await
    }

    pub async fn list_notifications(&self, query: VaultQuery) -> Result<Vec<CapturedNotification>> {
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM captured_notifications
                 WHERE (?1 IS NULL OR package_name = ?1)
                 AND (?2 IS NULL OR captured_at >= ?2)
                 AND (?3 IS NULL OR captured_at <= ?3)
                 AND (
                     ?4 IS NULL OR ?4 = '' OR
                     title LIKE '%' || ?4 || '%' OR
                     text LIKE '%' || ?4 || '%' OR
                     sub_text LIKE '%' || ?4 || '%'
                 )
                 ORDER BY captured_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![
                query.package_name,
                query.from_ms,
                query.to_ms,
                query.search,
            ])?;

            let mut notifications = Vec::new();
            while let Some(row) = rows.next()? {
                notifications.push(row_to_notification(row)?);
            }
            Ok(notifications)
        })
        .await
    }

    pub async fn mark_handled(&self, id: i64) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "UPDATE captured_notifications SET handled = 1 WHERE id = ?1",
                params![id],
            )
            .with_context(|| "failed to mark notification handled")?;
            Ok(())
        })
        .await
    }

    pub async fn delete_notification(&self, id: i64) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "DELETE FROM captured_notifications WHERE id = ?1",
                params![id],
            )
            .with_context(|| "failed to delete notification")?;
            Ok(())
        })
        .await
    }

    pub async fn known_packages(&self) -> Result<Vec<String>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT package_name FROM captured_notifications ORDER BY package_name",
            )?;
            let mut rows = stmt.query([])?;
            let mut packages = Vec::new();
            while let Some(row) = rows.next()? {
                packages.push(row.get::<_, String>(0)?);
            }
            Ok(packages)
        })
        .await
    }

    // --- capture rules ---

    /// Insert when `rule.id` is zero, replace otherwise. Returns the rule id.
    pub async fn upsert_rule(&self, rule: &Rule) -> Result<i64> {
        let record = rule.clone();
        self.execute(move |conn| {
            if record.id == 0 {
                conn.execute(
                    "INSERT INTO capture_rules
                     (name, kind, is_active, app_filter_mode, selected_packages_csv, start_ms, end_ms, weekend_days_csv)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        record.name,
                        record.kind.as_str(),
                        record.is_active,
                        record.app_filter_mode.as_str(),
                        record.selected_packages_csv,
                        record.start_ms,
                        record.end_ms,
                        record.weekend_days_csv,
                    ],
                )
                .with_context(|| "failed to insert capture rule")?;
                Ok(conn.last_insert_rowid())
            } else {
                conn.execute(
                    "INSERT OR REPLACE INTO capture_rules
                     (id, name, kind, is_active, app_filter_mode, selected_packages_csv, start_ms, end_ms, weekend_days_csv)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        record.id,
                        record.name,
                        record.kind.as_str(),
                        record.is_active,
                        record.app_filter_mode.as_str(),
                        record.selected_packages_csv,
                        record.start_ms,
                        record.end_ms,
                        record.weekend_days_csv,
                    ],
                )
                .with_context(|| "failed to replace capture rule")?;
                Ok(record.id)
            }
        })
        .await
    }

    pub async fn delete_rule(&self, id: i64) -> Result<()> {
        self.execute(move |conn| {
            conn.execute("DELETE FROM capture_rules WHERE id = ?1", params![id])
                .with_context(|| "failed to delete capture rule")?;
            Ok(())
        })
        .await
    }

    pub async fn rule_by_id(&self, id: i64) -> Result<Option<Rule>> {
        self.execute(move |conn| {
            let sql = format!("SELECT {RULE_COLUMNS} FROM capture_rules WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_rule(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn list_rules(&self) -> Result<Vec<Rule>> {
        self.rules_where("1 = 1").await
    }

    /// The active-rules snapshot consumed by the capture pipeline.
    pub async fn active_rules(&self) -> Result<Vec<Rule>> {
        self.rules_where("is_active = 1").await
    }

    async fn rules_where(&self, predicate: &'static str) -> Result<Vec<Rule>> {
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {RULE_COLUMNS} FROM capture_rules WHERE {predicate} ORDER BY id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            let mut rules = Vec::new();
            while let Some(row) = rows.next()? {
                rules.push(row_to_rule(row)?);
            }
            Ok(rules)
        })
        .await
    }

    // --- selected apps ---

    pub async fn set_selected(&self, package_name: &str, selected: bool) -> Result<()> {
        let package_name = package_name.to_string();
        self.execute(move |conn| {
            if selected {
                conn.execute(
                    "INSERT OR IGNORE INTO selected_apps (package_name) VALUES (?1)",
                    params![package_name],
                )
                .with_context(|| "failed to select app")?;
            } else {
                conn.execute(
                    "DELETE FROM selected_apps WHERE package_name = ?1",
                    params![package_name],
                )
                .with_context(|| "failed to deselect app")?;
            }
            Ok(())
        })
        .await
    }

    pub async fn is_selected(&self, package_name: &str) -> Result<bool> {
        let package_name = package_name.to_string();
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM selected_apps WHERE package_name = ?1",
                params![package_name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    pub async fn selected_packages(&self) -> Result<Vec<String>> {
        self.execute(|conn| {
            let mut stmt =
                conn.prepare("SELECT package_name FROM selected_apps ORDER BY package_name")?;
            let mut rows = stmt.query([])?;
            let mut packages = Vec::new();
            while let Some(row) = rows.next()? {
                packages.push(row.get::<_, String>(0)?);
            }
            Ok(packages)
        })
        .await
    }
}
