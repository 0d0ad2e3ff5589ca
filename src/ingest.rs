use crate::cluster::{Association, RepresentativeId};
use crate::config::SchedulerConfig;
use crate::store::{PersistentIndex, RepresentativeStore, StoreError};
use crate::table::{self, TableError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("column {0:?} missing from scheduler header")]
    MissingColumn(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandLink {
    pub row: usize,
    pub representative: RepresentativeId,
    pub is_new: bool,
}

/// What one crash's scheduler dump contributed.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub crash: String,
    pub registered_at: DateTime<Utc>,
    pub rows: usize,
    pub users: Vec<String>,
    pub queues: Vec<String>,
    pub commands: Vec<CommandLink>,
}

impl IngestReport {
    pub fn new_representatives(&self) -> usize {
        self.commands.iter().filter(|c| c.is_new).count()
    }
}

/// Parses a scheduler dump taken at a crash and clusters every job's command,
/// linking each cluster to the crash and the job's user.
///
/// A bad header aborts before anything is clustered. Callers ingesting several
/// crashes into one store must serialize the calls themselves.
pub fn ingest_dump<S>(
    raw: &str,
    crash_id: &str,
    config: &SchedulerConfig,
    index: &mut PersistentIndex<S, Association>,
) -> Result<IngestReport, IngestError>
where
    S: RepresentativeStore<Association>,
{
    let table = table::parse_block(raw, config.delimiter, config.fields.len())?;
    let column = |name: &str| {
        table
            .header
            .position(name)
            .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
    };
    let command_col = column(config.command_column.as_str())?;
    let user_col = column(config.user_column.as_str())?;
    let queue_col = column(config.queue_column.as_str())?;

    let mut report = IngestReport {
        crash: crash_id.to_string(),
        registered_at: Utc::now(),
        rows: table.rows.len(),
        users: Vec::new(),
        queues: Vec::new(),
        commands: Vec::with_capacity(table.rows.len()),
    };

    for (i, row) in table.rows.iter().enumerate() {
        let user = row.cell(user_col).unwrap_or_default();
        let queue = row.cell(queue_col).unwrap_or_default();
        let command = row.cell(command_col).unwrap_or_default();
        push_unique(&mut report.users, user);
        push_unique(&mut report.queues, queue);

        let insertion = index.insert(command, Association::Crash(crash_id.to_string()))?;
        let id = insertion.representative.id();
        let is_new = insertion.is_new;
        index.attach(id, Association::User(user.to_string()))?;
        report.commands.push(CommandLink { row: i, representative: id, is_new });
    }

    log::info!(
        "crash {crash_id}: {} rows, {} users, {} queues, {} new representatives",
        report.rows,
        report.users.len(),
        report.queues.len(),
        report.new_representatives()
    );
    Ok(report)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
