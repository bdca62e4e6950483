//! Write-behind persistence for the journal state.
//!
//! Edits land in memory first; the full record is then queued here and
//! written by a single background task. Writes leave the queue in the order
//! they were submitted. A failed write is logged and dropped; the in-memory
//! edit is kept.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::{
    sync::{mpsc, oneshot, Mutex},
    task::JoinHandle,
    time::{sleep, Duration},
};
use tokio_util::sync::CancellationToken;

use crate::db::{Database, EntryPatch};

use super::state::{reduce, JournalAction, JournalState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const RETRY_BACKOFF_MS: u64 = 50;

enum WriteCommand {
    Persist { id: String, patch: EntryPatch },
    Flush(oneshot::Sender<()>),
}

struct WriterInner {
    sender: mpsc::UnboundedSender<WriteCommand>,
    pending: Arc<AtomicUsize>,
    cancel_token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct WriteBehind {
    inner: Arc<WriterInner>,
}

impl WriteBehind {
    /// Spawns the writer task; must be called inside a Tokio runtime.
    pub fn spawn(db: Database, state: Arc<Mutex<JournalState>>, write_retries: u32) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let cancel_token = CancellationToken::new();

        let handle = tokio::spawn(write_loop(
            db,
            state,
            receiver,
            pending.clone(),
            write_retries,
            cancel_token.clone(),
        ));

        Self {
            inner: Arc::new(WriterInner {
                sender,
                pending,
                cancel_token,
                handle: Mutex::new(Some(handle)),
            }),
        }
    }

    /// Queues a full-record overwrite. Call with the state lock held so the
    /// saving flag and the pending count move together.
    pub fn enqueue(&self, id: String, patch: EntryPatch) {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        if self
            .inner
            .sender
            .send(WriteCommand::Persist { id: id.clone(), patch })
            .is_err()
        {
            self.inner.pending.fetch_sub(1, Ordering::SeqCst);
            log_error!("write-behind queue closed; dropping write for entry {}", id);
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Resolves once every write queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.inner.sender.send(WriteCommand::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }

    /// Drains the queue, then stops the writer task.
    pub async fn shutdown(&self) {
        self.flush().await;
        self.inner.cancel_token.cancel();

        if let Some(handle) = self.inner.handle.lock().await.take() {
            if let Err(err) = handle.await {
                log_error!("write-behind task failed to join: {err}");
            }
        }
    }
}

async fn write_loop(
    db: Database,
    state: Arc<Mutex<JournalState>>,
    mut receiver: mpsc::UnboundedReceiver<WriteCommand>,
    pending: Arc<AtomicUsize>,
    write_retries: u32,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            command = receiver.recv() => match command {
                Some(command) => {
                    handle_command(&db, &state, &pending, write_retries, command).await;
                }
                None => break,
            },
            _ = cancel_token.cancelled() => {
                while let Ok(command) = receiver.try_recv() {
                    handle_command(&db, &state, &pending, write_retries, command).await;
                }
                log_debug!("write-behind task shutting down");
                break;
            }
        }
    }
}

async fn handle_command(
    db: &Database,
    state: &Arc<Mutex<JournalState>>,
    pending: &AtomicUsize,
    write_retries: u32,
    command: WriteCommand,
) {
    match command {
        WriteCommand::Persist { id, patch } => {
            persist_with_retry(db, &id, patch, write_retries).await;

            if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                let mut guard = state.lock().await;
                // Re-check under the lock: an edit may have queued meanwhile.
                if pending.load(Ordering::SeqCst) == 0 {
                    let current = std::mem::take(&mut *guard);
                    *guard = reduce(current, JournalAction::SetSaving(false));
                }
            }
        }
        WriteCommand::Flush(done) => {
            let _ = done.send(());
        }
    }
}

async fn persist_with_retry(db: &Database, id: &str, patch: EntryPatch, write_retries: u32) {
    let mut attempt = 0;
    loop {
        match db.update_entry(id, patch.clone()).await {
            Ok(_) if attempt > 0 => {
                log_info!("persisted entry {} after {} retries", id, attempt);
                return;
            }
            Ok(_) => {
                log_debug!("persisted entry {}", id);
                return;
            }
            Err(err) if err.is_transient() && attempt < write_retries => {
                attempt += 1;
                log_warn!(
                    "write for entry {} failed (attempt {}/{}): {err:#}",
                    id,
                    attempt,
                    write_retries + 1
                );
                sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt))).await;
            }
            Err(err) => {
                log_error!("Error persisting entry {}: {err:#}", id);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use chrono::Utc;

    use crate::{
        db::{
            models::{MorningPatch, SectionPatch},
            test_support::temp_database,
            JournalEntry,
        },
        navigation::EntryDate,
    };

    use super::*;

    async fn stored_entry(db: &Database) -> (JournalEntry, EntryPatch) {
        let mut entry = JournalEntry::new(EntryDate::parse("2024-03-15").unwrap(), Utc::now());
        db.add_entry(&entry).await.unwrap();
        entry.apply_section_patch(
            &SectionPatch::Morning(MorningPatch {
                great_day: Some("retried".into()),
                ..Default::default()
            }),
            Utc::now(),
        );
        let patch = EntryPatch::from(&entry);
        (entry, patch)
    }

    async fn rename_entries(db: &Database, from: &'static str, to: &'static str) {
        db.execute(move |conn| {
            conn.execute_batch(&format!("ALTER TABLE {from} RENAME TO {to}"))?;
            Ok(())
        })
        .await
        .unwrap();
    }

    fn writer(db: &Database, write_retries: u32) -> WriteBehind {
        let state = Arc::new(Mutex::new(JournalState::new()));
        WriteBehind::spawn(db.clone(), state, write_retries)
    }

    #[tokio::test]
    async fn storage_failure_is_retried_until_it_succeeds() {
        let (_dir, db) = temp_database();
        let (entry, patch) = stored_entry(&db).await;
        let writer = writer(&db, 3);

        rename_entries(&db, "entries", "entries_away").await;
        writer.enqueue(entry.id.clone(), patch);
        // First attempt fails; restore the table during the backoff.
        sleep(Duration::from_millis(20)).await;
        rename_entries(&db, "entries_away", "entries").await;
        writer.flush().await;

        assert_eq!(writer.pending(), 0);
        let stored = db.get_entry(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.morning.unwrap().great_day, "retried");
        writer.shutdown().await;
    }

    #[tokio::test]
    async fn storage_failure_gives_up_after_configured_retries() {
        let (_dir, db) = temp_database();
        let (entry, patch) = stored_entry(&db).await;
        let writer = writer(&db, 2);

        rename_entries(&db, "entries", "entries_away").await;
        let started = Instant::now();
        writer.enqueue(entry.id.clone(), patch);
        writer.flush().await;
        let elapsed = started.elapsed();
        rename_entries(&db, "entries_away", "entries").await;

        // Two retries back off 50ms then 100ms.
        assert!(elapsed >= Duration::from_millis(150), "took {elapsed:?}");
        assert_eq!(writer.pending(), 0);
        let stored = db.get_entry(&entry.id).await.unwrap().unwrap();
        assert!(stored.morning.is_none());
        writer.shutdown().await;
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let (_dir, db) = temp_database();
        let ghost = JournalEntry::new(EntryDate::parse("2024-03-12").unwrap(), Utc::now());
        let writer = writer(&db, 5);

        let started = Instant::now();
        writer.enqueue(ghost.id.clone(), EntryPatch::from(&ghost));
        writer.flush().await;
        let elapsed = started.elapsed();

        // Five retries would back off for 750ms in total.
        assert!(elapsed < Duration::from_millis(250), "took {elapsed:?}");
        assert_eq!(writer.pending(), 0);
        assert!(db.get_entry(&ghost.id).await.unwrap().is_none());
        writer.shutdown().await;
    }
}
