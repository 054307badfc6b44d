//! Single writer actor.
//!
//! SQLite allows one writer at a time. All writes go through one task that
//! owns a dedicated connection and runs each job in an immediate
//! transaction, so concurrent schedulers never contend for the write lock.

use super::DbPool;
use crate::errors::{IntoCore, StorageError};
use diesel::SqliteConnection;
use log::{debug, warn};
use std::any::Any;
use steamtrack_core::errors::{DatabaseError, Error, Result};
use tokio::sync::{mpsc, oneshot};

// A job runs against the writer's connection and returns a core Result.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type ErasedReply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

/// Bound on queued write jobs.
const WRITE_QUEUE_CAPACITY: usize = 1024;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(ErasedJob, ErasedReply)>,
}

impl WriteHandle {
    /// Run `job` on the writer's connection inside one transaction.
    ///
    /// The transaction commits when the job returns `Ok` and rolls back
    /// otherwise.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_gone("the writer actor has stopped"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_gone("the writer actor dropped the reply"))??;

        boxed.downcast::<T>().map(|value| *value).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "writer actor returned an unexpected type".to_string(),
            ))
        })
    }
}

fn writer_gone(reason: &str) -> Error {
    StorageError::WriterUnavailable(reason.to_string()).into()
}

/// Spawn the writer task on the current tokio runtime.
///
/// The writer takes one connection from `pool` for its whole life and stops
/// when every [`WriteHandle`] has been dropped.
pub fn spawn_writer(pool: DbPool) -> Result<WriteHandle> {
    let mut conn = pool.get().into_core()?;
    let (tx, mut rx) = mpsc::channel::<(ErasedJob, ErasedReply)>(WRITE_QUEUE_CAPACITY);

    tokio::spawn(async move {
        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            if let Err(err) = &result {
                warn!("Write job failed: {}", err);
            }
            // The caller may have gone away; nothing to do then.
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor stopped");
    });

    Ok(WriteHandle { tx })
}
