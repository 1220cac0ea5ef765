use crate::args::Args;
use crate::backfill::chunked_backfill;
use crate::checkpointer::Checkpointer;
use crate::error::EngineError;
use crate::live::sink::handle::Sink;
use crate::live::source::handle::{Source, SourceInput};
use crate::live::state::outcome::Outcome;
use crate::live::tracker;
use eyre::Result;
use std::fmt::Debug;
use std::sync::Arc;
use store::cursor::store::Store as CursorStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running ingestion pipeline: backfill first, then the live tracker.
pub struct Engine {
    cancel: CancellationToken,
    handle: JoinHandle<Result<()>>,
}

impl Engine {
    /// Validates the configuration and the contract, then spawns the pipeline.
    ///
    /// Fails without spawning anything when `args` is invalid or no code is
    /// deployed at the contract address.
    pub async fn start<E, T>(
        args: Args,
        source: Arc<dyn Source<Item = E>>,
        cursor_store: CursorStore,
        sink: Arc<dyn Sink<Item = T>>,
    ) -> Result<Engine>
    where
        E: SourceInput + Clone + Debug + Send + Sync + 'static,
        T: Outcome + TryFrom<E> + Debug + Send + Sync + 'static,
        <T as TryFrom<E>>::Error: Debug,
    {
        args.validate()?;

        if !source.has_code(args.address).await? {
            tracing::error!("No contract deployed at {}", args.address);
            return Err(EngineError::ContractNotDeployed(args.address).into());
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(args, source, cursor_store, sink, cancel.clone()));

        Ok(Self { cancel, handle })
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels the pipeline and waits for every task to stop.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        self.wait().await
    }

    /// Waits for the pipeline to stop on its own, which only happens on failure or cancellation.
    pub async fn wait(self) -> Result<()> {
        self.handle.await?
    }
}

async fn run<E, T>(
    args: Args,
    source: Arc<dyn Source<Item = E>>,
    cursor_store: CursorStore,
    sink: Arc<dyn Sink<Item = T>>,
    cancel: CancellationToken,
) -> Result<()>
where
    E: SourceInput + Clone + Debug + Send + Sync + 'static,
    T: Outcome + TryFrom<E> + Debug + Send + Sync + 'static,
    <T as TryFrom<E>>::Error: Debug,
{
    let checkpointer = Checkpointer::new(cursor_store.clone(), args.cursor_key.clone());

    let backfill = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!("Engine cancelled during backfill");
            return Ok(());
        }
        report = chunked_backfill(&args, source.as_ref(), &checkpointer, sink.as_ref(), &cancel) => report,
    };
    let report = match backfill {
        Ok(report) => report,
        Err(e) if cancel.is_cancelled() && EngineError::is_cancellation(&e) => return Ok(()),
        Err(e) => {
            tracing::error!("Backfill failed: {e:?}");
            return Err(e);
        }
    };

    let watchers = tracker::watchers(&args, &cursor_store);
    tracker::track(&args, watchers, report.cursor, source, sink, &cancel).await
}
