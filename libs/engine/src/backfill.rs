use crate::args::Args;
use crate::checkpointer::Checkpointer;
use crate::live::sink::handle::Sink;
use crate::live::source::filter::ChunkFilter;
use crate::live::source::handle::{Source, SourceInput};
use crate::live::state::logic::{batch_range, decode_inputs};
use crate::retry::head_height_with_retry;
use alloy::primitives::BlockNumber;
use chain::error::ChainError;
use eyre::{Result, WrapErr};
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Summary of one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub batches: u64,
    pub persisted: usize,
    pub skipped: usize,
    /// Cursor once the run finished, the handoff height for the live tracker.
    pub cursor: BlockNumber,
    /// Head height observed when the run started.
    pub head: BlockNumber,
}

/// Persists every log in `(cursor, head]` in ranges of at most `max_range_width` blocks.
///
/// The head is read once; blocks produced meanwhile are left to the live tracker.
/// The cursor is moved to the end of a range only after the range's elements are stored,
/// so a failure at any point leaves it at the last fully persisted height.
pub async fn chunked_backfill<E, T>(
    args: &Args,
    source: &dyn Source<Item = E>,
    checkpointer: &Checkpointer,
    sink: &dyn Sink<Item = T>,
    cancel: &CancellationToken,
) -> Result<BackfillReport>
where
    E: SourceInput + Debug + Clone,
    T: TryFrom<E>,
    <T as TryFrom<E>>::Error: Debug,
{
    args.validate()?;

    let cursor = checkpointer.load_or_seed(args.cursor_seed).await?;
    let head =
        head_height_with_retry(cancel, source, args.retry_deadline, args.retry_interval).await?;

    let mut report = BackfillReport { cursor, head, ..Default::default() };
    if cursor >= head {
        tracing::info!(cursor, head, "Backfill not needed");
        return Ok(report);
    }

    tracing::info!(cursor, head, "Backfill started");

    let mut next = cursor + 1;
    while let Some((from, to)) = batch_range(next, head, args.max_range_width) {
        let chunk_filter = ChunkFilter {
            address: args.address,
            events: args.events.clone(),
            from_block_number: from,
            to_block_number: to,
        };
        let inputs = match source.chunk(chunk_filter).await {
            Ok(inputs) => inputs,
            Err(e) => {
                if let Some(ChainError::RangeTooLarge { .. }) = e.downcast_ref::<ChainError>() {
                    tracing::error!("Provider rejected a range of {} blocks", args.max_range_width);
                }
                return Err(e.wrap_err(format!("Backfill failed to query blocks [{from}, {to}]")));
            }
        };

        let (elements, skipped) = decode_inputs::<E, T>(inputs);
        if !elements.is_empty() {
            sink.process_batch(&elements)
                .await
                .wrap_err_with(|| format!("Backfill failed to persist blocks [{from}, {to}]"))?;
        }

        if let Err(e) = checkpointer.checkpoint(to).await {
            tracing::error!("Backfill failed on [checkpoint]: {e:?}");
            return Err(e);
        }

        report.batches += 1;
        report.persisted += elements.len();
        report.skipped += skipped;
        report.cursor = to;
        tracing::info!(from, to, persisted = elements.len(), skipped, "Backfill batch done");

        if to == head {
            break;
        }
        next = to + 1;
    }

    tracing::info!(
        batches = report.batches,
        persisted = report.persisted,
        skipped = report.skipped,
        "Backfill finished at block number: {}",
        report.cursor
    );
    Ok(report)
}
