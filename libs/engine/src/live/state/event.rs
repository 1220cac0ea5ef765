use alloy::primitives::BlockNumber;

/// A unit of work handed from the producer to the consumer of a watcher.
#[derive(Debug)]
pub enum Event<T> {
    Skip,
    Element(Box<T>),
    Many(Vec<T>),
    /// Every element up to and including this height has been handed over.
    Checkpoint(BlockNumber),
}

#[derive(Debug)]
pub struct Events<T>(pub Vec<Event<T>>);
