use crate::live::{
    source::handle::SourceInput,
    state::{
        event::{Event, Events},
        outcome::Outcome,
    },
};
use alloy::primitives::BlockNumber;
use std::fmt::Debug;

/// The next inclusive range to scan starting at `from`, at most `width` blocks wide
/// and never past `head`. `None` once `from` is beyond `head`.
pub fn batch_range(
    from: BlockNumber,
    head: BlockNumber,
    width: u64,
) -> Option<(BlockNumber, BlockNumber)> {
    if width == 0 || from > head {
        return None;
    }
    Some((from, from.saturating_add(width - 1).min(head)))
}

/// Converts every input, logging and dropping the ones that fail to convert.
/// Returns the converted elements and the number of skipped inputs.
pub fn decode_inputs<E, T>(inputs: Vec<E>) -> (Vec<T>, usize)
where
    E: SourceInput + Clone + Debug,
    T: TryFrom<E>,
    <T as TryFrom<E>>::Error: Debug,
{
    let mut skipped = 0;
    let elements = inputs
        .into_iter()
        .filter_map(|input| match T::try_from(input.clone()) {
            Ok(element) => Some(element),
            Err(e) => {
                tracing::error!("Skip: Failed to convert sourced input: {input:?} - reason {e:?}");
                skipped += 1;
                None
            }
        })
        .collect();
    (elements, skipped)
}

/// Progress of a single live watcher.
#[derive(Debug)]
pub struct State {
    next_block_number: BlockNumber,
    last_checkpoint: BlockNumber,
}

impl State {
    /// Starts right after `cursor`, the last height known to be persisted.
    pub fn new(cursor: BlockNumber) -> Self {
        Self { next_block_number: cursor.saturating_add(1), last_checkpoint: cursor }
    }

    pub fn get_next_block_number(&self) -> BlockNumber {
        self.next_block_number
    }

    pub fn get_last_checkpoint(&self) -> BlockNumber {
        self.last_checkpoint
    }

    pub fn next_range(&self, head: BlockNumber, width: u64) -> Option<(BlockNumber, BlockNumber)> {
        batch_range(self.next_block_number, head, width)
    }

    /// Poll mode: all inputs of `[next, to]` have been fetched.
    pub fn on_chunk<E, T>(&mut self, to: BlockNumber, inputs: Vec<E>) -> Events<T>
    where
        E: SourceInput + Clone + Debug,
        T: TryFrom<E>,
        <T as TryFrom<E>>::Error: Debug,
    {
        let (elements, _) = decode_inputs(inputs);
        self.next_block_number = to + 1;
        self.last_checkpoint = to;
        Events(vec![Event::Many(elements), Event::Checkpoint(to)])
    }

    /// Subscribe mode: one input pushed by the stream.
    ///
    /// Inputs arrive in non-decreasing block order, so an input at height `h`
    /// proves every height below `h` is complete.
    pub fn roll_forward<E, T>(&mut self, input: E) -> Events<T>
    where
        E: SourceInput + Clone + Debug,
        T: Outcome + TryFrom<E>,
        <T as TryFrom<E>>::Error: Debug,
    {
        let Some(block_number) = input.block_number() else {
            return Events(vec![Event::Skip]);
        };
        if block_number < self.next_block_number {
            tracing::debug!("Skip: input below next block {}: {input:?}", self.next_block_number);
            return Events(vec![Event::Skip]);
        }
        self.next_block_number = block_number;

        let mut events = match T::try_from(input.clone()) {
            Ok(element) => vec![Event::Element(Box::new(element))],
            Err(e) => {
                tracing::error!("Skip: Failed to convert consumed input: {input:?} - reason {e:?}");
                vec![Event::Skip]
            }
        };

        let complete = block_number - 1;
        if complete > self.last_checkpoint {
            self.last_checkpoint = complete;
            events.push(Event::Checkpoint(complete));
        }
        Events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Input(Option<BlockNumber>);

    impl SourceInput for Input {
        fn block_number(&self) -> Option<BlockNumber> {
            self.0
        }
    }

    #[derive(Debug, PartialEq)]
    struct Element(BlockNumber);

    impl Outcome for Element {
        fn block_number(&self) -> BlockNumber {
            self.0
        }
    }

    impl TryFrom<Input> for Element {
        type Error = &'static str;

        fn try_from(input: Input) -> Result<Self, Self::Error> {
            match input.0 {
                Some(n) if n % 7 != 0 => Ok(Element(n)),
                _ => Err("undecodable"),
            }
        }
    }

    #[test]
    fn test_batch_range_is_bounded_by_width_and_head() {
        assert_eq!(batch_range(1, 2500, 1000), Some((1, 1000)));
        assert_eq!(batch_range(2001, 2500, 1000), Some((2001, 2500)));
        assert_eq!(batch_range(5, 5, 1), Some((5, 5)));
        assert_eq!(batch_range(2501, 2500, 1000), None);
        assert_eq!(batch_range(1, 0, 1000), None);
        assert_eq!(batch_range(1, 10, 0), None);
        assert_eq!(batch_range(u64::MAX - 1, u64::MAX, 10), Some((u64::MAX - 1, u64::MAX)));
    }

    #[test]
    fn test_decode_inputs_skips_failures() {
        let inputs: Vec<Input> = (1..=10).map(|n| Input(Some(n))).collect();

        let (elements, skipped): (Vec<Element>, usize) = decode_inputs(inputs);

        assert_eq!(elements.len(), 9);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_on_chunk_advances_to_range_end() {
        let mut state = State::new(10);
        assert_eq!(state.next_range(25, 10), Some((11, 20)));

        let Events(events) = state.on_chunk::<Input, Element>(20, vec![Input(Some(12))]);

        assert!(matches!(events.as_slice(), [Event::Many(many), Event::Checkpoint(20)] if many.len() == 1));
        assert_eq!(state.get_next_block_number(), 21);
        assert_eq!(state.next_range(25, 10), Some((21, 25)));
        assert_eq!(state.next_range(20, 10), None);
    }

    #[test]
    fn test_roll_forward_checkpoints_completed_blocks() {
        let mut state = State::new(2);

        // first input of block 3 proves nothing new
        let Events(events) = state.roll_forward::<Input, Element>(Input(Some(3)));
        assert!(matches!(events.as_slice(), [Event::Element(_)]));

        // second input in the same block
        let Events(events) = state.roll_forward::<Input, Element>(Input(Some(3)));
        assert!(matches!(events.as_slice(), [Event::Element(_)]));

        // block 5 completes 3 and 4
        let Events(events) = state.roll_forward::<Input, Element>(Input(Some(5)));
        assert!(matches!(events.as_slice(), [Event::Element(_), Event::Checkpoint(4)]));
        assert_eq!(state.get_last_checkpoint(), 4);

        // undecodable input still completes the previous block
        let Events(events) = state.roll_forward::<Input, Element>(Input(Some(7)));
        assert!(matches!(events.as_slice(), [Event::Skip, Event::Checkpoint(6)]));
    }

    #[test]
    fn test_roll_forward_skips_stale_and_pending_inputs() {
        let mut state = State::new(10);

        let Events(events) = state.roll_forward::<Input, Element>(Input(Some(9)));
        assert!(matches!(events.as_slice(), [Event::Skip]));

        let Events(events) = state.roll_forward::<Input, Element>(Input(None));
        assert!(matches!(events.as_slice(), [Event::Skip]));

        assert_eq!(state.get_next_block_number(), 11);
        assert_eq!(state.get_last_checkpoint(), 10);
    }
}
