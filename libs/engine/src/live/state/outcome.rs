use alloy::primitives::BlockNumber;
use store::event::model::DomainEvent;

pub trait Outcome {
    fn block_number(&self) -> BlockNumber;
}

impl Outcome for DomainEvent {
    fn block_number(&self) -> BlockNumber {
        self.block_height()
    }
}
