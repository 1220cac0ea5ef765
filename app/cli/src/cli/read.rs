use clap::ValueEnum;
use engine::args::LiveMode;
use store::event::model::EventKind;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliEventType {
    Transfer,
    Stake,
    Unstake,
    Register,
    RewardReferral,
    RewardStakers,
    OwnershipTransferred,
}

impl From<CliEventType> for EventKind {
    fn from(value: CliEventType) -> Self {
        match value {
            CliEventType::Transfer => EventKind::Transfer,
            CliEventType::Stake => EventKind::Stake,
            CliEventType::Unstake => EventKind::Unstake,
            CliEventType::Register => EventKind::Register,
            CliEventType::RewardReferral => EventKind::RewardReferral,
            CliEventType::RewardStakers => EventKind::RewardStakers,
            CliEventType::OwnershipTransferred => EventKind::OwnershipTransferred,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliLiveMode {
    Poll,
    Subscribe,
}

impl From<CliLiveMode> for LiveMode {
    fn from(value: CliLiveMode) -> Self {
        match value {
            CliLiveMode::Poll => LiveMode::Poll,
            CliLiveMode::Subscribe => LiveMode::Subscribe,
        }
    }
}

/// All kinds when none is selected.
pub fn event_kinds(selected: &[CliEventType]) -> Vec<EventKind> {
    if selected.is_empty() {
        EventKind::ALL.to_vec()
    } else {
        let mut kinds: Vec<EventKind> = selected.iter().map(|&e| e.into()).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}
