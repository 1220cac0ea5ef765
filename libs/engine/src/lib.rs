pub mod args;
pub mod backfill;
pub mod checkpointer;
pub mod engine;
pub mod error;
pub mod retry;
pub mod live {
    pub mod pubsub {
        pub mod publisher;
        pub mod subscriber;
    }
    pub mod sink {
        pub mod event;
        pub mod handle;
    }
    pub mod source {
        pub mod filter;
        pub mod handle;
        pub mod log;
    }
    pub mod state {
        pub mod event;
        pub mod logic;
        pub mod outcome;
    }
    pub mod tracker;
}
