pub mod client;
pub mod cursor {
    pub mod model;
    pub mod store;
}
pub mod event {
    pub mod adapter;
    pub mod model;
    pub mod store;
}
