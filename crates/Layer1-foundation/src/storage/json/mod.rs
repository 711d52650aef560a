mod adapter;
mod store;

pub use adapter::JsonFileAdapter;
pub use store::JsonStore;
