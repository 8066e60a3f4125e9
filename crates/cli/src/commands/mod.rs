//! Command handlers for the Cropwise CLI.

pub mod ask;
pub mod chat;
pub mod index;
pub mod search;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use index::IndexCommand;
pub use search::SearchCommand;
