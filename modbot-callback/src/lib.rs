//! # modbot-callback
//!
//! Inline keyboard buttons carry short `"{pattern}:{key}"` strings; the values they refer to live
//! in a [`CallbackDataManager`] until popped or expired by the daily job.

pub mod error;
pub mod history;
pub mod keyboard;
pub mod manager;
pub mod store;

pub use error::CallbackKeyError;
pub use history::CallbackHistory;
pub use keyboard::{ButtonRepr, KeyboardSlot, PersistKeyboard};
pub use manager::{split_callback_data, CallbackDataManager, CallbackKey, DataValue};
pub use store::{CallbackStore, SharedCallbackStore};
