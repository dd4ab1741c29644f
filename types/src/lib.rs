pub mod audio;
pub mod events;
pub mod response;
pub mod session;
pub mod tools;
mod content;

pub use content::items::{FunctionCallItem, FunctionCallOutputItem, Item, ItemStatus};
pub use content::message::{ContentPart, MessageItem, MessageRole};
pub use events::{ClientEvent, ServerEvent};
pub use response::ResponseConfig;
pub use session::Session;
