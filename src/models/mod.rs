pub mod assistant_model;
pub mod conversation;
pub mod file_ref;
pub mod message;

pub use assistant_model::AssistantModel;
pub use conversation::Conversation;
pub use file_ref::FileRef;
pub use message::{Message, Role};
