pub mod history;
pub mod preview;
pub mod store;
pub mod submission;

pub use history::HistoryDatabase;
pub use preview::FilePreview;
pub use store::ConversationStore;
pub use submission::{ChatFlow, Dispatch, Outcome, SubmissionState};
