pub mod chat_view;
pub mod file_preview;
pub mod input_area;
pub mod message_widget;
pub mod sidebar;
pub mod window;
