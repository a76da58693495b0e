pub mod clipboard_service;
pub mod open_service;
pub mod share_service;

pub use clipboard_service::copy_to_clipboard;
pub use open_service::open_link;
pub use share_service::run_share;
