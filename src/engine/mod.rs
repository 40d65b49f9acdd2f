pub mod conversations;
pub mod dispatch;
pub mod messages;
pub mod triggers;
pub mod unread;
