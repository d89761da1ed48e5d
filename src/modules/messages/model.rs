pub use campusly_models::messages::{
    InboxFilterParams, MESSAGE_COLUMNS, Message, SendMessageDto, UnreadCount,
};
