use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    delete_message, get_inbox, get_message, get_sent, get_unread_count, mark_read, send_message,
};

pub fn init_messages_router() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message))
        .route("/inbox", get(get_inbox))
        .route("/sent", get(get_sent))
        .route("/unread-count", get(get_unread_count))
        .route("/{id}", get(get_message).delete(delete_message))
        .route("/{id}/read", post(mark_read))
}
