use axum::http::Method;

/// The fixed set of conversation routes the gateway forwards upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    CreateConversation,
    SendMessage,
    GenerateMessage,
    GetMessages,
    GenerateReport,
    DeleteConversation,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::CreateConversation,
        Route::SendMessage,
        Route::GenerateMessage,
        Route::GetMessages,
        Route::GenerateReport,
        Route::DeleteConversation,
    ];

    /// Path on both the gateway and the upstream API.
    pub fn path(self) -> &'static str {
        match self {
            Route::CreateConversation => "/create_conversation",
            Route::SendMessage => "/send_message",
            Route::GenerateMessage => "/generate_message",
            Route::GetMessages => "/get_messages",
            Route::GenerateReport => "/generate_report",
            Route::DeleteConversation => "/delete_conversation",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Route::GetMessages => Method::GET,
            _ => Method::POST,
        }
    }
}
