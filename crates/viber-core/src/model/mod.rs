//! Viber protocol models.

pub mod api;
pub mod callback;
pub mod document;
pub mod event;
pub mod message;
pub mod response;
pub mod user;

pub use api::{
    AUTH_TOKEN_HEADER, DEFAULT_API_URL, GetOnlineParams, GetUserDetailsParams, PostParams,
    SIGNATURE_HEADER, SendMessageParams, Sender, SetWebhookParams, WelcomeMessage, endpoint,
};
pub use callback::{
    Callback, ClientStatusCallback, ConversationStartedCallback, FailedCallback,
    MessageCallback, SubscribedCallback, UserEventCallback, WebhookCallback,
};
pub use document::Document;
pub use event::{CallbackType, EventKind};
pub use message::{
    ContactMessage, FileMessage, LocationMessage, Message, MessageKind, MessageOptions,
    PictureMessage, RichMediaMessage, StickerMessage, TextMessage, UrlMessage, VideoMessage,
};
pub use response::{
    AccountInfo, AccountLocation, ApiResponse, Envelope, OnlineStatus, StatusCode, UserDetails,
    UserStatus,
};
pub use user::{User, UserProfile};
