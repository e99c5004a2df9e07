//! Reply helper bound to one interaction.

use viber_core::{ApiResponse, ApiResult, Document, Message, UserProfile};

use crate::bot::Bot;

/// Replies to the user behind a received callback.
///
/// Handed to message and subscribe handlers. Cloning is cheap.
#[derive(Clone)]
pub struct Response {
    bot: Bot,
    user_profile: UserProfile,
    silent: bool,
    reply_type: Option<String>,
    chat_id: Option<String>,
}

impl Response {
    /// Creates a response for a one-on-one chat.
    pub fn new(bot: Bot, user_profile: UserProfile) -> Self {
        Self {
            bot,
            user_profile,
            silent: false,
            reply_type: None,
            chat_id: None,
        }
    }

    pub(crate) fn with_context(
        mut self,
        silent: bool,
        reply_type: Option<String>,
        chat_id: Option<String>,
    ) -> Self {
        self.silent = silent;
        self.reply_type = reply_type;
        self.chat_id = chat_id;
        self
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// The user to reply to.
    pub fn user_profile(&self) -> &UserProfile {
        &self.user_profile
    }

    /// Whether the platform asked for a silent reply.
    pub fn silent(&self) -> bool {
        self.silent
    }

    pub fn reply_type(&self) -> Option<&str> {
        self.reply_type.as_deref()
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    /// Sends `messages` to the bound user and chat.
    ///
    /// See [`Bot::send_message`].
    pub async fn send(
        &self,
        messages: impl IntoIterator<Item = Message>,
        tracking_data: Option<&Document>,
    ) -> ApiResult<ApiResponse> {
        self.bot
            .send_message(
                &self.user_profile,
                messages,
                tracking_data,
                self.chat_id.as_deref(),
            )
            .await
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("user_profile", &self.user_profile)
            .field("silent", &self.silent)
            .field("reply_type", &self.reply_type)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}
