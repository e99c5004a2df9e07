//! Viber message types.
//!
//! A [`Message`] is one of the platform's message kinds ([`MessageKind`])
//! plus the envelope fields every kind shares ([`MessageOptions`]).
//!
//! # Wire Format
//!
//! All kinds share one flat JSON object discriminated by `type`:
//!
//! | Kind | `type` | Payload |
//! |------|--------|---------|
//! | Text | `text` | `text` |
//! | Url | `url` | `media` |
//! | Contact | `contact` | `contact: {name, phone_number, avatar?}` |
//! | Location | `location` | `location: {lat, lon}` |
//! | Picture | `picture` | `media`, `text`, `thumbnail?` |
//! | Video | `video` | `media`, `size`, `text?`, `thumbnail?`, `duration?` |
//! | Sticker | `sticker` | `sticker_id` |
//! | RichMedia | `rich_media` | `rich_media`, `alt_text?` |
//! | Keyboard | *(none)* | `keyboard` only |
//!
//! The envelope adds `keyboard`, `tracking_data`, `min_api_version` and, for
//! received messages, `timestamp` and `message_token`.
//!
//! # Example
//!
//! ```rust,ignore
//! use viber_core::{Document, Message, PictureMessage};
//!
//! let greeting = Message::text("Hello!")
//!     .with_tracking_data(Document::new().with("step", 1));
//!
//! let picture: Message = PictureMessage::new("https://example.com/cat.jpg")
//!     .text("A cat")
//!     .into();
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::document::{Document, tracking_data};
use crate::error::{ApiError, ApiResult};

// ============================================================================
// Message
// ============================================================================

/// A message sent to, or received from, a Viber user.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The kind-specific payload.
    pub kind: MessageKind,
    /// Fields shared by all kinds.
    pub options: MessageOptions,
}

/// Envelope fields shared by every message kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageOptions {
    /// Custom keyboard shown alongside the message.
    pub keyboard: Option<Document>,
    /// Opaque data echoed back by the platform with the user's reply.
    pub tracking_data: Option<Document>,
    /// Overrides the kind's default minimum API version.
    pub min_api_version: Option<u32>,
    /// Epoch milliseconds, set on received messages.
    pub timestamp: Option<i64>,
    /// Platform message token, set on received messages.
    pub token: Option<u64>,
}

/// The kind-specific payload of a [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    /// Plain text.
    Text(TextMessage),
    /// A URL.
    Url(UrlMessage),
    /// A contact card.
    Contact(ContactMessage),
    /// A geographic location.
    Location(LocationMessage),
    /// An image.
    Picture(PictureMessage),
    /// A video.
    Video(VideoMessage),
    /// A sticker.
    Sticker(StickerMessage),
    /// A rich media carousel.
    RichMedia(RichMediaMessage),
    /// A keyboard with no other content.
    Keyboard,
    /// A file (receive only).
    File(FileMessage),
    /// A kind this SDK does not model (receive only).
    Unsupported {
        /// The wire `type` value.
        type_name: String,
    },
}

/// Plain text payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMessage {
    pub text: String,
}

/// URL payload.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlMessage {
    pub url: String,
}

/// Contact card payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub name: String,
    pub phone_number: String,
    pub avatar: Option<String>,
}

impl ContactMessage {
    /// Creates a contact card.
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone_number: phone_number.into(),
            avatar: None,
        }
    }

    /// Sets the contact avatar URL.
    pub fn avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Location payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMessage {
    pub latitude: f64,
    pub longitude: f64,
}

/// Picture payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PictureMessage {
    pub url: String,
    pub text: Option<String>,
    pub thumbnail: Option<String>,
}

impl PictureMessage {
    /// Creates a picture message from an image URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: None,
            thumbnail: None,
        }
    }

    /// Sets the caption.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the thumbnail URL.
    pub fn thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

/// Video payload.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMessage {
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    pub text: Option<String>,
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    pub duration: Option<u32>,
}

impl VideoMessage {
    /// Creates a video message.
    pub fn new(url: impl Into<String>, size: u64) -> Self {
        Self {
            url: url.into(),
            size,
            text: None,
            thumbnail: None,
            duration: None,
        }
    }

    /// Sets the caption.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the thumbnail URL.
    pub fn thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Sets the duration in seconds.
    pub fn duration(mut self, seconds: u32) -> Self {
        self.duration = Some(seconds);
        self
    }
}

/// Sticker payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerMessage {
    pub sticker_id: u64,
}

/// Rich media payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RichMediaMessage {
    pub rich_media: Document,
    /// Shown by clients that cannot render rich media.
    pub alt_text: Option<String>,
}

impl RichMediaMessage {
    /// Creates a rich media message.
    pub fn new(rich_media: Document) -> Self {
        Self {
            rich_media,
            alt_text: None,
        }
    }

    /// Sets the fallback text.
    pub fn alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
        self
    }
}

/// File payload (receive only).
#[derive(Debug, Clone, PartialEq)]
pub struct FileMessage {
    pub url: String,
    pub file_name: String,
    pub size: u64,
}

// ============================================================================
// Constructors and Builders
// ============================================================================

macro_rules! impl_from_payload {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for Message {
                fn from(payload: $payload) -> Self {
                    Message::new(MessageKind::$variant(payload))
                }
            }
        )*
    };
}

impl_from_payload! {
    TextMessage => Text,
    UrlMessage => Url,
    ContactMessage => Contact,
    LocationMessage => Location,
    PictureMessage => Picture,
    VideoMessage => Video,
    StickerMessage => Sticker,
    RichMediaMessage => RichMedia,
}

impl Message {
    /// Wraps a payload with default options.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            options: MessageOptions::default(),
        }
    }

    /// Creates a text message.
    pub fn text(text: impl Into<String>) -> Self {
        TextMessage { text: text.into() }.into()
    }

    /// Creates a URL message.
    pub fn url(url: impl Into<String>) -> Self {
        UrlMessage { url: url.into() }.into()
    }

    /// Creates a contact message.
    pub fn contact(name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        ContactMessage::new(name, phone_number).into()
    }

    /// Creates a location message.
    pub fn location(latitude: f64, longitude: f64) -> Self {
        LocationMessage {
            latitude,
            longitude,
        }
        .into()
    }

    /// Creates a picture message without caption.
    pub fn picture(url: impl Into<String>) -> Self {
        PictureMessage::new(url).into()
    }

    /// Creates a video message.
    pub fn video(url: impl Into<String>, size: u64) -> Self {
        VideoMessage::new(url, size).into()
    }

    /// Creates a sticker message.
    pub fn sticker(sticker_id: u64) -> Self {
        StickerMessage { sticker_id }.into()
    }

    /// Creates a rich media message.
    pub fn rich_media(rich_media: Document) -> Self {
        RichMediaMessage::new(rich_media).into()
    }

    /// Creates a keyboard-only message.
    pub fn keyboard(keyboard: Document) -> Self {
        Message::new(MessageKind::Keyboard).with_keyboard(keyboard)
    }

    /// Attaches a keyboard.
    pub fn with_keyboard(mut self, keyboard: Document) -> Self {
        self.options.keyboard = Some(keyboard);
        self
    }

    /// Attaches tracking data.
    pub fn with_tracking_data(mut self, tracking_data: Document) -> Self {
        self.options.tracking_data = Some(tracking_data);
        self
    }

    /// Overrides the minimum API version.
    pub fn with_min_api_version(mut self, version: u32) -> Self {
        self.options.min_api_version = Some(version);
        self
    }

    // --------------------------------
    // Accessors
    // --------------------------------

    /// Returns the wire `type` name, `None` for keyboard-only messages.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Text(_) => Some("text"),
            MessageKind::Url(_) => Some("url"),
            MessageKind::Contact(_) => Some("contact"),
            MessageKind::Location(_) => Some("location"),
            MessageKind::Picture(_) => Some("picture"),
            MessageKind::Video(_) => Some("video"),
            MessageKind::Sticker(_) => Some("sticker"),
            MessageKind::RichMedia(_) => Some("rich_media"),
            MessageKind::Keyboard => None,
            MessageKind::File(_) => Some("file"),
            MessageKind::Unsupported { type_name } => Some(type_name),
        }
    }

    /// Returns the text content: the body of a text message or the caption of
    /// a picture or video.
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Text(m) => Some(&m.text),
            MessageKind::Picture(m) => m.text.as_deref(),
            MessageKind::Video(m) => m.text.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` for plain text messages.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, MessageKind::Text(_))
    }

    /// The minimum API version a client needs to render this message.
    ///
    /// Rich media needs version 2, everything else defaults to 1.
    pub fn min_api_version(&self) -> u32 {
        self.options
            .min_api_version
            .unwrap_or(match self.kind {
                MessageKind::RichMedia(_) => 2,
                _ => 1,
            })
    }

    /// Wire paths of the fields this kind cannot be sent without.
    ///
    /// Nested fields use dotted paths (`contact.name`).
    pub fn required_arguments(&self) -> &'static [&'static str] {
        match self.kind {
            MessageKind::Text(_) => &["text"],
            MessageKind::Url(_) => &["media"],
            MessageKind::Contact(_) => &["contact.name", "contact.phone_number"],
            MessageKind::Location(_) => &["location.lat", "location.lon"],
            MessageKind::Picture(_) => &["media"],
            MessageKind::Video(_) => &["media", "size"],
            MessageKind::Sticker(_) => &["sticker_id"],
            MessageKind::RichMedia(_) => &["rich_media"],
            MessageKind::Keyboard => &["keyboard"],
            MessageKind::File(_) => &["media", "file_name", "size"],
            MessageKind::Unsupported { .. } => &[],
        }
    }

    /// Checks that the message can be sent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidMessage`] when a required argument is empty,
    /// a coordinate is out of range, the keyboard lacks a `Buttons` array, or
    /// the kind is receive only.
    pub fn validate(&self) -> ApiResult<()> {
        fn non_empty(value: &str, field: &str) -> ApiResult<()> {
            if value.trim().is_empty() {
                Err(ApiError::invalid_message(format!("{field} must not be empty")))
            } else {
                Ok(())
            }
        }

        match &self.kind {
            MessageKind::Text(m) => non_empty(&m.text, "text")?,
            MessageKind::Url(m) => non_empty(&m.url, "url")?,
            MessageKind::Contact(m) => {
                non_empty(&m.name, "contact name")?;
                non_empty(&m.phone_number, "contact phone number")?;
            }
            MessageKind::Location(m) => {
                if !(-90.0..=90.0).contains(&m.latitude) || !(-180.0..=180.0).contains(&m.longitude)
                {
                    return Err(ApiError::invalid_message(format!(
                        "location out of range: {},{}",
                        m.latitude, m.longitude
                    )));
                }
            }
            MessageKind::Picture(m) => non_empty(&m.url, "picture url")?,
            MessageKind::Video(m) => {
                non_empty(&m.url, "video url")?;
                if m.size == 0 {
                    return Err(ApiError::invalid_message("video size must be positive"));
                }
            }
            MessageKind::Sticker(_) => {}
            MessageKind::RichMedia(m) => {
                if m.rich_media.is_empty() {
                    return Err(ApiError::invalid_message("rich media must not be empty"));
                }
            }
            MessageKind::Keyboard => {
                if self.options.keyboard.is_none() {
                    return Err(ApiError::invalid_message(
                        "keyboard message requires a keyboard",
                    ));
                }
            }
            MessageKind::File(_) | MessageKind::Unsupported { .. } => {
                return Err(ApiError::invalid_message(format!(
                    "'{}' messages cannot be sent",
                    self.type_name().unwrap_or_default()
                )));
            }
        }

        if let Some(keyboard) = &self.options.keyboard
            && !keyboard.is_keyboard()
        {
            return Err(ApiError::invalid_message(
                "keyboard must contain a Buttons array",
            ));
        }

        Ok(())
    }
}

/// Lets a single message be passed wherever a sequence is expected.
impl IntoIterator for Message {
    type Item = Message;
    type IntoIter = std::iter::Once<Message>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(self)
    }
}

// ============================================================================
// Serialization / Deserialization
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact: Option<WireContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<WireLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sticker_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rich_media: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keyboard: Option<Document>,
    #[serde(
        default,
        with = "tracking_data",
        skip_serializing_if = "Option::is_none"
    )]
    tracking_data: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_api_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
    #[serde(
        default,
        alias = "token",
        skip_serializing_if = "Option::is_none"
    )]
    message_token: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContact {
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireLocation {
    lat: f64,
    lon: f64,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let options = &message.options;
        let mut wire = WireMessage {
            kind: message.type_name().map(str::to_string),
            keyboard: options.keyboard.clone(),
            tracking_data: options.tracking_data.clone(),
            min_api_version: Some(message.min_api_version()),
            timestamp: options.timestamp,
            message_token: options.token,
            ..Default::default()
        };

        match &message.kind {
            MessageKind::Text(m) => wire.text = Some(m.text.clone()),
            MessageKind::Url(m) => wire.media = Some(m.url.clone()),
            MessageKind::Contact(m) => {
                wire.contact = Some(WireContact {
                    name: m.name.clone(),
                    phone_number: m.phone_number.clone(),
                    avatar: m.avatar.clone(),
                });
            }
            MessageKind::Location(m) => {
                wire.location = Some(WireLocation {
                    lat: m.latitude,
                    lon: m.longitude,
                });
            }
            MessageKind::Picture(m) => {
                wire.media = Some(m.url.clone());
                // The platform requires the caption field, even when empty.
                wire.text = Some(m.text.clone().unwrap_or_default());
                wire.thumbnail.clone_from(&m.thumbnail);
            }
            MessageKind::Video(m) => {
                wire.media = Some(m.url.clone());
                wire.size = Some(m.size);
                wire.text.clone_from(&m.text);
                wire.thumbnail.clone_from(&m.thumbnail);
                wire.duration = m.duration;
            }
            MessageKind::Sticker(m) => wire.sticker_id = Some(m.sticker_id),
            MessageKind::RichMedia(m) => {
                wire.rich_media = Some(m.rich_media.clone());
                wire.alt_text.clone_from(&m.alt_text);
            }
            MessageKind::Keyboard | MessageKind::Unsupported { .. } => {}
            MessageKind::File(m) => {
                wire.media = Some(m.url.clone());
                wire.file_name = Some(m.file_name.clone());
                wire.size = Some(m.size);
            }
        }

        wire
    }
}

impl WireMessage {
    fn into_message(self) -> Message {
        let kind = match self.kind.as_deref() {
            Some("text") => MessageKind::Text(TextMessage {
                text: self.text.unwrap_or_default(),
            }),
            Some("url") => MessageKind::Url(UrlMessage {
                url: self.media.unwrap_or_default(),
            }),
            Some("contact") => {
                let contact = self.contact.unwrap_or(WireContact {
                    name: String::new(),
                    phone_number: String::new(),
                    avatar: None,
                });
                MessageKind::Contact(ContactMessage {
                    name: contact.name,
                    phone_number: contact.phone_number,
                    avatar: contact.avatar,
                })
            }
            Some("location") => {
                let (latitude, longitude) =
                    self.location.map(|l| (l.lat, l.lon)).unwrap_or_default();
                MessageKind::Location(LocationMessage {
                    latitude,
                    longitude,
                })
            }
            Some("picture") => MessageKind::Picture(PictureMessage {
                url: self.media.unwrap_or_default(),
                text: self.text.filter(|t| !t.is_empty()),
                thumbnail: self.thumbnail,
            }),
            Some("video") => MessageKind::Video(VideoMessage {
                url: self.media.unwrap_or_default(),
                size: self.size.unwrap_or_default(),
                text: self.text,
                thumbnail: self.thumbnail,
                duration: self.duration,
            }),
            Some("sticker") => MessageKind::Sticker(StickerMessage {
                sticker_id: self.sticker_id.unwrap_or_default(),
            }),
            Some("rich_media") => MessageKind::RichMedia(RichMediaMessage {
                rich_media: self.rich_media.unwrap_or_default(),
                alt_text: self.alt_text,
            }),
            Some("file") => MessageKind::File(FileMessage {
                url: self.media.unwrap_or_default(),
                file_name: self.file_name.unwrap_or_default(),
                size: self.size.unwrap_or_default(),
            }),
            Some(other) => MessageKind::Unsupported {
                type_name: other.to_string(),
            },
            None => MessageKind::Keyboard,
        };

        Message {
            kind,
            options: MessageOptions {
                keyboard: self.keyboard,
                tracking_data: self.tracking_data,
                min_api_version: self.min_api_version,
                timestamp: self.timestamp,
                token: self.message_token,
            },
        }
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        WireMessage::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        WireMessage::deserialize(deserializer).map(WireMessage::into_message)
    }
}

// ============================================================================
// Tests
// ============================================================================
