//! User profiles and user details.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

/// The public profile of a Viber user, as delivered in callbacks.
///
/// Only `id` is guaranteed. Users may hide the rest, in which case the fields
/// are empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique Viber user id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: String,
    /// ISO 3166 country code.
    #[serde(default)]
    pub country: String,
    /// Device language (ISO 639-1).
    #[serde(default)]
    pub language: String,
    /// Maximum API version supported by the user's devices.
    #[serde(default)]
    pub api_version: u32,
}

impl UserProfile {
    /// Creates a profile that only carries an id.
    ///
    /// Useful when sending to a user whose id is already known.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Full user details as returned by `get_user_details`.
///
/// `Deref` → [`UserProfile`], so `user.name` works directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    /// Embedded profile fields.
    #[serde(flatten)]
    pub profile: UserProfile,

    /// Operating system of the primary device.
    #[serde(default)]
    pub primary_device_os: String,
    /// Viber client version on the primary device.
    #[serde(default)]
    pub viber_version: String,
    /// Mobile country code.
    #[serde(default)]
    pub mcc: i64,
    /// Mobile network code.
    #[serde(default)]
    pub mnc: i64,
    /// Device model.
    #[serde(default)]
    pub device_type: String,
    /// Role in the account (`admin`, `participant`, ...).
    #[serde(default)]
    pub role: String,
    /// Online status code.
    #[serde(default)]
    pub online_status: i64,
    /// Online status, human readable.
    #[serde(default)]
    pub online_status_message: String,
    /// Last time the user was online, epoch milliseconds.
    #[serde(default)]
    pub last_online: i64,
}

impl Deref for User {
    type Target = UserProfile;

    fn deref(&self) -> &Self::Target {
        &self.profile
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.profile
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        user.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_flattens_profile() {
        let user: User = serde_json::from_value(json!({
            "id": "01234567890A=",
            "name": "John McClane",
            "avatar": "http://avatar.example.com",
            "country": "UK",
            "language": "en",
            "primary_device_os": "Android 7.1",
            "api_version": 1,
            "viber_version": "6.5.0",
            "mcc": 1,
            "mnc": 1,
            "device_type": "iPhone9,4"
        }))
        .unwrap();

        assert_eq!(user.id, "01234567890A=");
        assert_eq!(user.name, "John McClane");
        assert_eq!(user.api_version, 1);
        assert_eq!(user.device_type, "iPhone9,4");
        assert_eq!(user.online_status, 0);
    }

    #[test]
    fn test_profile_tolerates_hidden_fields() {
        let profile: UserProfile = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(profile, UserProfile::from_id("abc"));
    }
}
