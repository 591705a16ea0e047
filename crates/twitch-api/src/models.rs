use serde::{Deserialize, Serialize};

/// Wrapper for Twitch Helix responses.
#[derive(Debug, Deserialize)]
pub struct HelixResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct HelixPagination {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HelixPaginatedResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<HelixPagination>,
}

/// User information from GET /helix/users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub profile_image_url: String,
    #[serde(default)]
    pub offline_image_url: String,
}

/// Stream information from GET /helix/streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(rename = "type", default)]
    pub stream_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_deserializes_with_optional_fields_missing() {
        let body = r#"{
          "data": [{
            "id": "141981764",
            "login": "somestreamer",
            "display_name": "SomeStreamer",
            "profile_image_url": "https://cdn.example/profile.png"
          }]
        }"#;

        let parsed: HelixResponse<TwitchUser> = serde_json::from_str(body).unwrap();
        let user = &parsed.data[0];
        assert_eq!(user.login, "somestreamer");
        assert_eq!(user.description, "");
        assert_eq!(user.offline_image_url, "");
    }

    #[test]
    fn paginated_response_carries_cursor() {
        let body = r#"{
          "data": [{
            "id": "s1",
            "user_id": "u1",
            "user_login": "login",
            "started_at": "2026-02-16T00:00:00Z",
            "type": "live"
          }],
          "pagination": { "cursor": "eyJiIjpudWxsfQ" }
        }"#;

        let parsed: HelixPaginatedResponse<StreamInfo> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].stream_type, "live");
        assert_eq!(
            parsed.pagination.and_then(|p| p.cursor).as_deref(),
            Some("eyJiIjpudWxsfQ")
        );
    }
}
