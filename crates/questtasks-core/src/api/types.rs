// Request and response bodies for the REST backend that have no home in the
// mission model.

use serde::{Deserialize, Serialize};

use crate::mission::User;

/// Body of `POST /users/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    pub user: User,
}

fn bearer() -> String {
    "bearer".to_string()
}

/// A signed-in user and their bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl From<LoginResponse> for Session {
    fn from(r: LoginResponse) -> Self {
        Session {
            token: r.access_token,
            user: r.user,
        }
    }
}

/// Response of `POST /missions/{id}/participants`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParticipantRecord {
    pub mission_id: String,
    pub user_id: String,
    #[serde(default)]
    pub total_points: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddParticipantBody<'a> {
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlanRequest<'a> {
    pub prompt: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_into_session() {
        let json = r#"{
            "access_token": "abc.def",
            "token_type": "bearer",
            "user": {"id": "u1", "username": "sandy", "email": "s@tree.dome", "avatar": null}
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        let session = Session::from(resp);
        assert_eq!(session.token, "abc.def");
        assert_eq!(session.user.username, "sandy");
    }

    #[test]
    fn new_user_omits_missing_avatar() {
        let u = NewUser {
            email: "g@snail.sea".into(),
            username: "gary".into(),
            password: "meow".into(),
            avatar: None,
        };
        let v = serde_json::to_value(&u).unwrap();
        assert!(v.get("avatar").is_none());
        assert_eq!(v["username"], "gary");
    }

    #[test]
    fn participant_body_is_snake_case() {
        let v = serde_json::to_value(AddParticipantBody { user_id: "u7" }).unwrap();
        assert_eq!(v, serde_json::json!({"user_id": "u7"}));
    }
}
