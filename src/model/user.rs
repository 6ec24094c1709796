use super::redacted::Redacted;
use mongodb::bson::{oid::ObjectId, serde_helpers::serialize_object_id_as_hex_string};
use serde::{Deserialize, Serialize};

/// A document of the `users` collection. Field names are stored lowercased.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub name: String,
    #[serde(rename = "username")]
    pub user_name: String,

    /// PHC formatted argon2 hash.
    pub password: Redacted<String>,
}

/// What callers get to see of a user. Never carries the password.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(
        rename(serialize = "id", deserialize = "_id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    pub email: String,
    pub name: String,
    #[serde(rename(serialize = "userName", deserialize = "username"))]
    pub user_name: String,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            user_name: user.user_name.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub user_name: String,
    pub password: Redacted<String>,
}

#[derive(Deserialize, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: Redacted<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc};

    #[test]
    fn profile_json_uses_hex_id_and_drops_password() {
        let user = User {
            id: ObjectId::new(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            user_name: "ada".into(),
            password: Redacted::new("$argon2id$secret".into()),
        };
        let json = serde_json::to_value(Profile::from(&user)).expect("serialize");
        assert_eq!(json["id"], user.id.to_hex());
        assert_eq!(json["userName"], "ada");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn documents_store_a_lowercase_username() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "email": "ada@example.com",
            "name": "Ada",
            "username": "ada",
            "password": "$argon2id$secret",
        };

        let user: User = bson::from_document(document.clone()).expect("user");
        assert_eq!(user.user_name, "ada");
        assert_eq!(bson::to_document(&user).expect("document"), document);

        let profile: Profile = bson::from_document(document).expect("profile");
        assert_eq!(profile.id, id);
        assert_eq!(profile.user_name, "ada");
    }

    #[test]
    fn new_user_reads_camel_case_fields() {
        let input: NewUser = serde_json::from_str(
            r#"{"email":"a@b.c","name":"A","userName":"a","password":"pw"}"#,
        )
        .expect("deserialize");
        assert_eq!(input.user_name, "a");
        assert_eq!(input.password.as_str(), "pw");
    }
}
