use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub avatar: Avatar,
    pub display_name: String,
}

/// A user as it's handed to clients: everything but the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    pub id: String,
    pub username: String,
    pub avatar: Avatar,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub avatar: Avatar,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Avatar {
    Boy,
    Girl,
}

impl Avatar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Avatar::Boy => "boy",
            Avatar::Girl => "girl",
        }
    }
}

impl TryFrom<&'_ str> for Avatar {
    type Error = ();

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "boy" => Ok(Avatar::Boy),
            "girl" => Ok(Avatar::Girl),
            _ => Err(()),
        }
    }
}

impl User {
    pub fn from_new(id: String, new: NewUser) -> Self {
        let NewUser {
            username,
            password,
            avatar,
            display_name,
        } = new;

        Self {
            id,
            username,
            password,
            avatar,
            display_name,
        }
    }
}

impl From<User> for SafeUser {
    fn from(user: User) -> Self {
        let User {
            id,
            username,
            password: _,
            avatar,
            display_name,
        } = user;

        Self {
            id,
            username,
            avatar,
            display_name,
        }
    }
}

/// The two accounts every store starts with.
pub fn seed_users() -> [NewUser; 2] {
    [
        NewUser {
            username: "him".into(),
            password: "80085".into(),
            avatar: Avatar::Boy,
            display_name: "Him".into(),
        },
        NewUser {
            username: "her".into(),
            password: "1234".into(),
            avatar: Avatar::Girl,
            display_name: "Her".into(),
        },
    ]
}
