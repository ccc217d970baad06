use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A catalog entry as it leaves the API: the row plus its owner's display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub created_at: String,
    pub user_id: String,
    pub user: BookOwner,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookOwner {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl BookOwner {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
}

impl NewBook {
    pub fn new(title: &str, author: &str, genre: &str) -> Self {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
        }
    }

    /// Trims every field and rejects the submission if any of them is blank.
    pub fn validated(self) -> Result<NewBook, ApiError> {
        let book = NewBook {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: self.genre.trim().to_string(),
        };

        let missing: Vec<&str> = [
            ("title", &book.title),
            ("author", &book.author),
            ("genre", &book.genre),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| *field)
        .collect();

        if !missing.is_empty() {
            return Err(ApiError::Validation(format!("Missing required fields: {}", missing.join(", "))));
        }

        Ok(book)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
