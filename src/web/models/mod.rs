use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::entities::review::VoteValue;

// --- Session ---

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub exp: usize,
}

/// A logged in user, as decoded from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub username: String,
}

/// Who is making a request. Inserted as a request extension by the identity
/// middleware and handed to every use case that cares.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(AuthenticatedUser),
}

impl Identity {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }

    pub fn profile_id(&self) -> Option<Uuid> {
        self.user().map(|u| u.profile_id)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }
}

// --- Query strings ---

/// `?search_query=&page=` as used by the HTML listing pages.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub search_query: String,
    pub page: Option<String>,
}

impl ListingQuery {
    /// Page number from the query string; anything unparsable means page 1.
    pub fn page_number(&self) -> i64 {
        parse_page(self.page.as_deref())
    }
}

/// `?q=&page=&limit=` as used by the JSON API.
#[derive(Debug, Default, Deserialize)]
pub struct ApiListingQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<String>,
    pub limit: Option<u64>,
}

impl ApiListingQuery {
    pub fn page_number(&self) -> i64 {
        parse_page(self.page.as_deref())
    }
}

fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(1)
}

// --- Forms ---

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub featured_image: Option<String>,
    pub demo_link: Option<String>,
    pub source_link: Option<String>,
    /// Comma separated tag names.
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub value: VoteValue,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    pub location: Option<String>,
    pub short_intro: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub social_github: Option<String>,
    pub social_linkedin: Option<String>,
    pub social_website: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillForm {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageForm {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}
