//! Fully populated aggregates returned by the query layer.
//!
//! Each one is assembled by explicit queries in `db::services`, so the cost
//! of loading related rows stays visible at the call site.

use serde::Serialize;

use crate::db::entities::{message, profile, project, review, skill, tag};

/// A project as shown in listings: the row, its owner and its tags.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectCard {
    pub project: project::Model,
    pub owner: Option<profile::Model>,
    pub tags: Vec<tag::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    pub review: review::Model,
    pub author: Option<profile::Model>,
}

/// A project with everything its detail page renders.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: project::Model,
    pub owner: Option<profile::Model>,
    pub tags: Vec<tag::Model>,
    pub reviews: Vec<ReviewWithAuthor>,
}

/// A profile as shown in the developer listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileCard {
    pub profile: profile::Model,
    pub skills: Vec<skill::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileDetail {
    pub profile: profile::Model,
    pub skills: Vec<skill::Model>,
    pub projects: Vec<ProjectCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Inbox {
    pub messages: Vec<message::Model>,
    pub unread_count: u64,
}
