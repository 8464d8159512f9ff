use std::sync::LazyLock;

use mongodb::bson::{DateTime, oid::ObjectId};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::helpers::to_chrono;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9]").expect("slug pattern is valid"));

pub const DEFAULT_ICON: &str = "folder";

/// Categories inserted when the collection is empty at startup.
pub const DEFAULT_CATEGORIES: [(&str, &str); 10] = [
    ("General Discussion", "general-discussion"),
    ("Programming", "programming"),
    ("Technology", "technology"),
    ("Gaming", "gaming"),
    ("Science", "science"),
    ("Arts & Culture", "arts-culture"),
    ("Sports", "sports"),
    ("Education", "education"),
    ("Business", "business"),
    ("Health & Wellness", "health-wellness"),
];

/// Lowercase the name and replace every character outside `[a-z0-9]` with a hyphen.
pub fn slugify(name: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&name.trim().to_lowercase(), "-")
        .into_owned()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: String,
    pub created_at: DateTime,
}

impl Category {
    pub fn new(name: &str, slug: Option<&str>, description: Option<String>, icon: Option<String>) -> Self {
        let slug = slug
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| slugify(name));

        Category {
            id: ObjectId::new(),
            name: name.trim().to_string(),
            slug,
            description: description.map(|d| d.trim().to_string()),
            icon: icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            created_at: DateTime::now(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        CategoryView {
            id: category.id.to_hex(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            icon: category.icon.clone(),
            created_at: to_chrono(category.created_at),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_replaces_every_non_alphanumeric() {
        assert_eq!(slugify("Programming"), "programming");
        assert_eq!(slugify("Arts & Culture"), "arts---culture");
        assert_eq!(slugify("C++ / Rust"), "c-----rust");
    }

    #[test]
    fn explicit_slug_wins_over_derived() {
        let category = Category::new("Arts & Culture", Some("arts-culture"), None, None);
        assert_eq!(category.slug, "arts-culture");
        assert_eq!(category.icon, DEFAULT_ICON);
    }

    #[test]
    fn blank_slug_is_derived_from_name() {
        let category = Category::new("Health Tips", Some("  "), None, Some("heart".into()));
        assert_eq!(category.slug, "health-tips");
        assert_eq!(category.icon, "heart");
    }
}
