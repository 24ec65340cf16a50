//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Hosted backend collaborators consumed by the console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};
use studio_security::{Role, Section, Subject};

/// Account as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Account identifier.
    pub id: String,
    /// Login email.
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for backend calls.
    pub access_token: String,
    /// Owner of the session.
    pub user: AuthUser,
}

/// The caller-visible part of a profile row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Persisted role; `None` when blank or unrecognised.
    pub role: Option<Role>,
    /// Full name.
    pub full_name: Option<String>,
    /// Whether AI-assisted tools are enabled for the account.
    pub ai_access: Option<bool>,
}

/// Columns written by a profile save. `None` leaves a column untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// New role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ProfileUpdate {
    /// Whether the update writes nothing.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.role.is_none()
    }
}

/// Raw profile row; the role column is parsed leniently.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub ai_access: Option<bool>,
}

impl ProfileRow {
    pub(crate) fn into_subject(self) -> Subject {
        Subject {
            role: Role::from_column(self.role.as_deref()),
            id: self.id,
            name: self.full_name,
            email: self.email,
        }
    }

    pub(crate) fn into_record(self) -> ProfileRecord {
        ProfileRecord {
            role: Role::from_column(self.role.as_deref()),
            full_name: self.full_name,
            ai_access: self.ai_access,
        }
    }
}

/// Reply body of an edge function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionReply {
    /// Human-readable outcome, shown verbatim when present.
    #[serde(default)]
    pub message: Option<String>,
}

/// Content-bearing sections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentKind {
    /// Gallery media.
    Gallery,
    /// Blog posts.
    Blog,
    /// Team member entries.
    Members,
}

impl ContentKind {
    /// Console section that exposes this content.
    pub fn section(&self) -> Section {
        match self {
            ContentKind::Gallery => Section::Gallery,
            ContentKind::Blog => Section::Blog,
            ContentKind::Members => Section::Members,
        }
    }

    /// Content kind behind a section, if it has one.
    pub fn for_section(section: Section) -> Option<Self> {
        match section {
            Section::Gallery => Some(ContentKind::Gallery),
            Section::Blog => Some(ContentKind::Blog),
            Section::Members => Some(ContentKind::Members),
            Section::Invite | Section::Profiles => None,
        }
    }

    /// PostgREST ordering: newest first for media, alphabetical for people.
    pub(crate) fn order_clause(&self) -> &'static str {
        match self {
            ContentKind::Gallery | ContentKind::Blog => "created_at.desc",
            ContentKind::Members => "name.asc",
        }
    }

    /// Label shown for a row without a title.
    pub fn untitled(&self) -> &'static str {
        match self {
            ContentKind::Blog => "Untitled Post",
            ContentKind::Gallery | ContentKind::Members => "Untitled",
        }
    }

    /// Whether a storage failure other than a missing object aborts the delete.
    pub fn strict_media_cleanup(&self) -> bool {
        matches!(self, ContentKind::Gallery)
    }
}

/// One listed content row, normalised across tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Row identifier, stringified.
    pub id: String,
    /// Title or member name.
    pub title: Option<String>,
    /// Category, author or position.
    pub detail: Option<String>,
    /// Public URL of the attached media.
    pub media_url: Option<String>,
    /// Creation timestamp as stored.
    pub created_at: Option<String>,
}

impl ContentItem {
    /// Normalise a raw row. Rows without an id are rejected.
    pub fn from_row(row: &Map<String, Value>) -> Option<Self> {
        let id = match row.get("id")? {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        Some(Self {
            id,
            title: first_text(row, &["title", "name"]),
            detail: first_text(row, &["category", "author", "position", "role"]),
            media_url: first_text(row, &["imageUrl", "image_url"]),
            created_at: first_text(row, &["created_at"]),
        })
    }

    /// Object path of the media inside `bucket`, decoded, if the URL points there.
    pub fn media_path(&self, bucket: &str) -> Option<String> {
        let url = url::Url::parse(self.media_url.as_deref()?).ok()?;
        let segments: Vec<&str> = url.path_segments()?.collect();
        let index = segments.iter().position(|segment| *segment == bucket)?;
        let rest = &segments[index + 1..];
        if rest.is_empty() {
            return None;
        }
        let joined = rest.join("/");
        urlencoding::decode(&joined)
            .ok()
            .map(|decoded| decoded.into_owned())
    }

    /// Title as listed, with the kind's fallback.
    pub fn display_title(&self, kind: ContentKind) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| kind.untitled().to_owned())
    }

    /// Secondary line as listed. Blog rows always show a byline.
    pub fn display_detail(&self, kind: ContentKind) -> Option<String> {
        match kind {
            ContentKind::Blog => Some(format!(
                "By {}",
                self.detail.as_deref().unwrap_or("Unknown Author")
            )),
            ContentKind::Gallery | ContentKind::Members => self.detail.clone(),
        }
    }
}

/// A blog post opened for editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    /// Row identifier, stringified.
    pub id: String,
    /// Post title.
    pub title: Option<String>,
    /// Byline.
    pub author: Option<String>,
    /// Markdown body.
    pub content: Option<String>,
    /// Header media URL.
    pub media_url: Option<String>,
}

impl BlogPost {
    /// Read a full `blogPosts` row.
    pub fn from_row(row: &Map<String, Value>) -> Option<Self> {
        let item = ContentItem::from_row(row)?;
        Some(Self {
            id: item.id,
            title: item.title,
            author: first_text(row, &["author"]),
            content: first_text(row, &["content"]),
            media_url: item.media_url,
        })
    }
}

/// Columns written when a content row is edited. `None` leaves a column untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentPatch {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// New body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ContentPatch {
    /// Whether the patch writes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.content.is_none()
    }
}

fn first_text(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find_map(|value| value.as_str().map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalises_gallery_and_blog_rows() {
        let gallery = json!({"id": 12, "title": "Dawn", "category": "landscape", "imageUrl": "https://x/a.jpg"});
        let item = ContentItem::from_row(gallery.as_object().unwrap()).unwrap();
        assert_eq!(item.id, "12");
        assert_eq!(item.detail.as_deref(), Some("landscape"));

        let blog = json!({"id": "p-1", "title": "Launch", "author": "Ana"});
        let item = ContentItem::from_row(blog.as_object().unwrap()).unwrap();
        assert_eq!(item.detail.as_deref(), Some("Ana"));
        assert!(item.media_url.is_none());

        assert!(ContentItem::from_row(json!({"title": "x"}).as_object().unwrap()).is_none());
    }

    #[test]
    fn media_path_is_extracted_after_bucket() {
        let item = ContentItem {
            id: "1".into(),
            title: None,
            detail: None,
            media_url: Some(
                "https://p.example.co/storage/v1/object/public/blog-images/1700_header_my%20pic.png"
                    .into(),
            ),
            created_at: None,
        };
        assert_eq!(
            item.media_path("blog-images").as_deref(),
            Some("1700_header_my pic.png")
        );
        assert_eq!(item.media_path("gallery-images"), None);
    }

    #[test]
    fn blog_rows_fall_back_when_fields_are_blank() {
        let item = ContentItem::from_row(json!({"id": 7}).as_object().unwrap()).unwrap();
        assert_eq!(item.display_title(ContentKind::Blog), "Untitled Post");
        assert_eq!(
            item.display_detail(ContentKind::Blog).as_deref(),
            Some("By Unknown Author")
        );
        assert_eq!(item.display_title(ContentKind::Gallery), "Untitled");
        assert_eq!(item.display_detail(ContentKind::Gallery), None);

        let post = BlogPost::from_row(
            json!({"id": "p-1", "title": "Launch", "author": "Ana", "content": "# Hi"})
                .as_object()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(post.author.as_deref(), Some("Ana"));
        assert_eq!(post.content.as_deref(), Some("# Hi"));
    }

    #[test]
    fn patch_serialises_only_set_columns() {
        let patch = ContentPatch {
            title: Some("New".into()),
            content: Some(String::new()),
            ..ContentPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"title": "New", "content": ""})
        );
        assert!(ContentPatch::default().is_empty());
    }

    #[test]
    fn profile_rows_parse_roles_leniently() {
        let row: ProfileRow = serde_json::from_value(json!({
            "id": "u1", "full_name": null, "email": "a@b.c", "role": "superuser"
        }))
        .unwrap();
        let subject = row.into_subject();
        assert_eq!(subject.role, None);
        assert_eq!(subject.display_name(), "N/A");
    }

    #[test]
    fn update_serialises_only_set_columns() {
        let update = ProfileUpdate {
            full_name: None,
            role: Some(Role::Editor),
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"role": "editor"}));
    }
}
