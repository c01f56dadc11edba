//! Cache key and tag definitions.
//!
//! A [`QueryKey`] names one cached query result. A [`Tag`] names something a
//! mutation can invalidate; every query key provides a fixed set of tags.

use std::fmt;

use crate::application::routes::Route;
use crate::domain::entities::PostId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    BlogPost,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::BlogPost => "BlogPost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
    /// The whole collection of an entity kind.
    List,
    /// A single entity, by its id rendered as text.
    Item(String),
}

/// Invalidation key: `{kind, "LIST"}` or `{kind, id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: EntityKind,
    pub id: TagId,
}

impl Tag {
    pub fn list(kind: EntityKind) -> Self {
        Self {
            kind,
            id: TagId::List,
        }
    }

    pub fn item(kind: EntityKind, id: impl ToString) -> Self {
        Self {
            kind,
            id: TagId::Item(id.to_string()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            TagId::List => write!(f, "{}:LIST", self.kind.as_str()),
            TagId::Item(id) => write!(f, "{}:{id}", self.kind.as_str()),
        }
    }
}

/// Identifies a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Users,
    BlogPosts,
    /// A single post, derived from the post listing.
    BlogPost(PostId),
}

impl QueryKey {
    /// The route that fetches this query's data.
    pub fn route(&self) -> Route {
        match self {
            QueryKey::Users => Route::ListUsers,
            QueryKey::BlogPosts | QueryKey::BlogPost(_) => Route::ListBlogPosts,
        }
    }

    /// Tags this query's entry is registered under.
    ///
    /// List entries only carry the list tag, so editing a post leaves the post
    /// listing fresh. A single post is read out of the listing and carries both
    /// its own tag and the list tag.
    pub fn provided_tags(&self) -> Vec<Tag> {
        match self {
            QueryKey::Users => vec![Tag::list(EntityKind::User)],
            QueryKey::BlogPosts => vec![Tag::list(EntityKind::BlogPost)],
            QueryKey::BlogPost(id) => vec![
                Tag::item(EntityKind::BlogPost, id),
                Tag::list(EntityKind::BlogPost),
            ],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryKey::Users => "users",
            QueryKey::BlogPosts => "blog_posts",
            QueryKey::BlogPost(_) => "blog_post",
        }
    }

    /// The query key a read-only route is cached under, if any.
    pub fn for_route(route: &Route) -> Option<Self> {
        match route {
            Route::ListUsers => Some(QueryKey::Users),
            Route::ListBlogPosts => Some(QueryKey::BlogPosts),
            _ => None,
        }
    }
}

/// Tags a successful mutation invalidates.
pub fn invalidated_tags(route: &Route) -> Vec<Tag> {
    match route {
        Route::DeleteUser(_) => vec![Tag::list(EntityKind::User)],
        Route::CreateBlogPost(_) | Route::DeleteBlogPost(_) => {
            vec![Tag::list(EntityKind::BlogPost)]
        }
        Route::UpdateBlogPost(request) => vec![Tag::item(EntityKind::BlogPost, &request.id)],
        Route::ListUsers | Route::ListBlogPosts => Vec::new(),
    }
}
