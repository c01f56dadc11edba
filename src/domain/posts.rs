//! Blog post rules: draft validation, id generation and display formatting.

use time::{
    Date, OffsetDateTime, format_description::FormatItem, format_description::well_known::Rfc3339,
    macros::format_description,
};
use uuid::Uuid;

use super::entities::{BlogPost, PostDraft, UserId};
use super::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const BODY_MAX_CHARS: usize = 2000;

pub const DISPLAY_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day], [year]");
const PLAIN_DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const ISO_MILLIS_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

pub const UNKNOWN_DATE: &str = "Unknown date";

/// Validate a draft submitted from the "add post" form.
pub fn validate_new_draft(draft: &PostDraft) -> Result<(), DomainError> {
    validate_edit_draft(draft)?;

    if draft.title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::validation(
            "title",
            format!("Title cannot be longer than {TITLE_MAX_CHARS} characters"),
        ));
    }
    if draft.body.chars().count() > BODY_MAX_CHARS {
        return Err(DomainError::validation(
            "body",
            format!("Content cannot be longer than {BODY_MAX_CHARS} characters"),
        ));
    }

    Ok(())
}

/// Validate a draft submitted from the "edit post" form. Only presence is checked.
pub fn validate_edit_draft(draft: &PostDraft) -> Result<(), DomainError> {
    if draft.title.trim().is_empty() {
        return Err(DomainError::validation(
            "title",
            "Please enter the blog post title",
        ));
    }
    if draft.body.trim().is_empty() {
        return Err(DomainError::validation(
            "body",
            "Please enter the blog post content",
        ));
    }
    Ok(())
}

/// Generate a post id of the form `blog-<unix millis>-<0..999>`.
pub fn generate_post_id(now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let suffix = Uuid::new_v4().as_u128() % 1000;
    format!("blog-{millis}-{suffix}")
}

/// Render a UTC timestamp with millisecond precision, e.g. `2024-01-05T10:00:00.000Z`.
pub fn iso_timestamp(now: OffsetDateTime) -> Result<String, DomainError> {
    now.to_offset(time::UtcOffset::UTC)
        .format(ISO_MILLIS_FORMAT)
        .map_err(DomainError::from)
}

/// Build the record for a new post owned by `user_id`.
pub fn new_blog_post(
    user_id: UserId,
    draft: PostDraft,
    now: OffsetDateTime,
) -> Result<BlogPost, DomainError> {
    validate_new_draft(&draft)?;

    Ok(BlogPost {
        id: generate_post_id(now),
        title: draft.title,
        body: draft.body,
        user_id,
        date_posted: iso_timestamp(now)?,
    })
}

/// Posts belonging to a single user, in backend order.
pub fn posts_for_user(posts: &[BlogPost], user_id: UserId) -> Vec<BlogPost> {
    posts
        .iter()
        .filter(|post| post.user_id == user_id)
        .cloned()
        .collect()
}

/// Format a stored timestamp as `MMM dd, yyyy`.
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates; anything else
/// renders as [`UNKNOWN_DATE`].
pub fn format_date(value: &str) -> String {
    let date = OffsetDateTime::parse(value, &Rfc3339)
        .map(|timestamp| timestamp.date())
        .or_else(|_| Date::parse(value, PLAIN_DATE_FORMAT));

    date.ok()
        .and_then(|date| date.format(DISPLAY_DATE_FORMAT).ok())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}
