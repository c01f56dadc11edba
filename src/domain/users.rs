//! User table helpers: free-text search and column sorting.

use std::cmp::Ordering;

use serde::Deserialize;

use super::entities::User;

/// Keep users where any field contains `term`, case-insensitively.
///
/// An empty term returns every user. The numeric id is matched on its decimal text.
pub fn filter_users(users: &[User], term: &str) -> Vec<User> {
    if term.is_empty() {
        return users.to_vec();
    }

    let needle = term.to_lowercase();
    users
        .iter()
        .filter(|user| field_values(user).any(|value| value.to_lowercase().contains(&needle)))
        .cloned()
        .collect()
}

fn field_values(user: &User) -> impl Iterator<Item = String> + '_ {
    [
        user.id.to_string(),
        user.first_name.clone(),
        user.last_name.clone(),
        user.email.clone(),
        user.gender.clone(),
        user.ip_address.clone(),
    ]
    .into_iter()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortColumn {
    Id,
    FirstName,
    LastName,
    Email,
    Gender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascend,
    Descend,
}

fn compare(column: UserSortColumn, a: &User, b: &User) -> Ordering {
    match column {
        UserSortColumn::Id => a.id.cmp(&b.id),
        UserSortColumn::FirstName => a.first_name.cmp(&b.first_name),
        UserSortColumn::LastName => a.last_name.cmp(&b.last_name),
        UserSortColumn::Email => a.email.cmp(&b.email),
        UserSortColumn::Gender => a.gender.cmp(&b.gender),
    }
}

/// Stable sort by a single column.
pub fn sort_users(users: &mut [User], column: UserSortColumn, order: SortOrder) {
    users.sort_by(|a, b| match order {
        SortOrder::Ascend => compare(column, a, b),
        SortOrder::Descend => compare(column, b, a),
    });
}
