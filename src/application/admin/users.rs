use std::sync::Arc;

use tracing::{info, warn};

use postdeck_api_types::{ActionResponse, PageResponse};

use crate::application::pagination::PaginationStore;
use crate::domain::entities::{User, UserId};
use crate::domain::users::{filter_users, sort_users};

use super::service::AdminService;
use super::types::{
    AdminError, MSG_USER_DELETE_FAILED, MSG_USER_DELETED, MSG_USERS_FETCH_FAILED,
    USER_TABLE_STORAGE_KEY, UserTableQuery,
};

impl AdminService {
    /// One page of the user table, after search and sort.
    ///
    /// `page`/`pageSize` in the query are a pagination change and are saved
    /// under the user table's storage key. When the user query fails but an
    /// earlier result is cached, that result is shown with a notice.
    pub async fn user_page(&self, query: UserTableQuery) -> Result<PageResponse<User>, AdminError> {
        let (users, notice) = match self.client.users().await {
            Ok(users) => (users, None),
            Err(err) => match err.stale {
                Some(users) => {
                    warn!(error = %err.error, "showing last fetched users");
                    (users, Some(MSG_USERS_FETCH_FAILED.to_string()))
                }
                None => return Err(AdminError::failed(MSG_USERS_FETCH_FAILED, err.error)),
            },
        };

        let mut rows = filter_users(&users, query.search.as_deref().unwrap_or_default());
        if let Some(column) = query.sort {
            sort_users(&mut rows, column, query.order.unwrap_or_default());
        }

        let mut store = PaginationStore::new(
            Arc::clone(&self.storage),
            USER_TABLE_STORAGE_KEY,
            self.pagination.clone(),
            rows.len(),
        );
        if query.page.is_some() || query.page_size.is_some() {
            let state = store.state();
            store.change(
                query.page.unwrap_or(state.current),
                query.page_size.unwrap_or(state.page_size),
            );
        }

        let state = store.state();
        Ok(PageResponse {
            items: store.slice(&rows).to_vec(),
            current: state.current.get(),
            page_size: state.page_size.get(),
            total: state.total,
            page_size_options: store.options().page_size_options.clone(),
            notice,
        })
    }

    /// Delete a user. Their posts are left in place.
    pub async fn delete_user(&self, id: UserId) -> Result<ActionResponse<UserId>, AdminError> {
        match self.client.delete_user(id).await {
            Ok(_) => {
                info!(user_id = id, "user deleted");
                Ok(ActionResponse {
                    message: MSG_USER_DELETED.to_string(),
                    data: id,
                })
            }
            Err(err) => Err(AdminError::failed(MSG_USER_DELETE_FAILED, err)),
        }
    }
}
