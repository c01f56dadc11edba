use std::sync::Arc;

use crate::application::pagination::{PaginationOptions, PaginationStorage};
use crate::cache::ApiClient;

/// Orchestrates the admin views on top of the cached client.
#[derive(Clone)]
pub struct AdminService {
    pub(crate) client: ApiClient,
    pub(crate) storage: Arc<dyn PaginationStorage>,
    pub(crate) pagination: PaginationOptions,
}

impl AdminService {
    pub fn new(
        client: ApiClient,
        storage: Arc<dyn PaginationStorage>,
        pagination: PaginationOptions,
    ) -> Self {
        Self {
            client,
            storage,
            pagination,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}
