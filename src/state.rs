use crate::db::DbPool;
use crate::storage::SharedBlobStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub store: SharedBlobStore,
}
