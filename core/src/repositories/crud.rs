//! Generic CRUD contracts
//!
//! `M` is the persisted model and `S` the input schema used to create or
//! update it. Implementations are built around one session handle and
//! report every failure as a [`ServiceError`](crate::errors::ServiceError).

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::TableName;
use crate::errors::ServiceResult;

/// CRUD operations over a blocking session
pub trait GeneralCrudSync<M: TableName, S> {
    type Session;

    fn from_session(session: Self::Session) -> Self
    where
        Self: Sized;

    fn get_objects(&mut self) -> ServiceResult<Vec<M>>;

    fn create_object(&mut self, object: S) -> ServiceResult<M>;

    fn update_object(&mut self, id: Uuid, object: S) -> ServiceResult<M>;

    fn delete_object(&mut self, id: Uuid) -> ServiceResult<()>;

    fn get_object_by_id(&mut self, id: Uuid) -> ServiceResult<M>;
}

/// CRUD operations over an async session
#[async_trait]
pub trait GeneralCrudAsync<M, S>: Send
where
    M: TableName + Send + 'static,
    S: Send + 'static,
{
    type Session: Send;

    fn from_session(session: Self::Session) -> Self
    where
        Self: Sized;

    async fn get_objects(&mut self) -> ServiceResult<Vec<M>>;

    async fn create_object(&mut self, object: S) -> ServiceResult<M>;

    async fn update_object(&mut self, id: Uuid, object: S) -> ServiceResult<M>;

    async fn delete_object(&mut self, id: Uuid) -> ServiceResult<()>;

    async fn get_object_by_id(&mut self, id: Uuid) -> ServiceResult<M>;
}
