//! Generic repository traits for database operations.
//!
//! Every stored entity belongs to one user. The trait below gives handlers a
//! uniform CRUD surface where the owner id is always part of the lookup, so
//! another user's id behaves exactly like a missing row.

use anyhow::Result;
use diesel_async::AsyncPgConnection;
use shared_types::{
    CreateShiftRequest, CreateStudySessionRequest, CreateWorkplaceRequest, Shift, StudySession,
    UpdateShiftRequest, UpdateStudySessionRequest, UpdateWorkplaceRequest, Workplace,
};
use uuid::Uuid;

use crate::db;
use crate::models::{NewShift, NewStudySession, NewWorkplace};

/// CRUD operations for entities owned by a single user.
///
/// # Type Parameters
/// - `Entity`: The domain type returned from queries
/// - `CreateInput`: Validated request body for creating new entities
/// - `UpdateInput`: Validated request body for partial updates
#[allow(async_fn_in_trait)]
pub trait UserScopedRepository {
    type Entity;
    type CreateInput;
    type UpdateInput;

    /// Name used in "not found" errors.
    const RESOURCE: &'static str;

    async fn list(conn: &mut AsyncPgConnection, owner: Uuid) -> Result<Vec<Self::Entity>>;

    /// `Ok(None)` when the row does not exist or belongs to someone else.
    async fn get(conn: &mut AsyncPgConnection, owner: Uuid, id: Uuid)
        -> Result<Option<Self::Entity>>;

    async fn create(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        input: Self::CreateInput,
    ) -> Result<Self::Entity>;

    async fn update(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        id: Uuid,
        input: Self::UpdateInput,
    ) -> Result<Option<Self::Entity>>;

    /// Returns false when nothing was deleted.
    async fn delete(conn: &mut AsyncPgConnection, owner: Uuid, id: Uuid) -> Result<bool>;
}

pub struct Workplaces;

impl UserScopedRepository for Workplaces {
    type Entity = Workplace;
    type CreateInput = CreateWorkplaceRequest;
    type UpdateInput = UpdateWorkplaceRequest;

    const RESOURCE: &'static str = "Workplace";

    async fn list(conn: &mut AsyncPgConnection, owner: Uuid) -> Result<Vec<Workplace>> {
        db::workplaces::list_for_user(conn, owner).await
    }

    async fn get(conn: &mut AsyncPgConnection, owner: Uuid, id: Uuid) -> Result<Option<Workplace>> {
        db::workplaces::get_for_user(conn, owner, id).await
    }

    async fn create(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        input: CreateWorkplaceRequest,
    ) -> Result<Workplace> {
        db::workplaces::create(conn, NewWorkplace::from_request(owner, input)).await
    }

    async fn update(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        id: Uuid,
        input: UpdateWorkplaceRequest,
    ) -> Result<Option<Workplace>> {
        db::workplaces::update(conn, owner, id, input.into()).await
    }

    async fn delete(conn: &mut AsyncPgConnection, owner: Uuid, id: Uuid) -> Result<bool> {
        db::workplaces::delete(conn, owner, id).await
    }
}

pub struct Shifts;

impl UserScopedRepository for Shifts {
    type Entity = Shift;
    type CreateInput = CreateShiftRequest;
    type UpdateInput = UpdateShiftRequest;

    const RESOURCE: &'static str = "Shift";

    async fn list(conn: &mut AsyncPgConnection, owner: Uuid) -> Result<Vec<Shift>> {
        db::shifts::list_for_user(conn, owner, None).await
    }

    async fn get(conn: &mut AsyncPgConnection, owner: Uuid, id: Uuid) -> Result<Option<Shift>> {
        db::shifts::get_for_user(conn, owner, id).await
    }

    async fn create(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        input: CreateShiftRequest,
    ) -> Result<Shift> {
        db::shifts::create(conn, NewShift::from_request(owner, input)).await
    }

    async fn update(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        id: Uuid,
        input: UpdateShiftRequest,
    ) -> Result<Option<Shift>> {
        db::shifts::update(conn, owner, id, input.into()).await
    }

    async fn delete(conn: &mut AsyncPgConnection, owner: Uuid, id: Uuid) -> Result<bool> {
        db::shifts::delete(conn, owner, id).await
    }
}

pub struct StudySessions;

impl UserScopedRepository for StudySessions {
    type Entity = StudySession;
    type CreateInput = CreateStudySessionRequest;
    type UpdateInput = UpdateStudySessionRequest;

    const RESOURCE: &'static str = "Study session";

    async fn list(conn: &mut AsyncPgConnection, owner: Uuid) -> Result<Vec<StudySession>> {
        db::study_sessions::list_for_user(conn, owner).await
    }

    async fn get(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        id: Uuid,
    ) -> Result<Option<StudySession>> {
        db::study_sessions::get_for_user(conn, owner, id).await
    }

    async fn create(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        input: CreateStudySessionRequest,
    ) -> Result<StudySession> {
        db::study_sessions::create(conn, NewStudySession::from_request(owner, input)).await
    }

    async fn update(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        id: Uuid,
        input: UpdateStudySessionRequest,
    ) -> Result<Option<StudySession>> {
        db::study_sessions::update(conn, owner, id, input.into()).await
    }

    async fn delete(conn: &mut AsyncPgConnection, owner: Uuid, id: Uuid) -> Result<bool> {
        db::study_sessions::delete(conn, owner, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_repositories() {
        fn _check<T: UserScopedRepository>() {}
        _check::<Workplaces>();
        _check::<Shifts>();
        _check::<StudySessions>();
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(Workplaces::RESOURCE, "Workplace");
        assert_eq!(Shifts::RESOURCE, "Shift");
        assert_eq!(StudySessions::RESOURCE, "Study session");
    }
}
