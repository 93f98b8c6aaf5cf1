use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{
        deadpool::{Object, Pool},
        AsyncDieselConnectionManager, ManagerConfig,
    },
    AsyncPgConnection, RunQueryDsl,
};
use shared_types::{Shift, StudySession, User, Workplace};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::{
    NewShift, NewStudySession, NewUser, NewWorkplace, ShiftChanges, ShiftRow, StudySessionChanges,
    StudySessionRow, UserRow, WorkplaceChanges,
};

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConn = Object<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // The connection object drives the socket; it must be polled for the client to work.
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

/// Build the connection pool. No connection is opened until first use.
pub fn establish_connection_pool(config: &AppConfig) -> anyhow::Result<DbPool> {
    let manager = if config.database_tls {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            config.database_url.clone(),
            manager_config,
        )
    } else {
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url.clone())
    };

    let pool = Pool::builder(manager)
        .max_size(config.database_pool_size.max(1))
        .build()?;

    Ok(pool)
}

pub async fn get_conn(pool: &DbPool) -> Result<DbConn, ApiError> {
    Ok(pool.get().await?)
}

// User database operations
pub mod users {
    use super::*;

    pub async fn find_by_email(
        conn: &mut AsyncPgConnection,
        email_val: &str,
    ) -> anyhow::Result<Option<UserRow>> {
        use crate::schema::users::dsl::*;

        let user = users
            .filter(email.eq(email_val.to_lowercase()))
            .select(UserRow::as_select())
            .first::<UserRow>(conn)
            .await
            .optional()?;

        Ok(user)
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> anyhow::Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let row = users
            .filter(id.eq(user_id))
            .select(UserRow::as_select())
            .first::<UserRow>(conn)
            .await
            .optional()?;

        Ok(row.map(Into::into))
    }

    /// Insert a user. Returns `Ok(None)` when the email is already registered.
    pub async fn create(
        conn: &mut AsyncPgConnection,
        email_val: &str,
        name_val: Option<&str>,
        password_hash_val: &str,
    ) -> anyhow::Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let normalized = email_val.to_lowercase();
        let result = diesel::insert_into(users)
            .values(NewUser {
                email: &normalized,
                name: name_val,
                password_hash: password_hash_val,
            })
            .returning(UserRow::as_returning())
            .get_result::<UserRow>(conn)
            .await;

        match result {
            Ok(row) => Ok(Some(row.into())),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// Workplace database operations
pub mod workplaces {
    use super::*;

    pub async fn list_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
    ) -> anyhow::Result<Vec<Workplace>> {
        use crate::schema::workplaces::dsl::*;

        let items = workplaces
            .filter(user_id.eq(owner))
            .order_by(name.asc())
            .load::<Workplace>(conn)
            .await?;

        Ok(items)
    }

    pub async fn get_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        workplace_id: Uuid,
    ) -> anyhow::Result<Option<Workplace>> {
        use crate::schema::workplaces::dsl::*;

        let item = workplaces
            .filter(id.eq(workplace_id))
            .filter(user_id.eq(owner))
            .first::<Workplace>(conn)
            .await
            .optional()?;

        Ok(item)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_workplace: NewWorkplace,
    ) -> anyhow::Result<Workplace> {
        use crate::schema::workplaces::dsl::*;

        let created = diesel::insert_into(workplaces)
            .values(new_workplace)
            .get_result::<Workplace>(conn)
            .await?;

        Ok(created)
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        workplace_id: Uuid,
        changes: WorkplaceChanges,
    ) -> anyhow::Result<Option<Workplace>> {
        use crate::schema::workplaces::dsl::*;

        let updated = diesel::update(workplaces.filter(id.eq(workplace_id)).filter(user_id.eq(owner)))
            .set(changes)
            .get_result::<Workplace>(conn)
            .await
            .optional()?;

        Ok(updated)
    }

    /// Returns whether a row was removed. Shifts at the workplace cascade.
    pub async fn delete(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        workplace_id: Uuid,
    ) -> anyhow::Result<bool> {
        use crate::schema::workplaces::dsl::*;

        let deleted = diesel::delete(workplaces.filter(id.eq(workplace_id)).filter(user_id.eq(owner)))
            .execute(conn)
            .await?;

        Ok(deleted > 0)
    }
}

// Shift database operations
pub mod shifts {
    use super::*;

    pub async fn list_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        workplace_filter: Option<Uuid>,
    ) -> anyhow::Result<Vec<Shift>> {
        use crate::schema::shifts::dsl::*;

        let mut query = shifts
            .filter(user_id.eq(owner))
            .select(ShiftRow::as_select())
            .order_by(start_datetime.asc())
            .into_boxed();

        if let Some(wid) = workplace_filter {
            query = query.filter(workplace_id.eq(wid));
        }

        let rows = query.load::<ShiftRow>(conn).await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        shift_id: Uuid,
    ) -> anyhow::Result<Option<Shift>> {
        use crate::schema::shifts::dsl::*;

        let row = shifts
            .filter(id.eq(shift_id))
            .filter(user_id.eq(owner))
            .select(ShiftRow::as_select())
            .first::<ShiftRow>(conn)
            .await
            .optional()?;

        Ok(row.map(Into::into))
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_shift: NewShift) -> anyhow::Result<Shift> {
        use crate::schema::shifts::dsl::*;

        let row = diesel::insert_into(shifts)
            .values(new_shift)
            .returning(ShiftRow::as_returning())
            .get_result::<ShiftRow>(conn)
            .await?;

        Ok(row.into())
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        shift_id: Uuid,
        changes: ShiftChanges,
    ) -> anyhow::Result<Option<Shift>> {
        use crate::schema::shifts::dsl::*;

        let row = diesel::update(shifts.filter(id.eq(shift_id)).filter(user_id.eq(owner)))
            .set(changes)
            .returning(ShiftRow::as_returning())
            .get_result::<ShiftRow>(conn)
            .await
            .optional()?;

        Ok(row.map(Into::into))
    }

    pub async fn delete(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        shift_id: Uuid,
    ) -> anyhow::Result<bool> {
        use crate::schema::shifts::dsl::*;

        let deleted = diesel::delete(shifts.filter(id.eq(shift_id)).filter(user_id.eq(owner)))
            .execute(conn)
            .await?;

        Ok(deleted > 0)
    }
}

// Study session database operations
pub mod study_sessions {
    use super::*;

    pub async fn list_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
    ) -> anyhow::Result<Vec<StudySession>> {
        use crate::schema::study_sessions::dsl::*;

        let rows = study_sessions
            .filter(user_id.eq(owner))
            .select(StudySessionRow::as_select())
            .order_by(start_datetime.asc())
            .load::<StudySessionRow>(conn)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        session_id: Uuid,
    ) -> anyhow::Result<Option<StudySession>> {
        use crate::schema::study_sessions::dsl::*;

        let row = study_sessions
            .filter(id.eq(session_id))
            .filter(user_id.eq(owner))
            .select(StudySessionRow::as_select())
            .first::<StudySessionRow>(conn)
            .await
            .optional()?;

        Ok(row.map(Into::into))
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_session: NewStudySession,
    ) -> anyhow::Result<StudySession> {
        use crate::schema::study_sessions::dsl::*;

        let row = diesel::insert_into(study_sessions)
            .values(new_session)
            .returning(StudySessionRow::as_returning())
            .get_result::<StudySessionRow>(conn)
            .await?;

        Ok(row.into())
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        session_id: Uuid,
        changes: StudySessionChanges,
    ) -> anyhow::Result<Option<StudySession>> {
        use crate::schema::study_sessions::dsl::*;

        let row = diesel::update(
            study_sessions
                .filter(id.eq(session_id))
                .filter(user_id.eq(owner)),
        )
        .set(changes)
        .returning(StudySessionRow::as_returning())
        .get_result::<StudySessionRow>(conn)
        .await
        .optional()?;

        Ok(row.map(Into::into))
    }

    pub async fn delete(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        session_id: Uuid,
    ) -> anyhow::Result<bool> {
        use crate::schema::study_sessions::dsl::*;

        let deleted = diesel::delete(
            study_sessions
                .filter(id.eq(session_id))
                .filter(user_id.eq(owner)),
        )
        .execute(conn)
        .await?;

        Ok(deleted > 0)
    }
}
