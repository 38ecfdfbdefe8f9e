use serde::Deserialize;
use serde_json::Value;

use crate::supabase::{DataError, DataService, Filter};
use crate::users::repo_types::{NewUser, RecordId, User};

pub const USERS_TABLE: &str = "users";

#[derive(Deserialize)]
struct IdOnly {
    id: RecordId,
}

fn decode_rows<T: for<'de> Deserialize<'de>>(rows: Vec<Value>) -> Result<Vec<T>, DataError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(DataError::from))
        .collect()
}

impl User {
    /// Id of any row already holding `email` or `mobile`.
    pub async fn find_conflicting(
        data: &dyn DataService,
        email: &str,
        mobile: &str,
    ) -> Result<Option<RecordId>, DataError> {
        let filter = Filter::or([Filter::eq("email", email), Filter::eq("mobile", mobile)]);
        let rows = data.select(USERS_TABLE, "id", &[filter]).await?;
        Ok(decode_rows::<IdOnly>(rows)?.into_iter().next().map(|r| r.id))
    }

    pub async fn find_id_by_email(
        data: &dyn DataService,
        email: &str,
    ) -> Result<Option<RecordId>, DataError> {
        let rows = data
            .select(USERS_TABLE, "id", &[Filter::eq("email", email)])
            .await?;
        Ok(decode_rows::<IdOnly>(rows)?.into_iter().next().map(|r| r.id))
    }

    pub async fn find_by_id(data: &dyn DataService, id: &str) -> Result<Option<User>, DataError> {
        let rows = data
            .select(USERS_TABLE, "*", &[Filter::eq("id", id)])
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    pub async fn list_all(data: &dyn DataService) -> Result<Vec<User>, DataError> {
        let rows = data.select(USERS_TABLE, "*", &[]).await?;
        decode_rows(rows)
    }

    /// Inserts and returns the stored row, or `None` when the store echoed nothing back.
    pub async fn create(
        data: &dyn DataService,
        new_user: &NewUser<'_>,
    ) -> Result<Option<User>, DataError> {
        let rows = data
            .insert(USERS_TABLE, serde_json::to_value(new_user)?)
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    /// Applies `patch` to the row with `id`; `None` when no row matched.
    pub async fn update(
        data: &dyn DataService,
        id: &str,
        patch: Value,
    ) -> Result<Option<User>, DataError> {
        let rows = data
            .update(USERS_TABLE, patch, &[Filter::eq("id", id)])
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    /// Number of rows removed.
    pub async fn delete(data: &dyn DataService, id: &str) -> Result<usize, DataError> {
        let rows = data.delete(USERS_TABLE, &[Filter::eq("id", id)]).await?;
        Ok(rows.len())
    }
}
