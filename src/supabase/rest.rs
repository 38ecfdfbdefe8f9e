use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{DataError, DataService, Filter};

/// PostgREST endpoint of the managed database.
#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn with_client(http: Client, project_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    fn returning(req: RequestBuilder) -> RequestBuilder {
        req.header("Prefer", "return=representation")
    }
}

fn query_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_query_pair).collect()
}

async fn rows(res: Response) -> Result<Vec<Value>, DataError> {
    let status = res.status();
    if status == StatusCode::CONFLICT {
        return Err(DataError::Conflict(res.text().await.unwrap_or_default()));
    }
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(DataError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = res.bytes().await?;
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        single => Ok(vec![single]),
    }
}

#[async_trait]
impl DataService for PostgrestClient {
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[Filter],
    ) -> Result<Vec<Value>, DataError> {
        let mut params = vec![("select".to_string(), columns.to_string())];
        params.extend(query_pairs(filters));
        debug!(table, ?params, "postgrest select");
        let res = self
            .authorized(self.http.get(self.table_url(table)))
            .query(&params)
            .send()
            .await?;
        rows(res).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, DataError> {
        debug!(table, "postgrest insert");
        let req = self.authorized(self.http.post(self.table_url(table)));
        let res = Self::returning(req).json(&row).send().await?;
        rows(res).await
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, DataError> {
        let params = query_pairs(filters);
        debug!(table, ?params, "postgrest update");
        let req = self.authorized(self.http.patch(self.table_url(table)));
        let res = Self::returning(req)
            .query(&params)
            .json(&patch)
            .send()
            .await?;
        rows(res).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, DataError> {
        let params = query_pairs(filters);
        debug!(table, ?params, "postgrest delete");
        let req = self.authorized(self.http.delete(self.table_url(table)));
        let res = Self::returning(req).query(&params).send().await?;
        rows(res).await
    }
}
