//! In-memory collaborators for router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{AuthIdentity, AuthService, AuthServiceError, DataError, DataService, Filter};

#[derive(Default)]
pub struct FakeDataService {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicI64,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    /// When set, every call fails with this status.
    pub fail_with: Mutex<Option<u16>>,
    /// When set, calls after the first `n` fail with 503.
    pub fail_after: Mutex<Option<usize>>,
    /// Writes fail as conflicts the duplicate pre-check cannot see.
    pub conflict_on_write: Mutex<bool>,
    calls: AtomicUsize,
}

impl FakeDataService {
    pub fn seed(&self, table: &str, mut row: Value) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if row.get("id").is_none() {
            row["id"] = json!(id);
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn check_failure(&self) -> Result<(), DataError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let status = match (*self.fail_with.lock().unwrap(), *self.fail_after.lock().unwrap()) {
            (Some(status), _) => status,
            (None, Some(n)) if call >= n => 503,
            _ => return Ok(()),
        };
        Err(DataError::Status {
            status,
            body: "injected failure".into(),
        })
    }

    fn check_conflict(&self) -> Result<(), DataError> {
        if *self.conflict_on_write.lock().unwrap() {
            return Err(DataError::Conflict("duplicate key value".into()));
        }
        Ok(())
    }
}

fn matches(filter: &Filter, row: &Value) -> bool {
    match filter {
        Filter::Eq { column, value } => row
            .get(column)
            .map(|v| value_eq(v, value))
            .unwrap_or(false),
        Filter::Or(inner) => inner.iter().any(|f| matches(f, row)),
    }
}

fn value_eq(v: &Value, expected: &str) -> bool {
    match v {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        Value::Null => expected == "null",
        _ => false,
    }
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(f, row))
}

#[async_trait]
impl DataService for FakeDataService {
    async fn select(
        &self,
        table: &str,
        _columns: &str,
        filters: &[Filter],
    ) -> Result<Vec<Value>, DataError> {
        self.check_failure()?;
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|r| matches_all(r, filters))
            .collect())
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Vec<Value>, DataError> {
        self.check_failure()?;
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_conflict()?;
        let duplicate = self.rows(table).iter().any(|existing| {
            ["email", "mobile"]
                .iter()
                .any(|col| existing.get(col).is_some() && existing.get(col) == row.get(col))
        });
        if duplicate {
            return Err(DataError::Conflict("duplicate key value".into()));
        }
        row["created_at"] = json!("2025-01-01T00:00:00Z");
        Ok(vec![self.seed(table, row)])
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, DataError> {
        self.check_failure()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check_conflict()?;
        let mut tables = self.tables.lock().unwrap();
        let mut changed = Vec::new();
        for row in tables.entry(table.to_string()).or_default().iter_mut() {
            if matches_all(row, filters) {
                if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                    for (k, v) in fields {
                        target.insert(k.clone(), v.clone());
                    }
                }
                changed.push(row.clone());
            }
        }
        Ok(changed)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, DataError> {
        self.check_failure()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let (removed, kept): (Vec<Value>, Vec<Value>) =
            rows.drain(..).partition(|r| matches_all(r, filters));
        *rows = kept;
        Ok(removed)
    }
}

#[derive(Default)]
pub struct FakeAuthService {
    accounts: Mutex<HashMap<String, (String, String)>>,
    pub unavailable: Mutex<bool>,
    /// When set, sign-in is refused with this provider code.
    pub refused: Mutex<Option<String>>,
}

impl FakeAuthService {
    pub fn with_account(self, email: &str, password: &str, provider_id: &str) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), provider_id.to_string()));
        self
    }
}

#[async_trait]
impl AuthService for FakeAuthService {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, AuthServiceError> {
        if *self.unavailable.lock().unwrap() {
            return Err(AuthServiceError::Provider("503 Service Unavailable".into()));
        }
        if let Some(code) = self.refused.lock().unwrap().clone() {
            return Err(AuthServiceError::Refused(code));
        }
        match self.accounts.lock().unwrap().get(email) {
            Some((expected, provider_id)) if expected == password => Ok(AuthIdentity {
                provider_id: provider_id.clone(),
                email: email.to_string(),
            }),
            _ => Err(AuthServiceError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_match_numbers_and_strings() {
        let row = json!({"id": 7, "email": "a@b.io", "mobile": "555"});
        assert!(matches(&Filter::eq("id", "7"), &row));
        assert!(!matches(&Filter::eq("id", "8"), &row));
        assert!(matches(
            &Filter::or([Filter::eq("email", "x@y.io"), Filter::eq("mobile", "555")]),
            &row
        ));
        assert!(!matches(&Filter::eq("missing", "1"), &row));
    }
}
