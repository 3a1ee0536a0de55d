//! Loading / error / data state delivered to callers

use crate::error::ClientError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Tri-state of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No data and no error yet
    Loading,
    /// The last fetch failed
    Error,
    /// Data is available
    Success,
}

/// Snapshot of a query as seen by one caller
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    /// Delivered payload, after reshaping
    pub data: Option<T>,
    /// Failure of the last fetch; earlier data is kept alongside it
    pub error: Option<Arc<ClientError>>,
    /// A request for this key is in flight
    pub is_fetching: bool,
    /// `data` belongs to the previous key while the current one loads
    pub is_previous_data: bool,
    /// When `data` was last written by a successful fetch
    pub data_updated_at: Option<DateTime<Utc>>,
}

impl<T> QueryState<T> {
    pub fn loading() -> Self {
        Self {
            status: QueryStatus::Loading,
            data: None,
            error: None,
            is_fetching: false,
            is_previous_data: false,
            data_updated_at: None,
        }
    }

    pub(crate) fn from_parts(
        data: Option<T>,
        error: Option<Arc<ClientError>>,
        data_updated_at: Option<DateTime<Utc>>,
        is_fetching: bool,
    ) -> Self {
        let status = match (&data, &error) {
            (_, Some(_)) => QueryStatus::Error,
            (Some(_), None) => QueryStatus::Success,
            (None, None) => QueryStatus::Loading,
        };
        Self {
            status,
            data,
            error,
            is_fetching,
            is_previous_data: false,
            data_updated_at,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        QueryState {
            status: self.status,
            data: self.data.map(f),
            error: self.error,
            is_fetching: self.is_fetching,
            is_previous_data: self.is_previous_data,
            data_updated_at: self.data_updated_at,
        }
    }
}

impl QueryState<Value> {
    /// Typed view of the payload.
    ///
    /// A payload that does not fit `T` becomes an error state carrying
    /// [`ClientError::Json`]; the cached response is left untouched.
    pub fn decode<T: DeserializeOwned>(self) -> QueryState<T> {
        let (status, data, error) = match self.data.map(serde_json::from_value).transpose() {
            Ok(data) => (self.status, data, self.error),
            Err(e) => (QueryStatus::Error, None, Some(Arc::new(ClientError::from(e)))),
        };
        QueryState {
            status,
            data,
            error,
            is_fetching: self.is_fetching,
            is_previous_data: self.is_previous_data,
            data_updated_at: self.data_updated_at,
        }
    }
}
