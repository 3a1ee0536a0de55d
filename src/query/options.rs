//! Per-query behavior switches

use crate::error::{ClientError, Result};
use serde_json::Value;
use std::time::Duration;

/// Path of a sub-field to deliver instead of the whole response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Select(&'static [&'static str]);

impl Select {
    pub const fn path(fields: &'static [&'static str]) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.0
    }

    /// Walk the path; a missing field is an invalid response
    pub fn apply(&self, value: &Value) -> Result<Value> {
        let mut current = value;
        for field in self.0 {
            current = current.get(*field).ok_or_else(|| {
                ClientError::InvalidResponse(format!("missing field `{}`", self.0.join(".")))
            })?;
        }
        Ok(current.clone())
    }
}

/// Options of one cached query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Disabled queries never hit the network
    pub enabled: bool,
    /// Reshape the cached response before delivery
    pub select: Option<Select>,
    /// Background polling period for observers
    pub refetch_interval: Option<Duration>,
    /// Keep polling while the application is not focused
    pub refetch_interval_in_background: bool,
    /// Refetch when the application regains focus
    pub refetch_on_window_focus: bool,
    /// Return failures as `Err` instead of an error state
    pub use_error_boundary: bool,
    /// Show the previous key's data while a new key loads
    pub keep_previous_data: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            select: None,
            refetch_interval: None,
            refetch_interval_in_background: false,
            refetch_on_window_focus: false,
            use_error_boundary: false,
            keep_previous_data: false,
        }
    }
}

impl QueryOptions {
    pub fn select(mut self, select: Select) -> Self {
        self.select = Some(select);
        self
    }

    pub fn refetch_interval(mut self, period: Duration) -> Self {
        self.refetch_interval = Some(period);
        self
    }

    pub fn refetch_interval_in_background(mut self, enabled: bool) -> Self {
        self.refetch_interval_in_background = enabled;
        self
    }

    pub fn refetch_on_window_focus(mut self, enabled: bool) -> Self {
        self.refetch_on_window_focus = enabled;
        self
    }

    pub fn use_error_boundary(mut self, enabled: bool) -> Self {
        self.use_error_boundary = enabled;
        self
    }

    pub fn keep_previous_data(mut self, enabled: bool) -> Self {
        self.keep_previous_data = enabled;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
