//! Per-call context carried between lifecycle hooks.

use std::fmt::{self, Debug};
use std::panic::Location;
use std::time::{Duration, Instant};

use crate::query::operation::operation_label;

/// Source location of the code that issued a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerLocation {
    pub file: String,
    pub line: u32,
}

impl CallerLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the caller of this function (or of the outermost
    /// `#[track_caller]` frame above it).
    #[track_caller]
    pub fn here() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for CallerLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Description of a data-access call before it starts.
#[derive(Debug, Clone, Default)]
pub struct QueryCall {
    pub statement: Option<String>,
    pub parameters: String,
    pub caller: Option<CallerLocation>,
}

impl QueryCall {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: Some(statement.into()),
            ..Default::default()
        }
    }

    /// A call with no statement text (e.g. a failed connection checkout).
    pub fn without_statement() -> Self {
        Self::default()
    }

    /// Attach bound parameters, rendered with their `Debug` form.
    pub fn with_parameters<P: Debug + ?Sized>(mut self, parameters: &P) -> Self {
        self.parameters = format!("{parameters:?}");
        self
    }

    pub fn with_caller(mut self, caller: CallerLocation) -> Self {
        self.caller = Some(caller);
        self
    }
}

/// State of one in-flight call, created by `on_start`.
///
/// Terminal hooks take the context by value, so a call can be finalized at
/// most once.
#[derive(Debug)]
pub struct QueryCallContext {
    call: QueryCall,
    started_at: Instant,
}

impl QueryCallContext {
    pub fn start(call: QueryCall) -> Self {
        Self {
            call,
            started_at: Instant::now(),
        }
    }

    pub fn statement(&self) -> Option<&str> {
        self.call.statement.as_deref()
    }

    pub fn parameters(&self) -> &str {
        &self.call.parameters
    }

    pub fn caller(&self) -> Option<&CallerLocation> {
        self.call.caller.as_ref()
    }

    pub fn operation(&self) -> String {
        operation_label(self.statement())
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
