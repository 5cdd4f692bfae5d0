//! Request scoped metadata attached to every record

use logit_core::UNKNOWN_OP;
use std::borrow::Cow;

/// Generate a fresh trace identifier
pub fn new_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Operation name and trace identifier for one logical request.
///
/// Contexts are cheap values; derive a new one with [`LogContext::with_op`]
/// or [`LogContext::with_trace`] rather than mutating a shared one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    op: Option<String>,
    trace_id: Option<String>,
}

impl LogContext {
    /// Context with an operation and a trace id, generating the id when absent
    pub fn new(op: impl Into<String>, trace_id: Option<&str>) -> Self {
        Self {
            op: Some(op.into()),
            trace_id: Some(trace_id.map_or_else(new_trace_id, str::to_string)),
        }
    }

    /// Empty context: unknown operation, no trace id
    pub fn background() -> Self {
        Self::default()
    }

    /// Fresh context carrying only a trace id (generated when absent)
    pub fn trace(trace_id: Option<&str>) -> Self {
        Self::background().with_trace(trace_id)
    }

    /// Copy of this context with the operation replaced
    pub fn with_op(&self, op: impl Into<String>) -> Self {
        Self {
            op: Some(op.into()),
            trace_id: self.trace_id.clone(),
        }
    }

    /// Copy of this context with the trace id replaced (generated when absent)
    pub fn with_trace(&self, trace_id: Option<&str>) -> Self {
        Self {
            op: self.op.clone(),
            trace_id: Some(trace_id.map_or_else(new_trace_id, str::to_string)),
        }
    }

    /// Operation name, `"unknown"` when none was set
    pub fn op(&self) -> &str {
        self.op.as_deref().unwrap_or(UNKNOWN_OP)
    }

    /// Trace id. A context without one yields a new id on every call.
    pub fn trace_id(&self) -> Cow<'_, str> {
        match &self.trace_id {
            Some(id) => Cow::Borrowed(id),
            None => Cow::Owned(new_trace_id()),
        }
    }

    pub fn has_op(&self) -> bool {
        self.op.is_some()
    }

    pub fn has_trace_id(&self) -> bool {
        self.trace_id.is_some()
    }
}
