//! Finished log records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    ContextSnapshot, Level, LoggerName,
    render::{Arg, CauseChain, render},
};

/// A rendered log call, ready to be handed to a [`Sink`](crate::Sink).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub level: Level,
    pub logger: LoggerName,
    pub template: String,
    /// Textual forms of the arguments in order, surplus ones included.
    /// A detached cause is not repeated here.
    pub args: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<CauseChain>,
    pub context: ContextSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Renders `template` with `args` and captures `context`.
    ///
    /// This does not consult any level gate.
    #[must_use]
    pub fn new(
        level: Level,
        logger: LoggerName,
        template: impl Into<String>,
        args: &[Arg],
        context: ContextSnapshot,
    ) -> Self {
        let template = template.into();
        let rendered = render(&template, args);
        let inlined = if rendered.cause.is_some() {
            &args[..args.len() - 1]
        } else {
            args
        };

        Self {
            level,
            logger,
            template,
            args: inlined.iter().map(Arg::to_text).collect(),
            message: rendered.message,
            cause: rendered.cause,
            context,
            timestamp: Utc::now(),
        }
    }
}
