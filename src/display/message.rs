//! Severity-tagged HTML message fragments
//!
//! Produces a materialize `collection` list with a colored icon badge. The
//! body is inserted as-is; callers escape anything user supplied.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),
}

/// Message severity, parsed case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Success,
    Error,
    Information,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Success => "Success",
            Severity::Error => "Error",
            Severity::Information => "Information",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Severity::Warning => "priority_high",
            Severity::Success => "check",
            Severity::Error => "warning",
            Severity::Information => "help",
        }
    }

    fn circle_color(&self) -> &'static str {
        match self {
            Severity::Warning => "yellow",
            Severity::Success => "green",
            Severity::Error => "red",
            Severity::Information => "grey",
        }
    }
}

impl FromStr for Severity {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warning" => Ok(Severity::Warning),
            "success" => Ok(Severity::Success),
            "error" => Ok(Severity::Error),
            "information" => Ok(Severity::Information),
            _ => Err(MessageError::InvalidSeverity(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Render a message fragment for an already-parsed severity
pub fn render_message(severity: Severity, title: &str, body: &str) -> String {
    format!(
        concat!(
            "\n<ul class=\"collection\">\n",
            "<li class=\"collection-item avatar\">\n",
            "<i class=\"material-icons circle {color}\">{icon}</i>",
            "<span class=\"title\">{label} - {title}</span>",
            "{body}\n",
            "</li>\n",
            "</ul>\n",
        ),
        color = severity.circle_color(),
        icon = severity.icon(),
        label = severity.label(),
        title = title,
        body = body,
    )
}

/// Render a message fragment from a severity name
pub fn format_message(severity: &str, title: &str, body: &str) -> Result<String, MessageError> {
    let severity: Severity = severity.parse()?;
    Ok(render_message(severity, title, body))
}
