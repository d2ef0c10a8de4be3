//! Message payload construction.
//!
//! Turns a [`BuildOutcome`] into the single rich attachment that accompanies
//! the message text: one full-width field naming the agent and, when the
//! build has commits, one field listing the most recent of them.

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::outcome::{BuildOutcome, Commit};

/// Maximum number of commits rendered in the commits field.
pub const MAX_COMMITS: usize = 5;

/// Maximum number of revision characters displayed per commit.
pub const REVISION_DISPLAY_LEN: usize = 10;

/// Title of the commits field.
pub const COMMITS_FIELD_TITLE: &str = "Commits";

/// A rich-message block rendered by the messaging client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub fallback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,
    pub color: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A title/value pair inside an [`Attachment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    /// Hint to render the field at half width.
    pub short: bool,
}

impl Attachment {
    #[must_use]
    pub fn new(
        fallback: impl Into<String>,
        text: Option<String>,
        pretext: Option<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            fallback: fallback.into(),
            text,
            pretext,
            color: color.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, keeping insertion order.
    pub fn add_field(&mut self, title: impl Into<String>, value: impl Into<String>, short: bool) {
        self.fields.push(Field {
            title: title.into(),
            value: value.into(),
            short,
        });
    }
}

/// Build the attachment summarizing a build outcome.
#[must_use]
pub fn build_attachment(outcome: &BuildOutcome) -> Attachment {
    let mut attachment = Attachment::new(&outcome.result, None, None, &outcome.color);
    attachment.add_field(
        &outcome.result,
        format!("Agent: {}", outcome.agent_name),
        false,
    );

    if let Some(commits) = render_commits(&outcome.commits) {
        attachment.add_field(COMMITS_FIELD_TITLE, commits, false);
    }

    attachment
}

/// Render the commits field value, or `None` when there are no commits.
///
/// At most [`MAX_COMMITS`] commits are listed, oldest first. Overflow is
/// summarized by a trailing `(+ N more)` line.
#[must_use]
pub fn render_commits(commits: &[Commit]) -> Option<String> {
    if commits.is_empty() {
        return None;
    }

    let mut rendered = commits
        .iter()
        .take(MAX_COMMITS)
        .map(render_commit)
        .collect::<Vec<_>>()
        .join("\n");

    if commits.len() > MAX_COMMITS {
        rendered.push('\n');
        rendered.push_str(&format!("(+ {} more)\n", commits.len() - MAX_COMMITS));
    }

    Some(rendered)
}

fn render_commit(commit: &Commit) -> String {
    format!(
        "{} :: {} :: {}",
        short_revision(commit.revision.as_deref()),
        commit.user_name,
        commit.description
    )
}

/// Display form of a revision: its first ten characters, or "" when absent.
#[must_use]
pub fn short_revision(revision: Option<&str>) -> String {
    revision
        .unwrap_or_default()
        .chars()
        .take(REVISION_DISPLAY_LEN)
        .collect()
}

/// Serialize attachments to the JSON array the messaging API expects.
pub fn attachments_to_json(attachments: &[Attachment]) -> Result<String, NotifyError> {
    Ok(serde_json::to_string(attachments)?)
}
