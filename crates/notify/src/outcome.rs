//! Build outcome data supplied by the host build server.

use serde::{Deserialize, Serialize};

/// Visual severity of a build result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Build succeeded
    Good,
    /// Build is unstable or was interrupted
    Warning,
    /// Build failed
    Danger,
}

impl Severity {
    /// Get the attachment color for this severity.
    ///
    /// The messaging service renders these named colors natively.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// A single commit included in a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// VCS revision id. Some VCS roots report none.
    #[serde(default)]
    pub revision: Option<String>,
    /// Author or committer name.
    #[serde(default)]
    pub user_name: String,
    /// Commit message.
    #[serde(default)]
    pub description: String,
}

impl Commit {
    /// Create a commit record.
    #[must_use]
    pub fn new(
        revision: Option<&str>,
        user_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            revision: revision.map(str::to_string),
            user_name: user_name.into(),
            description: description.into(),
        }
    }
}

/// Result and metadata for one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    /// Result label, e.g. "SUCCESS" or "FAILURE".
    pub result: String,
    /// Name of the agent that ran the build.
    #[serde(default)]
    pub agent_name: String,
    /// Attachment color: a named color or a `#rrggbb` hex code.
    #[serde(default)]
    pub color: String,
    /// Commits in chronological order.
    #[serde(default)]
    pub commits: Vec<Commit>,
    /// Human-readable build description used as the message text.
    #[serde(default)]
    pub description: String,
    /// Link to the build results page.
    #[serde(default)]
    pub build_url: Option<String>,
}

impl BuildOutcome {
    /// Create an outcome whose color is derived from `severity`.
    #[must_use]
    pub fn new(
        result: impl Into<String>,
        agent_name: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            result: result.into(),
            agent_name: agent_name.into(),
            color: severity.color().to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn with_commits(mut self, commits: Vec<Commit>) -> Self {
        self.commits = commits;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_build_url(mut self, build_url: impl Into<String>) -> Self {
        self.build_url = Some(build_url.into());
        self
    }

    /// Message text with the build link in `<url|label>` syntax.
    ///
    /// Falls back to the plain description when no build URL is known.
    #[must_use]
    pub fn description_with_link_syntax(&self) -> String {
        match self.build_url.as_deref() {
            Some(url) if !url.is_empty() => format!("<{url}|{}>", self.description),
            _ => self.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_colors() {
        assert_eq!(Severity::Good.color(), "good");
        assert_eq!(Severity::Warning.color(), "warning");
        assert_eq!(Severity::Danger.color(), "danger");
    }

    #[test]
    fn test_new_derives_color() {
        let outcome = BuildOutcome::new("FAILURE", "agent-2", Severity::Danger);
        assert_eq!(outcome.color, "danger");
        assert!(outcome.commits.is_empty());

        let outcome = outcome.with_color("#FF0000");
        assert_eq!(outcome.color, "#FF0000");
    }

    #[test]
    fn test_link_syntax() {
        let outcome = BuildOutcome::new("SUCCESS", "agent-1", Severity::Good)
            .with_description("Project :: Build #12 SUCCESS");
        assert_eq!(
            outcome.description_with_link_syntax(),
            "Project :: Build #12 SUCCESS"
        );

        let outcome = outcome.with_build_url("https://ci.example.com/build/12");
        assert_eq!(
            outcome.description_with_link_syntax(),
            "<https://ci.example.com/build/12|Project :: Build #12 SUCCESS>"
        );
    }

    #[test]
    fn test_deserialize_host_json() {
        let json = r#"{
            "result": "SUCCESS",
            "agent_name": "agent-1",
            "color": "good",
            "commits": [
                {"revision": "abc", "user_name": "alice", "description": "fix"},
                {"user_name": "bob", "description": "no revision"}
            ]
        }"#;
        let outcome: BuildOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.commits.len(), 2);
        assert_eq!(outcome.commits[0].revision.as_deref(), Some("abc"));
        assert_eq!(outcome.commits[1].revision, None);
        assert_eq!(outcome.build_url, None);
    }
}
