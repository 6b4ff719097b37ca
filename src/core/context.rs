//! CI event classification and per-run build context
//!
//! The triggering event, the release tag, and the unique build identifier
//! are computed once when the pipeline starts and passed explicitly to the
//! stages that need them. Nothing here mutates the process environment.

use chrono::{DateTime, Utc};
use std::env;
use uuid::Uuid;

/// Ref prefix marking a version-tag push
const TAG_REF_PREFIX: &str = "refs/tags/";

/// Classification of the CI event that triggered the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiEvent {
    Push,
    PullRequest,
    Tag,
}

impl CiEvent {
    /// Classify from the raw event name and git ref.
    ///
    /// A push whose ref is a version tag is a `Tag` event regardless of
    /// the event name.
    pub fn classify(event_name: &str, git_ref: &str) -> Self {
        if git_ref.starts_with(TAG_REF_PREFIX) {
            CiEvent::Tag
        } else if event_name == "pull_request" {
            CiEvent::PullRequest
        } else {
            CiEvent::Push
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CiEvent::Push => "push",
            CiEvent::PullRequest => "pull_request",
            CiEvent::Tag => "tag",
        }
    }
}

/// Values derived from the CI environment, computed once at pipeline start
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Triggering event classification
    pub event: CiEvent,

    /// Unique build name forwarded to the browser test grid
    pub build_id: String,

    /// Version string from the pushed tag, when the event is a tag push
    pub release_tag: Option<String>,

    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
}

impl BuildContext {
    /// Compute the context from explicit values.
    pub fn compute(
        event_name: &str,
        git_ref: &str,
        run_id: &str,
        repository: Option<&str>,
    ) -> Self {
        let event = CiEvent::classify(event_name, git_ref);

        let repo_name = repository
            .and_then(|r| r.split('/').nth(1))
            .unwrap_or("unknown");

        // Random suffix keeps concurrent runs of the same workflow apart
        // on the grid dashboard.
        let suffix: String = Uuid::new_v4().simple().to_string()[..5].to_string();
        let build_id = format!("{}-{}-{}-{}", repo_name, event.as_str(), run_id, suffix);

        let release_tag = git_ref
            .strip_prefix(TAG_REF_PREFIX)
            .map(|tag| tag.to_string());

        Self {
            event,
            build_id,
            release_tag,
            started_at: Utc::now(),
        }
    }

    /// Compute the context from the hosted runner's environment.
    pub fn from_env(repository: Option<&str>) -> Self {
        let event_name = env::var("GITHUB_EVENT_NAME").unwrap_or_default();
        let git_ref = env::var("GITHUB_REF").unwrap_or_default();
        let run_id = env::var("GITHUB_RUN_ID").unwrap_or_default();

        Self::compute(&event_name, &git_ref, &run_id, repository)
    }

    pub fn is_push(&self) -> bool {
        self.event == CiEvent::Push
    }

    pub fn is_pull_request(&self) -> bool {
        self.event == CiEvent::PullRequest
    }

    pub fn is_tag(&self) -> bool {
        self.event == CiEvent::Tag
    }
}
