//! Per-request session context.
//!
//! The host application authenticates the caller, checks capabilities and
//! resolves the course/activity pair; this crate only consumes the result
//! as a read-only value threaded through the pipeline. Nothing here is
//! persisted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::profiles::InstanceType;

/// Raised when a session context cannot be assembled for a caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("activity {id} does not exist")]
    UnknownActivity { id: i64 },

    #[error("access denied: {reason}")]
    AccessDenied { reason: String },
}

/// Group mode of the course module hosting the activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// Groups are not used
    None,
    /// Members only see their own group
    Separate,
    /// Members see every group
    Visible,
}

/// One conferencing activity instance inside a course.
#[derive(Debug, Clone)]
pub struct Activity {
    pub id: i64,
    /// Composite meeting id as announced to the conferencing server.
    /// When a group context is active it carries a `[groupid]` suffix.
    pub meeting_id: String,
    pub name: String,
    pub kind: InstanceType,
    pub opening_time: Option<DateTime<Utc>>,
    pub closing_time: Option<DateTime<Utc>>,
    /// Rows are pre-rendered as HTML instead of a client-side table
    pub recordings_html: bool,
    /// Preview thumbnails enabled for this instance
    pub recordings_preview: bool,
    /// Show imported references only, ignoring live recordings
    pub recordings_imported: bool,
    /// Include meetings of deleted activity instances in the live fetch
    pub recordings_deleted: bool,
    pub group_mode: GroupMode,
    /// Group the caller is currently viewing through, if any
    pub group: Option<i64>,
}

/// Open/closed state of an activity relative to its configured window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    Open,
    NotStarted,
    Ended,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStatus::Open => "open",
            ActivityStatus::NotStarted => "not_started",
            ActivityStatus::Ended => "ended",
        }
    }
}

/// Resolved caller identity and capabilities for one request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub activity: Activity,
    pub course_id: i64,
    pub administrator: bool,
    pub moderator: bool,
    pub can_manage_recordings: bool,
    /// Version reported by the conferencing server, when reachable
    pub server_version: Option<String>,
    /// The configured server is operated by the plugin vendor and known
    /// to support inline editing regardless of version
    pub trusted_server: bool,
    /// Groups the caller belongs to in this course
    pub user_groups: Vec<i64>,
}

impl SessionContext {
    /// Whether the caller holds a privileged role.
    pub fn privileged(&self) -> bool {
        self.administrator || self.moderator
    }

    /// Server version as a number, 0.0 when unknown.
    pub fn server_version_number(&self) -> f64 {
        self.server_version
            .as_deref()
            .and_then(|version| version.trim().parse().ok())
            .unwrap_or(0.0)
    }

    /// Whether recording name/description are inline-editable for this
    /// caller against this server.
    pub fn rows_editable(&self) -> bool {
        self.can_manage_recordings && (self.server_version_number() >= 1.0 || self.trusted_server)
    }

    /// Whether preview thumbnails are rendered for this activity and
    /// server version.
    pub fn preview_enabled(&self) -> bool {
        self.server_version_number() >= 1.0 && self.activity.recordings_preview
    }

    /// Activity status relative to its opening/closing window.
    pub fn activity_status(&self, now: DateTime<Utc>) -> ActivityStatus {
        if let Some(opening) = self.activity.opening_time {
            if now < opening {
                return ActivityStatus::NotStarted;
            }
        }
        if let Some(closing) = self.activity.closing_time {
            if now > closing {
                return ActivityStatus::Ended;
            }
        }
        ActivityStatus::Open
    }
}

/// External collaborator assembling the session context for a caller.
///
/// Implementations enforce login and capability checks; a resolved
/// context means the caller may at least view the activity.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, activity_id: i64) -> Result<SessionContext, SessionError>;
}
