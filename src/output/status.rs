use console::{style, StyledObject};

/// How a platform status renders. Anything not in the table is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Failure,
    Cancelled,
    Running,
    Pending,
    Unknown,
}

/// `(status, conclusion)` pairs; a `None` conclusion matches any conclusion.
/// Entries are checked in order, so exact pairs come before wildcards.
const STATUS_TONES: &[(&str, Option<&str>, StatusTone)] = &[
    // GitHub: state lives in `conclusion` once `completed`
    ("completed", Some("success"), StatusTone::Success),
    ("completed", Some("failure"), StatusTone::Failure),
    ("completed", Some("timed_out"), StatusTone::Failure),
    ("completed", Some("startup_failure"), StatusTone::Failure),
    ("completed", Some("cancelled"), StatusTone::Cancelled),
    ("completed", Some("action_required"), StatusTone::Pending),
    ("in_progress", None, StatusTone::Running),
    ("queued", None, StatusTone::Pending),
    ("requested", None, StatusTone::Pending),
    ("waiting", None, StatusTone::Pending),
    // GitLab: status and conclusion carry the same value
    ("success", None, StatusTone::Success),
    ("failed", None, StatusTone::Failure),
    ("canceled", None, StatusTone::Cancelled),
    ("running", None, StatusTone::Running),
    ("pending", None, StatusTone::Pending),
    ("created", None, StatusTone::Pending),
    ("preparing", None, StatusTone::Pending),
    ("waiting_for_resource", None, StatusTone::Pending),
    ("scheduled", None, StatusTone::Pending),
    ("manual", None, StatusTone::Pending),
];

pub fn status_tone(status: &str, conclusion: &str) -> StatusTone {
    STATUS_TONES
        .iter()
        .find(|(s, c, _)| *s == status && c.map_or(true, |c| c == conclusion))
        .map_or(StatusTone::Unknown, |(_, _, tone)| *tone)
}

/// Colors `text` according to the tone of `(status, conclusion)`.
pub fn paint_status(text: &str, status: &str, conclusion: &str) -> StyledObject<String> {
    let styled = style(text.to_string());
    match status_tone(status, conclusion) {
        StatusTone::Success => styled.green(),
        StatusTone::Failure => styled.red(),
        StatusTone::Cancelled | StatusTone::Pending => styled.yellow(),
        StatusTone::Running => styled.blue(),
        StatusTone::Unknown => styled.white(),
    }
}
