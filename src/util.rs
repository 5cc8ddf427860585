use anyhow::{Context, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::OnceLock;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Records the local UTC offset. Must run before any other thread starts,
/// otherwise the offset cannot be read on most Unix platforms.
pub fn capture_local_offset() {
    if let Ok(offset) = UtcOffset::current_local_offset() {
        let _ = LOCAL_OFFSET.set(offset);
    }
}

/// Wall-clock stamp printed on reports, in local time when
/// [`capture_local_offset`] succeeded and marked as UTC otherwise.
pub fn now_report_stamp() -> String {
    report_stamp(OffsetDateTime::now_utc(), LOCAL_OFFSET.get().copied())
}

pub fn report_stamp(now: OffsetDateTime, local: Option<UtcOffset>) -> String {
    let (dt, suffix) = match local {
        Some(offset) => (now.to_offset(offset), ""),
        None => (now.to_offset(UtcOffset::UTC), " UTC"),
    };
    let stamp = dt
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| "1970-01-01 00:00:00".to_string());
    format!("{stamp}{suffix}")
}

/// Nanoseconds since the epoch, used to salt job ids.
pub fn now_unix_nanos() -> i128 {
    time::OffsetDateTime::now_utc().unix_timestamp_nanos()
}

/// Strips path components and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static regex"));

    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = re.replace_all(base, "_").replace("..", "_");
    let cleaned: String = cleaned.chars().take(100).collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        "upload".into()
    } else {
        cleaned
    }
}

/// Job ids are lowercase SHA-256 hex digests.
pub fn is_job_id(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
