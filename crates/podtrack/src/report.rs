//! Plain-text log reports served by the retrieval endpoints.

use crate::entry::sanitize_line;
use crate::identity::PodIdentity;
use crate::store::StoreSnapshot;

pub const GUID_REPORT_PLACEHOLDER: &str =
    "No logs available yet. Click some tiles to generate activity.";

pub const DATA_REPORT_PLACEHOLDER: &str =
    "No data logs available yet. Click some tiles to generate activity.";

/// Identity header followed by every buffered entry verbatim.
pub fn guid_report(identity: &PodIdentity, pod_name: &str, snapshot: &StoreSnapshot) -> String {
    if snapshot.lines.is_empty() {
        return GUID_REPORT_PLACEHOLDER.to_string();
    }

    let mut out = format!(
        "Pod GUID: {}\nPod Name: {pod_name}\nStarted: {}\nTotal Requests: {}\nLog Entries: {}/{}\n\n",
        identity.id(),
        identity.started_at_rfc3339(),
        snapshot.requests,
        snapshot.lines.len(),
        snapshot.capacity,
    );
    push_lines(&mut out, snapshot.lines.iter().map(String::as_str));
    out
}

/// Short header followed by every entry with `|` separators turned into `-`.
pub fn data_report(identity: &PodIdentity, pod_name: &str, snapshot: &StoreSnapshot) -> String {
    if snapshot.lines.is_empty() {
        return DATA_REPORT_PLACEHOLDER.to_string();
    }

    let mut out = format!(
        "Pod: {pod_name} ({})\nEntries: {}\n\n",
        identity.id(),
        snapshot.lines.len(),
    );
    let cleaned: Vec<String> = snapshot.lines.iter().map(|l| sanitize_line(l)).collect();
    push_lines(&mut out, cleaned.iter().map(String::as_str));
    out
}

fn push_lines<'a>(out: &mut String, lines: impl Iterator<Item = &'a str>) {
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lines: &[&str]) -> StoreSnapshot {
        StoreSnapshot {
            requests: lines.len() as u64,
            capacity: 100,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_reports_use_placeholders() {
        let identity = PodIdentity::generate();
        let empty = snapshot(&[]);
        assert_eq!(guid_report(&identity, "pod-a", &empty), GUID_REPORT_PLACEHOLDER);
        assert_eq!(data_report(&identity, "pod-a", &empty), DATA_REPORT_PLACEHOLDER);
    }

    #[test]
    fn test_guid_report_layout() {
        let identity = PodIdentity::generate();
        let report = guid_report(&identity, "pod-a", &snapshot(&["one | 1", "two | 2"]));
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], format!("Pod GUID: {}", identity.id()));
        assert_eq!(lines[1], "Pod Name: pod-a");
        assert!(lines[2].starts_with("Started: "));
        assert_eq!(lines[3], "Total Requests: 2");
        assert_eq!(lines[4], "Log Entries: 2/100");
        assert_eq!(lines[5], "");
        assert_eq!(&lines[6..], &["one | 1", "two | 2"]);
    }

    #[test]
    fn test_data_report_strips_pipes() {
        let identity = PodIdentity::generate();
        let report = data_report(&identity, "pod-a", &snapshot(&["one | 1", "two | 2"]));

        assert!(!report.contains('|'));
        assert!(report.starts_with(&format!("Pod: pod-a ({})\n", identity.id())));
        assert!(report.contains("Entries: 2\n"));
        assert!(report.ends_with("one - 1\ntwo - 2\n"));
    }
}
