use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{cmp_ignore_case, contains_ignore_case};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EmailAddress {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Sender {
    #[serde(rename = "emailAddress", default)]
    pub email_address: EmailAddress,
}

/// A received message as listed in the inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "bodyPreview", default)]
    pub body_preview: String,
    #[serde(rename = "receivedDateTime", default)]
    pub received_date_time: String,
    #[serde(default)]
    pub sender: Sender,
}

impl InboxMessage {
    /// Parsed receive time, if the backend sent a valid RFC 3339 timestamp
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.received_date_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn sender_name(&self) -> &str {
        &self.sender.email_address.name
    }

    pub fn sender_address(&self) -> &str {
        &self.sender.email_address.address
    }

    fn matches_search(&self, query: &str) -> bool {
        contains_ignore_case(&self.subject, query) || contains_ignore_case(self.sender_address(), query)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboxResponse {
    #[serde(default)]
    pub data: Vec<InboxMessage>,
}

/// Inbox list ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InboxSort {
    /// Newest first
    #[default]
    Date,
    /// Sender display name, A to Z
    Sender,
}

impl InboxSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "date" => Some(InboxSort::Date),
            "sender" => Some(InboxSort::Sender),
            _ => None,
        }
    }
}

/// Filter messages by subject or sender address and order them for display.
///
/// An empty query keeps everything. Messages with an unparseable receive
/// time sort after all dated ones under `InboxSort::Date`.
pub fn filter_and_sort<'a>(
    messages: &'a [InboxMessage],
    query: &str,
    sort: InboxSort,
) -> Vec<&'a InboxMessage> {
    let mut list: Vec<&InboxMessage> = messages
        .iter()
        .filter(|m| query.is_empty() || m.matches_search(query))
        .collect();

    list.sort_by(|a, b| match sort {
        InboxSort::Date => match (a.received_at(), b.received_at()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        InboxSort::Sender => cmp_ignore_case(a.sender_name(), b.sender_name()),
    });

    list
}

/// Message submitted to the backend for sending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, subject: &str, name: &str, address: &str, received: &str) -> InboxMessage {
        InboxMessage {
            id: id.to_string(),
            subject: subject.to_string(),
            body_preview: String::new(),
            received_date_time: received.to_string(),
            sender: Sender {
                email_address: EmailAddress {
                    name: name.to_string(),
                    address: address.to_string(),
                },
            },
        }
    }

    fn sample() -> Vec<InboxMessage> {
        vec![
            message("1", "Quarterly report", "zoe", "zoe@corp.com", "2024-03-01T09:00:00Z"),
            message("2", "Lunch?", "Bruno", "bruno@mail.com", "2024-03-05T12:30:00Z"),
            message("3", "Invoice", "alice", "billing@REPORTS.io", "not a date"),
        ]
    }

    #[test]
    fn test_parse_inbox_response() {
        let json = r#"{"data":[{"id":"AAMk","subject":"Hi","bodyPreview":"Hello there",
            "receivedDateTime":"2024-05-01T08:15:00Z",
            "sender":{"emailAddress":{"name":"Ana","address":"ana@example.com"}}}]}"#;
        let resp: InboxResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 1);
        let m = &resp.data[0];
        assert_eq!(m.body_preview, "Hello there");
        assert_eq!(m.sender_address(), "ana@example.com");
        assert!(m.received_at().is_some());
    }

    #[test]
    fn test_sort_by_date_newest_first() {
        let msgs = sample();
        let ids: Vec<&str> = filter_and_sort(&msgs, "", InboxSort::Date)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_sort_by_sender_ignores_case() {
        let msgs = sample();
        let ids: Vec<&str> = filter_and_sort(&msgs, "", InboxSort::Sender)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_filter_matches_subject_or_sender_address() {
        let msgs = sample();
        let ids: Vec<&str> = filter_and_sort(&msgs, "report", InboxSort::Date)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        // "Quarterly report" by subject, billing@REPORTS.io by address
        assert_eq!(ids, vec!["1", "3"]);

        // Sender display name alone does not match
        assert!(filter_and_sort(&msgs, "alice", InboxSort::Date).is_empty());
    }

    #[test]
    fn test_inbox_sort_parse() {
        assert_eq!(InboxSort::parse("Date"), Some(InboxSort::Date));
        assert_eq!(InboxSort::parse("sender"), Some(InboxSort::Sender));
        assert_eq!(InboxSort::parse("size"), None);
    }
}
