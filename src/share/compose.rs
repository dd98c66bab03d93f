//! Share text, deep links and device detection.

use crate::card::PostcardRecord;

/// User-agent fragments that mark a phone or tablet.
const MOBILE_AGENTS: &[&str] = &[
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    MOBILE_AGENTS.iter().any(|agent| ua.contains(agent))
}

/// Subject line and share-sheet title.
pub fn share_title(record: &PostcardRecord) -> String {
    format!("Holiday Wish from {}", record.sender)
}

/// Letter body shared by every channel.
pub fn message_body(record: &PostcardRecord) -> String {
    format!(
        "Dear {},\n\n{}\n\nWarmly,\n{}",
        record.recipient, record.message, record.sender
    )
}

/// WhatsApp caption: the body under a bold header line.
pub fn whatsapp_text(record: &PostcardRecord) -> String {
    format!("*{}*\n\n{}", share_title(record), message_body(record))
}

pub fn whatsapp_link(text: &str) -> String {
    format!("https://wa.me/?text={}", encode_uri_component(text))
}

/// `mailto:` link. Text only; the scheme cannot carry attachments.
pub fn mailto_link(subject: &str, body: &str) -> String {
    format!(
        "mailto:?subject={}&body={}",
        encode_uri_component(subject),
        encode_uri_component(body)
    )
}

/// Percent-encode like JavaScript's `encodeURIComponent`.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
