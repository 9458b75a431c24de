use sha2::{Digest, Sha256};

/// Deterministic content fingerprint over the fields that identify a repeat:
/// source package, display strings, and the origin timestamp. Absent fields
/// render as a fixed placeholder so they stay distinct from empty strings.
pub fn content_fingerprint(
    package_name: &str,
    title: Option<&str>,
    text: Option<&str>,
    sub_text: Option<&str>,
    post_time: i64,
) -> String {
    let source = format!(
        "{package_name}|{}|{}|{}|{post_time}",
        title.unwrap_or("null"),
        text.unwrap_or("null"),
        sub_text.unwrap_or("null"),
    );
    hex::encode(Sha256::digest(source.as_bytes()))
}
