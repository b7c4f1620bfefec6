use super::host::MediaHost;

/// First entry of `preferences` the host can record, checked at call time.
pub fn select_codec(host: &dyn MediaHost, preferences: &[String]) -> Option<String> {
    let selected = preferences
        .iter()
        .find(|mime| host.is_type_supported(mime))
        .cloned();
    tracing::debug!(selected = ?selected, candidates = preferences.len(), "Codec selected");
    selected
}

/// MIME type without parameters ("video/webm;codecs=vp9" -> "video/webm").
pub fn base_mime(mime_type: &str) -> &str {
    mime_type.split(';').next().unwrap_or(mime_type).trim()
}

/// File extension for a recorded container.
pub fn extension_for(mime_type: &str) -> &'static str {
    match base_mime(mime_type).to_lowercase().as_str() {
        "video/webm" => "webm",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "image/gif" => "gif",
        _ => "bin",
    }
}
