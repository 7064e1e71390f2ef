//! Subtitle payload parsing.
//!
//! Caption endpoints hand back a mix of formats: WebVTT, SRT, the json3
//! events format, and timedtext XML. All of them carry timestamp-tagged
//! text; this module flattens any of them into plain text, discarding the
//! timing information.

use crate::error::{OppsumError, Result};
use regex::Regex;
use serde::Deserialize;

/// Convert a subtitle payload of unknown format into plain text.
pub fn parse_subtitles(payload: &str) -> Result<String> {
    let trimmed = payload.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(OppsumError::Transcript("Empty subtitle payload".into()));
    }

    let text = if trimmed.starts_with("WEBVTT") {
        parse_vtt(trimmed)
    } else if trimmed.starts_with('{') {
        parse_json3(trimmed)?
    } else if trimmed.starts_with('<') {
        parse_timedtext_xml(trimmed)
    } else {
        parse_srt(trimmed)
    };

    if text.trim().is_empty() {
        return Err(OppsumError::Transcript(
            "Subtitle payload contained no caption text".into(),
        ));
    }

    Ok(text)
}

/// WebVTT: skip headers, cue identifiers and timing lines, strip inline tags.
///
/// Auto-generated tracks repeat each line as captions roll up, so a line
/// identical to the previous one is dropped.
fn parse_vtt(payload: &str) -> String {
    let timing = Regex::new(r"-->").expect("Invalid regex");
    let cue_number = Regex::new(r"^\d+$").expect("Invalid regex");
    let inline_tag = Regex::new(r"<[^>]*>").expect("Invalid regex");

    let mut lines: Vec<String> = Vec::new();

    for line in payload.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with("WEBVTT")
            || line.starts_with("NOTE")
            || line.starts_with("STYLE")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || timing.is_match(line)
            || cue_number.is_match(line)
        {
            continue;
        }

        let clean = inline_tag.replace_all(line, "").trim().to_string();
        if clean.is_empty() {
            continue;
        }
        if lines.last().map(|l| l == &clean).unwrap_or(false) {
            continue;
        }
        lines.push(clean);
    }

    lines.join(" ")
}

/// SRT: cue numbers and timing lines interleaved with text.
fn parse_srt(payload: &str) -> String {
    let timing = Regex::new(r"\d{2}:\d{2}:\d{2}").expect("Invalid regex");
    let cue_number = Regex::new(r"^\d+$").expect("Invalid regex");

    payload
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.contains("-->")
                && !cue_number.is_match(line)
                && !timing.is_match(line)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Deserialize)]
struct Json3Payload {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// The json3 events format used by auto-caption URLs.
fn parse_json3(payload: &str) -> Result<String> {
    let parsed: Json3Payload = serde_json::from_str(payload).map_err(|e| {
        OppsumError::Transcript(format!("Invalid json3 subtitle payload: {}", e))
    })?;

    let text = parsed
        .events
        .iter()
        .flat_map(|event| event.segs.iter())
        .map(|seg| seg.utf8.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(text)
}

/// Timedtext XML: `<text start="..." dur="...">...</text>` elements.
fn parse_timedtext_xml(payload: &str) -> String {
    let element = Regex::new(r"(?s)<text[^>]*>(.*?)</text>").expect("Invalid regex");
    let inline_tag = Regex::new(r"<[^>]*>").expect("Invalid regex");

    element
        .captures_iter(payload)
        .map(|caps| {
            inline_tag
                .replace_all(caps.get(1).map(|m| m.as_str()).unwrap_or(""), "")
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vtt() {
        let payload = "WEBVTT\nKind: captions\nLanguage: en\n\n\
                       00:00:00.000 --> 00:00:02.000\nhello world\n\n\
                       00:00:02.000 --> 00:00:04.000\nhello world\n\n\
                       00:00:04.000 --> 00:00:06.000\nsecond <c>line</c>\n";
        assert_eq!(parse_subtitles(payload).unwrap(), "hello world second line");
    }

    #[test]
    fn test_parse_srt() {
        let payload = "1\n00:00:00,000 --> 00:00:02,000\nfirst cue\n\n\
                       2\n00:00:02,000 --> 00:00:04,000\nsecond cue\n";
        assert_eq!(parse_subtitles(payload).unwrap(), "first cue second cue");
    }

    #[test]
    fn test_parse_json3() {
        let payload = r#"{"events":[{"segs":[{"utf8":"hello"},{"utf8":" there"}]},{"segs":[{"utf8":"friend"}]}]}"#;
        assert_eq!(parse_subtitles(payload).unwrap(), "hello there friend");
    }

    #[test]
    fn test_parse_timedtext_xml() {
        let payload = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript><text start="0" dur="2.1">first line</text><text start="2.1" dur="1.9">second line</text></transcript>"#;
        assert_eq!(parse_subtitles(payload).unwrap(), "first line second line");
    }

    #[test]
    fn test_empty_payload_fails() {
        assert!(parse_subtitles("").is_err());
        assert!(parse_subtitles("WEBVTT\n\n").is_err());
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(parse_subtitles("{not json").is_err());
    }
}
