use crate::types::{
    ClipLocation, HelperDocument, SearchResult, Snippet, TimestampSnippet, TranscriptSegment,
    YoutubeLinks,
};

/// Format seconds as MM:SS, or H:MM:SS past the hour
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Parse "SS", "MM:SS" or "H:MM:SS" (fractional seconds allowed) into seconds
pub fn parse_timestamp(input: &str) -> Option<f64> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.trim().is_empty()) {
        return None;
    }

    let (last, leading) = parts.split_last()?;
    let seconds: f64 = last.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 || (!leading.is_empty() && seconds >= 60.0) {
        return None;
    }

    let mut total = seconds;
    for (i, part) in leading.iter().rev().enumerate() {
        let value: u64 = part.trim().parse().ok()?;
        // minutes are bounded only when an hour field follows
        if i == 0 && leading.len() == 2 && value >= 60 {
            return None;
        }
        total += value as f64 * 60f64.powi(i as i32 + 1);
    }
    Some(total)
}

/// Format a video length for headers, e.g. "2m 5s" or "1h 2m 3s"
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else {
        format!("{}m {}s", mins, secs)
    }
}

/// Relevance in [0, 1] as a whole percentage
pub fn format_relevance(relevance: f64) -> String {
    let clamped = if relevance.is_finite() {
        relevance.clamp(0.0, 1.0)
    } else {
        0.0
    };
    format!("{}%", (clamped * 100.0).round() as u32)
}

pub fn empty_search_notice(query: &str) -> String {
    format!("No results found for \"{}\"", query)
}

pub fn format_search_result(result: &SearchResult) -> String {
    format!(
        "[{}–{}] {} {}",
        format_timestamp(result.start),
        format_timestamp(result.end),
        format_relevance(result.relevance),
        result.text.trim()
    )
}

/// One line per result, or the empty-results notice quoting `query`
pub fn format_search_results(query: &str, results: &[SearchResult]) -> Vec<String> {
    if results.is_empty() {
        return vec![empty_search_notice(query)];
    }
    results.iter().map(format_search_result).collect()
}

/// One transcript line, `[MM:SS] text`
pub fn format_transcript_segment(segment: &TranscriptSegment) -> String {
    format!("[{}] {}", format_timestamp(segment.start), segment.text.trim())
}

pub fn format_youtube_links(links: &YoutubeLinks) -> String {
    let range = if links.timestamp_display.is_empty() {
        format!(
            "{}–{}",
            format_timestamp(links.start_time),
            format_timestamp(links.end_time)
        )
    } else {
        links.timestamp_display.clone()
    };
    format!(
        "{} ({}s)\n  watch: {}\n  short: {}\n  embed: {}",
        range, links.duration, links.watch_url, links.short_url, links.embed_url
    )
}

pub fn format_clip_location(location: &ClipLocation<'_>) -> String {
    match location {
        ClipLocation::Link(links) => format_youtube_links(links),
        ClipLocation::File { path, start, end } => format!(
            "[{}–{}] {}",
            format_timestamp(*start),
            format_timestamp(*end),
            path
        ),
    }
}

pub fn format_snippet(snippet: &Snippet) -> String {
    let mut output = format!(
        "#{} {} {}",
        snippet.index,
        format_relevance(snippet.relevance),
        snippet.context.trim()
    );
    if let Some(location) = snippet.location() {
        output.push('\n');
        output.push_str(&format_clip_location(&location));
    }
    output
}

pub fn format_timestamp_snippet(snippet: &TimestampSnippet) -> String {
    snippet
        .location()
        .map(|location| format_clip_location(&location))
        .unwrap_or_default()
}

/// Format a helper document as human-readable markdown
pub fn format_document_readable(doc: &HelperDocument) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", doc.title));

    output.push_str("## Overview\n\n");
    output.push_str(&doc.overview);
    output.push_str("\n\n");

    output.push_str("## Key Points\n\n");
    for (i, point) in doc.key_points.iter().enumerate() {
        let start = format_timestamp(point.timestamp_start);
        let end = format_timestamp(point.timestamp_end);
        output.push_str(&format!("### {}. [{}–{}] {}\n", i + 1, start, end, point.title));
        output.push_str(&format!("**Importance:** {}\n\n", point.importance));
        if let Some(url) = &point.screenshot_url {
            output.push_str(&format!("![Screenshot at {}]({})\n\n", start, url));
        }
        output.push_str(&format!("{}\n\n", point.summary));
    }

    if !doc.action_items.is_empty() {
        output.push_str("## Action Items\n\n");
        for item in &doc.action_items {
            output.push_str(&format!("- {}\n", item));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Importance, KeyPoint};

    #[test]
    fn transcript_line_past_the_hour() {
        let segment = TranscriptSegment {
            start: 3725.4,
            end: 3730.0,
            text: "  closing remarks ".to_string(),
        };
        assert_eq!(format_transcript_segment(&segment), "[1:02:05] closing remarks");
    }

    #[test]
    fn duration_matches_header_format() {
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(59.9), "0m 59s");
        assert_eq!(format_duration(3723.0), "1h 2m 3s");
    }

    #[test]
    fn timestamps_grow_an_hour_field() {
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3661.0), "1:01:01");
        assert_eq!(format_timestamp(-3.0), "00:00");
    }

    #[test]
    fn parses_clock_style_input() {
        assert_eq!(parse_timestamp("42"), Some(42.0));
        assert_eq!(parse_timestamp("1:05"), Some(65.0));
        assert_eq!(parse_timestamp("1:01:01"), Some(3661.0));
        assert_eq!(parse_timestamp(" 12.5 "), Some(12.5));
        assert_eq!(parse_timestamp("1:75"), None);
        assert_eq!(parse_timestamp("1:60:00"), None);
        assert_eq!(parse_timestamp("-3"), None);
        assert_eq!(parse_timestamp("a:b"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn relevance_is_clamped_integer_percent() {
        assert_eq!(format_relevance(0.873), "87%");
        assert_eq!(format_relevance(1.4), "100%");
        assert_eq!(format_relevance(-0.2), "0%");
        assert_eq!(format_relevance(f64::NAN), "0%");
    }

    #[test]
    fn empty_results_quote_query() {
        let lines = format_search_results("neural nets", &[]);
        assert_eq!(lines, vec!["No results found for \"neural nets\"".to_string()]);
    }

    #[test]
    fn one_line_per_result() {
        let results = vec![
            SearchResult {
                text: "intro".to_string(),
                start: 0.0,
                end: 4.0,
                relevance: 0.91,
            },
            SearchResult {
                text: "outro".to_string(),
                start: 60.0,
                end: 65.0,
                relevance: 0.42,
            },
        ];
        let lines = format_search_results("x", &results);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[00:00–00:04] 91% intro");
        assert!(lines[1].contains("42%"));
    }

    #[test]
    fn document_lists_key_points_and_actions() {
        let doc = HelperDocument {
            session_id: "s1".into(),
            title: "Demo".to_string(),
            overview: "About things.".to_string(),
            key_points: vec![KeyPoint {
                title: "Start".to_string(),
                summary: "It begins.".to_string(),
                timestamp_start: 5.0,
                timestamp_end: 30.0,
                importance: Importance::High,
                screenshot_url: Some("http://host/s.jpg".to_string()),
            }],
            action_items: vec!["Try it".to_string()],
            markdown: String::new(),
        };
        let text = format_document_readable(&doc);
        assert!(text.contains("### 1. [00:05–00:30] Start"));
        assert!(text.contains("**Importance:** high"));
        assert!(text.contains("![Screenshot at 00:05](http://host/s.jpg)"));
        assert!(text.contains("- Try it"));
    }
}
