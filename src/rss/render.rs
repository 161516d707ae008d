//! Terminal rendering of browsed posts.

use std::io::Write;

use super::html::clean_description;
use super::types::FeedPost;
use crate::datetime::{format_utc_datetime, DISPLAY_FORMAT};
use crate::Result;

const SEPARATOR: &str = "=====================================";

/// Wrap `text` in an OSC 8 hyperlink to `url`.
pub fn hyperlink(url: &str, text: &str) -> String {
    format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
}

/// Write the browse listing, times shown in `timezone`.
pub fn render_posts<W: Write + ?Sized>(
    out: &mut W,
    posts: &[FeedPost],
    timezone: &str,
) -> Result<()> {
    writeln!(out, "Found {} posts:", posts.len())?;

    for entry in posts {
        let post = &entry.post;
        writeln!(out, "{SEPARATOR}")?;
        writeln!(out, "Title: {}", hyperlink(&post.url, &post.title))?;
        writeln!(out, "Feed: {}", entry.feed_name)?;
        if let Some(description) = post.description.as_deref() {
            writeln!(out, "Description: {}", clean_description(description))?;
        }
        writeln!(
            out,
            "Published: {}",
            format_utc_datetime(&post.published_at, timezone, DISPLAY_FORMAT)
        )?;
        writeln!(out, "{SEPARATOR}")?;
        writeln!(out)?;
    }

    Ok(())
}
