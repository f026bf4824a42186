//! Plain-text import/export of videos as tagged blocks:
//!
//! ```text
//! [TITLE] Unboxing the new camera
//! [DESCRIPTION] First impressions
//! [SCRIPT] Intro
//! Close-up of the box
//! [URL] https://example.com/watch?v=1
//! [STATUS] in-production
//!
//! ```
//!
//! Markers are case-insensitive and must start a line. The Portuguese
//! markers (`[TÍTULO]`, `[DESCRIÇÃO]`, `[ROTEIRO]`) are read as aliases.
//!
//! A description or script line that itself starts with a marker would end
//! the field early on re-import, so such values are refused when a video is
//! saved (see [`has_marker_line`]). Titles and URLs are single-line.

use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

use crate::models::{NewVideo, Video, VideoStatus};

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*\[(TITLE|TÍTULO|TITULO|DESCRIPTION|DESCRIÇÃO|DESCRICAO|SCRIPT|ROTEIRO|URL|STATUS)\]",
    )
    .expect("valid marker regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Script,
    Url,
    Status,
}

impl Field {
    fn from_marker(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "title" | "título" | "titulo" => Some(Field::Title),
            "description" | "descrição" | "descricao" => Some(Field::Description),
            "script" | "roteiro" => Some(Field::Script),
            "url" => Some(Field::Url),
            "status" => Some(Field::Status),
            _ => None,
        }
    }

    fn is_multiline(&self) -> bool {
        matches!(self, Field::Description | Field::Script)
    }
}

#[derive(Debug, Default)]
struct Block {
    title: Option<String>,
    description: Option<String>,
    script: Option<String>,
    url: Option<String>,
    status: Option<String>,
}

impl Block {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Script => &mut self.script,
            Field::Url => &mut self.url,
            Field::Status => &mut self.status,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn into_new_video(self) -> Option<NewVideo> {
        let non_empty = |v: Option<String>| v.filter(|v| !v.is_empty());
        Some(NewVideo {
            title: self.title?,
            description: non_empty(self.description),
            script: non_empty(self.script),
            url: non_empty(self.url),
            status: self.status.as_deref().map(parse_status).unwrap_or_default(),
        })
    }
}

/// Maps free-form status text to the canonical enum. Accepts English and
/// Portuguese spellings, with or without accents, spaces, hyphens or
/// underscores. Anything unrecognized is `Planned`.
pub fn parse_status(text: &str) -> VideoStatus {
    let normalized = text
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    match normalized.as_str() {
        "in production" | "em produção" | "em producao" => VideoStatus::InProduction,
        "in editing" | "em edição" | "em edicao" => VideoStatus::InEditing,
        "completed" | "concluído" | "concluido" => VideoStatus::Completed,
        _ => VideoStatus::Planned,
    }
}

/// True when a line after the first starts with a block marker. The first
/// line follows the field's own marker on export, so it is never read as one.
pub fn has_marker_line(text: &str) -> bool {
    text.split_once('\n')
        .is_some_and(|(_, rest)| MARKER_RE.is_match(rest))
}

/// Parses a document into one entry per title marker. Text before the first
/// title is ignored.
pub fn parse(content: &str) -> Vec<NewVideo> {
    let markers: Vec<(Field, usize, usize)> = MARKER_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let field = Field::from_marker(caps.get(1)?.as_str())?;
            Some((field, whole.start(), whole.end()))
        })
        .collect();

    let mut blocks: Vec<Block> = Vec::new();
    for (i, &(field, _, value_start)) in markers.iter().enumerate() {
        let value_end = markers
            .get(i + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(content.len());
        let raw = &content[value_start..value_end];
        let value = if field.is_multiline() {
            raw.trim()
        } else {
            raw.trim_start_matches([' ', '\t'])
                .lines()
                .next()
                .unwrap_or("")
                .trim()
        };

        if field == Field::Title {
            blocks.push(Block::default());
        }
        if let Some(block) = blocks.last_mut() {
            block.set(field, value.to_string());
        }
    }

    blocks.into_iter().filter_map(Block::into_new_video).collect()
}

/// Renders videos as tagged blocks, each followed by a blank line.
pub fn export(videos: &[Video]) -> String {
    let mut out = String::new();
    for video in videos {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "[TITLE] {}", video.title);
        if let Some(description) = &video.description {
            let _ = writeln!(out, "[DESCRIPTION] {}", description);
        }
        if let Some(script) = &video.script {
            let _ = writeln!(out, "[SCRIPT] {}", script);
        }
        if let Some(url) = &video.url {
            let _ = writeln!(out, "[URL] {}", url);
        }
        let _ = writeln!(out, "[STATUS] {}", video.status);
        out.push('\n');
    }
    out
}
