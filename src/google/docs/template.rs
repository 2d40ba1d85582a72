//! Template-fill planning over a fetched document tree
//!
//! Everything here is pure: functions inspect a `Document` and return the
//! `Request`s to send. Offsets are UTF-16 code units, as in the Docs API.

use std::collections::BTreeMap;

use regex::RegexBuilder;

use super::types::{Document, Range, Request, StructuralElement, Table};

/// Side length of inserted inline images, in points
pub const IMAGE_SIZE_PT: f64 = 150.0;

/// Columns of the gallery table
pub const GALLERY_COLUMNS: usize = 3;

/// A text run with its position in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRunRef<'a> {
    pub start_index: usize,
    pub end_index: usize,
    pub content: &'a str,
}

/// `{{key}}`
pub fn placeholder(key: &str) -> String {
    format!("{{{{{}}}}}", key)
}

/// Gallery placeholder key for the 1-based image number
pub fn gallery_placeholder_key(number: usize) -> String {
    format!("googlevision{}", number)
}

pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// All text runs in document order, descending into table cells
pub fn text_runs(content: &[StructuralElement]) -> Vec<TextRunRef<'_>> {
    let mut runs = Vec::new();
    collect_runs(content, &mut runs);
    runs
}

fn collect_runs<'a>(elements: &'a [StructuralElement], runs: &mut Vec<TextRunRef<'a>>) {
    for element in elements {
        if let Some(paragraph) = &element.paragraph {
            for elem in &paragraph.elements {
                if let Some(run) = &elem.text_run {
                    runs.push(TextRunRef {
                        start_index: elem.start_index,
                        end_index: elem.end_index,
                        content: &run.content,
                    });
                }
            }
        } else if let Some(table) = &element.table {
            for row in &table.table_rows {
                for cell in &row.table_cells {
                    collect_runs(&cell.content, runs);
                }
            }
        }
    }
}

/// Runs whose text contains `{{key}}`
pub fn runs_containing<'a>(document: &'a Document, key: &str) -> Vec<TextRunRef<'a>> {
    let needle = placeholder(key);
    text_runs(&document.body.content)
        .into_iter()
        .filter(|run| run.content.contains(&needle))
        .collect()
}

pub fn contains_placeholder(document: &Document, key: &str) -> bool {
    !runs_containing(document, key).is_empty()
}

/// Exact ranges of every `{{key}}`, in document order
pub fn find_placeholder_occurrences(document: &Document, key: &str) -> Vec<Range> {
    let needle = placeholder(key);
    let needle_len = utf16_len(&needle);

    let mut ranges = Vec::new();
    for run in text_runs(&document.body.content) {
        for (byte_offset, _) in run.content.match_indices(&needle) {
            let start = run.start_index + utf16_len(&run.content[..byte_offset]);
            ranges.push(Range::new(start, start + needle_len));
        }
    }
    ranges
}

/// First occurrence of `{{key}}`
pub fn find_first_placeholder(document: &Document, key: &str) -> Option<Range> {
    find_placeholder_occurrences(document, key).into_iter().next()
}

/// One `replaceAllText` per key whose placeholder occurs in the document
pub fn replacement_requests(document: &Document, values: &BTreeMap<String, String>) -> Vec<Request> {
    let runs = text_runs(&document.body.content);
    values
        .iter()
        .filter_map(|(key, value)| {
            let needle = placeholder(key);
            runs.iter()
                .any(|run| run.content.contains(&needle))
                .then(|| Request::replace_all_text(needle, value.as_str()))
        })
        .collect()
}

/// Blank out every listed placeholder still present
pub fn removal_requests(document: &Document, keys: &[String]) -> Vec<Request> {
    let runs = text_runs(&document.body.content);
    keys.iter()
        .map(|key| placeholder(key))
        .filter(|needle| runs.iter().any(|run| run.content.contains(needle.as_str())))
        .map(|needle| Request::replace_all_text(needle, ""))
        .collect()
}

/// Font size for the title: short titles get larger type
pub fn title_font_size(title: &str) -> f64 {
    match title.chars().count() {
        0..=20 => 18.0,
        21..=40 => 16.0,
        _ => 14.0,
    }
}

/// Range of the first run whose trimmed text contains the title (case-insensitive)
pub fn find_title_range(document: &Document, title: &str) -> Option<Range> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    let pattern = RegexBuilder::new(&regex::escape(title))
        .case_insensitive(true)
        .build()
        .ok()?;

    text_runs(&document.body.content)
        .into_iter()
        .find(|run| pattern.is_match(run.content.trim()))
        .map(|run| Range::new(run.start_index, run.end_index))
}

/// `updateTextStyle` sizing the title, when the title is found
pub fn title_font_request(document: &Document, title: &str) -> Option<Request> {
    find_title_range(document, title).map(|range| Request::font_size(range, title_font_size(title)))
}

/// Metadata rendered as `key: value` lines with the bold `key:` spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedMetadata {
    pub text: String,
    /// Offsets relative to the start of `text`
    pub bold: Vec<Range>,
}

/// Parse `- key: value - key: value` text into lines
///
/// Rows are split on `-`, each row on its first `:`. Rows with an empty key
/// keep only their value.
pub fn format_metadata(raw: &str) -> FormattedMetadata {
    let mut lines: Vec<String> = Vec::new();
    let mut bold = Vec::new();
    let mut offset = 0;

    for row in raw.split('-').map(str::trim).filter(|row| !row.is_empty()) {
        let (key, value) = match row.split_once(':') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (row, ""),
        };

        let line = match (key.is_empty(), value.is_empty()) {
            (false, false) => format!("{}: {}", key, value),
            (false, true) => format!("{}:", key),
            (true, false) => value.to_string(),
            (true, true) => continue,
        };
        if !key.is_empty() {
            let key_len = utf16_len(key) + 1;
            bold.push(Range::new(offset, offset + key_len));
        }

        offset += utf16_len(&line) + 1;
        lines.push(line);
    }

    FormattedMetadata {
        text: lines.join("\n"),
        bold,
    }
}

/// Replace the placeholder at `at` with formatted metadata
pub fn metadata_requests(at: Range, formatted: &FormattedMetadata) -> Vec<Request> {
    let mut requests = vec![Request::delete_range(at)];
    if formatted.text.is_empty() {
        return requests;
    }
    requests.push(Request::insert_text(formatted.text.as_str(), at.start_index));
    requests.extend(formatted.bold.iter().map(|range| {
        Request::bold(Range::new(
            at.start_index + range.start_index,
            at.start_index + range.end_index,
        ))
    }));
    requests
}

/// Rows needed to lay out `images` in `GALLERY_COLUMNS` columns
pub fn gallery_rows(images: usize) -> usize {
    images.div_ceil(GALLERY_COLUMNS)
}

/// First table starting at or after `index`, looking inside tables too
pub fn find_first_table_at_or_after(content: &[StructuralElement], index: usize) -> Option<&Table> {
    for element in content {
        let Some(table) = &element.table else {
            continue;
        };
        if element.start_index >= index {
            return Some(table);
        }
        for row in &table.table_rows {
            for cell in &row.table_cells {
                if let Some(found) = find_first_table_at_or_after(&cell.content, index) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Insert `{{googlevision1}}..{{googlevisionN}}` into the table's cells
///
/// Cells are numbered row-major; each placeholder goes just before the
/// cell's closing newline. Requests are ordered by descending index so
/// earlier inserts do not shift later ones.
pub fn gallery_placeholder_requests(table: &Table, images: usize) -> Vec<Request> {
    let mut requests: Vec<Request> = table
        .table_rows
        .iter()
        .flat_map(|row| row.table_cells.iter())
        .take(images)
        .enumerate()
        .map(|(i, cell)| {
            Request::insert_text(
                placeholder(&gallery_placeholder_key(i + 1)),
                cell.end_index.saturating_sub(1),
            )
        })
        .collect();

    requests.sort_by_key(|request| std::cmp::Reverse(request.insert_index().unwrap_or(0)));
    requests
}

/// Delete each range and insert the image in its place, last range first
pub fn image_requests(occurrences: &[Range], uri: &str) -> Vec<Request> {
    let mut sorted = occurrences.to_vec();
    sorted.sort_by_key(|range| std::cmp::Reverse(range.start_index));

    sorted
        .into_iter()
        .flat_map(|range| {
            [
                Request::delete_range(range),
                Request::insert_inline_image(uri, range.start_index, IMAGE_SIZE_PT),
            ]
        })
        .collect()
}
