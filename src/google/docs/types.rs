//! Google Docs v1 document tree and batch-update requests
//!
//! Only the parts of the schema the report pipeline reads or writes are
//! modelled. All indexes are UTF-16 code unit offsets into the document body.

use serde::{Deserialize, Serialize};

/// A document as returned by `documents.get`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub body: Body,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// A paragraph, table, or section break in a body or table cell
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    /// Absent on the leading section break, which starts at zero
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    pub paragraph: Option<Paragraph>,
    pub table: Option<Table>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub columns: usize,
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// Half-open index range `[start_index, end_index)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: usize,
    pub end_index: usize,
}

impl Range {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub magnitude: f64,
    pub unit: String,
}

impl Dimension {
    pub fn points(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: "PT".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub height: Dimension,
    pub width: Dimension,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Dimension>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstringMatchCriteria {
    pub text: String,
    pub match_case: bool,
}

/// One entry of a `documents.batchUpdate` request list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    ReplaceAllText {
        #[serde(rename = "containsText")]
        contains_text: SubstringMatchCriteria,
        #[serde(rename = "replaceText")]
        replace_text: String,
    },
    DeleteContentRange {
        range: Range,
    },
    InsertText {
        text: String,
        location: Location,
    },
    InsertInlineImage {
        uri: String,
        location: Location,
        #[serde(rename = "objectSize")]
        object_size: Size,
    },
    InsertTable {
        rows: usize,
        columns: usize,
        location: Location,
    },
    UpdateTextStyle {
        range: Range,
        #[serde(rename = "textStyle")]
        text_style: TextStyle,
        fields: String,
    },
}

impl Request {
    pub fn replace_all_text(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Request::ReplaceAllText {
            contains_text: SubstringMatchCriteria {
                text: find.into(),
                match_case: true,
            },
            replace_text: replace.into(),
        }
    }

    pub fn delete_range(range: Range) -> Self {
        Request::DeleteContentRange { range }
    }

    pub fn insert_text(text: impl Into<String>, index: usize) -> Self {
        Request::InsertText {
            text: text.into(),
            location: Location { index },
        }
    }

    /// Square inline image, `size_pt` points on each side
    pub fn insert_inline_image(uri: impl Into<String>, index: usize, size_pt: f64) -> Self {
        Request::InsertInlineImage {
            uri: uri.into(),
            location: Location { index },
            object_size: Size {
                height: Dimension::points(size_pt),
                width: Dimension::points(size_pt),
            },
        }
    }

    pub fn insert_table(rows: usize, columns: usize, index: usize) -> Self {
        Request::InsertTable {
            rows,
            columns,
            location: Location { index },
        }
    }

    pub fn bold(range: Range) -> Self {
        Request::UpdateTextStyle {
            range,
            text_style: TextStyle {
                bold: Some(true),
                font_size: None,
            },
            fields: "bold".to_string(),
        }
    }

    pub fn font_size(range: Range, points: f64) -> Self {
        Request::UpdateTextStyle {
            range,
            text_style: TextStyle {
                bold: None,
                font_size: Some(Dimension::points(points)),
            },
            fields: "fontSize".to_string(),
        }
    }

    /// Insertion index for requests that insert at a location
    pub fn insert_index(&self) -> Option<usize> {
        match self {
            Request::InsertText { location, .. }
            | Request::InsertInlineImage { location, .. }
            | Request::InsertTable { location, .. } => Some(location.index),
            _ => None,
        }
    }
}

/// Body of `documents.batchUpdate`
#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateRequest<'a> {
    pub requests: &'a [Request],
}
