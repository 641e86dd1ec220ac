//! Map document parsing.
//!
//! The map endpoint serves either CSV (one grid row per line, one cell per comma-separated field)
//! or JSON (`{"width":W,"height":H,"rows":[...]}` or a bare array of row strings). Both are turned
//! into validated rows of cell characters ready for [`GridModel::load`](crate::model::GridModel::load).

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapParseError {
    #[error("map document contains no cells")]
    Empty,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("declared height {declared} but found {actual} rows")]
    HeightMismatch { declared: u32, actual: usize },

    #[error("row {row} has {len} cells, wider than declared width {declared}")]
    RowTooWide { row: usize, len: usize, declared: u32 },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonMap {
    Object {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        rows: Vec<String>,
    },
    Rows(Vec<String>),
}

/// A parsed map: rows of cell characters plus the dimensions they normalize to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDocument {
    pub width: u32,
    pub height: u32,
    pub rows: Vec<String>,
}

pub fn parse_map(text: &str) -> Result<MapDocument, MapParseError> {
    let trimmed = text.trim_start();
    let rows = match trimmed.chars().next() {
        Some('{') | Some('[') => parse_json(trimmed)?,
        _ => parse_csv(text),
    };
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
    if width == 0 {
        return Err(MapParseError::Empty);
    }
    Ok(MapDocument {
        width,
        height: rows.len() as u32,
        rows,
    })
}

fn parse_json(text: &str) -> Result<Vec<String>, MapParseError> {
    match serde_json::from_str::<JsonMap>(text)? {
        JsonMap::Rows(rows) => Ok(rows),
        JsonMap::Object {
            width,
            height,
            mut rows,
        } => {
            if let Some(declared) = height {
                if declared as usize != rows.len() {
                    return Err(MapParseError::HeightMismatch {
                        declared,
                        actual: rows.len(),
                    });
                }
            }
            if let Some(declared) = width {
                for (i, row) in rows.iter_mut().enumerate() {
                    let len = row.chars().count();
                    if len > declared as usize {
                        return Err(MapParseError::RowTooWide {
                            row: i,
                            len,
                            declared,
                        });
                    }
                    row.extend(std::iter::repeat_n(' ', declared as usize - len));
                }
            }
            Ok(rows)
        }
    }
}

fn parse_csv(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim_end_matches('\r').is_empty())
        .map(|line| {
            line.trim_end_matches('\r')
                .split(',')
                .map(|field| field.trim().chars().next().unwrap_or(' '))
                .collect::<String>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_takes_first_char_of_each_trimmed_field() {
        let doc = parse_map("x, o ,1\n ,  ,Xyz\n").unwrap();
        assert_eq!(doc.rows, vec!["xo1".to_string(), "  X".to_string()]);
        assert_eq!((doc.width, doc.height), (3, 2));
    }

    #[test]
    fn csv_skips_blank_lines_and_handles_crlf() {
        let doc = parse_map("x,o\r\n\r\n1,2\r\n").unwrap();
        assert_eq!(doc.rows, vec!["xo".to_string(), "12".to_string()]);
    }

    #[test]
    fn csv_ragged_rows_report_max_width() {
        let doc = parse_map("x\no,o,o\n").unwrap();
        assert_eq!(doc.width, 3);
        assert_eq!(doc.rows[0], "x");
    }

    #[test]
    fn json_array_of_rows() {
        let doc = parse_map(r#"  ["xo", "  "]"#).unwrap();
        assert_eq!(doc.rows, vec!["xo".to_string(), "  ".to_string()]);
        assert_eq!((doc.width, doc.height), (2, 2));
    }

    #[test]
    fn json_object_pads_to_declared_width() {
        let doc = parse_map(r#"{"width":4,"height":2,"rows":["x","oo"]}"#).unwrap();
        assert_eq!(doc.rows, vec!["x   ".to_string(), "oo  ".to_string()]);
        assert_eq!(doc.width, 4);
    }

    #[test]
    fn json_object_without_dimensions() {
        let doc = parse_map(r#"{"rows":["x1","o"]}"#).unwrap();
        assert_eq!((doc.width, doc.height), (2, 2));
    }

    #[test]
    fn json_height_mismatch_is_rejected() {
        let err = parse_map(r#"{"width":2,"height":3,"rows":["xo","  "]}"#).unwrap_err();
        assert!(matches!(
            err,
            MapParseError::HeightMismatch {
                declared: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn json_row_wider_than_declared_is_rejected() {
        let err = parse_map(r#"{"width":1,"rows":["xo"]}"#).unwrap_err();
        assert!(matches!(err, MapParseError::RowTooWide { row: 0, len: 2, .. }));
    }

    #[test]
    fn malformed_json_is_a_typed_error() {
        assert!(matches!(parse_map("{\"rows\": [").unwrap_err(), MapParseError::Json(_)));
    }

    #[test]
    fn empty_documents_are_rejected() {
        assert!(matches!(parse_map("").unwrap_err(), MapParseError::Empty));
        assert!(matches!(parse_map("\n\n").unwrap_err(), MapParseError::Empty));
        assert!(matches!(parse_map("[]").unwrap_err(), MapParseError::Empty));
        // rows present but no cells in any of them
        assert!(matches!(parse_map(r#"[""]"#).unwrap_err(), MapParseError::Empty));
        assert!(matches!(parse_map(r#"["", ""]"#).unwrap_err(), MapParseError::Empty));
        assert!(matches!(
            parse_map(r#"{"rows": [""], "height": 1}"#).unwrap_err(),
            MapParseError::Empty
        ));
    }
}
