//! quick-xml event walk over a level document.

use super::{LevelData, LoadError, LoadResult};
use crate::wfc::{CellPos, DirectionSet, NeighborRule, TileDef};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

pub(super) fn parse_levels(xml: &str) -> LoadResult<Vec<LevelData>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut levels = Vec::new();
    let mut level: Option<LevelData> = None;
    let mut tile: Option<TileDef> = None;

    loop {
        let (element, empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"tile" => {
                        if let (Some(level), Some(def)) = (level.as_mut(), tile.take()) {
                            level.tiles.push(def);
                        }
                    }
                    b"level" => levels.extend(level.take()),
                    _ => {}
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(LoadError::Xml(format!(
                    "at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => continue,
        };

        let name = element_name(&element)?;
        let attrs = parse_attributes(&element)?;

        match name.as_str() {
            "levels" => {}
            "level" => {
                let data = parse_level(&attrs)?;
                if empty {
                    levels.push(data);
                } else {
                    level = Some(data);
                }
            }
            "tile" => {
                let Some(current) = level.as_mut() else {
                    warn!("<tile> outside <level> ignored");
                    continue;
                };
                let def = parse_tile(&attrs)?;
                if empty {
                    current.tiles.push(def);
                } else {
                    tile = Some(def);
                }
            }
            "constraint" => {
                let Some(current) = tile.as_mut() else {
                    warn!("<constraint> outside <tile> ignored");
                    continue;
                };
                let (directions, neighbors) = parse_constraint(&attrs)?;
                current.rules.push(NeighborRule {
                    directions,
                    neighbors,
                });
            }
            other => warn!(element = other, "unknown element ignored"),
        }
    }

    Ok(levels)
}

fn parse_level(attrs: &HashMap<String, String>) -> LoadResult<LevelData> {
    let rows: usize = required_parsed(attrs, "level", "rows")?;
    let cols: usize = required_parsed(attrs, "level", "cols")?;
    for (attribute, value) in [("rows", rows), ("cols", cols)] {
        if value == 0 {
            return Err(invalid("level", attribute, "0", "must be at least 1"));
        }
    }

    let cell_size: f32 = optional_parsed(attrs, "level", "cellSize")?.unwrap_or(1.0);
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(invalid(
            "level",
            "cellSize",
            &cell_size.to_string(),
            "must be positive",
        ));
    }

    Ok(LevelData {
        name: required(attrs, "level", "name")?.to_string(),
        rows,
        cols,
        cell_size,
        start: optional_cell(attrs, "startRow", "startCol")?,
        end: optional_cell(attrs, "endRow", "endCol")?,
        tiles: Vec::new(),
    })
}

fn parse_tile(attrs: &HashMap<String, String>) -> LoadResult<TileDef> {
    let id = required(attrs, "tile", "id")?;
    let frequency: f64 = optional_parsed(attrs, "tile", "frequency")?.unwrap_or(1.0);
    let mut def = TileDef::new(id, frequency);
    if let Some(prefab) = attrs.get("prefab") {
        def = def.with_visual(prefab.as_str());
    }
    Ok(def)
}

fn parse_constraint(attrs: &HashMap<String, String>) -> LoadResult<(DirectionSet, Vec<String>)> {
    let directions: DirectionSet = required(attrs, "constraint", "direction")?.parse()?;
    let neighbors = required(attrs, "constraint", "neighbors")?
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Ok((directions, neighbors))
}

/// Both coordinates or neither.
fn optional_cell(
    attrs: &HashMap<String, String>,
    row_attr: &str,
    col_attr: &str,
) -> LoadResult<Option<CellPos>> {
    let row: Option<usize> = optional_parsed(attrs, "level", row_attr)?;
    let col: Option<usize> = optional_parsed(attrs, "level", col_attr)?;
    match (row, col) {
        (Some(row), Some(col)) => Ok(Some(CellPos::new(row, col))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(missing("level", col_attr)),
        (None, Some(_)) => Err(missing("level", row_attr)),
    }
}

fn required<'a>(
    attrs: &'a HashMap<String, String>,
    element: &str,
    attribute: &str,
) -> LoadResult<&'a str> {
    attrs
        .get(attribute)
        .map(String::as_str)
        .ok_or_else(|| missing(element, attribute))
}

fn required_parsed<T>(attrs: &HashMap<String, String>, element: &str, attribute: &str) -> LoadResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_parsed(attrs, element, attribute)?.ok_or_else(|| missing(element, attribute))
}

fn optional_parsed<T>(
    attrs: &HashMap<String, String>,
    element: &str,
    attribute: &str,
) -> LoadResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match attrs.get(attribute) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(element, attribute, value, &e.to_string())),
    }
}

fn missing(element: &str, attribute: &str) -> LoadError {
    LoadError::MissingAttribute {
        element: element.to_string(),
        attribute: attribute.to_string(),
    }
}

fn invalid(element: &str, attribute: &str, value: &str, reason: &str) -> LoadError {
    LoadError::InvalidAttribute {
        element: element.to_string(),
        attribute: attribute.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn element_name(e: &BytesStart) -> LoadResult<String> {
    std::str::from_utf8(e.name().as_ref())
        .map_err(|err| LoadError::Xml(format!("invalid UTF-8: {}", err)))
        .map(|s| s.to_string())
}

fn parse_attributes(elem: &BytesStart) -> LoadResult<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr_result in elem.attributes() {
        let attr = attr_result.map_err(|e| LoadError::Xml(format!("attribute error: {}", e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| LoadError::Xml(format!("invalid UTF-8 in attribute key: {}", e)))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| LoadError::Xml(format!("invalid attribute value: {}", e)))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}
