//! Strict payload parser
//!
//! Turns [`RawBoard`] payloads into validated records. Required fields are
//! checked up front so nothing downstream ever sees a half-formed board:
//! the first violation aborts with a [`ParseError`].

use crate::error::ParseError;
use crate::payload::{RawBoard, RawColumnValue, RawGroup, RawItem, RawSubitem};
use boardsync_model::RemoteId;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Name prefix of the hidden boards that hold sub-items
pub const SUBITEM_BOARD_PREFIX: &str = "Subitems of ";

/// Board lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardState {
    /// Live board
    Active,
    /// Archived board
    Archived,
    /// Deleted board (still listed for a grace period)
    Deleted,
}

/// Validated board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRecord {
    pub id: RemoteId,
    pub name: String,
    pub description: Option<String>,
    pub external_ref: Option<String>,
    pub state: BoardState,
    /// Groups in remote order, each holding its items in remote order
    pub groups: Vec<GroupRecord>,
}

impl BoardRecord {
    /// Whether this is a hidden sub-item board
    #[inline]
    #[must_use]
    pub fn is_subitem_board(&self) -> bool {
        self.name.starts_with(SUBITEM_BOARD_PREFIX)
    }

    /// Whether this board should be mirrored as a project
    #[inline]
    #[must_use]
    pub fn is_project_board(&self) -> bool {
        self.state == BoardState::Active && !self.is_subitem_board()
    }
}

/// Validated group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: RemoteId,
    pub title: String,
    pub color: Option<String>,
    pub items: Vec<ItemRecord>,
}

/// Validated item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: RemoteId,
    pub name: String,
    /// Text of the first status column, if any
    pub status_text: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub person: Option<String>,
    pub subitems: Vec<SubitemRecord>,
}

/// Validated sub-item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubitemRecord {
    pub id: RemoteId,
    pub name: String,
    pub status_text: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub person: Option<String>,
}

/// Parse a list of boards, failing on the first invalid one
///
/// # Errors
/// The first [`ParseError`] encountered.
pub fn parse_boards(raw: &[RawBoard]) -> Result<Vec<BoardRecord>, ParseError> {
    raw.iter().map(parse_board).collect()
}

/// Parse one board with its groups, items and sub-items
///
/// # Errors
/// - `ParseError::MissingField` / `EmptyIdentifier` for absent data
/// - `ParseError::UnknownBoardState` for an unrecognised state
/// - `ParseError::UnknownGroup` for an item pointing outside the board
/// - `ParseError::InvalidDate` for a malformed date column
pub fn parse_board(raw: &RawBoard) -> Result<BoardRecord, ParseError> {
    let id = required_id("board", raw.id.as_deref())?;
    let name = required(&raw.name, "board", &id, "name")?;
    let state_text = required(&raw.state, "board", &id, "state")?;
    let state = match state_text.to_ascii_lowercase().as_str() {
        "active" => BoardState::Active,
        "archived" => BoardState::Archived,
        "deleted" => BoardState::Deleted,
        _ => {
            return Err(ParseError::UnknownBoardState {
                board: id.to_string(),
                state: state_text,
            })
        }
    };

    let mut groups = raw
        .groups
        .iter()
        .map(parse_group)
        .collect::<Result<Vec<_>, _>>()?;

    let index: HashMap<RemoteId, usize> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (g.id.clone(), i))
        .collect();

    for raw_item in &raw.items {
        let item = parse_item(raw_item)?;
        let group_id = raw_item
            .group
            .as_ref()
            .and_then(|g| g.id.as_deref())
            .ok_or_else(|| ParseError::MissingField {
                entity: "item",
                id: item.id.to_string(),
                field: "group",
            })?;
        let slot = index
            .get(&RemoteId::from(group_id))
            .ok_or_else(|| ParseError::UnknownGroup {
                item: item.id.to_string(),
                group: group_id.to_string(),
            })?;
        groups[*slot].items.push(item);
    }

    Ok(BoardRecord {
        id,
        name,
        description: raw.description.clone().filter(|d| !d.trim().is_empty()),
        external_ref: raw
            .external_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        state,
        groups,
    })
}

fn parse_group(raw: &RawGroup) -> Result<GroupRecord, ParseError> {
    let id = required_id("group", raw.id.as_deref())?;
    let title = required(&raw.title, "group", &id, "title")?;
    Ok(GroupRecord {
        id,
        title,
        color: raw.color.clone().filter(|c| !c.is_empty()),
        items: Vec::new(),
    })
}

fn parse_item(raw: &RawItem) -> Result<ItemRecord, ParseError> {
    let id = required_id("item", raw.id.as_deref())?;
    let name = required(&raw.name, "item", &id, "name")?;
    let columns = Columns::new(&raw.column_values);
    let due_date = columns.due_date("item", &id)?;
    let subitems = raw
        .subitems
        .iter()
        .map(parse_subitem)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ItemRecord {
        status_text: columns.status_text(),
        person: columns.person(),
        due_date,
        id,
        name,
        subitems,
    })
}

fn parse_subitem(raw: &RawSubitem) -> Result<SubitemRecord, ParseError> {
    let id = required_id("sub-item", raw.id.as_deref())?;
    let name = required(&raw.name, "sub-item", &id, "name")?;
    let columns = Columns::new(&raw.column_values);
    let due_date = columns.due_date("sub-item", &id)?;

    Ok(SubitemRecord {
        status_text: columns.status_text(),
        person: columns.person(),
        due_date,
        id,
        name,
    })
}

fn required_id(entity: &'static str, raw: Option<&str>) -> Result<RemoteId, ParseError> {
    match raw {
        None => Err(ParseError::MissingField {
            entity,
            id: "?".to_string(),
            field: "id",
        }),
        Some(id) if id.trim().is_empty() => Err(ParseError::EmptyIdentifier { entity }),
        Some(id) => Ok(RemoteId::from(id)),
    }
}

fn required(
    value: &Option<String>,
    entity: &'static str,
    id: &RemoteId,
    field: &'static str,
) -> Result<String, ParseError> {
    value.clone().ok_or_else(|| ParseError::MissingField {
        entity,
        id: id.to_string(),
        field,
    })
}

/// Column lookup helpers over one entity's column values
struct Columns<'a> {
    values: &'a [RawColumnValue],
}

impl<'a> Columns<'a> {
    fn new(values: &'a [RawColumnValue]) -> Self {
        Self { values }
    }

    /// First column typed `status`, or whose id or title mentions "status"
    fn status_text(&self) -> Option<String> {
        self.values
            .iter()
            .find(|c| {
                c.kind.as_deref() == Some("status")
                    || mentions_status(c.id.as_deref())
                    || mentions_status(c.title.as_deref())
            })
            .and_then(|c| non_empty(c.text.as_deref()))
    }

    fn person(&self) -> Option<String> {
        self.first_of_kind(&["people", "person"])
            .and_then(|c| non_empty(c.text.as_deref()))
    }

    fn due_date(&self, entity: &'static str, id: &RemoteId) -> Result<Option<NaiveDate>, ParseError> {
        let Some(text) = self
            .first_of_kind(&["date"])
            .and_then(|c| non_empty(c.text.as_deref()))
        else {
            return Ok(None);
        };

        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ParseError::InvalidDate {
                entity,
                id: id.to_string(),
                value: text,
            })
    }

    fn first_of_kind(&self, kinds: &[&str]) -> Option<&'a RawColumnValue> {
        self.values
            .iter()
            .find(|c| c.kind.as_deref().is_some_and(|k| kinds.contains(&k)))
    }
}

fn mentions_status(text: Option<&str>) -> bool {
    text.is_some_and(|t| t.to_lowercase().contains("status"))
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty()).map(str::to_string)
}
