//! Resource descriptors
//!
//! Tunnels, routes and points-of-presence share one `list` / `show`
//! command pair each; only the verb and the listing shape differ.

use super::codec::{self, read_block, read_single_reply};
use super::record::{DetailRecord, ListingRecord, Route, Tunnel};
use super::transport::LineIo;
use super::{Result, CODE_LIST_BEGIN, CODE_LIST_END};

/// How the body of a `list` reply is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingShape {
    /// Whitespace-separated fields, exactly one per name
    Fields(&'static [&'static str]),
    /// One opaque identifier per line
    Identifiers,
}

/// A listable, showable server resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    /// Command verb (`tunnel`, `route`, `pop`)
    pub verb: &'static str,
    /// Layout of `list` bodies
    pub shape: ListingShape,
}

impl ResourceKind {
    pub const TUNNEL: ResourceKind = ResourceKind {
        verb: "tunnel",
        shape: ListingShape::Fields(&Tunnel::FIELDS),
    };

    pub const ROUTE: ResourceKind = ResourceKind {
        verb: "route",
        shape: ListingShape::Fields(&Route::FIELDS),
    };

    pub const POP: ResourceKind = ResourceKind {
        verb: "pop",
        shape: ListingShape::Identifiers,
    };

    /// The `list` command for this resource
    pub fn list_command(&self) -> String {
        format!("{} list", self.verb)
    }

    /// The `show` command for one resource id
    pub fn show_command(&self, id: &str) -> String {
        format!("{} show {}", self.verb, id)
    }
}

/// Result of a `list` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Records(Vec<ListingRecord>),
    Identifiers(Vec<String>),
}

impl Listing {
    fn empty(kind: &ResourceKind) -> Self {
        match kind.shape {
            ListingShape::Fields(_) => Listing::Records(Vec::new()),
            ListingShape::Identifiers => Listing::Identifiers(Vec::new()),
        }
    }

    /// Take the fixed-field records (empty for identifier listings)
    pub fn into_records(self) -> Vec<ListingRecord> {
        match self {
            Listing::Records(records) => records,
            Listing::Identifiers(_) => Vec::new(),
        }
    }

    /// Take the identifiers (empty for fixed-field listings)
    pub fn into_identifiers(self) -> Vec<String> {
        match self {
            Listing::Identifiers(ids) => ids,
            Listing::Records(_) => Vec::new(),
        }
    }
}

fn is_list_end(code: &str) -> bool {
    code == CODE_LIST_END
}

/// Run `<verb> list` and parse the block
///
/// A success reply other than `201` means the server has nothing to list
/// and no block follows.
pub fn list<T: LineIo + ?Sized>(io: &mut T, kind: &ResourceKind) -> Result<Listing> {
    codec::send_command(io, &kind.list_command())?;

    let status = read_single_reply(io)?;
    if status.code() != CODE_LIST_BEGIN {
        tracing::warn!("Could not list {}s: {}", kind.verb, status.message());
        return Ok(Listing::empty(kind));
    }

    let lines = read_block(io, is_list_end)?;
    match kind.shape {
        ListingShape::Fields(names) => {
            let records = codec::parse_fixed_field_listing(&lines, names).map_err(|e| {
                tracing::error!("Wrong field format when listing {}s", kind.verb);
                e
            })?;
            Ok(Listing::Records(records))
        }
        ListingShape::Identifiers => Ok(Listing::Identifiers(
            lines.into_iter().map(|l| l.trim().to_string()).collect(),
        )),
    }
}

/// Run `<verb> show <id>` and parse the key/value block
pub fn show<T: LineIo + ?Sized>(io: &mut T, kind: &ResourceKind, id: &str) -> Result<DetailRecord> {
    codec::check_argument("id", id)?;
    codec::send_command(io, &kind.show_command(id))?;

    read_single_reply(io)?;
    let lines = read_block(io, is_list_end)?;
    codec::parse_key_value_block(&lines)
}
