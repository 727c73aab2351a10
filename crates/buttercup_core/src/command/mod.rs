//! The mutation command language.
//!
//! Every change to an archive is expressed as a command: a 3-letter slug
//! followed by positional string arguments, serialized as one history line.
//! The descriptor table below is the single authority on which slugs exist,
//! their argument shapes, and whether replaying them removes information
//! (the `destructive` flag drives merge stripping).
//!
//! # Key Components
//!
//! - [`Slug`] - the command opcodes
//! - [`Command`] - a decoded command (slug + arguments)
//! - [`CommandBuilder`] - constructs validated, encoded command lines
//! - [`COMMAND_DESCRIPTORS`] - the full descriptor table

mod builder;
mod codec;

pub use builder::{generate_entity_id, CommandBuilder};

/// Sentinel parent ID meaning "the archive root".
pub const ROOT_PARENT_ID: &str = "0";

/// Shape of one positional command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// An opaque entity ID (group, entry, or the root sentinel)
    EntityId,
    /// An attribute or property key
    Key,
    /// An attribute or property value (may be empty, may contain spaces)
    Value,
    /// A random padding nonce
    Nonce,
    /// The on-disk format tag
    Format,
}

/// Command opcodes, one per history-line slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slug {
    /// `aid` - assign the archive its opaque identifier
    ArchiveId,
    /// `saa` - set an archive attribute
    SetArchiveAttribute,
    /// `daa` - delete an archive attribute
    DeleteArchiveAttribute,
    /// `cgr` - create a group under a parent
    CreateGroup,
    /// `tgr` - set a group title
    SetGroupTitle,
    /// `mgr` - move a group to a new parent
    MoveGroup,
    /// `dgr` - delete a group and its subtree
    DeleteGroup,
    /// `sga` - set a group attribute
    SetGroupAttribute,
    /// `dga` - delete a group attribute
    DeleteGroupAttribute,
    /// `cen` - create an entry in a group
    CreateEntry,
    /// `men` - move an entry to another group
    MoveEntry,
    /// `den` - delete an entry
    DeleteEntry,
    /// `sep` - set an entry property
    SetEntryProperty,
    /// `dep` - delete an entry property
    DeleteEntryProperty,
    /// `sea` - set an entry attribute
    SetEntryAttribute,
    /// `dea` - delete an entry attribute
    DeleteEntryAttribute,
    /// `pad` - padding no-op with a random nonce
    Pad,
    /// `fmt` - on-disk format tag
    Format,
}

/// Descriptor for one command: symbolic name, wire slug, argument shapes,
/// and whether replay removes information.
#[derive(Debug)]
pub struct CommandDescriptor {
    /// Symbolic name
    pub name: &'static str,
    /// The opcode
    pub slug: Slug,
    /// The 3-letter wire form
    pub code: &'static str,
    /// Positional argument shapes
    pub args: &'static [ArgKind],
    /// True if replaying this command removes information
    pub destructive: bool,
}

use self::ArgKind::{EntityId, Format as FormatArg, Key, Nonce, Value};

/// The canonical command set.
pub const COMMAND_DESCRIPTORS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "archive-id",
        slug: Slug::ArchiveId,
        code: "aid",
        args: &[EntityId],
        destructive: false,
    },
    CommandDescriptor {
        name: "set-archive-attribute",
        slug: Slug::SetArchiveAttribute,
        code: "saa",
        args: &[Key, Value],
        destructive: false,
    },
    CommandDescriptor {
        name: "delete-archive-attribute",
        slug: Slug::DeleteArchiveAttribute,
        code: "daa",
        args: &[Key],
        destructive: true,
    },
    CommandDescriptor {
        name: "create-group",
        slug: Slug::CreateGroup,
        code: "cgr",
        args: &[EntityId, EntityId],
        destructive: false,
    },
    CommandDescriptor {
        name: "set-group-title",
        slug: Slug::SetGroupTitle,
        code: "tgr",
        args: &[EntityId, Value],
        destructive: false,
    },
    CommandDescriptor {
        name: "move-group",
        slug: Slug::MoveGroup,
        code: "mgr",
        args: &[EntityId, EntityId],
        destructive: false,
    },
    CommandDescriptor {
        name: "delete-group",
        slug: Slug::DeleteGroup,
        code: "dgr",
        args: &[EntityId],
        destructive: true,
    },
    CommandDescriptor {
        name: "set-group-attribute",
        slug: Slug::SetGroupAttribute,
        code: "sga",
        args: &[EntityId, Key, Value],
        destructive: false,
    },
    CommandDescriptor {
        name: "delete-group-attribute",
        slug: Slug::DeleteGroupAttribute,
        code: "dga",
        args: &[EntityId, Key],
        destructive: true,
    },
    CommandDescriptor {
        name: "create-entry",
        slug: Slug::CreateEntry,
        code: "cen",
        args: &[EntityId, EntityId],
        destructive: false,
    },
    CommandDescriptor {
        name: "move-entry",
        slug: Slug::MoveEntry,
        code: "men",
        args: &[EntityId, EntityId],
        destructive: false,
    },
    CommandDescriptor {
        name: "delete-entry",
        slug: Slug::DeleteEntry,
        code: "den",
        args: &[EntityId],
        destructive: true,
    },
    CommandDescriptor {
        name: "set-entry-property",
        slug: Slug::SetEntryProperty,
        code: "sep",
        args: &[EntityId, Key, Value],
        destructive: false,
    },
    CommandDescriptor {
        name: "delete-entry-property",
        slug: Slug::DeleteEntryProperty,
        code: "dep",
        args: &[EntityId, Key],
        destructive: true,
    },
    CommandDescriptor {
        name: "set-entry-attribute",
        slug: Slug::SetEntryAttribute,
        code: "sea",
        args: &[EntityId, Key, Value],
        destructive: false,
    },
    CommandDescriptor {
        name: "delete-entry-attribute",
        slug: Slug::DeleteEntryAttribute,
        code: "dea",
        args: &[EntityId, Key],
        destructive: true,
    },
    CommandDescriptor {
        name: "pad",
        slug: Slug::Pad,
        code: "pad",
        args: &[Nonce],
        destructive: false,
    },
    CommandDescriptor {
        name: "format",
        slug: Slug::Format,
        code: "fmt",
        args: &[FormatArg],
        destructive: false,
    },
];

impl Slug {
    /// The 3-letter wire form.
    pub fn code(&self) -> &'static str {
        self.descriptor().code
    }

    /// Look up a slug by its wire form.
    pub fn from_code(code: &str) -> Option<Slug> {
        COMMAND_DESCRIPTORS
            .iter()
            .find(|d| d.code == code)
            .map(|d| d.slug)
    }

    /// Whether replaying this command removes information.
    pub fn is_destructive(&self) -> bool {
        self.descriptor().destructive
    }

    /// The full descriptor for this slug.
    pub fn descriptor(&self) -> &'static CommandDescriptor {
        COMMAND_DESCRIPTORS
            .iter()
            .find(|d| d.slug == *self)
            .expect("every slug has a descriptor")
    }
}

/// A decoded command: slug plus positional arguments.
///
/// Immutable once built; the sole unit of mutation against an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The opcode
    pub slug: Slug,
    /// Positional arguments, unquoted
    pub args: Vec<String>,
}

impl Command {
    /// Whether replaying this command removes information.
    pub fn is_destructive(&self) -> bool {
        self.slug.is_destructive()
    }
}

/// True if the history line is a `pad` no-op.
pub fn is_padding_line(line: &str) -> bool {
    line.starts_with("pad ") || line == "pad"
}

/// True if the history line carries a destructive command.
///
/// Lines that fail to decode are not destructive; replay will reject them
/// with a proper error instead.
pub fn is_destructive_line(line: &str) -> bool {
    line.get(..3)
        .and_then(Slug::from_code)
        .is_some_and(|slug| slug.is_destructive())
}
