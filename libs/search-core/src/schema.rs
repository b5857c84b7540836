//! Column registry: which attributes are searchable, where they live and
//! what semantic type their literals must parse as.

use std::collections::HashMap;
use std::fmt;

use crate::op::SearchOp;

/// A physical `table.column` reference. Always a static identifier, never
/// client text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: &'static str,
    pub column: &'static str,
}

impl ColumnRef {
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self { table, column }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Which of the two joined tables an attribute belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnGroup {
    /// Identity and ownership attributes, one row per resource id.
    Identity,
    /// Per-version attributes, one row per (id, version).
    Version,
}

/// Semantic type of a searchable column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    String,
    Boolean,
    Integer,
    Timestamp,
    Uuid,
    Enum(&'static [&'static str]),
    StringArray,
}

impl ColumnKind {
    /// Array columns interpret set membership as containment.
    pub fn effective_op(self, op: SearchOp) -> SearchOp {
        match (self, op) {
            (Self::StringArray, SearchOp::In) => SearchOp::Contains,
            (Self::StringArray, SearchOp::Nin) => SearchOp::Ncontains,
            (_, op) => op,
        }
    }

    /// Static operator/type compatibility table. `op` is the effective
    /// operator (after [`ColumnKind::effective_op`]).
    pub fn allows(self, op: SearchOp) -> bool {
        use SearchOp::*;
        match self {
            Self::String => !matches!(op, Contains | Ncontains),
            Self::Boolean => matches!(op, Eq | Neq),
            Self::Integer => matches!(
                op,
                Eq | Neq | Lt | Lte | Gt | Gte | In | Nin | Between | Nbetween
            ),
            Self::Timestamp => matches!(op, Eq | Neq | Lt | Lte | Gt | Gte | Between | Nbetween),
            Self::Uuid | Self::Enum(_) => matches!(op, Eq | Neq | In | Nin),
            Self::StringArray => matches!(op, Contains | Ncontains),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
            Self::Enum(_) => "enum",
            Self::StringArray => "string-array",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    /// Canonical (snake_case) attribute name.
    pub name: &'static str,
    pub column: ColumnRef,
    pub kind: ColumnKind,
    pub group: ColumnGroup,
    /// The column may hold no value.
    pub nullable: bool,
}

impl ColumnDef {
    /// A continuation value taken from this column can be sent back as a
    /// strict `gt`/`lt` bound without skipping absent values.
    pub fn supports_keyset(&self) -> bool {
        !self.nullable && self.kind.allows(SearchOp::Gt) && self.kind.allows(SearchOp::Lt)
    }
}

/// Columns the compiler itself needs beyond client-searchable attributes.
#[derive(Clone, Debug)]
pub struct KeyColumns {
    pub tenant: ColumnRef,
    pub id: ColumnRef,
    pub owner: ColumnRef,
    pub deleted: ColumnRef,
    pub latest_version: ColumnRef,
    pub version: ColumnRef,
    /// Appended to every ordering, in order, to make it total.
    pub tiebreakers: Vec<ColumnRef>,
}

/// Hand-maintained registry `attribute -> ColumnDef`.
#[derive(Clone, Debug)]
pub struct SchemaTable {
    identity_table: &'static str,
    version_table: &'static str,
    columns: HashMap<&'static str, ColumnDef>,
    keys: KeyColumns,
}

impl SchemaTable {
    pub fn new(identity_table: &'static str, version_table: &'static str, keys: KeyColumns) -> Self {
        Self {
            identity_table,
            version_table,
            columns: HashMap::new(),
            keys,
        }
    }

    /// Register an attribute stored on the identity table under the same name.
    pub fn identity(self, name: &'static str, kind: ColumnKind) -> Self {
        let table = self.identity_table;
        self.register(name, table, kind, ColumnGroup::Identity, false)
    }

    /// Register an attribute stored on the version table under the same name.
    pub fn version(self, name: &'static str, kind: ColumnKind) -> Self {
        let table = self.version_table;
        self.register(name, table, kind, ColumnGroup::Version, false)
    }

    /// Like [`SchemaTable::version`], for a column that may hold no value.
    pub fn optional_version(self, name: &'static str, kind: ColumnKind) -> Self {
        let table = self.version_table;
        self.register(name, table, kind, ColumnGroup::Version, true)
    }

    fn register(
        mut self,
        name: &'static str,
        table: &'static str,
        kind: ColumnKind,
        group: ColumnGroup,
        nullable: bool,
    ) -> Self {
        self.columns.insert(
            name,
            ColumnDef {
                name,
                column: ColumnRef::new(table, name),
                kind,
                group,
                nullable,
            },
        );
        self
    }

    pub fn keys(&self) -> &KeyColumns {
        &self.keys
    }

    /// Resolve an attribute: exact name first, then the snake_case form of a
    /// camelCase name (`maxJobs` -> `max_jobs`).
    pub fn resolve(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .get(name)
            .or_else(|| self.columns.get(snake_case(name).as_str()))
    }

    /// True when `def` is the per-version `version` attribute.
    pub fn is_version_attribute(&self, def: &ColumnDef) -> bool {
        def.column == self.keys.version
    }

    pub fn attributes(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.values()
    }
}

pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
