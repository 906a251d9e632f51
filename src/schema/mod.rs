//! Declarative description of the persisted schema.
//!
//! Every table is declared once as data. The bootstrap, host initialization,
//! migration and verification paths all render or inspect SQL from these
//! declarations rather than carrying their own statement lists.

mod insurance_application;
mod member;
mod partner_group;

pub use insurance_application::INSURANCE_APPLICATION;
pub use member::MEMBER;
pub use partner_group::PARTNER_GROUP;

/// Tables created by the direct bootstrap, in dependency order.
pub static BOOTSTRAP_TABLES: [&Table; 2] = [&PARTNER_GROUP, &MEMBER];

/// Every table the host application owns, in dependency order.
pub static ALL_TABLES: [&Table; 3] = [&PARTNER_GROUP, &MEMBER, &INSURANCE_APPLICATION];

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub not_null: bool,
    /// SQL literal, already quoted.
    pub default: Option<&'static str>,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Column {
            name,
            sql_type,
            not_null: false,
            default: None,
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub const fn default(mut self, literal: &'static str) -> Self {
        self.default = Some(literal);
        self
    }

    pub fn is_text(&self) -> bool {
        let ty = self.sql_type.to_ascii_uppercase();
        ty.starts_with("VARCHAR") || ty.starts_with("TEXT") || ty.starts_with("CHAR")
    }

    fn definition(&self, shape: Shape, is_primary_key: bool) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        // The primary key keeps its NOT NULL marker in every shape
        if self.not_null && (is_primary_key || shape == Shape::Constrained) {
            sql.push_str(" NOT NULL");
        }
        if let (Some(default), Shape::Constrained) = (self.default, shape) {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }
}

#[derive(Debug)]
pub enum Constraint {
    Check {
        name: &'static str,
        column: &'static str,
        allowed: fn() -> Vec<&'static str>,
    },
    Unique {
        name: &'static str,
        columns: &'static [&'static str],
    },
    ForeignKey {
        column: &'static str,
        table: &'static str,
        references: &'static str,
    },
}

impl Constraint {
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Constraint::Check { name, .. } | Constraint::Unique { name, .. } => Some(*name),
            Constraint::ForeignKey { .. } => None,
        }
    }

    fn definition(&self) -> String {
        match self {
            Constraint::Check {
                name,
                column,
                allowed,
            } => {
                let values: Vec<String> = allowed().into_iter().map(quote_literal).collect();
                format!("CONSTRAINT {} CHECK ({} IN ({}))", name, column, values.join(","))
            }
            Constraint::Unique { name, columns } => {
                format!("CONSTRAINT {} UNIQUE ({})", name, columns.join(", "))
            }
            Constraint::ForeignKey {
                column,
                table,
                references,
            } => format!("FOREIGN KEY({}) REFERENCES {} ({})", column, table, references),
        }
    }
}

#[derive(Debug)]
pub struct Index {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Which part of a declaration is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Every column marker and table constraint
    Constrained,
    /// Column names, types and the primary key only
    Unconstrained,
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [Column],
    pub constraints: &'static [Constraint],
    pub indexes: &'static [Index],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// `(column, referenced table, referenced column)` for each foreign key.
    pub fn foreign_keys(&self) -> Vec<(&'static str, &'static str, &'static str)> {
        self.constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::ForeignKey {
                    column,
                    table,
                    references,
                } => Some((*column, *table, *references)),
                _ => None,
            })
            .collect()
    }

    /// Renders `CREATE TABLE` for this declaration under `table_name`, which
    /// differs from `self.name` when building staging tables.
    pub fn create_sql(&self, table_name: &str, shape: Shape, if_not_exists: bool) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.definition(shape, c.name == self.primary_key))
            .collect();

        lines.push(format!("PRIMARY KEY ({})", self.primary_key));

        if shape == Shape::Constrained {
            lines.extend(self.constraints.iter().map(Constraint::definition));
        }

        format!(
            "CREATE TABLE {}{} (\n    {}\n)",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            table_name,
            lines.join(",\n    ")
        )
    }

    pub fn create_index_sql(&self, if_not_exists: bool) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| {
                format!(
                    "CREATE INDEX {}{} ON {} ({})",
                    if if_not_exists { "IF NOT EXISTS " } else { "" },
                    index.name,
                    self.name,
                    index.columns.join(", ")
                )
            })
            .collect()
    }
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
