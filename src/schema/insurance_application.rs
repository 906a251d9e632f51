use super::{Column, Constraint, Table};

// Owned by the host application. Only the host initialization path creates
// it; the maintenance procedures inspect it.
pub static INSURANCE_APPLICATION: Table = Table {
    name: "insurance_application",
    primary_key: "id",
    columns: &[
        Column::new("id", "INTEGER").not_null(),
        Column::new("member_id", "INTEGER").not_null(),
        Column::new("partner_group_id", "INTEGER"),
        Column::new("car_number", "VARCHAR(32)"),
        Column::new("customer_name", "VARCHAR(128)"),
        Column::new("status", "VARCHAR(32)"),
        Column::new("created_at", "DATETIME"),
    ],
    constraints: &[
        Constraint::ForeignKey {
            column: "member_id",
            table: "member",
            references: "id",
        },
        Constraint::ForeignKey {
            column: "partner_group_id",
            table: "partner_group",
            references: "id",
        },
    ],
    indexes: &[],
};
