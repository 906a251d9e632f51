use super::{Column, Table};

pub static PARTNER_GROUP: Table = Table {
    name: "partner_group",
    primary_key: "id",
    columns: &[
        Column::new("id", "INTEGER").not_null(),
        Column::new("name", "VARCHAR(255)"),
        Column::new("business_number", "VARCHAR(64)"),
        Column::new("corporation_number", "VARCHAR(64)"),
        Column::new("representative", "VARCHAR(128)"),
        Column::new("phone", "VARCHAR(64)"),
        Column::new("mobile", "VARCHAR(64)"),
        Column::new("address", "VARCHAR(255)"),
        Column::new("bank_name", "VARCHAR(64)"),
        Column::new("account_number", "VARCHAR(64)"),
        Column::new("logo_path", "VARCHAR(512)"),
        Column::new("created_at", "DATETIME"),
    ],
    constraints: &[],
    indexes: &[],
};
