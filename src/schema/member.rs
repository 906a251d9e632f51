use super::{Column, Constraint, Index, Table};
use crate::models::{allowed_values, ApprovalStatus, MemberType, Role, SettlementMethod};

/// Member accounts. `partner_group_id` is NULL only for the global admin.
pub static MEMBER: Table = Table {
    name: "member",
    primary_key: "id",
    columns: &[
        Column::new("id", "INTEGER").not_null(),
        Column::new("partner_group_id", "INTEGER"),
        Column::new("username", "VARCHAR(120)").not_null(),
        Column::new("password_hash", "VARCHAR(255)").not_null(),
        Column::new("company_name", "VARCHAR(255)").not_null(),
        Column::new("position", "VARCHAR(128)").not_null().default("''"),
        Column::new("full_name", "VARCHAR(128)").not_null().default("''"),
        Column::new("license_number", "VARCHAR(64)").not_null().default("''"),
        Column::new("address", "VARCHAR(255)"),
        Column::new("business_number", "VARCHAR(64)").not_null(),
        Column::new("car_dealership_number", "VARCHAR(64)").not_null(),
        Column::new("corporation_number", "VARCHAR(64)"),
        Column::new("representative", "VARCHAR(128)").not_null(),
        Column::new("phone", "VARCHAR(64)"),
        Column::new("mobile", "VARCHAR(64)"),
        Column::new("email", "VARCHAR(255)"),
        Column::new("registration_cert_path", "VARCHAR(512)"),
        Column::new("license_attachment_path", "VARCHAR(512)"),
        Column::new("member_type", "VARCHAR(32)").not_null().default("'법인사업자'"),
        Column::new("privacy_agreement", "BOOLEAN").default("0"),
        Column::new("approval_status", "VARCHAR(32)").default("'신청'"),
        Column::new("role", "VARCHAR(32)").default("'member'"),
        Column::new("memo", "VARCHAR(255)"),
        Column::new("point_balance", "INTEGER").default("0"),
        Column::new("settlement_method", "VARCHAR(16)").default("'포인트'"),
        Column::new("claim_amount", "INTEGER").default("0"),
        Column::new("created_at", "DATETIME"),
    ],
    constraints: &[
        Constraint::Check {
            name: "ck_member_approval_status",
            column: "approval_status",
            allowed: allowed_values::<ApprovalStatus>,
        },
        Constraint::Check {
            name: "ck_member_role",
            column: "role",
            allowed: allowed_values::<Role>,
        },
        Constraint::Check {
            name: "ck_member_type",
            column: "member_type",
            allowed: allowed_values::<MemberType>,
        },
        Constraint::Check {
            name: "ck_member_settlement_method",
            column: "settlement_method",
            allowed: allowed_values::<SettlementMethod>,
        },
        Constraint::Unique {
            name: "uq_member_username_partner",
            columns: &["username", "partner_group_id"],
        },
        Constraint::ForeignKey {
            column: "partner_group_id",
            table: "partner_group",
            references: "id",
        },
    ],
    indexes: &[
        Index {
            name: "idx_member_business_number",
            columns: &["business_number"],
        },
        Index {
            name: "idx_member_created_at",
            columns: &["created_at"],
        },
        Index {
            name: "idx_member_partner_group",
            columns: &["partner_group_id"],
        },
        Index {
            name: "idx_member_username_partner",
            columns: &["username", "partner_group_id"],
        },
    ],
};
