use log::{debug, info};
use rusqlite::{params, Connection};

use crate::error::MemberDbError;
use crate::models::{ApprovalStatus, MemberType, Role};
use crate::password::PasswordHash;

pub struct SeedPartnerGroup {
    pub id: i64,
    pub name: &'static str,
    pub business_number: &'static str,
    pub representative: &'static str,
    pub phone: &'static str,
    pub mobile: &'static str,
    pub address: &'static str,
}

pub struct SeedMember {
    pub id: i64,
    pub partner_group_id: Option<i64>,
    pub username: &'static str,
    pub password: &'static str,
    pub company_name: &'static str,
    pub position: &'static str,
    pub full_name: &'static str,
    pub license_number: &'static str,
    pub business_number: &'static str,
    pub car_dealership_number: &'static str,
    pub representative: &'static str,
    pub phone: &'static str,
    pub mobile: &'static str,
    pub email: &'static str,
    pub member_type: MemberType,
    pub approval_status: ApprovalStatus,
    pub role: Role,
}

pub const SEED_PARTNER_GROUP: SeedPartnerGroup = SeedPartnerGroup {
    id: 1,
    name: "부산광역시자동차매매사업조합",
    business_number: "123-45-67890",
    representative: "홍길동",
    phone: "051-123-4567",
    mobile: "010-1234-5678",
    address: "부산시 중구",
};

/// The global administrator. Belongs to no partner group.
pub const SEED_ADMIN: SeedMember = SeedMember {
    id: 1,
    partner_group_id: None,
    username: "hyundai",
    password: "#admin1004",
    company_name: "현대해상",
    position: "관리자",
    full_name: "관리자",
    license_number: "1234567890",
    business_number: "123-45-67890",
    car_dealership_number: "9876543210",
    representative: "김관리",
    phone: "02-123-4567",
    mobile: "010-9876-5432",
    email: "admin@hyundai.com",
    member_type: MemberType::Corporate,
    approval_status: ApprovalStatus::Approved,
    role: Role::Admin,
};

pub const SEED_PARTNER_ADMIN: SeedMember = SeedMember {
    id: 2,
    partner_group_id: Some(SEED_PARTNER_GROUP.id),
    username: "wecar1004",
    password: "#wecarm1004",
    company_name: "위탁운영파트너",
    position: "관리자",
    full_name: "파트너관리자",
    license_number: "1111111111",
    business_number: "111-11-11111",
    car_dealership_number: "2222222222",
    representative: "박파트너",
    phone: "02-111-1111",
    mobile: "010-1111-1111",
    email: "partner@wecar.com",
    member_type: MemberType::Corporate,
    approval_status: ApprovalStatus::Approved,
    role: Role::PartnerAdmin,
};

pub const SEED_MEMBERS: [&SeedMember; 2] = [&SEED_ADMIN, &SEED_PARTNER_ADMIN];

/// What to do when a seed row's id is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    Fail,
    Ignore,
}

impl OnConflict {
    fn insert_verb(&self) -> &'static str {
        match self {
            OnConflict::Fail => "INSERT",
            OnConflict::Ignore => "INSERT OR IGNORE",
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedCounts {
    pub partner_groups: usize,
    pub members: usize,
}

pub struct Seeder;

impl Seeder {
    /// Inserts the seed partner group and both seed members. Returns how many
    /// rows were actually written, which is less than the full set only with
    /// `OnConflict::Ignore`.
    pub fn insert_all(
        conn: &Connection,
        pbkdf2_iterations: u32,
        on_conflict: OnConflict,
    ) -> Result<SeedCounts, MemberDbError> {
        let mut counts = SeedCounts::default();

        let group = &SEED_PARTNER_GROUP;
        counts.partner_groups = conn.execute(
            &format!(
                "{} INTO partner_group (
                    id, name, business_number, representative, phone, mobile, address, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))",
                on_conflict.insert_verb()
            ),
            params![
                group.id,
                group.name,
                group.business_number,
                group.representative,
                group.phone,
                group.mobile,
                group.address,
            ],
        )?;

        for member in SEED_MEMBERS {
            counts.members += Self::insert_member(conn, member, pbkdf2_iterations, on_conflict)?;
        }

        info!(
            "Seed rows written: {} partner group(s), {} member(s)",
            counts.partner_groups, counts.members
        );

        Ok(counts)
    }

    fn insert_member(
        conn: &Connection,
        member: &SeedMember,
        pbkdf2_iterations: u32,
        on_conflict: OnConflict,
    ) -> Result<usize, MemberDbError> {
        debug!("Hashing password for seed account '{}'", member.username);
        let password_hash = PasswordHash::generate(member.password, pbkdf2_iterations);

        let inserted = conn.execute(
            &format!(
                "{} INTO member (
                    id, partner_group_id, username, password_hash, company_name, position,
                    full_name, license_number, business_number, car_dealership_number,
                    representative, phone, mobile, email, member_type, privacy_agreement,
                    approval_status, role, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, datetime('now'))",
                on_conflict.insert_verb()
            ),
            params![
                member.id,
                member.partner_group_id,
                member.username,
                password_hash,
                member.company_name,
                member.position,
                member.full_name,
                member.license_number,
                member.business_number,
                member.car_dealership_number,
                member.representative,
                member.phone,
                member.mobile,
                member.email,
                member.member_type.to_string(),
                member.approval_status.to_string(),
                member.role.to_string(),
            ],
        )?;

        Ok(inserted)
    }
}
