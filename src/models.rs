use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Business registration category of a member. Stored as the Korean label.
#[derive(AsRefStr, EnumIter, EnumString, IntoStaticStr, Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum MemberType {
    #[strum(serialize = "법인사업자")]
    Corporate,
    #[strum(serialize = "개인사업자")]
    Individual,
}

impl MemberType {
    /// Labels written by older releases before the current vocabulary.
    pub const LEGACY_TOKENS: [(&'static str, MemberType); 2] = [
        ("법인", MemberType::Corporate),
        ("개인", MemberType::Individual),
    ];

    pub fn from_legacy(token: &str) -> Option<Self> {
        Self::LEGACY_TOKENS
            .iter()
            .find(|(legacy, _)| *legacy == token)
            .map(|(_, member_type)| *member_type)
    }

    /// Rewrites a legacy label to its current equivalent. Anything else,
    /// including values that are not member types at all, passes through.
    pub fn normalize(value: &str) -> &str {
        match Self::from_legacy(value) {
            Some(member_type) => member_type.into(),
            None => value,
        }
    }
}

#[derive(AsRefStr, EnumIter, EnumString, IntoStaticStr, Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum ApprovalStatus {
    #[strum(serialize = "신청")]
    Applied,
    #[strum(serialize = "승인")]
    Approved,
}

#[derive(AsRefStr, EnumIter, EnumString, IntoStaticStr, Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum Role {
    #[strum(serialize = "member")]
    Member,
    #[strum(serialize = "admin")]
    Admin,
    #[strum(serialize = "partner_admin")]
    PartnerAdmin,
}

/// How a member's insurance fees are settled.
#[derive(AsRefStr, EnumIter, EnumString, IntoStaticStr, Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum SettlementMethod {
    #[strum(serialize = "포인트")]
    Point,
    #[strum(serialize = "후불정산")]
    Deferred,
}

/// Every stored label of a categorical enum, in declaration order.
pub fn allowed_values<E>() -> Vec<&'static str>
where
    E: IntoEnumIterator,
    &'static str: From<E>,
{
    E::iter().map(<&'static str>::from).collect()
}
