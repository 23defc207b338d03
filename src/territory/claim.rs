//! Claim and group records

use crate::core::types::{AllianceId, GroupId, SubjectId};
use crate::permission::action::ActionType;
use crate::spatial::coord::CellCoord;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Plot price meaning "not for sale"
pub const NOT_FOR_SALE: i64 = -1;

/// Per-claim permission flags granted to subjects without an explicit grant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionFlags {
    pub build: bool,
    pub destroy: bool,
    pub fire: bool,
    pub explosion: bool,
}

impl PermissionFlags {
    pub fn allows(&self, action: ActionType) -> bool {
        match action {
            ActionType::Build => self.build,
            ActionType::Destroy => self.destroy,
        }
    }
}

/// Ownership record for one claim cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub cell: CellCoord,
    pub group: GroupId,
    /// Individual holder inside the group; `None` means group-owned
    #[serde(default)]
    pub holder: Option<SubjectId>,
    #[serde(default)]
    pub trusted: AHashSet<SubjectId>,
    #[serde(default)]
    pub flags: PermissionFlags,
    /// `>= 0` is for sale at that price, `-1` is not for sale
    #[serde(default = "not_for_sale")]
    pub price: i64,
}

fn not_for_sale() -> i64 {
    NOT_FOR_SALE
}

impl Claim {
    pub fn new(cell: CellCoord, group: GroupId) -> Self {
        Self {
            cell,
            group,
            holder: None,
            trusted: AHashSet::new(),
            flags: PermissionFlags::default(),
            price: NOT_FOR_SALE,
        }
    }

    pub fn with_holder(mut self, holder: SubjectId) -> Self {
        self.holder = Some(holder);
        self
    }

    pub fn with_flags(mut self, flags: PermissionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.price = price;
        self
    }

    pub fn trust(mut self, subject: SubjectId) -> Self {
        self.trusted.insert(subject);
        self
    }

    pub fn has_holder(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_for_sale(&self) -> bool {
        self.price != NOT_FOR_SALE
    }
}

/// A claim-owning group (town)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Higher-tier affiliation; unaffiliated groups lose protection in war mode
    #[serde(default)]
    pub alliance: Option<AllianceId>,
    /// Group-wide fire spread
    #[serde(default)]
    pub fire: bool,
    /// Group-wide explosions
    #[serde(default)]
    pub explosions: bool,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            alliance: None,
            fire: false,
            explosions: false,
        }
    }

    pub fn with_alliance(mut self, alliance: AllianceId) -> Self {
        self.alliance = Some(alliance);
        self
    }

    pub fn has_alliance(&self) -> bool {
        self.alliance.is_some()
    }
}
