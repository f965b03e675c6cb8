use serde::{Deserialize, Serialize};
use waygate_geom::BlockPos;

/// Functional category of a block within a portal structure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockRole {
    /// Block the structure was built from.
    Origin,
    /// Interactive block that opens the control menu.
    Console,
    Frame,
    /// Traversable interior.
    Portal,
}

impl BlockRole {
    pub const COUNT: usize = 4;
    pub const ALL: [BlockRole; Self::COUNT] = [
        BlockRole::Origin,
        BlockRole::Console,
        BlockRole::Frame,
        BlockRole::Portal,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used in style tables.
    pub fn name(self) -> &'static str {
        match self {
            BlockRole::Origin => "origin",
            BlockRole::Console => "console",
            BlockRole::Frame => "frame",
            BlockRole::Portal => "portal",
        }
    }

    pub fn from_name(s: &str) -> Option<BlockRole> {
        BlockRole::ALL.into_iter().find(|r| r.name() == s)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalBlock {
    pub pos: BlockPos,
    pub role: BlockRole,
}

impl PortalBlock {
    #[inline]
    pub const fn new(pos: BlockPos, role: BlockRole) -> Self {
        Self { pos, role }
    }
}
