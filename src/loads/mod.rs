//! Loads, load patterns, load cases and mass sources

mod distributed;
mod load_case;
mod load_pattern;
mod mass_source;
mod node_load;
mod point_load;

use serde::{Deserialize, Serialize};

pub use distributed::{CoordSystem, MemberDistributedLoad};
pub use load_case::{DirectionalCombination, ExcitationDirection, LoadCase, LoadCaseType, ModalCombination, RsaLoad};
pub use load_pattern::LoadPattern;
pub use mass_source::{MassMultiplier, MassSource};
pub use node_load::NodalLoad;
pub use point_load::{LoadDirection, MemberPointLoad, PointLoadKind};

/// Any applied load, tagged by `type` in the model file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Load {
    #[serde(rename = "nodal")]
    Nodal(NodalLoad),
    #[serde(rename = "member_dist", alias = "member")]
    MemberDistributed(MemberDistributedLoad),
    #[serde(rename = "member_point")]
    MemberPoint(MemberPointLoad),
}

impl Load {
    /// Name of the pattern this load belongs to
    pub fn pattern(&self) -> &str {
        match self {
            Load::Nodal(l) => &l.pattern,
            Load::MemberDistributed(l) => &l.pattern,
            Load::MemberPoint(l) => &l.pattern,
        }
    }

    /// Element the load acts on (member loads only)
    pub fn element_id(&self) -> Option<u32> {
        match self {
            Load::Nodal(_) => None,
            Load::MemberDistributed(l) => Some(l.element_id),
            Load::MemberPoint(l) => Some(l.element_id),
        }
    }
}

impl From<NodalLoad> for Load {
    fn from(l: NodalLoad) -> Self {
        Load::Nodal(l)
    }
}

impl From<MemberDistributedLoad> for Load {
    fn from(l: MemberDistributedLoad) -> Self {
        Load::MemberDistributed(l)
    }
}

impl From<MemberPointLoad> for Load {
    fn from(l: MemberPointLoad) -> Self {
        Load::MemberPoint(l)
    }
}
