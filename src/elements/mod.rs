//! Structural model records: joints, materials, sections and frame elements

mod material;
mod member;
mod node;
mod section;

pub use material::Material;
pub use member::{FrameElement, MemberReleases};
pub use node::Node;
pub use section::{Section, SectionProperties};
