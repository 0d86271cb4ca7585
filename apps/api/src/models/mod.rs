pub mod role;
pub mod section;

pub use role::{PromptModifiers, RoleConfig, RoleSummary};
pub use section::Section;
