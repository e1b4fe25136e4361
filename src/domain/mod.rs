//! Domain logic - pure business rules independent of git operations

pub mod commit;
pub mod prerelease;
pub mod release;
pub mod release_type;
pub mod tag;
pub mod version;

pub use commit::{BodyAnnotation, Commit};
pub use prerelease::PreRelease;
pub use release::Version;
pub use release_type::{BumpOverride, ReleaseType};
pub use tag::{RenderMode, TagTemplate, DEFAULT_TAG_TEMPLATE};
pub use version::{latest_matching, scan_tags, SemVer, SkippedTag};
