// ABOUTME: Validated domain types shared by the decision engine and its collaborators.
// ABOUTME: Migration ids, migration history, deploy targets, image tags and references.

mod image_ref;
mod migration;
mod tag;
mod target;

pub use image_ref::{ImageRef, ParseImageRefError};
pub use migration::{MigrationHistory, MigrationId, MigrationIdError};
pub use tag::{ImageTag, ImageTagError};
pub use target::{DeployTarget, UnknownTarget};
