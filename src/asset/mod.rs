//! Photo assets
//!
//! Photos are copied into the diary's asset directory under names derived from
//! their capture time.

mod capture;
mod namer;

pub use capture::{capture_time, capture_time_from_name, extension_of, is_supported_image, SUPPORTED_EXTENSIONS};
pub use namer::{
    allocate_suffix, canonical_prefix, list_collisions, resolve, AssetName, CollisionChoice,
    CollisionResolver,
};
