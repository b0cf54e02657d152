// Pattern module - Shared beat/melody representation
// Normalization, validation and layout over the flexible wire format

pub mod normalize;
pub mod timeline;
pub mod types;
pub mod validate;

pub use normalize::{normalize_pattern, NormalizedPattern, PatternKey, WireShape};
pub use timeline::{timeline, TimelineEntry};
pub use types::{PatternItem, PatternKind, Sound, Volume, REST};
pub use validate::{
    is_valid_pattern, validate_pattern, ValidationIssue, ValidationReport, Validator,
    ValidatorConfig,
};
