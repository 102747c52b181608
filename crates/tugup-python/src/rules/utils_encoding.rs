//! The `*_text` helpers of `django.utils.encoding` became `*_str` in Django 3.0.

use crate::registry::RuleRegistry;
use crate::rules::NameRenames;
use crate::version::TargetVersion;

static RENAMES: NameRenames = NameRenames {
    rule: "utils_encoding",
    min_version: TargetVersion::new(3, 0),
    submodule: "utils.encoding",
    renames: &[("force_text", "force_str"), ("smart_text", "smart_str")],
};

pub(super) fn register(registry: &mut RuleRegistry) {
    RENAMES.register(registry);
}
