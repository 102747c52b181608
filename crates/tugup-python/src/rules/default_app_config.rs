//! Django 3.2 discovers `AppConfig` subclasses automatically, making the
//! module-level `default_app_config` of an app's `__init__.py` redundant.

use tugup_core::patch::ScheduledEdit;

use crate::context::FileContext;
use crate::edits::erase_node;
use crate::registry::{HandlerResult, RuleRegistry};
use crate::rules::{is_name, simple_string};
use crate::tree::{NodeKind, SyntaxNode};
use crate::version::TargetVersion;

const RULE: &str = "default_app_config";
const MIN_VERSION: TargetVersion = TargetVersion::new(3, 2);

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register(RULE, MIN_VERSION, NodeKind::Assignment, assignment);
}

fn assignment<'t>(
    ctx: &mut FileContext,
    node: SyntaxNode<'t>,
    parent: Option<SyntaxNode<'t>>,
) -> HandlerResult {
    if ctx.file_name() != Some("__init__.py") {
        return Ok(Vec::new());
    }
    let Some(statement) = parent.filter(|p| p.is(NodeKind::ExpressionStatement)) else {
        return Ok(Vec::new());
    };
    let module_level = statement.parent().is_some_and(|p| p.is(NodeKind::Module));
    if !module_level || statement.children().len() != 1 {
        return Ok(Vec::new());
    }
    let target = node
        .child_by_field("left")
        .is_some_and(|left| is_name(left, "default_app_config"));
    let dotted_path = node
        .child_by_field("right")
        .and_then(simple_string)
        .is_some();
    if !target || !dotted_path || node.child_by_field("type").is_some() {
        return Ok(Vec::new());
    }

    let end = statement.end_position();
    Ok(vec![ScheduledEdit::new(statement.position(), move |stream, i| {
        erase_node(stream, i, end)
    })])
}

#[cfg(test)]
mod tests {
    use crate::rules::testing::rewrite_at;

    const INIT: Option<&str> = Some("polls/__init__.py");

    #[test]
    fn removes_assignment_line() {
        let source = "import os\ndefault_app_config = 'polls.apps.PollsConfig'\nVERSION = 1\n";
        assert_eq!(rewrite_at("3.2", INIT, source), "import os\nVERSION = 1\n");
    }

    #[test]
    fn only_statement_leaves_empty_file() {
        let source = "default_app_config = \"polls.apps.PollsConfig\"\n";
        assert_eq!(rewrite_at("4.0", INIT, source), "");
    }

    #[test]
    fn other_files_and_targets_are_untouched() {
        let source = "default_app_config = 'polls.apps.PollsConfig'\n";
        assert_eq!(rewrite_at("3.2", Some("polls/apps.py"), source), source);
        assert_eq!(rewrite_at("3.2", None, source), source);
        assert_eq!(rewrite_at("3.1", INIT, source), source);
    }

    #[test]
    fn nested_or_computed_assignments_are_kept() {
        let init = |source: &str| rewrite_at("3.2", INIT, source);
        let nested = "if True:\n    default_app_config = 'a.apps.A'\n";
        assert_eq!(init(nested), nested);
        let computed = "default_app_config = base + '.apps.A'\n";
        assert_eq!(init(computed), computed);
        let chained = "default_app_config = x = 'a.apps.A'\n";
        assert_eq!(init(chained), chained);
    }
}
