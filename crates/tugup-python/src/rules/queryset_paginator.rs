//! `QuerySetPaginator` was an alias of `Paginator`, deprecated in Django 2.2.

use crate::registry::RuleRegistry;
use crate::rules::NameRenames;
use crate::version::TargetVersion;

static RENAMES: NameRenames = NameRenames {
    rule: "queryset_paginator",
    min_version: TargetVersion::new(2, 2),
    submodule: "core.paginator",
    renames: &[("QuerySetPaginator", "Paginator")],
};

pub(super) fn register(registry: &mut RuleRegistry) {
    RENAMES.register(registry);
}

#[cfg(test)]
mod tests {
    use crate::rules::testing::{check, check_noop};

    #[test]
    fn import_and_use() {
        check(
            "2.2",
            "from django.core.paginator import QuerySetPaginator\n\npaginator = QuerySetPaginator(qs, 25)\n",
            "from django.core.paginator import Paginator\n\npaginator = Paginator(qs, 25)\n",
        );
    }

    #[test]
    fn both_names_imported() {
        check(
            "2.2",
            "from django.core.paginator import Paginator, QuerySetPaginator\nQuerySetPaginator(qs, 1)\n",
            "from django.core.paginator import Paginator\nPaginator(qs, 1)\n",
        );
    }

    #[test]
    fn below_target() {
        check_noop(
            "2.1",
            "from django.core.paginator import QuerySetPaginator\nQuerySetPaginator(qs, 1)\n",
        );
    }

    #[test]
    fn not_imported() {
        check_noop("2.2", "QuerySetPaginator(qs, 1)\n");
    }
}
