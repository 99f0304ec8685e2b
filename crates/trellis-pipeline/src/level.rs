//! Ephemeral nesting state for the relationship resolver.

use std::cell::Cell;
use std::rc::Rc;

/// One step of nesting while resolving a field path.
///
/// Levels form a parent-linked chain that mirrors the recursion into
/// nested objects, embedded arrays and joins. A child holds a counted
/// reference to its parent but never the other way around; the chain is
/// dropped as recursion unwinds. `unwound` tracks whether this level's
/// array is currently decomposed into per-element documents at the
/// present point in the pipeline.
#[derive(Debug)]
pub(crate) struct Level {
    /// Composed dotted storage path from the pipeline root.
    pub name: String,
    /// Array-valued: an embedded array or a many join.
    pub multiple: bool,
    /// Storage names retained inside this level's element documents.
    pub retain: Vec<String>,
    pub parent: Option<Rc<Level>>,
    unwound: Cell<bool>,
}

impl Level {
    pub fn push(
        parent: Option<Rc<Level>>,
        segment: &str,
        multiple: bool,
        retain: Vec<String>,
    ) -> Rc<Self> {
        let name = match &parent {
            Some(p) => format!("{}.{}", p.name, segment),
            None => segment.to_string(),
        };
        Rc::new(Self {
            name,
            multiple,
            retain,
            parent,
            unwound: Cell::new(false),
        })
    }

    /// Synthetic field recording an element's original array index while
    /// the level is decomposed.
    pub fn index_field(&self) -> String {
        format!("__idx_{}", self.name.replace('.', "__"))
    }

    /// Accumulator name used when a `$group` re-assembles this level.
    /// `$group` output fields cannot contain dots, so nested paths get a
    /// mangled alias that the following `$project` maps back.
    pub fn group_alias(&self) -> String {
        if self.name.contains('.') {
            format!("__group_{}", self.name.replace('.', "__"))
        } else {
            self.name.clone()
        }
    }

    pub fn head(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    pub fn is_unwound(&self) -> bool {
        self.unwound.get()
    }

    pub fn set_unwound(&self, unwound: bool) {
        self.unwound.set(unwound);
    }
}

/// The parent chain of `level` in root-to-leaf order, excluding `level`
/// itself.
pub(crate) fn ancestors(level: &Rc<Level>) -> Vec<Rc<Level>> {
    let mut chain = Vec::new();
    let mut cursor = level.parent.clone();
    while let Some(current) = cursor {
        cursor = current.parent.clone();
        chain.push(current);
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_compose() {
        let root = Level::push(None, "settings", false, vec![]);
        let child = Level::push(Some(root), "groups", true, vec![]);
        assert_eq!(child.name, "settings.groups");
        assert_eq!(child.head(), "settings");
    }

    #[test]
    fn index_and_alias_mangle_dots() {
        let root = Level::push(None, "settings", false, vec![]);
        let child = Level::push(Some(root), "groups", true, vec![]);
        assert_eq!(child.index_field(), "__idx_settings__groups");
        assert_eq!(child.group_alias(), "__group_settings__groups");
    }

    #[test]
    fn top_level_alias_is_the_name() {
        let level = Level::push(None, "notifications", true, vec![]);
        assert_eq!(level.group_alias(), "notifications");
        assert_eq!(level.index_field(), "__idx_notifications");
    }

    #[test]
    fn ancestors_run_root_to_leaf() {
        let a = Level::push(None, "a", true, vec![]);
        let b = Level::push(Some(a.clone()), "b", true, vec![]);
        let c = Level::push(Some(b), "c", false, vec![]);
        let chain = ancestors(&c);
        let names: Vec<&str> = chain.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["a", "a.b"]);
    }
}
