//! Reciprocal ownership edges
//!
//! Every parent/child edge in the scene graph (shader→material, material→mesh,
//! mesh→surface) is a list on the parent plus a back-reference on the child. The two
//! sides are only ever changed together, by [`relink`].

use slotmap::Key;

use super::registry::Registry;
use crate::errors::{SceneError, SceneResult};

/// A parent holding an ordered list of children.
pub trait ChildList<C> {
    fn children(&self) -> &[C];
    fn children_mut(&mut self) -> &mut Vec<C>;
}

/// A child holding a back-reference to its parent.
pub trait Owned<P> {
    fn owner(&self) -> Option<P>;
    fn set_owner(&mut self, owner: Option<P>);
}

/// Errors reported for one kind of edge.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub missing_parent: SceneError,
    pub missing_child: SceneError,
}

pub const SHADER_MATERIAL: Edge = Edge {
    missing_parent: SceneError::UnknownShader,
    missing_child: SceneError::UnknownMaterial,
};

pub const MATERIAL_MESH: Edge = Edge {
    missing_parent: SceneError::UnknownMaterial,
    missing_child: SceneError::UnknownMesh,
};

pub const MESH_SURFACE: Edge = Edge {
    missing_parent: SceneError::UnknownMesh,
    missing_child: SceneError::UnknownSurface,
};

/// Moves `child` from its current parent's list into `new_parent`'s, or detaches it
/// when `new_parent` is `None`, and updates the back-reference to match.
///
/// Returns `Ok(false)` when the child already sits under `new_parent`. The child
/// appears at most once in any parent's list afterwards.
pub fn relink<P, PV, C, CV>(
    parents: &mut Registry<P, PV>,
    children: &mut Registry<C, CV>,
    child: C,
    new_parent: Option<P>,
    edge: Edge,
) -> SceneResult<bool>
where
    P: Key,
    C: Key,
    PV: ChildList<C>,
    CV: Owned<P>,
{
    let old_parent = children
        .get(child)
        .ok_or(edge.missing_child)?
        .owner();

    if let Some(parent) = new_parent {
        if !parents.contains(parent) {
            return Err(edge.missing_parent);
        }
    }

    if old_parent == new_parent {
        let listed = match new_parent.and_then(|parent| parents.get(parent)) {
            Some(parent) => parent.children().contains(&child),
            None => true,
        };
        if listed {
            return Ok(false);
        }
    }

    if let Some(old) = old_parent.and_then(|parent| parents.get_mut(parent)) {
        old.children_mut().retain(|c| *c != child);
    }

    if let Some(new) = new_parent.and_then(|parent| parents.get_mut(parent)) {
        let list = new.children_mut();
        if !list.contains(&child) {
            list.push(child);
        }
    }

    if let Some(entry) = children.get_mut(child) {
        entry.set_owner(new_parent);
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::new_key_type;

    new_key_type! {
        struct ParentKey;
        struct ChildKey;
    }

    #[derive(Default)]
    struct Parent {
        children: Vec<ChildKey>,
    }

    #[derive(Default)]
    struct Child {
        owner: Option<ParentKey>,
    }

    impl ChildList<ChildKey> for Parent {
        fn children(&self) -> &[ChildKey] {
            &self.children
        }

        fn children_mut(&mut self) -> &mut Vec<ChildKey> {
            &mut self.children
        }
    }

    impl Owned<ParentKey> for Child {
        fn owner(&self) -> Option<ParentKey> {
            self.owner
        }

        fn set_owner(&mut self, owner: Option<ParentKey>) {
            self.owner = owner;
        }
    }

    #[test]
    fn test_reparent_moves_child_between_lists() {
        let mut parents: Registry<ParentKey, Parent> = Registry::new();
        let mut children: Registry<ChildKey, Child> = Registry::new();
        let first = parents.insert(Parent::default());
        let second = parents.insert(Parent::default());
        let child = children.insert(Child::default());

        assert_eq!(
            relink(&mut parents, &mut children, child, Some(first), MESH_SURFACE),
            Ok(true)
        );
        assert_eq!(
            relink(&mut parents, &mut children, child, Some(second), MESH_SURFACE),
            Ok(true)
        );

        assert!(parents.get(first).unwrap().children.is_empty());
        assert_eq!(parents.get(second).unwrap().children, vec![child]);
        assert_eq!(children.get(child).unwrap().owner, Some(second));
    }

    #[test]
    fn test_relink_to_same_parent_is_a_no_op() {
        let mut parents: Registry<ParentKey, Parent> = Registry::new();
        let mut children: Registry<ChildKey, Child> = Registry::new();
        let parent = parents.insert(Parent::default());
        let child = children.insert(Child::default());

        relink(&mut parents, &mut children, child, Some(parent), MESH_SURFACE).unwrap();
        assert_eq!(
            relink(&mut parents, &mut children, child, Some(parent), MESH_SURFACE),
            Ok(false)
        );
        assert_eq!(parents.get(parent).unwrap().children.len(), 1);
    }

    #[test]
    fn test_detach_clears_both_sides() {
        let mut parents: Registry<ParentKey, Parent> = Registry::new();
        let mut children: Registry<ChildKey, Child> = Registry::new();
        let parent = parents.insert(Parent::default());
        let child = children.insert(Child::default());

        relink(&mut parents, &mut children, child, Some(parent), MESH_SURFACE).unwrap();
        relink(&mut parents, &mut children, child, None, MESH_SURFACE).unwrap();

        assert!(parents.get(parent).unwrap().children.is_empty());
        assert_eq!(children.get(child).unwrap().owner, None);
    }

    #[test]
    fn test_unknown_handles_are_rejected() {
        let mut parents: Registry<ParentKey, Parent> = Registry::new();
        let mut children: Registry<ChildKey, Child> = Registry::new();
        let parent = parents.insert(Parent::default());
        let child = children.insert(Child::default());
        let stale = parents.insert(Parent::default());
        parents.remove(stale);

        assert_eq!(
            relink(&mut parents, &mut children, child, Some(stale), MESH_SURFACE),
            Err(SceneError::UnknownMesh)
        );
        children.remove(child);
        assert_eq!(
            relink(&mut parents, &mut children, child, Some(parent), MESH_SURFACE),
            Err(SceneError::UnknownSurface)
        );
    }
}
