//! Category hierarchy queries built on the [`Repository`] contract.
//!
//! Categories only store a parent pointer, so every walk here is a series
//! of `get`/`get_all` calls. Upward walks guard against parent cycles in
//! stored data; [`category_tree`] hands the whole table to the tree builder.

use std::collections::{HashSet, VecDeque};

use tracing::info;

use bookkeeper_core::{Category, Filter, Model, Pk, Tree};

use crate::error::StorageError;
use crate::traits::Repository;

/// The category's parent, if it has one and it still exists.
pub fn parent_of<R>(repo: &R, category: &Category) -> Result<Option<Category>, StorageError>
where
    R: Repository<Category> + ?Sized,
{
    match category.parent {
        Some(pk) => repo.get(pk),
        None => Ok(None),
    }
}

/// All ancestors, nearest first.
///
/// Returns [`StorageError::Integrity`] if the parent chain loops.
pub fn ancestors_of<R>(repo: &R, category: &Category) -> Result<Vec<Category>, StorageError>
where
    R: Repository<Category> + ?Sized,
{
    let mut seen: HashSet<Pk> = HashSet::from([category.pk]);
    let mut chain = Vec::new();
    let mut current = parent_of(repo, category)?;
    while let Some(parent) = current {
        if !seen.insert(parent.pk) {
            return Err(StorageError::Integrity {
                reason: format!("category {} has a cyclic parent chain", category.pk),
            });
        }
        current = parent_of(repo, &parent)?;
        chain.push(parent);
    }
    Ok(chain)
}

/// Direct subcategories, in insertion order.
pub fn children_of<R>(repo: &R, category: &Category) -> Result<Vec<Category>, StorageError>
where
    R: Repository<Category> + ?Sized,
{
    repo.get_all(Some(&Filter::new().with("parent", category.pk)))
}

/// All subcategories, breadth-first.
pub fn descendants_of<R>(repo: &R, category: &Category) -> Result<Vec<Category>, StorageError>
where
    R: Repository<Category> + ?Sized,
{
    let mut seen: HashSet<Pk> = HashSet::from([category.pk]);
    let mut queue = VecDeque::from([category.clone()]);
    let mut found = Vec::new();
    while let Some(next) = queue.pop_front() {
        for child in children_of(repo, &next)? {
            if seen.insert(child.pk) {
                queue.push_back(child.clone());
                found.push(child);
            }
        }
    }
    Ok(found)
}

/// Deletes a category after moving its direct subcategories up to its
/// parent, and returns the deleted category.
///
/// Children are moved first and the category goes last. Each step commits
/// on its own, so an interrupted call leaves a valid forest with the
/// category still present, and repeating the call finishes the job.
/// Expenses filed under the category are not touched.
pub fn delete_category<R>(repo: &mut R, pk: Pk) -> Result<Category, StorageError>
where
    R: Repository<Category> + ?Sized,
{
    let category = repo.get(pk)?.ok_or_else(|| StorageError::NotFound {
        table: Category::TYPE_NAME.to_string(),
        pk,
    })?;
    for mut child in children_of(&*repo, &category)? {
        child.parent = category.parent;
        repo.update(&child)?;
        info!("moved category {} under {:?}", child.pk, child.parent);
    }
    repo.delete(pk)?;
    Ok(category)
}

/// Builds the display tree of every stored category.
pub fn category_tree<R>(repo: &R) -> Result<Tree, StorageError>
where
    R: Repository<Category> + ?Sized,
{
    let records = repo
        .get_all(None)?
        .iter()
        .map(Category::to_tree_record)
        .collect::<Vec<_>>();
    Ok(Tree::build(Category::TREE_ATTRIBUTES, records)?)
}
