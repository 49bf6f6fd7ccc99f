use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use dentlab_core::Entity;

use crate::error::{RepoResult, RepositoryError};

/// In-memory document collection keyed by entity id, for tests/dev.
#[derive(Debug)]
pub struct InMemoryCollection<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> InMemoryCollection<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn read(&self) -> RepoResult<RwLockReadGuard<'_, HashMap<E::Id, E>>> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::Backend("in-memory collection lock poisoned".to_string()))
    }

    pub(crate) fn write(&self) -> RepoResult<RwLockWriteGuard<'_, HashMap<E::Id, E>>> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::Backend("in-memory collection lock poisoned".to_string()))
    }
}

impl<E: Entity> Default for InMemoryCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryCollection<E>
where
    E: Entity + Clone,
{
    pub fn get(&self, id: &E::Id) -> RepoResult<E> {
        self.read()?.get(id).cloned().ok_or(RepositoryError::NotFound)
    }

    pub fn upsert(&self, entity: E) -> RepoResult<()> {
        let id = *entity.id();
        self.write()?.insert(id, entity);
        Ok(())
    }

    /// Insert a new record. An existing id is a conflict.
    pub fn insert(&self, entity: E) -> RepoResult<E::Id> {
        let id = *entity.id();
        let mut map = self.write()?;
        if map.contains_key(&id) {
            return Err(RepositoryError::Conflict(format!("duplicate id {id:?}")));
        }
        map.insert(id, entity);
        Ok(id)
    }

    pub fn remove(&self, id: &E::Id) -> RepoResult<E> {
        self.write()?.remove(id).ok_or(RepositoryError::NotFound)
    }

    pub fn filter<F>(&self, mut keep: F) -> RepoResult<Vec<E>>
    where
        F: FnMut(&E) -> bool,
    {
        Ok(self.read()?.values().filter(|e| keep(e)).cloned().collect())
    }

    /// Apply `change` to a copy and store it only if the change succeeds.
    pub fn modify<F, Err>(&self, id: &E::Id, change: F) -> RepoResult<E>
    where
        F: FnOnce(&mut E) -> Result<(), Err>,
        RepositoryError: From<Err>,
    {
        let mut map = self.write()?;
        let current = map.get(id).ok_or(RepositoryError::NotFound)?;
        let mut next = current.clone();
        change(&mut next)?;
        map.insert(*id, next.clone());
        Ok(next)
    }

    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.read()?.is_empty())
    }
}
