use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use nodm_model::{
    resolve_as, AnyReferenceable, Emitter, ModelError, ModelResult, Referenceable, ResolveRequest,
    Resolver,
};
use nodm_store::{Filter, StorageBackend};
use tracing::debug;

use crate::cache::{ReadCache, WriteCache};

/// Persists graphs of referenceable entities through a [`StorageBackend`].
///
/// Each write encodes the whole reachable graph into a [`WriteCache`],
/// checks that every `(section, name)` key is claimed by one entity only,
/// and then commits the cache with a single `update` call. Each read decodes
/// through a [`ReadCache`], so an entity reached by several paths comes back
/// as one shared `Arc`.
///
/// Consistency is only checked within one call. Two separate writes that
/// disagree about the same key simply overwrite each other.
pub struct Database<S = Box<dyn StorageBackend>> {
    store: S,
}

impl<S: StorageBackend> Database<S> {
    /// Create a database over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying storage backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the storage backend.
    pub fn into_store(self) -> S {
        self.store
    }

    // ---- Writing ----

    /// Write `root` and everything it references.
    pub fn write<T: Referenceable>(&self, root: &Arc<T>) -> ModelResult<()> {
        self.write_with(root, &mut WriteCache::new(), true)
    }

    /// Write `root` through a caller-supplied cache.
    ///
    /// With `follow_references` unset only `root` itself is encoded and the
    /// entities it refers to are assumed to be stored already. The commit
    /// includes every entry in `cache`, not just the ones added by this call.
    pub fn write_with<T: Referenceable>(
        &self,
        root: &Arc<T>,
        cache: &mut WriteCache,
        follow_references: bool,
    ) -> ModelResult<()> {
        Walker {
            cache: &mut *cache,
            follow_references,
        }
        .visit(root.clone())?;
        self.commit(cache)
    }

    /// Write several graphs as one batch.
    ///
    /// The graphs share one cache, so a key claimed by different entities in
    /// two of them is a consistency error and nothing is committed.
    pub fn write_many<I>(&self, roots: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = Arc<dyn AnyReferenceable>>,
    {
        let mut cache = WriteCache::new();
        let mut walker = Walker {
            cache: &mut cache,
            follow_references: true,
        };
        for root in roots {
            walker.visit(root)?;
        }
        self.commit(&cache)
    }

    fn commit(&self, cache: &WriteCache) -> ModelResult<()> {
        let entries = cache.to_entries();
        debug!(count = entries.len(), "committing write batch");
        self.store.update(&entries)?;
        Ok(())
    }

    // ---- Reading ----

    /// Read the `T` stored as `name`, with a fresh cache.
    ///
    /// Two calls return two independent graphs.
    pub fn read<T: Referenceable>(&self, name: &str) -> ModelResult<Arc<T>> {
        self.read_with(name, &mut ReadCache::new())
    }

    /// Read the `T` stored as `name`, reusing entities already in `cache`.
    pub fn read_with<T: Referenceable>(
        &self,
        name: &str,
        cache: &mut ReadCache,
    ) -> ModelResult<Arc<T>> {
        resolve_as::<T>(
            &mut Reading {
                store: &self.store,
                cache,
            },
            name,
        )
    }

    /// Lazily read one `T` per name, all through one shared cache.
    ///
    /// Each entity is fetched when the iterator reaches it; an error for one
    /// name does not stop the iterator.
    ///
    /// Every name is read as the same type. To read entities of several types
    /// so that they share instances, pass one [`ReadCache`] to successive
    /// [`read_with`](Self::read_with) calls, or continue from
    /// [`ReadMany::into_cache`].
    pub fn read_many<T, I>(&self, names: I) -> ReadMany<'_, S, T, I::IntoIter>
    where
        T: Referenceable,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        ReadMany {
            store: &self.store,
            names: names.into_iter(),
            cache: ReadCache::new(),
            marker: PhantomData,
        }
    }

    // ---- Querying ----

    /// Names of stored `T`s matching `filter`, as the backend reports them.
    pub fn query_names<T: Referenceable>(&self, filter: Option<&Filter>) -> ModelResult<Vec<String>> {
        Ok(self.store.query_names(T::SECTION, filter)?)
    }
}

/// Iterator returned by [`Database::read_many`].
pub struct ReadMany<'d, S, T, I> {
    store: &'d S,
    names: I,
    cache: ReadCache,
    marker: PhantomData<fn() -> T>,
}

impl<S, T, I> ReadMany<'_, S, T, I> {
    /// Entities decoded so far, including everything they refer to.
    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    /// Stop reading and keep the entities decoded so far.
    pub fn into_cache(self) -> ReadCache {
        self.cache
    }
}

impl<S, T, I> Iterator for ReadMany<'_, S, T, I>
where
    S: StorageBackend,
    T: Referenceable,
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = ModelResult<Arc<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.next()?;
        let mut reading = Reading {
            store: self.store,
            cache: &mut self.cache,
        };
        Some(resolve_as::<T>(&mut reading, name.as_ref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.names.size_hint()
    }
}

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

/// Depth-first encoder that fills a [`WriteCache`].
struct Walker<'c> {
    cache: &'c mut WriteCache,
    follow_references: bool,
}

impl Walker<'_> {
    fn visit(&mut self, entity: Arc<dyn AnyReferenceable>) -> ModelResult<()> {
        let section = entity.section();
        if let Some(cached) = self.cache.entity(section, entity.entity_name()) {
            if cached.same_entity(entity.as_ref()) {
                return Ok(());
            }
            return Err(ModelError::Consistency {
                section: section.to_string(),
                name: entity.entity_name().to_string(),
            });
        }
        let record = entity.encode_record(self)?;
        debug!(section, name = entity.entity_name(), kind = entity.type_label(), "encoded entity");
        self.cache.insert(entity, record);
        Ok(())
    }
}

impl Emitter for Walker<'_> {
    fn emit(&mut self, entity: Arc<dyn AnyReferenceable>) -> ModelResult<()> {
        if self.follow_references {
            self.visit(entity)
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

/// Resolver that fetches from the store and decodes through a cache.
struct Reading<'a, S> {
    store: &'a S,
    cache: &'a mut ReadCache,
}

impl<S: StorageBackend> Resolver for Reading<'_, S> {
    fn resolve(&mut self, request: ResolveRequest<'_>) -> ModelResult<Arc<dyn Any + Send + Sync>> {
        let key: (TypeId, String) = (request.type_id, request.name.to_string());
        if let Some(hit) = self.cache.lookup(&key) {
            return Ok(hit);
        }
        if !self.cache.begin(key.clone()) {
            return Err(ModelError::parse(
                format!("{}/{}", request.section, request.name),
                "reference cycle: the record is reached again while it is being decoded",
            ));
        }
        let decoded = self
            .store
            .get_item(request.section, request.name)
            .map_err(ModelError::from)
            .and_then(|record| (request.decode)(request.name, &record, self));
        self.cache.finish(&key, decoded.as_ref().ok().cloned());
        let entity = decoded?;
        debug!(section = request.section, name = request.name, kind = request.type_name, "decoded entity");
        Ok(entity)
    }
}
