//! The bucket-and-chain table engine.
//!
//! A `Table` owns an array of bucket heads and a slotmap arena of items;
//! each bucket is a doubly-linked chain threaded through the arena by
//! generational keys, so removal by handle is O(1) and handles stay stable
//! across rehashing (items are relinked, never reallocated). Keys need not
//! be unique: an item is the pair {key, yield}, and only byte-identical
//! pairs are rejected.
//!
//! Queries address items by `(key, yield)` where either side may be a
//! wildcard (`None`). A specific key is marshalled through the key kind's
//! registry entry and reduced to a bucket index by the table's hash
//! function strategy; a wildcard scans buckets in order.
//!
//! Single-threaded use only. Iteration via [`Table::next_matching`] holds
//! no locks and is stable only while no insert/remove/rebuild intervenes.

use std::rc::Rc;

use slotmap::{DefaultKey, SlotMap};

use crate::error::TableError;
use crate::hash_fn::HashFn;
use crate::object::{Object, ObjectKind};

/// Default growth threshold: grow once half the buckets' worth of entries
/// is reached.
pub const DEFAULT_MAX_OCCUPANCY_RATIO: f32 = 0.5;

/// Default initial bucket count.
pub const DEFAULT_INITIAL_BUCKETS: u32 = 1024;

/// Construction-time table parameters.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Kind of the keys this table indexes.
    pub key_kind: ObjectKind,
    /// Kind of the yields stored alongside keys.
    pub yield_kind: ObjectKind,
    /// Whether the table stores its own copy of each key (`true`) or shares
    /// the caller's `Rc` (`false`).
    pub copy_keys: bool,
    /// As `copy_keys`, for yields.
    pub copy_yields: bool,
    /// Requested bucket count; rounded down to a power of two, floored
    /// at 16.
    pub initial_buckets: u32,
    /// Occupancy ratio (`entries / nbuckets`) that triggers doubling.
    pub max_occupancy_ratio: f32,
}

impl TableConfig {
    /// A config with the given kinds, copying both keys and yields, default
    /// sizing.
    pub fn new(key_kind: ObjectKind, yield_kind: ObjectKind) -> Self {
        Self {
            key_kind,
            yield_kind,
            copy_keys: true,
            copy_yields: true,
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
            max_occupancy_ratio: DEFAULT_MAX_OCCUPANCY_RATIO,
        }
    }
}

/// Stable handle to an item. Resolves to `None` after the item is removed,
/// even if its arena slot is reused (generational keys).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ItemHandle(DefaultKey);

impl ItemHandle {
    /// The item's key, while it is live in `table`.
    pub fn key<'a>(&self, table: &'a Table) -> Option<&'a Object> {
        table.items.get(self.0).map(|item| item.key.get())
    }

    /// The item's yield, while it is live in `table`.
    pub fn yield_ref<'a>(&self, table: &'a Table) -> Option<&'a Object> {
        table.items.get(self.0).map(|item| item.yld.get())
    }

    /// Mutable access to the item's yield. Available only when the table
    /// owns the yield (`copy_yields`); shared yields remain caller
    /// property and return `None`.
    pub fn yield_mut<'a>(&self, table: &'a mut Table) -> Option<&'a mut Object> {
        table.items.get_mut(self.0).and_then(|item| item.yld.get_mut())
    }
}

/// An owned copy or a caller-shared reference, per the table's copy flags.
#[derive(Debug)]
enum Stored {
    Owned(Object),
    Shared(Rc<Object>),
}

impl Stored {
    fn get(&self) -> &Object {
        match self {
            Stored::Owned(obj) => obj,
            Stored::Shared(rc) => rc.as_ref(),
        }
    }

    fn get_mut(&mut self) -> Option<&mut Object> {
        match self {
            Stored::Owned(obj) => Some(obj),
            Stored::Shared(_) => None,
        }
    }
}

#[derive(Debug)]
struct Item {
    key: Stored,
    yld: Stored,
    /// Cached bucket index; updated on rebuild.
    bucket: u32,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

/// A chained hash table of {key, yield} items with non-unique keys.
pub struct Table {
    key_kind: ObjectKind,
    yield_kind: ObjectKind,
    copy_keys: bool,
    copy_yields: bool,
    hash_fn: Rc<HashFn>,
    /// Chain heads; length is always a power of two.
    buckets: Vec<Option<DefaultKey>>,
    /// `buckets.len() - 1`, used to select hash bits.
    mask: u32,
    entries: usize,
    max_occupancy_ratio: f32,
    items: SlotMap<DefaultKey, Item>,
}

/// Largest power of two ≤ `requested`, floored at 16.
fn floor_pow2_min16(requested: u32) -> u32 {
    let mut n = 0x4000_0000u32;
    while n > requested {
        n >>= 1;
    }
    n.max(16)
}

impl Table {
    /// Create an empty table using `hash_fn` for bucket placement.
    ///
    /// The strategy is shared, not owned: dropping the table never tears
    /// down the strategy's state.
    pub fn new(config: TableConfig, hash_fn: Rc<HashFn>) -> Self {
        assert!(
            config.max_occupancy_ratio > 0.0,
            "max_occupancy_ratio must be positive"
        );
        let nbuckets = floor_pow2_min16(config.initial_buckets);
        Self {
            key_kind: config.key_kind,
            yield_kind: config.yield_kind,
            copy_keys: config.copy_keys,
            copy_yields: config.copy_yields,
            hash_fn,
            buckets: vec![None; nbuckets as usize],
            mask: nbuckets - 1,
            entries: 0,
            max_occupancy_ratio: config.max_occupancy_ratio,
            items: SlotMap::with_key(),
        }
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Current bucket count (always a power of two).
    pub fn nbuckets(&self) -> u32 {
        self.buckets.len() as u32
    }

    pub fn key_kind(&self) -> ObjectKind {
        self.key_kind
    }

    pub fn yield_kind(&self) -> ObjectKind {
        self.yield_kind
    }

    /// The strategy this table hashes with.
    pub fn hash_fn(&self) -> &HashFn {
        &self.hash_fn
    }

    fn bucket_of(&self, key: &Object) -> u32 {
        self.hash_fn.hash_bytes(&self.key_kind.marshal(key)) & self.mask
    }

    /// Bucket scan range for a query key: the key's single bucket, or every
    /// bucket for a wildcard.
    fn bucket_range(&self, key: Option<&Object>) -> (u32, u32) {
        match key {
            None => (0, self.nbuckets()),
            Some(k) => {
                let h = self.bucket_of(k);
                (h, h + 1)
            }
        }
    }

    fn key_matches(&self, query: Option<&Object>, item: &Item) -> bool {
        match query {
            None => true,
            Some(q) => self.key_kind.compare(q, item.key.get()).is_eq(),
        }
    }

    fn yield_matches(&self, query: Option<&Object>, item: &Item) -> bool {
        match query {
            None => true,
            Some(q) => self.yield_kind.compare(q, item.yld.get()).is_eq(),
        }
    }

    fn check_kind(expected: ObjectKind, obj: &Object) -> Result<(), TableError> {
        if expected.accepts(obj) {
            Ok(())
        } else {
            Err(TableError::KindMismatch {
                expected,
                found: obj.natural_kind(),
            })
        }
    }

    /// Insert a {key, yield} pair.
    ///
    /// Errors with [`TableError::AlreadyExists`] (a no-op) when an item
    /// equal in both key and yield (per the registry comparators, so either
    /// orientation of a bidirectional connection) is already present.
    /// Grows first when the occupancy threshold is reached, then links the
    /// new item at the front of its bucket chain.
    ///
    /// With `copy_keys`/`copy_yields` the table stores its own copy;
    /// otherwise it shares the caller's `Rc`.
    ///
    /// Note: the duplicate check compares yields of items whose key already
    /// matches, so tables with `Stats` yields must keep keys unique; the
    /// `Stats` comparator is fatal.
    pub fn insert(&mut self, key: Rc<Object>, yld: Rc<Object>) -> Result<ItemHandle, TableError> {
        Self::check_kind(self.key_kind, &key)?;
        Self::check_kind(self.yield_kind, &yld)?;

        if self.exists(Some(&*key), Some(&*yld)) {
            return Err(TableError::AlreadyExists);
        }

        // Grow before linking; one doubling always suffices since occupancy
        // halves, but mirror the threshold as a loop condition.
        while self.entries as f32 >= self.max_occupancy_ratio * self.buckets.len() as f32 {
            let target = self.nbuckets() * 2;
            self.rebuild(target);
        }

        let key = if self.copy_keys {
            Stored::Owned((*key).clone())
        } else {
            Stored::Shared(key)
        };
        let yld = if self.copy_yields {
            Stored::Owned((*yld).clone())
        } else {
            Stored::Shared(yld)
        };

        let bucket = self.bucket_of(key.get());
        let head = self.buckets[bucket as usize];
        let id = self.items.insert(Item {
            key,
            yld,
            bucket,
            prev: None,
            next: head,
        });
        if let Some(old_head) = head {
            self.items[old_head].prev = Some(id);
        }
        self.buckets[bucket as usize] = Some(id);
        self.entries += 1;
        Ok(ItemHandle(id))
    }

    /// First item matching `{key, yield}`, either of which may be a
    /// wildcard (`None` matches anything). Order: bucket order, then chain
    /// head-to-tail. A wildcard key scans every bucket; a specific key
    /// scans exactly its own.
    pub fn lookup(&self, key: Option<&Object>, yld: Option<&Object>) -> Option<ItemHandle> {
        let (h1, h2) = self.bucket_range(key);
        for h in h1..h2 {
            let mut cursor = self.buckets[h as usize];
            while let Some(id) = cursor {
                let item = &self.items[id];
                if self.key_matches(key, item) && self.yield_matches(yld, item) {
                    return Some(ItemHandle(id));
                }
                cursor = item.next;
            }
        }
        None
    }

    /// Whether any item matches `{key, yield}`.
    pub fn exists(&self, key: Option<&Object>, yld: Option<&Object>) -> bool {
        self.lookup(key, yld).is_some()
    }

    /// Ordered iteration over items matching `key`.
    ///
    /// With no `prev`, starts at the key's bucket (bucket 0 for a wildcard)
    /// and returns the first match scanning forward. With a `prev`, the
    /// immediate chain successor is returned if it matches; if it exists
    /// but does not match, iteration stops: no skipping within a bucket.
    /// An exhausted chain continues at the following bucket.
    ///
    /// The order is stable only while no insert/remove/rebuild intervenes;
    /// a stale `prev` handle yields `None`.
    pub fn next_matching(
        &self,
        prev: Option<ItemHandle>,
        key: Option<&Object>,
    ) -> Option<ItemHandle> {
        let start = match prev {
            None => match key {
                None => 0,
                Some(k) => self.bucket_of(k),
            },
            Some(handle) => {
                let item = self.items.get(handle.0)?;
                if let Some(next_id) = item.next {
                    // Successor in the same bucket: either the next match or
                    // the end of this key's run.
                    let next = &self.items[next_id];
                    return if self.key_matches(key, next) {
                        Some(ItemHandle(next_id))
                    } else {
                        None
                    };
                }
                item.bucket + 1
            }
        };

        match key {
            None => (start..self.nbuckets())
                .find_map(|h| self.buckets[h as usize])
                .map(ItemHandle),
            Some(_) => {
                // A specific key lives in exactly one bucket, so only the
                // starting bucket can hold further matches.
                let mut cursor = *self.buckets.get(start as usize)?;
                while let Some(id) = cursor {
                    let item = &self.items[id];
                    if self.key_matches(key, item) {
                        return Some(ItemHandle(id));
                    }
                    cursor = item.next;
                }
                None
            }
        }
    }

    /// Number of items matching `key`, counted via repeated
    /// [`next_matching`](Self::next_matching). Cost is proportional to the
    /// matches, plus a full bucket-array scan for a wildcard.
    ///
    /// Because iteration stops at the first non-matching chain neighbor,
    /// a specific key's count covers only the contiguous run of matches
    /// from the first hit. When an unrelated key hashes into the same
    /// bucket and its items interleave, matches past the interloper are
    /// not counted.
    pub fn count_entries(&self, key: Option<&Object>) -> usize {
        let mut count = 0;
        let mut cursor = self.next_matching(None, key);
        while let Some(handle) = cursor {
            count += 1;
            cursor = self.next_matching(Some(handle), key);
        }
        count
    }

    /// Remove every item matching `{key, yield}` (wildcards match all) and
    /// return how many were removed. `remove(None, None)` empties the
    /// table.
    pub fn remove(&mut self, key: Option<&Object>, yld: Option<&Object>) -> usize {
        let (h1, h2) = self.bucket_range(key);
        let mut removed = 0;
        for h in h1..h2 {
            let mut cursor = self.buckets[h as usize];
            while let Some(id) = cursor {
                let item = &self.items[id];
                cursor = item.next;
                if self.key_matches(key, item) && self.yield_matches(yld, item) {
                    self.unlink(id);
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Remove all items; the bucket array is retained.
    pub fn reset(&mut self) {
        let _ = self.remove(None, None);
    }

    /// Rebuild the bucket array around `nbuckets_hint` (same power-of-two
    /// rounding as construction) and rehash every item into it, exactly
    /// once each, with the same strategy. Items are relinked in place:
    /// handles stay valid, `len()` is unchanged.
    pub fn rebuild(&mut self, nbuckets_hint: u32) {
        let new_nbuckets = floor_pow2_min16(nbuckets_hint);
        log::debug!(
            "rebuilding table ({} -> {} buckets, {} entries)",
            self.buckets.len(),
            new_nbuckets,
            self.entries
        );

        let old = std::mem::replace(&mut self.buckets, vec![None; new_nbuckets as usize]);
        self.mask = new_nbuckets - 1;

        for head in old {
            let mut cursor = head;
            while let Some(id) = cursor {
                cursor = self.items[id].next;

                let bucket = self.bucket_of(self.items[id].key.get());
                let new_head = self.buckets[bucket as usize];
                {
                    let item = &mut self.items[id];
                    item.bucket = bucket;
                    item.prev = None;
                    item.next = new_head;
                }
                if let Some(h) = new_head {
                    self.items[h].prev = Some(id);
                }
                self.buckets[bucket as usize] = Some(id);
            }
        }
    }

    /// Unlink `id` from its chain and free its arena slot.
    fn unlink(&mut self, id: DefaultKey) {
        let item = self
            .items
            .remove(id)
            .expect("unlink target must be a live item");
        match item.prev {
            Some(p) => self.items[p].next = item.next,
            None => self.buckets[item.bucket as usize] = item.next,
        }
        if let Some(n) = item.next {
            self.items[n].prev = item.prev;
        }
        self.entries -= 1;
    }
}
