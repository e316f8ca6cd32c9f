//! Reference sequence repository.

use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex},
};

use bstr::{BStr, BString, ByteSlice};

/// A provider of reference sequence bases.
///
/// Implementations own the underlying storage (an in-memory map, an indexed
/// FASTA file, a remote service) and return the full sequence for a name.
pub trait Adapter: Send + Sync {
    /// Returns the bases of the named reference sequence, or `None` if the
    /// sequence is unknown to this provider.
    fn get(&mut self, name: &BStr) -> Option<io::Result<Vec<u8>>>;
}

/// An empty adapter with no sequences.
struct Empty;

impl Adapter for Empty {
    fn get(&mut self, _name: &BStr) -> Option<io::Result<Vec<u8>>> {
        None
    }
}

/// An adapter over in-memory sequences.
#[derive(Default)]
pub struct Sequences(Vec<(BString, Vec<u8>)>);

impl Sequences {
    /// Adds a named sequence.
    pub fn insert<N>(&mut self, name: N, sequence: Vec<u8>)
    where
        N: Into<BString>,
    {
        self.0.push((name.into(), sequence));
    }
}

impl FromIterator<(BString, Vec<u8>)> for Sequences {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (BString, Vec<u8>)>,
    {
        Self(iter.into_iter().collect())
    }
}

impl Adapter for Sequences {
    fn get(&mut self, name: &BStr) -> Option<io::Result<Vec<u8>>> {
        self.0
            .iter()
            .find(|(n, _)| n.as_bstr() == name)
            .map(|(_, sequence)| Ok(sequence.clone()))
    }
}

/// A caching, shareable reference sequence repository.
///
/// Fetched sequences are reference counted so concurrent slice decodes can
/// hold the same bases; dropping the returned handle releases them.
#[derive(Clone)]
pub struct Repository(Arc<Mutex<Inner>>);

struct Inner {
    adapter: Box<dyn Adapter>,
    cache: HashMap<BString, Arc<[u8]>>,
}

impl Repository {
    /// Creates a repository backed by the given adapter.
    pub fn new<A>(adapter: A) -> Self
    where
        A: Adapter + 'static,
    {
        Self(Arc::new(Mutex::new(Inner {
            adapter: Box::new(adapter),
            cache: HashMap::new(),
        })))
    }

    /// Returns the bases of the named reference sequence.
    pub fn get(&self, name: &BStr) -> Option<io::Result<Arc<[u8]>>> {
        let mut inner = self.0.lock().ok()?;

        if let Some(sequence) = inner.cache.get(name) {
            return Some(Ok(sequence.clone()));
        }

        match inner.adapter.get(name)? {
            Ok(sequence) => {
                let sequence: Arc<[u8]> = sequence.into();
                inner.cache.insert(name.into(), sequence.clone());
                Some(Ok(sequence))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        let mut sequences = Sequences::default();
        sequences.insert("sq0", b"ACGT".to_vec());

        let repository = Repository::new(sequences);

        let sequence = repository.get(b"sq0".as_bstr()).unwrap().unwrap();
        assert_eq!(&sequence[..], b"ACGT");

        assert!(repository.get(b"sq1".as_bstr()).is_none());
    }

    #[test]
    fn test_get_is_cached_and_shared() {
        let mut sequences = Sequences::default();
        sequences.insert("sq0", b"ACGT".to_vec());

        let repository = Repository::new(sequences);

        let a = repository.get(b"sq0".as_bstr()).unwrap().unwrap();
        let b = repository.get(b"sq0".as_bstr()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_default_is_empty() {
        let repository = Repository::default();
        assert!(repository.get(b"sq0".as_bstr()).is_none());
    }
}
