use crate::heap::{Cell, Heap};
use crate::{AtomId, HeapError};

/// An interned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    chars: Box<str>,
}

impl Atom {
    pub fn as_str(&self) -> &str {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl Heap {
    /// Interns a UTF-8 byte range, returning the existing atom when one with
    /// the same contents is still alive.
    ///
    /// Creating a new atom allocates and can therefore collect. Callers must
    /// root anything they hold across this call.
    pub fn atomize_utf8(&mut self, bytes: &[u8]) -> Result<AtomId, HeapError> {
        let text = std::str::from_utf8(bytes).map_err(|_| HeapError::InvalidUtf8)?;
        if let Some(&atom) = self.atoms.get(text) {
            if self.is_live(atom.0) {
                return Ok(atom);
            }
        }

        let bytes = std::mem::size_of::<Atom>() + text.len();
        let id = self.alloc_cell(
            Cell::Atom(Atom {
                chars: text.into(),
            }),
            bytes,
        )?;
        let atom = AtomId(id);
        self.atoms.insert(text.into(), atom);
        log::trace!("Interned atom {:?} as {:?}", text, atom);
        Ok(atom)
    }

    pub fn atom(&self, id: AtomId) -> Result<&Atom, HeapError> {
        match self.cell(id.0)? {
            Cell::Atom(atom) => Ok(atom),
            other => Err(HeapError::WrongCellKind {
                id: id.0,
                expected: "atom",
                actual: other.kind_name(),
            }),
        }
    }

    /// Number of atoms currently held by the intern table.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Heap, HeapError, HeapLimits};

    #[test]
    fn test_atom_deduplication() {
        let mut heap = Heap::new(HeapLimits::default());
        let a = heap.atomize_utf8(b"length").unwrap();
        let b = heap.atomize_utf8(b"length").unwrap();
        let c = heap.atomize_utf8(b"prototype").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(heap.atom(a).unwrap().as_str(), "length");
        assert_eq!(heap.atom_count(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let mut heap = Heap::new(HeapLimits::default());
        assert_eq!(heap.atomize_utf8(&[0xff, 0xfe]), Err(HeapError::InvalidUtf8));
    }

    #[test]
    fn test_unreferenced_atoms_are_swept() {
        let mut heap = Heap::new(HeapLimits::default());
        let atom = heap.atomize_utf8(b"transient").unwrap();
        heap.collect_garbage();
        assert_eq!(heap.atom_count(), 0);
        assert!(matches!(heap.atom(atom), Err(HeapError::StaleReference(_))));

        let again = heap.atomize_utf8(b"transient").unwrap();
        assert_ne!(atom, again);
    }
}
