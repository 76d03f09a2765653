use super::Handle;

/// Append-only storage for one kind of GPU resource descriptor. Handles are
/// plain indices; dereferencing a handle that was never issued is a
/// programmer error and asserts rather than recovering.
pub struct ResourceRegistry<T> {
    items: Vec<T>,
}

impl<T> ResourceRegistry<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn insert(&mut self, item: T) -> Handle<T> {
        let index = self.items.len();
        self.items.push(item);
        Handle::new(index)
    }

    pub fn get(&self, handle: Handle<T>) -> &T {
        assert!(
            handle.index() < self.items.len(),
            "invalid resource handle: index {} out of {}",
            handle.index(),
            self.items.len()
        );
        &self.items[handle.index()]
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        assert!(
            handle.index() < self.items.len(),
            "invalid resource handle: index {} out of {}",
            handle.index(),
            self.items.len()
        );
        &mut self.items[handle.index()]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ResourceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_roundtrips() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.insert(42u32);
        assert_eq!(*registry.get(handle), 42);
        *registry.get_mut(handle) = 7;
        assert_eq!(*registry.get(handle), 7);
    }

    #[test]
    #[should_panic(expected = "invalid resource handle")]
    fn stale_handle_asserts() {
        let registry: ResourceRegistry<u32> = ResourceRegistry::new();
        registry.get(Handle::new(0));
    }
}
