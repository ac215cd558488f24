use std::cell::Cell;

/// A value that can track whether it has been changed since it was last uploaded.
pub struct Tracked<T> {
    value: T,
    changed: Cell<bool>,
}

impl<T> Tracked<T> {
    /// Create a new value with a changed status.
    pub fn new(value: T) -> Self {
        Self {
            value,
            changed: Cell::new(true),
        }
    }

    /// Returns true if the value was changed.
    pub fn changed(&self) -> bool {
        self.changed.get()
    }

    /// Call the function with the value if it was changed. The status is only reset when the
    /// function succeeds, so a failed upload is retried next time.
    pub fn if_changed<E>(&self, f: impl FnOnce(&T) -> Result<(), E>) -> Result<(), E> {
        if self.changed.get() {
            f(&self.value)?;
            self.changed.replace(false);
        }
        Ok(())
    }
}

impl<T> std::ops::Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> std::ops::DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.changed.replace(true);
        &mut self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let tracked = Tracked::new(5);
        assert_eq!(*tracked, 5);
        assert!(tracked.changed());
    }

    #[test]
    fn test_if_changed_resets_on_success() {
        let tracked = Tracked::new(5);

        let mut seen = None;
        tracked
            .if_changed(|v| {
                seen = Some(*v);
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(seen, Some(5));
        assert!(!tracked.changed());

        let mut calls = 0;
        tracked
            .if_changed(|_| {
                calls += 1;
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_if_changed_keeps_status_on_error() {
        let tracked = Tracked::new(5);
        assert!(tracked.if_changed(|_| Err("upload failed")).is_err());
        assert!(tracked.changed());
    }

    #[test]
    fn test_deref_mut_marks_changed() {
        let mut tracked = Tracked::new(5);
        tracked.if_changed(|_| Ok::<(), ()>(())).unwrap();

        *tracked = 6;
        assert!(tracked.changed());
        assert_eq!(*tracked, 6);
    }
}
