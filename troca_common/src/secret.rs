use std::fmt;

/// Holds a config credential (signing secrets, API keys) that must never end up in logs.
///
/// `Debug` and `Display` both print `****` regardless of the wrapped value, so a `Secret` can sit inside a
/// struct that derives `Debug` without leaking. Code that genuinely needs the value calls [`Secret::reveal`];
/// those call sites are the complete list of places a credential travels to.
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn reveal(&self) -> &T {
        &self.0
    }
}

impl<T: Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for Secret<T> {
    fn default() -> Self {
        Self(T::default())
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
