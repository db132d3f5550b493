/// Construction through an options record.
///
/// Every record implementing `Default` leaves all of its fields unset, and an
/// unset field keeps whatever the platform picks for that attribute. Setting a
/// field to the value the platform would have chosen anyway is still
/// forwarded to the primitive.
///
/// ```rust
/// use native_sync::{Configurable, Mutex, MutexKind};
///
/// let m = Mutex::configure(|c| c.kind = Some(MutexKind::Recursive));
/// m.lock();
/// m.lock();
/// unsafe {
///     m.unlock();
///     m.unlock();
/// }
/// ```
pub trait Configurable: Sized {
    /// The options record consumed by `with_config`.
    type Config: Default;

    /// Creates the primitive from an explicit options record.
    fn with_config(config: Self::Config) -> Self;

    /// Creates the primitive after letting `f` fill in a default record.
    ///
    /// `f` runs exactly once, before the underlying primitive is initialized.
    fn configure<F>(f: F) -> Self
    where
        F: FnOnce(&mut Self::Config),
    {
        let mut config = Self::Config::default();
        f(&mut config);
        Self::with_config(config)
    }
}
