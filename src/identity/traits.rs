/// Interface to the device-local key-value storage backing the identity
/// records. Values are opaque strings; `IdentityStore` owns the encoding.
///
/// Implementations only need to be durable for the keys they are given.
/// Serialization of concurrent access is handled by `IdentityStore`, which is
/// why writes take `&mut self`.
pub trait IdentityBackend {
    type Error;

    /// Loads the raw value stored under `key`, or `None` if it was never
    /// written.
    fn load(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Durably stores `raw` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, raw: &str) -> Result<(), Self::Error>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), Self::Error>;
}
