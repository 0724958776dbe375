/// Byte-level access to named assets, independent of where they live.
/// The archive set implements this for production use; tests substitute
/// call-counting stubs to observe lookup behavior.
pub trait RawAssetLoader: Send + Sync {
    /// in case of a caching implementation, this may need to clone the whole buffer!
    fn load_raw_owned(&self, path: &str) -> Option<Vec<u8>>;

    fn exists(&self, path: &str) -> bool;
}
