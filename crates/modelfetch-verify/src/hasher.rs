use digest::Digest;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

#[cfg(feature = "md5")]
pub struct Md5Hasher(md5::Md5);

#[cfg(feature = "md5")]
impl Hasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

#[cfg(feature = "md5")]
impl Default for Md5Hasher {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "md5")]
impl Md5Hasher {
    pub fn new() -> Self { Self(md5::Md5::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { md5::Md5::digest(data).to_vec() }
}

#[cfg(feature = "sha256")]
pub struct Sha256Hasher(sha2::Sha256);

#[cfg(feature = "sha256")]
impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

#[cfg(feature = "sha256")]
impl Default for Sha256Hasher {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "sha256")]
impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha256::digest(data).to_vec() }
}

/// Hasher selected at runtime from a [`crate::Algorithm`].
pub enum AnyHasher {
    #[cfg(feature = "md5")]
    Md5(Md5Hasher),
    #[cfg(feature = "sha256")]
    Sha256(Sha256Hasher),
}

impl Hasher for AnyHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            #[cfg(feature = "md5")]
            AnyHasher::Md5(h) => h.update(data),
            #[cfg(feature = "sha256")]
            AnyHasher::Sha256(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            #[cfg(feature = "md5")]
            AnyHasher::Md5(h) => h.finalize(),
            #[cfg(feature = "sha256")]
            AnyHasher::Sha256(h) => h.finalize(),
        }
    }
}
