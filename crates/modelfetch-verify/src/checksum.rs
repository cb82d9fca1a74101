use std::fmt;
use std::str::FromStr;

use crate::{AnyHasher, Result, VerificationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Md5,
    Sha256,
}

impl Algorithm {
    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Algorithm::Md5 => 16,
            Algorithm::Sha256 => 32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha256 => "sha256",
        }
    }

    pub fn hasher(self) -> Result<AnyHasher> {
        match self {
            #[cfg(feature = "md5")]
            Algorithm::Md5 => Ok(AnyHasher::Md5(crate::Md5Hasher::new())),
            #[cfg(feature = "sha256")]
            Algorithm::Sha256 => Ok(AnyHasher::Sha256(crate::Sha256Hasher::new())),
            #[allow(unreachable_patterns)]
            other => Err(VerificationError::UnknownAlgorithm(other.name().to_string())),
        }
    }

    fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "sha256" | "sha-256" => Ok(Algorithm::Sha256),
            other => Err(VerificationError::UnknownAlgorithm(other.to_string())),
        }
    }

    fn from_digest_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(Algorithm::Md5),
            32 => Some(Algorithm::Sha256),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// An expected digest together with the algorithm that produces it.
///
/// Parsed from `<algorithm>:<hex>` or from bare hex, in which case the
/// algorithm is inferred from the digest length (32 hex chars is MD5,
/// 64 is SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: Algorithm,
    digest:    Vec<u8>,
}

impl Checksum {
    pub fn new(algorithm: Algorithm, digest: Vec<u8>) -> Result<Self> {
        if digest.len() != algorithm.digest_len() {
            return Err(VerificationError::InvalidDigest(hex::encode(&digest)));
        }
        Ok(Self { algorithm, digest })
    }

    pub fn md5(digest_hex: &str) -> Result<Self> {
        Self::new(Algorithm::Md5, decode_hex(digest_hex)?)
    }

    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    pub fn digest(&self) -> &[u8] { &self.digest }

    pub fn to_hex(&self) -> String { hex::encode(&self.digest) }

    /// Fresh incremental hasher for this checksum's algorithm.
    ///
    /// Fails with [`VerificationError::UnknownAlgorithm`] when the
    /// algorithm's feature is compiled out.
    pub fn hasher(&self) -> Result<AnyHasher> { self.algorithm.hasher() }

    pub fn verify(&self, actual: &[u8]) -> Result<()> {
        if actual == self.digest.as_slice() {
            Ok(())
        } else {
            Err(VerificationError::Mismatch {
                expected: self.to_hex(),
                actual:   hex::encode(actual),
            })
        }
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim()).map_err(|_| VerificationError::InvalidDigest(s.to_string()))
}

impl FromStr for Checksum {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((name, digest)) => Self::new(Algorithm::from_name(name)?, decode_hex(digest)?),
            None => {
                let digest = decode_hex(s)?;
                let algorithm = Algorithm::from_digest_len(digest.len())
                    .ok_or_else(|| VerificationError::InvalidDigest(s.to_string()))?;
                Self::new(algorithm, digest)
            }
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}
