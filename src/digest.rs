use hex;
use md5;
use std::fmt;
use std::str;

pub const DIGEST_LENGTH: usize = 16;
pub const HEX_LENGTH: usize = DIGEST_LENGTH * 2;

pub type Digest = [u8; DIGEST_LENGTH];

/// Maps a byte string to a fixed-width digest.
///
/// A digester error is fatal to the worker using it: the search stops and the failure is carried
/// to the final reduction.
pub trait Digester {
    fn digest(&mut self, input: &[u8]) -> Result<Digest, &'static str>;
}

/// MD5 through the `md5` crate, which has no failure path of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5;

impl Digester for Md5 {
    fn digest(&mut self, input: &[u8]) -> Result<Digest, &'static str> {
        let mut context = md5::Context::new();
        context.consume(input);
        Ok(context.compute().0)
    }
}

/// Lowercase hex rendering of a digest, stored inline so table slots never allocate
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexDigest([u8; HEX_LENGTH]);

impl HexDigest {
    pub fn encode(digest: &Digest) -> Self {
        let mut buf = [0u8; HEX_LENGTH];
        // The buffer is exactly twice the digest width, the only case encode_to_slice rejects
        let encoded = hex::encode_to_slice(digest, &mut buf);
        debug_assert!(encoded.is_ok());
        HexDigest(buf)
    }

    pub fn as_str(&self) -> &str {
        // hex only writes ASCII digits
        str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexDigest({})", self.as_str())
    }
}
