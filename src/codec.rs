//! The injected binary codec (§3: "replies are serializable and
//! deserializable via an injected binary codec"). The core never interprets
//! reply bytes itself; it only asks a [`ReplyCodec`] to turn a reply into
//! bytes for `SET`/`LEASE_SET` and back into a reply on a `GET`/`LEASE_GET`
//! hit.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::BoxError;

/// Encodes/decodes a reply type to/from the raw bytes stored in the cache.
pub trait ReplyCodec<Reply>: Send + Sync + 'static {
    /// Serialize a reply into a contiguous byte buffer.
    ///
    /// Per §4.4 this must be safe to call from main-stack (non-cooperative)
    /// context — implementations are free to allocate and recurse as a
    /// normal synchronous function would.
    fn encode(&self, reply: &Reply) -> Result<Vec<u8>, BoxError>;

    /// Deserialize a previously-encoded payload back into a reply.
    fn decode(&self, payload: &[u8]) -> Result<Reply, BoxError>;
}

/// Default [`ReplyCodec`] backed by `postcard`, the compact `serde` wire
/// format already used by this lineage's cache managers for stored replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardCodec;

impl<Reply> ReplyCodec<Reply> for PostcardCodec
where
    Reply: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn encode(&self, reply: &Reply) -> Result<Vec<u8>, BoxError> {
        postcard::to_allocvec(reply).map_err(|e| Box::new(e) as BoxError)
    }

    fn decode(&self, payload: &[u8]) -> Result<Reply, BoxError> {
        postcard::from_bytes(payload).map_err(|e| Box::new(e) as BoxError)
    }
}
