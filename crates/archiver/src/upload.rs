//! Compress an oplog window and hand it to the storage

use crate::storage::Storage;
use bytes::Bytes;
use flate2::write::GzEncoder;
use pitr_core::{CompressionType, Error, Result};
use std::io::Write;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

/// Block size of reads from the oplog stream
const READ_BLOCK: usize = 64 * 1024;

/// Blocks read ahead of the encoder
const PIPELINE_DEPTH: usize = 4;

/// Zstandard level used for chunks
const ZSTD_LEVEL: i32 = 3;

/// Encode everything `reader` yields with `compression` and save it as `path`.
///
/// Reading stays on the runtime while encoding runs on the blocking pool; at
/// most [`PIPELINE_DEPTH`] raw blocks are in flight between the two. Returns
/// the number of bytes stored.
pub async fn upload<R>(
    mut reader: R,
    storage: &dyn Storage,
    compression: CompressionType,
    path: &str,
) -> Result<u64>
where
    R: AsyncRead + Unpin + Send,
{
    let mut encoder = Encoder::new(compression)?;
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(PIPELINE_DEPTH);
    let encode = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        while let Some(block) = rx.blocking_recv() {
            encoder.write_all(&block)?;
        }
        encoder.finish()
    });

    let read = pump(&mut reader, &tx, path).await;
    drop(tx);

    let encoded = encode
        .await
        .map_err(|e| Error::storage(path, "compress", std::io::Error::other(e)))?;
    read?;
    let data = encoded.map_err(|e| Error::storage(path, "compress", e))?;

    let written = data.len() as u64;
    storage.save(path, Bytes::from(data)).await?;

    tracing::debug!(path, bytes = written, compression = %compression, "chunk encoded");
    Ok(written)
}

/// Feed the reader's blocks to the encoder until EOF or until it hangs up
async fn pump<R>(reader: &mut R, tx: &mpsc::Sender<Vec<u8>>, path: &str) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    loop {
        let mut block = vec![0u8; READ_BLOCK];
        let n = reader
            .read(&mut block)
            .await
            .map_err(|e| Error::storage(path, "read oplog", e))?;
        if n == 0 {
            return Ok(());
        }
        block.truncate(n);
        // a closed channel means the encoder failed; its error is reported
        if tx.send(block).await.is_err() {
            return Ok(());
        }
    }
}

/// Built-in encoders
enum Encoder {
    Plain(Vec<u8>),
    Gzip(GzEncoder<Vec<u8>>),
    Zstd(zstd::stream::write::Encoder<'static, Vec<u8>>),
}

impl Encoder {
    fn new(compression: CompressionType) -> Result<Self> {
        match compression {
            CompressionType::None => Ok(Encoder::Plain(Vec::new())),
            CompressionType::Gzip | CompressionType::Pgzip => Ok(Encoder::Gzip(GzEncoder::new(
                Vec::new(),
                flate2::Compression::default(),
            ))),
            CompressionType::Zstd => zstd::stream::write::Encoder::new(Vec::new(), ZSTD_LEVEL)
                .map(Encoder::Zstd)
                .map_err(|e| Error::storage("", "init zstd encoder", e)),
            CompressionType::Lz4 | CompressionType::Snappy | CompressionType::S2 => {
                Err(Error::unsupported(
                    compression.as_str(),
                    "no built-in encoder; the oplog source must provide its own upload",
                ))
            }
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Encoder::Plain(out) => {
                out.extend_from_slice(buf);
                Ok(())
            }
            Encoder::Gzip(enc) => enc.write_all(buf),
            Encoder::Zstd(enc) => enc.write_all(buf),
        }
    }

    fn finish(self) -> std::io::Result<Vec<u8>> {
        match self {
            Encoder::Plain(out) => Ok(out),
            Encoder::Gzip(enc) => enc.finish(),
            Encoder::Zstd(enc) => enc.finish(),
        }
    }
}
