use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::types::Chunk;
use crate::{FALLBACK_CHUNK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a stream in bounded chunks.
pub struct ChunkReader<R> {
    reader: R,
    chunk_size: usize,
    offset: u64,
}

impl ChunkReader<tokio::fs::File> {
    /// Opens a local file for chunked reading.
    ///
    /// If `chunk_size` is 0, [`FALLBACK_CHUNK_SIZE`] (64 KiB) is used.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(file, chunk_size))
    }
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    /// Wraps any async reader.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            FALLBACK_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            reader,
            chunk_size,
            offset: 0,
        }
    }

    /// Reads the next chunk. Returns `None` at end of stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let mut buf = vec![0u8; self.chunk_size];
        let n = self.reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);

        let chunk = Chunk {
            offset: self.offset,
            data: buf,
        };
        self.offset += n as u64;
        Ok(Some(chunk))
    }

    /// Bytes read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

// ---------------------------------------------------------------------------
// Pipe
// ---------------------------------------------------------------------------

/// Totals observed by both sides of a completed pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeSummary {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub chunks: u64,
}

/// Streams `reader` into `writer` chunk by chunk.
///
/// The read side and the write side run as two futures joined on the
/// current task. A one-slot channel sits between them, so the next chunk is
/// read only after the writer has accepted the previous one. The pipe
/// resolves only when the read side has hit end of stream *and* the write
/// side has drained every chunk and shut the writer down. An error on
/// either side aborts the whole pipe.
///
/// `on_chunk` is called with the length of each chunk after it is written.
pub async fn pipe_chunked<R, W, F>(
    reader: ChunkReader<R>,
    mut writer: W,
    mut on_chunk: F,
) -> Result<PipeSummary, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnMut(u64),
{
    let (tx, mut rx) = mpsc::channel::<Chunk>(1);

    let read_side = async move {
        let mut reader = reader;
        let mut chunks: u64 = 0;
        while let Some(chunk) = reader.next_chunk().await? {
            chunks += 1;
            if tx.send(chunk).await.is_err() {
                return Err(TransferError::PipeClosed);
            }
        }
        // `tx` drops here, which is the end-of-stream signal for the writer.
        Ok::<_, TransferError>((reader.offset(), chunks))
    };

    let write_side = async {
        let mut written: u64 = 0;
        while let Some(chunk) = rx.recv().await {
            writer.write_all(&chunk.data).await?;
            let n = chunk.len() as u64;
            written += n;
            on_chunk(n);
        }
        writer.shutdown().await?;
        Ok::<_, TransferError>(written)
    };

    let ((bytes_read, chunks), bytes_written) = tokio::try_join!(read_side, write_side)?;

    if bytes_read != bytes_written {
        return Err(TransferError::ShortTransfer {
            read: bytes_read,
            written: bytes_written,
        });
    }

    Ok(PipeSummary {
        bytes_read,
        bytes_written,
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Writer that records data and whether it was shut down.
    #[derive(Default)]
    struct RecordingWriter {
        data: Vec<u8>,
        shut_down: bool,
        fail_after: Option<usize>,
    }

    impl AsyncWrite for RecordingWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            if let Some(limit) = self.fail_after
                && self.data.len() + buf.len() > limit
            {
                return Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "remote closed",
                )));
            }
            self.data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            self.shut_down = true;
            Poll::Ready(Ok(()))
        }
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn reader_splits_into_bounded_chunks() {
        let mut reader = ChunkReader::new(Cursor::new(b"AABBCCDDEE".to_vec()), 4);
        let c1 = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(c1.offset, 0);
        assert_eq!(c1.data, b"AABB");
        let c2 = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(c2.offset, 4);
        let c3 = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(c3.data, b"EE");
        assert!(reader.next_chunk().await.unwrap().is_none());
        assert_eq!(reader.offset(), 10);
    }

    #[test]
    fn zero_chunk_size_uses_default() {
        let reader = ChunkReader::new(Cursor::new(Vec::<u8>::new()), 0);
        assert_eq!(reader.chunk_size(), FALLBACK_CHUNK_SIZE);
    }

    #[tokio::test]
    async fn pipe_copies_everything_and_shuts_down() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let reader = ChunkReader::new(Cursor::new(data.clone()), FALLBACK_CHUNK_SIZE);
        let mut writer = RecordingWriter::default();
        let mut ticks = Vec::new();

        let summary = pipe_chunked(reader, &mut writer, |n| ticks.push(n))
            .await
            .unwrap();

        assert_eq!(summary.bytes_read, 200_000);
        assert_eq!(summary.bytes_written, 200_000);
        assert_eq!(summary.chunks, 4);
        assert_eq!(ticks.iter().sum::<u64>(), 200_000);
        assert!(ticks.iter().all(|&n| n <= FALLBACK_CHUNK_SIZE as u64));
        assert!(writer.shut_down);
        assert_eq!(writer.data, data);
    }

    #[tokio::test]
    async fn pipe_empty_source_still_shuts_down() {
        let reader = ChunkReader::new(Cursor::new(Vec::<u8>::new()), 16);
        let mut writer = RecordingWriter::default();
        let summary = pipe_chunked(reader, &mut writer, |_| {}).await.unwrap();
        assert_eq!(summary.bytes_written, 0);
        assert_eq!(summary.chunks, 0);
        assert!(writer.shut_down);
    }

    #[tokio::test]
    async fn write_error_aborts_pipe() {
        let reader = ChunkReader::new(Cursor::new(vec![7u8; 1000]), 100);
        let mut writer = RecordingWriter {
            fail_after: Some(350),
            ..Default::default()
        };
        let result = pipe_chunked(reader, &mut writer, |_| {}).await;
        assert!(matches!(result, Err(TransferError::Io(_))));
        assert!(!writer.shut_down);
    }

    #[tokio::test]
    async fn read_error_aborts_pipe() {
        let reader = ChunkReader::new(FailingReader, 100);
        let mut writer = RecordingWriter::default();
        let result = pipe_chunked(reader, &mut writer, |_| {}).await;
        assert!(matches!(result, Err(TransferError::Io(_))));
    }

    #[tokio::test]
    async fn open_reads_local_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, vec![1u8; 70_000]).unwrap();
        let reader = ChunkReader::open(&path, 0).await.unwrap();
        let mut writer = RecordingWriter::default();
        let summary = pipe_chunked(reader, &mut writer, |_| {}).await.unwrap();
        assert_eq!(summary.bytes_written, 70_000);
    }
}
