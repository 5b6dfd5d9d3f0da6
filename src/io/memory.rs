use super::ReadAt;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// In-memory reader over a fully assembled archive buffer.
///
/// Takes ownership of the buffer without copying it. Clones share the
/// same bytes.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Arc<Vec<u8>>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
        }
    }
}

impl From<Vec<u8>> for MemoryReader {
    fn from(data: Vec<u8>) -> Self {
        MemoryReader::new(data)
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let len = self.data.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn short_read_at_tail() {
        let reader = MemoryReader::new(b"abcdef".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(reader.read_at(4, &mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(reader.read_at(6, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn read_exact_past_end_fails() {
        let reader = MemoryReader::new(b"abc".to_vec());
        let mut buf = [0u8; 4];
        assert!(reader.read_exact_at(0, &mut buf).await.is_err());

        let mut buf = [0u8; 3];
        reader.read_exact_at(0, &mut buf).await.unwrap();
        assert_eq!(&buf, b"abc");
    }

    #[test]
    fn wraps_buffer_in_place() {
        let data = vec![7u8; 4096];
        let ptr = data.as_ptr();
        let reader = MemoryReader::new(data);
        assert_eq!(reader.data.as_ptr(), ptr);
        assert_eq!(reader.clone().data.as_ptr(), ptr);
    }
}
