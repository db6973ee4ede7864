use super::utils::{self, LINE_FEED, MAX_GROUP_LENGTH};
use crate::transport::TransportError;
use log::{debug, warn};
use std::io::ErrorKind;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameLine {
    /// First line after a connection, the serial buffer may have started mid frame
    Partial(Vec<u8>),
    Aligned(Vec<u8>),
}

/// Splits a byte stream into TIC lines. One reader per connection.
pub struct FrameReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    first_line: bool,
    overrun: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        FrameReader {
            inner: BufReader::new(reader),
            buf: Vec::with_capacity(128),
            first_line: true,
            overrun: false,
        }
    }

    pub async fn next_line(&mut self) -> Result<FrameLine, TransportError> {
        loop {
            let (used, found) = match self.inner.fill_buf().await {
                Ok([]) => {
                    if !self.buf.is_empty() {
                        debug!("dropping {} bytes at the end of the stream", self.buf.len());
                    }
                    return Err(TransportError::Closed);
                }
                Ok(available) => match available.iter().position(|b| *b == LINE_FEED) {
                    Some(i) => {
                        if !self.overrun {
                            self.buf.extend_from_slice(&available[..=i]);
                        }
                        (i + 1, true)
                    }
                    None => {
                        if !self.overrun {
                            self.buf.extend_from_slice(available);
                        }
                        (available.len(), false)
                    }
                },
                // Serial ports report "no data yet" this way, partial bytes stay in buf
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                    continue;
                }
                Err(e) => return Err(TransportError::Read(e)),
            };
            self.inner.consume(used);

            if self.buf.len() > MAX_GROUP_LENGTH {
                warn!("no line feed within {MAX_GROUP_LENGTH} bytes, skipping to the next line");
                self.buf.clear();
                self.overrun = !found;
                continue;
            }

            if found {
                if self.overrun {
                    // end of the oversized chunk, nothing to hand out
                    self.overrun = false;
                    continue;
                }
                break;
            }
        }

        let line = utils::strip_terminators(&self.buf).to_vec();
        self.buf.clear();

        if self.first_line {
            self.first_line = false;
            return Ok(FrameLine::Partial(line));
        }

        Ok(FrameLine::Aligned(line))
    }

    /// Drops any partially received line
    pub fn discard(&mut self) {
        if !self.buf.is_empty() {
            debug!("discarding partial line: {:?}", self.buf.escape_ascii().to_string());
        }
        self.buf.clear();
        self.overrun = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncWriteExt, ReadBuf};

    #[tokio::test]
    async fn test_first_line_is_partial() {
        let data: &[u8] = b"E 00750 -\r\nOPTARIF BASE 0\r\nPAPP 00750 -\r\x03\x02\n";
        let mut reader = FrameReader::new(data);

        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Partial(b"E 00750 -".to_vec()));
        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Aligned(b"OPTARIF BASE 0".to_vec()));
        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Aligned(b"PAPP 00750 -".to_vec()));
        assert!(matches!(reader.next_line().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_well_formed_first_line_is_still_partial() {
        let data: &[u8] = b"OPTARIF BASE 0\r\n";
        let mut reader = FrameReader::new(data);
        assert!(matches!(reader.next_line().await.unwrap(), FrameLine::Partial(_)));
    }

    #[tokio::test]
    async fn test_line_split_over_writes() {
        let (mut peer, stream) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(stream);

        let task = tokio::spawn(async move {
            peer.write_all(b"junk\n").await.unwrap();
            peer.write_all(b"IINST 0").await.unwrap();
            tokio::task::yield_now().await;
            peer.write_all(b"02 [\r\n").await.unwrap();
            peer
        });

        assert!(matches!(reader.next_line().await.unwrap(), FrameLine::Partial(_)));
        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Aligned(b"IINST 002 [".to_vec()));
        drop(task.await.unwrap());
        assert!(matches!(reader.next_line().await, Err(TransportError::Closed)));
    }

    /// Yields a timeout before each chunk, as a serial port with a read timeout does
    struct TimeoutReader {
        chunks: Vec<&'static [u8]>,
        timed_out: bool,
    }

    impl AsyncRead for TimeoutReader {
        fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
            if !self.timed_out {
                self.timed_out = true;
                return Poll::Ready(Err(std::io::Error::new(ErrorKind::TimedOut, "no data")));
            }
            self.timed_out = false;
            if !self.chunks.is_empty() {
                let chunk = self.chunks.remove(0);
                buf.put_slice(chunk);
            }
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_timeouts_are_not_end_of_stream() {
        let reader = TimeoutReader { chunks: vec![&b"x\nHCH"[..], &b"C 001234567 +\r\n"[..]], timed_out: false };
        let mut reader = FrameReader::new(reader);

        assert!(matches!(reader.next_line().await.unwrap(), FrameLine::Partial(_)));
        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Aligned(b"HCHC 001234567 +".to_vec()));
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::new(ErrorKind::BrokenPipe, "device unplugged")))
        }
    }

    #[tokio::test]
    async fn test_read_error_is_propagated() {
        let mut reader = FrameReader::new(FailingReader);
        assert!(matches!(reader.next_line().await, Err(TransportError::Read(_))));
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped() {
        let mut data = b"junk\n".to_vec();
        data.extend(std::iter::repeat(0xFF).take(5000));
        data.extend_from_slice(b"\nPAPP 00750 -\r\n");
        let mut reader = FrameReader::new(&data[..]);

        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Partial(b"junk".to_vec()));
        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Aligned(b"PAPP 00750 -".to_vec()));
        assert!(matches!(reader.next_line().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_oversized_first_chunk_does_not_count_as_first_line() {
        let mut data = vec![0xFFu8; 5000];
        data.extend_from_slice(b"\nOPTARIF BASE 0\r\nPAPP 00750 -\r\n");
        let mut reader = FrameReader::new(&data[..]);

        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Partial(b"OPTARIF BASE 0".to_vec()));
        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Aligned(b"PAPP 00750 -".to_vec()));
    }

    #[tokio::test]
    async fn test_line_at_the_length_limit_is_kept() {
        let mut data = b"x\n".to_vec();
        let mut line = b"ADCO ".to_vec();
        line.resize(MAX_GROUP_LENGTH - 1, b'0');
        data.extend_from_slice(&line);
        data.push(LINE_FEED);
        let mut reader = FrameReader::new(&data[..]);

        assert!(matches!(reader.next_line().await.unwrap(), FrameLine::Partial(_)));
        assert_eq!(reader.next_line().await.unwrap(), FrameLine::Aligned(line));
    }
}
