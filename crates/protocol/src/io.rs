//! Streaming primitives over tokio byte streams.
//!
//! Messages carry no envelope, so everything is read field by field in the
//! order the protocol fixes. A reader that falls out of step is not detected.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{BinaryWriter, Color, MAX_STRING_BYTES, ProtocolError};

/// Protocol-level reads on top of [`AsyncReadExt`].
#[allow(async_fn_in_trait)]
pub trait WireRead: AsyncRead + Unpin {
    /// Read a one-byte boolean; any non-zero byte is `true`.
    async fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u8().await? != 0)
    }

    /// Read three raw bytes as r, g, b.
    async fn read_color(&mut self) -> Result<Color, ProtocolError> {
        let mut rgb = [0u8; 3];
        self.read_exact(&mut rgb).await?;
        Ok(Color::new(rgb[0], rgb[1], rgb[2]))
    }

    /// Read a length-prefixed UTF-16BE string.
    async fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_i32().await?;
        if len < 0 {
            return Err(ProtocolError::NegativeLength(len));
        }
        let len = len as usize;
        if len > MAX_STRING_BYTES {
            return Err(ProtocolError::StringTooLong(len));
        }
        if len % 2 != 0 {
            return Err(ProtocolError::OddStringLength(len));
        }
        let mut raw = vec![0u8; len];
        self.read_exact(&mut raw).await?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}

impl<R: AsyncRead + Unpin + ?Sized> WireRead for R {}

/// Write a built message and flush it.
pub async fn write_packet<W>(writer: &mut W, packet: BinaryWriter) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer.write_all(&packet.finish()).await?;
    writer.flush().await?;
    Ok(())
}
