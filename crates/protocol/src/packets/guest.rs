//! Guest -> Host messages.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::io::WireRead;
use crate::{BinaryWriter, ProtocolError};

/// Join request, the first thing a guest sends after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinRequest {
    pub message: Option<String>,
}

impl JoinRequest {
    pub fn new(message: Option<&str>) -> Self {
        Self {
            message: message.map(str::to_owned),
        }
    }

    pub fn build(&self) -> BinaryWriter {
        let mut w = BinaryWriter::new();
        match &self.message {
            Some(message) => {
                w.put_bool(true);
                w.put_string(message);
            }
            None => w.put_bool(false),
        }
        w
    }

    pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let message = if reader.read_bool().await? {
            Some(reader.read_string().await?)
        } else {
            None
        };
        Ok(Self { message })
    }
}

/// A move submitted by the guest whose turn it is.
///
/// Travels as one `i64` with `y` in the high half and `x` in the low half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub x: i32,
    pub y: i32,
}

impl MoveRequest {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn pack(self) -> i64 {
        ((self.y as i64) << 32) | (self.x as u32 as i64)
    }

    pub fn unpack(packed: i64) -> Self {
        Self {
            x: packed as i32,
            y: (packed >> 32) as i32,
        }
    }

    pub fn build(self) -> BinaryWriter {
        let mut w = BinaryWriter::with_capacity(8);
        w.put_i64(self.pack());
        w
    }

    pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        Ok(Self::unpack(reader.read_i64().await?))
    }
}
