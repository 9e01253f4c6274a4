//! Minimal fallible byte-buffer reading/writing, used to give the wire codec
//! (see [`crate::codec`]) a `Result`-returning API instead of the panicking
//! one [`bytes::Buf`]/[`bytes::BufMut`] expose directly.
//!
//! All multi-byte integers are read and written in native-endian order, since
//! the only consumer of this wire format is another instance of this same
//! program (see [`crate::codec`] for why that's safe).

mod impl_bytes;

use bytes::Bytes;

/// Error when reading or writing to/from a byte buffer using [`ReadBytes`] or
/// [`WriteBytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BytesError {
    /// Byte buffer was too short to attempt this operation.
    #[error("buffer too short")]
    BufferTooShort,
}

/// Result type with [`BytesError`] as an error type.
pub type Result<T> = std::result::Result<T, BytesError>;

/// Type which can be [encoded](Encode) using a constant number of bytes.
pub trait ConstEncodeSize {
    /// Number of bytes required to encode a value of this type.
    const ENCODE_SIZE: usize;
}

/// Defines how to encode this value into a [`WriteBytes`].
pub trait Encode {
    /// Writes this value into a [`WriteBytes`].
    ///
    /// # Errors
    ///
    /// Errors if the buffer is not long enough to fit the extra bytes.
    fn encode(&self, buf: &mut impl WriteBytes) -> Result<()>;
}

/// Defines how to decode a value of this type from a [`ReadBytes`].
pub trait Decode: Sized {
    /// Reads the next value of this type from the buffer, and advances the
    /// cursor of the buffer.
    ///
    /// # Errors
    ///
    /// Errors if the buffer does not have enough bytes left to read.
    fn decode(buf: &mut impl ReadBytes) -> Result<Self>;
}

/// Provides fallible functions for reading bytes from a [`Bytes`] or
/// [`BytesMut`](bytes::BytesMut).
pub trait ReadBytes {
    /// Reads the next [`u8`] and advances the cursor of the buffer.
    fn read_u8(&mut self) -> Result<u8>;

    /// Reads the next native-endian [`u32`] and advances the cursor.
    fn read_u32(&mut self) -> Result<u32>;

    /// Reads the next native-endian [`i32`] and advances the cursor.
    fn read_i32(&mut self) -> Result<i32>;

    /// Reads the next native-endian [`i64`] and advances the cursor.
    fn read_i64(&mut self) -> Result<i64>;

    /// Reads the next `len` bytes and creates a new [`Bytes`], creating a
    /// clone of the underlying [`Bytes`] object. The clone is cheap as it
    /// only increases a reference count.
    ///
    /// # Errors
    ///
    /// Errors if the buffer has less than `len` bytes left to read.
    fn read_slice(&mut self, len: usize) -> Result<Bytes>;

    /// Reads the next `T` and advances the cursor of the buffer.
    #[inline]
    fn read<T: Decode>(&mut self) -> Result<T>
    where
        Self: Sized,
    {
        T::decode(self)
    }
}

/// Provides fallible functions for writing bytes to a
/// [`BytesMut`](bytes::BytesMut).
pub trait WriteBytes {
    /// Writes a [`u8`] into the buffer and advances the cursor.
    fn write_u8(&mut self, value: u8) -> Result<()>;

    /// Writes a native-endian [`u32`] into the buffer and advances the
    /// cursor.
    fn write_u32(&mut self, value: u32) -> Result<()>;

    /// Writes a native-endian [`i32`] into the buffer and advances the
    /// cursor.
    fn write_i32(&mut self, value: i32) -> Result<()>;

    /// Writes a native-endian [`i64`] into the buffer and advances the
    /// cursor.
    fn write_i64(&mut self, value: i64) -> Result<()>;

    /// Writes a slice of bytes into the buffer and advances the cursor.
    fn write_slice(&mut self, src: &[u8]) -> Result<()>;

    /// Writes a `T` into the buffer and advances the cursor.
    #[inline]
    fn write<T: Encode>(&mut self, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        value.encode(self)
    }
}
