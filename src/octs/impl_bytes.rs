use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{BytesError, ReadBytes, Result, WriteBytes};

macro_rules! read_n {
    ($self:expr, $get:ident, $size:literal) => {
        if $self.remaining() >= $size {
            Ok($self.$get())
        } else {
            Err(BytesError::BufferTooShort)
        }
    };
}

macro_rules! write_n {
    ($self:expr, $value:expr, $put:ident, $size:literal) => {
        if $self.remaining_mut() >= $size {
            $self.$put($value);
            Ok(())
        } else {
            Err(BytesError::BufferTooShort)
        }
    };
}

macro_rules! impl_read {
    () => {
        #[inline]
        fn read_u8(&mut self) -> Result<u8> {
            read_n!(self, get_u8, 1)
        }

        #[inline]
        fn read_u32(&mut self) -> Result<u32> {
            read_n!(self, get_u32_ne, 4)
        }

        #[inline]
        fn read_i32(&mut self) -> Result<i32> {
            read_n!(self, get_i32_ne, 4)
        }

        #[inline]
        fn read_i64(&mut self) -> Result<i64> {
            read_n!(self, get_i64_ne, 8)
        }
    };
}

impl ReadBytes for Bytes {
    impl_read!();

    #[inline]
    fn read_slice(&mut self, len: usize) -> Result<Bytes> {
        if self.remaining() >= len {
            Ok(self.split_to(len))
        } else {
            Err(BytesError::BufferTooShort)
        }
    }
}

impl ReadBytes for BytesMut {
    impl_read!();

    #[inline]
    fn read_slice(&mut self, len: usize) -> Result<Bytes> {
        if self.remaining() >= len {
            Ok(self.split_to(len).freeze())
        } else {
            Err(BytesError::BufferTooShort)
        }
    }
}

impl WriteBytes for BytesMut {
    #[inline]
    fn write_u8(&mut self, value: u8) -> Result<()> {
        write_n!(self, value, put_u8, 1)
    }

    #[inline]
    fn write_u32(&mut self, value: u32) -> Result<()> {
        write_n!(self, value, put_u32_ne, 4)
    }

    #[inline]
    fn write_i32(&mut self, value: i32) -> Result<()> {
        write_n!(self, value, put_i32_ne, 4)
    }

    #[inline]
    fn write_i64(&mut self, value: i64) -> Result<()> {
        write_n!(self, value, put_i64_ne, 8)
    }

    #[inline]
    fn write_slice(&mut self, src: &[u8]) -> Result<()> {
        if self.remaining_mut() >= src.len() {
            self.put_slice(src);
            Ok(())
        } else {
            Err(BytesError::BufferTooShort)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_roundtrip() {
        let mut buf = BytesMut::with_capacity(32);
        buf.write_u8(1).unwrap();
        buf.write_u32(2).unwrap();
        buf.write_i32(-3).unwrap();
        buf.write_i64(-4).unwrap();
        buf.write_slice(&[5, 6, 7]).unwrap();

        let mut buf = buf.freeze();
        assert_eq!(1, buf.read_u8().unwrap());
        assert_eq!(2, buf.read_u32().unwrap());
        assert_eq!(-3, buf.read_i32().unwrap());
        assert_eq!(-4, buf.read_i64().unwrap());
        assert_eq!(&[5, 6, 7][..], &buf.read_slice(3).unwrap()[..]);
    }

    #[test]
    fn short_buffer_errors() {
        let mut buf = BytesMut::with_capacity(2).freeze();
        assert_eq!(Err(BytesError::BufferTooShort), buf.read_i32());
    }
}
