//! Byte-aligned little-endian cursors.

use payload::{Quat, Vec2, Vec3};

use crate::error::{DecodeError, EncodeError, WireResult};

/// Reads little-endian fields from a byte slice.
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> WireResult<[u8; N]> {
        let needed = self.pos.saturating_add(N);
        let bytes = self
            .buf
            .get(self.pos..needed)
            .ok_or(DecodeError::Truncated {
                needed,
                available: self.buf.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos = needed;
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> WireResult<u8> {
        self.take::<1>().map(|[byte]| byte)
    }

    pub(crate) fn read_u16(&mut self) -> WireResult<u16> {
        self.take().map(u16::from_le_bytes)
    }

    pub(crate) fn read_u32(&mut self) -> WireResult<u32> {
        self.take().map(u32::from_le_bytes)
    }

    pub(crate) fn read_u64(&mut self) -> WireResult<u64> {
        self.take().map(u64::from_le_bytes)
    }

    pub(crate) fn read_f32(&mut self, field: &'static str) -> WireResult<f32> {
        let value = f32::from_bits(self.read_u32()?);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DecodeError::NonFinite { field })
        }
    }

    pub(crate) fn read_vec2(&mut self, field: &'static str) -> WireResult<Vec2> {
        Ok(Vec2::new(self.read_f32(field)?, self.read_f32(field)?))
    }

    pub(crate) fn read_vec3(&mut self, field: &'static str) -> WireResult<Vec3> {
        Ok(Vec3::new(
            self.read_f32(field)?,
            self.read_f32(field)?,
            self.read_f32(field)?,
        ))
    }

    pub(crate) fn read_quat(&mut self, field: &'static str) -> WireResult<Quat> {
        Ok(Quat::from_xyzw(
            self.read_f32(field)?,
            self.read_f32(field)?,
            self.read_f32(field)?,
            self.read_f32(field)?,
        ))
    }
}

/// Writes little-endian fields into a caller-provided buffer.
#[derive(Debug)]
pub(crate) struct ByteWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub(crate) fn new(out: &'a mut [u8]) -> Self {
        Self { out, pos: 0 }
    }

    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        let needed = self.pos.saturating_add(bytes.len());
        let available = self.out.len();
        let dst = self
            .out
            .get_mut(self.pos..needed)
            .ok_or(EncodeError::BufferTooSmall { needed, available })?;
        dst.copy_from_slice(bytes);
        self.pos = needed;
        Ok(())
    }

    pub(crate) fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.put(&[value])
    }

    pub(crate) fn write_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.put(&value.to_le_bytes())
    }

    pub(crate) fn write_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.put(&value.to_le_bytes())
    }

    pub(crate) fn write_u64(&mut self, value: u64) -> Result<(), EncodeError> {
        self.put(&value.to_le_bytes())
    }

    pub(crate) fn write_f32(&mut self, value: f32, field: &'static str) -> Result<(), EncodeError> {
        if !value.is_finite() {
            return Err(EncodeError::NonFinite { field });
        }
        self.write_u32(value.to_bits())
    }

    pub(crate) fn write_vec2(
        &mut self,
        value: Vec2,
        field: &'static str,
    ) -> Result<(), EncodeError> {
        self.write_f32(value.x, field)?;
        self.write_f32(value.y, field)
    }

    pub(crate) fn write_vec3(
        &mut self,
        value: Vec3,
        field: &'static str,
    ) -> Result<(), EncodeError> {
        self.write_f32(value.x, field)?;
        self.write_f32(value.y, field)?;
        self.write_f32(value.z, field)
    }

    pub(crate) fn write_quat(
        &mut self,
        value: Quat,
        field: &'static str,
    ) -> Result<(), EncodeError> {
        self.write_f32(value.x, field)?;
        self.write_f32(value.y, field)?;
        self.write_f32(value.z, field)?;
        self.write_f32(value.w, field)
    }
}
