use super::FrameError;

/// Bounds-checked little-endian cursor over a frame.
///
/// Every read names the field it is reading so a truncated frame reports
/// exactly where it ran out.
pub struct FrameReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    fn take<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], FrameError> {
        let bytes = self
            .data
            .get(self.offset..self.offset + N)
            .and_then(|slice| <[u8; N]>::try_from(slice).ok())
            .ok_or(FrameError::ShortRead {
                field,
                offset: self.offset,
            })?;
        self.offset += N;
        Ok(bytes)
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, FrameError> {
        let [b] = self.take::<1>(field)?;
        Ok(b)
    }

    /// Reads a one-byte flag; only `1` counts as set.
    pub fn flag(&mut self, field: &'static str) -> Result<bool, FrameError> {
        Ok(self.u8(field)? == 1)
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16, FrameError> {
        self.take(field).map(u16::from_le_bytes)
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32, FrameError> {
        self.take(field).map(u32::from_le_bytes)
    }

    pub fn i32(&mut self, field: &'static str) -> Result<i32, FrameError> {
        self.take(field).map(i32::from_le_bytes)
    }

    pub fn f32(&mut self, field: &'static str) -> Result<f32, FrameError> {
        self.take(field).map(f32::from_le_bytes)
    }
}
