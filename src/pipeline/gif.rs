use crate::{
    error::{AnimationError, Result},
    pipeline::{lzw, quantize::QuantizedFrame},
};

/// How a decoder clears a frame before drawing the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalMethod {
    Unspecified = 0,
    Keep = 1,
    Background = 2,
    Previous = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// Display time in hundredths of a second.
    pub delay_cs: u16,
    pub disposal: DisposalMethod,
    /// NETSCAPE2.0 loop count; only honored on the first frame. `0` loops forever.
    pub repeat: Option<u16>,
}

/// `round(100 / fps)` centiseconds, clamped to what the format can store.
pub fn delay_centiseconds(fps: f64) -> u16 {
    (100.0 / fps).round().clamp(1.0, u16::MAX as f64) as u16
}

/// In-memory GIF89a writer with a local color table on every frame.
pub struct GifEncoder {
    width: u16,
    height: u16,
    buf: Vec<u8>,
    frames: usize,
}

impl GifEncoder {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buf = Vec::with_capacity(width as usize * height as usize);
        buf.extend_from_slice(b"GIF89a");
        buf.extend_from_slice(&width.to_le_bytes());
        buf.extend_from_slice(&height.to_le_bytes());
        // No global color table, 8-bit color resolution.
        buf.push(0x70);
        buf.push(0); // background color index
        buf.push(0); // pixel aspect ratio
        Self {
            width,
            height,
            buf,
            frames: 0,
        }
    }

    pub fn write_frame(&mut self, frame: &QuantizedFrame, options: FrameOptions) -> Result<()> {
        self.validate(frame)?;

        if self.frames == 0 {
            if let Some(repeat) = options.repeat {
                self.write_loop_extension(repeat);
            }
        }

        self.write_graphic_control(frame, options);
        self.write_image(frame);
        self.frames += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.frames == 0 {
            return Err(AnimationError::EncodingError(
                "Cannot finish a GIF without frames".into(),
            ));
        }
        self.buf.push(0x3B);
        Ok(self.buf)
    }

    fn validate(&self, frame: &QuantizedFrame) -> Result<()> {
        if frame.width == 0 || frame.height == 0 {
            return Err(AnimationError::EncodingError("Frame has no pixels".into()));
        }
        if frame.width > self.width || frame.height > self.height {
            return Err(AnimationError::EncodingError(format!(
                "Frame {}x{} exceeds canvas {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.indices.len() != frame.width as usize * frame.height as usize {
            return Err(AnimationError::EncodingError(format!(
                "Frame has {} indices for {}x{} pixels",
                frame.indices.len(),
                frame.width,
                frame.height
            )));
        }
        if frame.palette.len() > 256 {
            return Err(AnimationError::EncodingError(format!(
                "Color table has {} entries, at most 256 allowed",
                frame.palette.len()
            )));
        }
        let table_len = color_table_len(frame.palette.len());
        if let Some(&max) = frame.indices.iter().max() {
            if max as usize >= table_len {
                return Err(AnimationError::EncodingError(format!(
                    "Index {} is outside the {}-entry color table",
                    max, table_len
                )));
            }
        }
        Ok(())
    }

    fn write_loop_extension(&mut self, repeat: u16) {
        self.buf.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        self.buf.extend_from_slice(b"NETSCAPE2.0");
        self.buf.extend_from_slice(&[0x03, 0x01]);
        self.buf.extend_from_slice(&repeat.to_le_bytes());
        self.buf.push(0x00);
    }

    fn write_graphic_control(&mut self, frame: &QuantizedFrame, options: FrameOptions) {
        let transparent = frame.transparent_index.is_some() as u8;
        self.buf.extend_from_slice(&[0x21, 0xF9, 0x04]);
        self.buf.push(((options.disposal as u8) << 2) | transparent);
        self.buf.extend_from_slice(&options.delay_cs.to_le_bytes());
        self.buf.push(frame.transparent_index.unwrap_or(0));
        self.buf.push(0x00);
    }

    fn write_image(&mut self, frame: &QuantizedFrame) {
        let table_len = color_table_len(frame.palette.len());
        let table_bits = table_len.trailing_zeros() as u8;

        self.buf.push(0x2C);
        self.buf.extend_from_slice(&0u16.to_le_bytes()); // left
        self.buf.extend_from_slice(&0u16.to_le_bytes()); // top
        self.buf.extend_from_slice(&frame.width.to_le_bytes());
        self.buf.extend_from_slice(&frame.height.to_le_bytes());
        self.buf.push(0x80 | (table_bits - 1));

        for color in &frame.palette {
            self.buf.extend_from_slice(color);
        }
        for _ in frame.palette.len()..table_len {
            self.buf.extend_from_slice(&[0, 0, 0]);
        }

        let min_code_size = table_bits.max(2);
        self.buf.push(min_code_size);
        let data = lzw::compress(min_code_size, &frame.indices);
        for block in data.chunks(255) {
            self.buf.push(block.len() as u8);
            self.buf.extend_from_slice(block);
        }
        self.buf.push(0x00);
    }
}

/// Stored color tables are a power of two between 2 and 256 entries.
fn color_table_len(palette_len: usize) -> usize {
    palette_len.clamp(2, 256).next_power_of_two()
}

/// Writes every frame with the same delay and background disposal; the repeat count
/// goes on the first frame only.
pub fn encode_animation(frames: &[QuantizedFrame], delay_cs: u16, repeat: u16) -> Result<Vec<u8>> {
    let first = frames
        .first()
        .ok_or_else(|| AnimationError::EncodingError("No frames to encode".into()))?;

    let mut encoder = GifEncoder::new(first.width, first.height);
    for (index, frame) in frames.iter().enumerate() {
        encoder
            .write_frame(
                frame,
                FrameOptions {
                    delay_cs,
                    disposal: DisposalMethod::Background,
                    repeat: (index == 0).then_some(repeat),
                },
            )
            .map_err(|e| e.in_frame(index))?;
    }
    encoder.finish()
}
