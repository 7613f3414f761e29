use crate::error::{AnimationError, Result};
use std::collections::HashMap;

pub const MAX_PALETTE_SIZE: usize = 256;

/// Pixels with alpha below this are written as the transparent index.
pub const ALPHA_THRESHOLD: u8 = 128;

/// A frame reduced to an indexed color table.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedFrame {
    pub width: u16,
    pub height: u16,
    pub palette: Vec<[u8; 3]>,
    pub indices: Vec<u8>,
    pub transparent_index: Option<u8>,
}

type ColorCount = ([u8; 3], u32);

struct ColorBox {
    colors: Vec<ColorCount>,
}

impl ColorBox {
    fn population(&self) -> u64 {
        self.colors.iter().map(|&(_, n)| n as u64).sum()
    }

    /// Channel with the largest spread and that spread.
    fn widest_channel(&self) -> (usize, u8) {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for (color, _) in &self.colors {
            for ch in 0..3 {
                min[ch] = min[ch].min(color[ch]);
                max[ch] = max[ch].max(color[ch]);
            }
        }
        (0..3)
            .map(|ch| (ch, max[ch].saturating_sub(min[ch])))
            .max_by_key(|&(ch, range)| (range, std::cmp::Reverse(ch)))
            .unwrap_or((0, 0))
    }

    fn average(&self) -> [u8; 3] {
        let total = self.population().max(1);
        let mut sums = [0u64; 3];
        for (color, n) in &self.colors {
            for ch in 0..3 {
                sums[ch] += color[ch] as u64 * *n as u64;
            }
        }
        sums.map(|s| ((s + total / 2) / total) as u8)
    }

    /// Splits at the weighted median of the widest channel. Needs at least two colors.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.colors
            .sort_unstable_by_key(|&(color, _)| (color[channel], color));

        let half = self.population() / 2;
        let mut acc = 0u64;
        let mut at = self.colors.len() / 2;
        for (i, &(_, n)) in self.colors.iter().enumerate() {
            acc += n as u64;
            if acc >= half {
                at = i + 1;
                break;
            }
        }
        let at = at.clamp(1, self.colors.len() - 1);

        let upper = self.colors.split_off(at);
        (self, ColorBox { colors: upper })
    }
}

fn median_cut(mut colors: Vec<ColorCount>, max_colors: usize) -> Vec<[u8; 3]> {
    colors.sort_unstable_by_key(|&(color, _)| color);
    if colors.len() <= max_colors {
        return colors.into_iter().map(|(color, _)| color).collect();
    }

    let mut boxes = vec![ColorBox { colors }];
    while boxes.len() < max_colors {
        let widest = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .max_by_key(|(_, b)| (b.widest_channel().1, b.population()))
            .map(|(i, _)| i);

        let Some(pos) = widest else { break };
        let (lower, upper) = boxes.swap_remove(pos).split();
        boxes.push(lower);
        boxes.push(upper);
    }

    boxes.iter().map(ColorBox::average).collect()
}

fn nearest(palette: &[[u8; 3]], color: [u8; 3]) -> u8 {
    let mut best = 0usize;
    let mut best_dist = u32::MAX;
    for (i, entry) in palette.iter().enumerate() {
        let dist: u32 = (0..3)
            .map(|ch| {
                let d = entry[ch] as i32 - color[ch] as i32;
                (d * d) as u32
            })
            .sum();
        if dist < best_dist {
            best = i;
            best_dist = dist;
            if dist == 0 {
                break;
            }
        }
    }
    best as u8
}

/// Builds a color table of at most 256 entries for one RGBA8 frame and maps every pixel
/// to its nearest entry.
pub fn quantize(rgba: &[u8], width: u16, height: u16) -> Result<QuantizedFrame> {
    let pixel_count = width as usize * height as usize;
    if rgba.len() != pixel_count * 4 {
        return Err(AnimationError::EncodingError(format!(
            "Frame buffer is {} bytes, expected {} for {}x{} RGBA",
            rgba.len(),
            pixel_count * 4,
            width,
            height
        )));
    }

    let mut histogram: HashMap<[u8; 3], u32> = HashMap::new();
    let mut has_transparency = false;
    for px in rgba.chunks_exact(4) {
        if px[3] < ALPHA_THRESHOLD {
            has_transparency = true;
        } else {
            *histogram.entry([px[0], px[1], px[2]]).or_insert(0) += 1;
        }
    }

    let budget = if has_transparency {
        MAX_PALETTE_SIZE - 1
    } else {
        MAX_PALETTE_SIZE
    };
    let mut palette = median_cut(histogram.into_iter().collect(), budget);
    let opaque_len = palette.len();

    let transparent_index = if has_transparency {
        palette.push([0, 0, 0]);
        Some(opaque_len as u8)
    } else {
        None
    };

    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    let indices = rgba
        .chunks_exact(4)
        .map(|px| match transparent_index {
            Some(t) if px[3] < ALPHA_THRESHOLD => t,
            _ => {
                let color = [px[0], px[1], px[2]];
                *lookup
                    .entry(color)
                    .or_insert_with(|| nearest(&palette[..opaque_len], color))
            }
        })
        .collect();

    Ok(QuantizedFrame {
        width,
        height,
        palette,
        indices,
        transparent_index,
    })
}

/// Quantizes each `size x size` frame independently, in order.
pub fn quantize_frames(frames: &[Vec<u8>], size: u16) -> Result<Vec<QuantizedFrame>> {
    frames
        .iter()
        .enumerate()
        .map(|(index, rgba)| {
            quantize(rgba, size, size).map_err(|e| e.in_frame(index))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: [u8; 4], pixels: usize) -> Vec<u8> {
        color.iter().copied().cycle().take(pixels * 4).collect()
    }

    #[test]
    fn test_few_colors_are_kept_exactly() {
        let mut rgba = solid([255, 0, 0, 255], 8);
        rgba.extend(solid([0, 255, 0, 255], 8));

        let frame = quantize(&rgba, 4, 4).unwrap();
        assert_eq!(frame.palette.len(), 2);
        assert_eq!(frame.transparent_index, None);
        for (i, &index) in frame.indices.iter().enumerate() {
            let expected = if i < 8 { [255, 0, 0] } else { [0, 255, 0] };
            assert_eq!(frame.palette[index as usize], expected);
        }
    }

    #[test]
    fn test_gradient_is_reduced_to_256_entries() {
        let (width, height) = (64u16, 64u16);
        let mut rgba = Vec::with_capacity(64 * 64 * 4);
        for y in 0..height {
            for x in 0..width {
                rgba.extend([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
            }
        }

        let frame = quantize(&rgba, width, height).unwrap();
        assert_eq!(frame.palette.len(), MAX_PALETTE_SIZE);
        assert_eq!(frame.indices.len(), 64 * 64);

        // Every pixel lands near its source color.
        for (px, &index) in rgba.chunks_exact(4).zip(&frame.indices) {
            let entry = frame.palette[index as usize];
            for ch in 0..3 {
                assert!((entry[ch] as i32 - px[ch] as i32).abs() <= 24);
            }
        }
    }

    #[test]
    fn test_transparent_pixels_get_reserved_index() {
        let mut rgba = solid([10, 20, 30, 255], 3);
        rgba.extend(solid([200, 200, 200, 0], 1));

        let frame = quantize(&rgba, 2, 2).unwrap();
        assert_eq!(frame.transparent_index, Some(1));
        assert_eq!(frame.palette.len(), 2);
        assert_eq!(frame.indices, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_quantization_is_deterministic() {
        let rgba: Vec<u8> = (0..32 * 32)
            .flat_map(|i: u32| [(i * 7) as u8, (i * 13) as u8, (i * 29) as u8, 255])
            .collect();
        let a = quantize(&rgba, 32, 32).unwrap();
        let b = quantize(&rgba, 32, 32).unwrap();
        assert_eq!(a, b);
        assert!(a.palette.len() <= MAX_PALETTE_SIZE);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let err = quantize_frames(&[vec![0u8; 10]], 32).unwrap_err();
        assert!(err.to_string().contains("frame 0"));
    }
}
