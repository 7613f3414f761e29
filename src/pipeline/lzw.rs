use std::collections::HashMap;

/// GIF caps LZW codes at 12 bits.
const MAX_CODES: u16 = 4096;

/// Packs variable-width codes least-significant-bit first.
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    bits: u8,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            acc: 0,
            bits: 0,
        }
    }

    fn write(&mut self, code: u16, width: u8) {
        self.acc |= (code as u32) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// LZW-compresses color indices the way GIF image data expects. Every index must be
/// below `1 << min_code_size`.
pub fn compress(min_code_size: u8, indices: &[u8]) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let end = clear + 1;

    let mut writer = BitWriter::new();
    let mut code_size = min_code_size + 1;
    let mut next_code = end + 1;
    let mut table: HashMap<u32, u16> = HashMap::new();

    writer.write(clear, code_size);

    let mut pixels = indices.iter().copied();
    let Some(first) = pixels.next() else {
        writer.write(end, code_size);
        return writer.finish();
    };

    let mut prefix = first as u16;
    for k in pixels {
        let key = ((prefix as u32) << 8) | k as u32;
        if let Some(&code) = table.get(&key) {
            prefix = code;
            continue;
        }

        writer.write(prefix, code_size);

        if next_code == MAX_CODES {
            writer.write(clear, code_size);
            table.clear();
            next_code = end + 1;
            code_size = min_code_size + 1;
        } else {
            // The decoder widens one entry behind us, so widen before inserting the
            // first code that no longer fits.
            if next_code >= (1 << code_size) {
                code_size += 1;
            }
            table.insert(key, next_code);
            next_code += 1;
        }

        prefix = k as u16;
    }

    writer.write(prefix, code_size);
    writer.write(end, code_size);
    writer.finish()
}
