#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgba, RgbaImage};
use rgen_anim::{
    pipeline::seed::FixedSeedSource, AnimationError, AnimationPipeline, Config, GenerationParams,
    GenerationResult, ImageProvider, ProviderChain, Result,
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Paints a 16x16 PNG whose colors depend on the seed; the corner pixel is transparent.
pub struct PaintingProvider {
    pub seen: Mutex<Vec<GenerationParams>>,
    pub fail_on_seed: Option<u64>,
}

impl PaintingProvider {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail_on_seed: None,
        }
    }

    pub fn failing_on(seed: u64) -> Self {
        Self {
            fail_on_seed: Some(seed),
            ..Self::new()
        }
    }

    pub fn seeds(&self) -> Vec<u64> {
        let mut seeds: Vec<u64> = self.seen.lock().unwrap().iter().map(|p| p.seed).collect();
        seeds.sort_unstable();
        seeds
    }
}

#[async_trait]
impl ImageProvider for PaintingProvider {
    fn name(&self) -> &'static str {
        "painting"
    }

    async fn generate(&self, params: GenerationParams) -> Result<GenerationResult> {
        self.seen.lock().unwrap().push(params.clone());
        if self.fail_on_seed == Some(params.seed) {
            return Err(AnimationError::ProviderError("upstream returned 503".into()));
        }
        Ok(GenerationResult {
            result_url: png_data_uri(params.seed),
        })
    }
}

pub fn png_bytes(seed: u64) -> Vec<u8> {
    let shade = (seed % 251) as u8;
    let image = RgbaImage::from_fn(16, 16, |x, y| {
        if x == 0 && y == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([shade, (x * 16) as u8, (y * 16) as u8, 255])
        }
    });
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

pub fn png_data_uri(seed: u64) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(seed)))
}

/// Answers every connection with the same canned response; returns the base URL.
pub async fn serve_http(status: &'static str, content_type: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    status,
                    content_type,
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

pub fn pipeline(provider: Arc<dyn ImageProvider>, seed: u64) -> AnimationPipeline {
    AnimationPipeline::new(&Config::default())
        .with_providers(ProviderChain::new().with_provider(|_| true, provider))
        .with_seed_source(Arc::new(FixedSeedSource(seed)))
}

pub fn gif_bytes(result_url: &str) -> Vec<u8> {
    let payload = result_url
        .strip_prefix("data:image/gif;base64,")
        .expect("result is a base64 GIF data URI");
    STANDARD.decode(payload).unwrap()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameInfo {
    pub width: u16,
    pub height: u16,
    pub delay_cs: u16,
    pub disposal: u8,
    pub transparent: bool,
    pub local_table_len: usize,
}

#[derive(Debug, Default)]
pub struct GifLayout {
    pub width: u16,
    pub height: u16,
    pub loop_extensions: usize,
    pub repeat: Option<u16>,
    pub frames: Vec<FrameInfo>,
}

fn skip_sub_blocks(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        let len = bytes[pos] as usize;
        pos += 1;
        if len == 0 {
            return pos;
        }
        pos += len;
    }
}

/// Walks the block structure of a GIF89a document.
pub fn walk_gif(bytes: &[u8]) -> GifLayout {
    assert_eq!(&bytes[0..6], b"GIF89a");
    let mut layout = GifLayout {
        width: u16::from_le_bytes([bytes[6], bytes[7]]),
        height: u16::from_le_bytes([bytes[8], bytes[9]]),
        ..Default::default()
    };

    let mut pos = 13;
    if bytes[10] & 0x80 != 0 {
        pos += 3 * (1 << ((bytes[10] & 0x07) + 1));
    }

    let mut pending = FrameInfo::default();
    loop {
        match bytes[pos] {
            0x21 => {
                let label = bytes[pos + 1];
                if label == 0xF9 {
                    let packed = bytes[pos + 3];
                    pending.disposal = (packed >> 2) & 0x07;
                    pending.transparent = packed & 0x01 == 1;
                    pending.delay_cs = u16::from_le_bytes([bytes[pos + 4], bytes[pos + 5]]);
                } else if label == 0xFF && &bytes[pos + 3..pos + 14] == b"NETSCAPE2.0" {
                    layout.loop_extensions += 1;
                    layout.repeat = Some(u16::from_le_bytes([bytes[pos + 16], bytes[pos + 17]]));
                }
                pos = skip_sub_blocks(bytes, pos + 2);
            }
            0x2C => {
                pending.width = u16::from_le_bytes([bytes[pos + 5], bytes[pos + 6]]);
                pending.height = u16::from_le_bytes([bytes[pos + 7], bytes[pos + 8]]);
                let packed = bytes[pos + 9];
                pos += 10;
                if packed & 0x80 != 0 {
                    pending.local_table_len = 1 << ((packed & 0x07) + 1);
                    pos += 3 * pending.local_table_len;
                }
                pos += 1; // LZW minimum code size
                pos = skip_sub_blocks(bytes, pos);
                layout.frames.push(std::mem::take(&mut pending));
            }
            0x3B => return layout,
            other => panic!("unexpected block 0x{:02X} at {}", other, pos),
        }
    }
}
