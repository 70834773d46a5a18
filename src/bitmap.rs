//! Decoder for the SmartEVSE LCD snapshot.
//!
//! `GET /lcd` answers with a 1-bit BMP of the controller's 128x64 LCD.
//! Rows are stored bottom-to-top and each byte holds eight pixels with the
//! leftmost pixel in the most significant bit. The decoder locates the
//! pixel data through the file header's `bfOffBits` field rather than a
//! fixed header length, since the palette size varies between writers.
//!
//! A bare 1024-byte buffer without any header is accepted as a bottom-up
//! 128x64 frame.

use core::fmt;

/// Width of the SmartEVSE LCD in pixels.
pub const LCD_WIDTH: u32 = 128;

/// Height of the SmartEVSE LCD in pixels.
pub const LCD_HEIGHT: u32 = 64;

const HEADERLESS_LEN: usize = (LCD_WIDTH * LCD_HEIGHT / 8) as usize;
const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_MIN: usize = 12;

/// Bitmap decoding errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BitmapError {
    /// Neither a BMP file nor a headerless frame.
    NotBitmap,
    /// The body ended before the pixel data did.
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes received.
        got: usize,
    },
    /// Only 1-bit images are supported.
    UnsupportedDepth(u16),
    /// Zero or implausibly large dimensions.
    BadDimensions {
        /// Header width.
        width: i32,
        /// Header height.
        height: i32,
    },
}

impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBitmap => write!(f, "not a bitmap"),
            Self::Truncated { needed, got } => {
                write!(f, "bitmap truncated: need {} bytes, got {}", needed, got)
            }
            Self::UnsupportedDepth(bpp) => write!(f, "unsupported bit depth {}", bpp),
            Self::BadDimensions { width, height } => {
                write!(f, "bad bitmap dimensions {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for BitmapError {}

/// A decoded monochrome frame, stored top-down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LcdFrame {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl LcdFrame {
    /// Decodes a BMP file or a headerless 128x64 frame.
    pub fn decode(data: &[u8]) -> Result<Self, BitmapError> {
        if data.starts_with(b"BM") {
            Self::decode_bmp(data)
        } else if data.len() == HEADERLESS_LEN {
            Ok(Self::from_rows(data, LCD_WIDTH, LCD_HEIGHT, true))
        } else {
            Err(BitmapError::NotBitmap)
        }
    }

    fn decode_bmp(data: &[u8]) -> Result<Self, BitmapError> {
        let header_end = FILE_HEADER_LEN + INFO_HEADER_MIN;
        if data.len() < header_end {
            return Err(BitmapError::Truncated {
                needed: header_end,
                got: data.len(),
            });
        }

        let offset = read_u32(data, 10) as usize;
        let info_len = read_u32(data, 14) as usize;

        // OS/2 core headers use 16-bit dimensions
        let (width, height, bpp) = if info_len == INFO_HEADER_MIN {
            (
                i32::from(read_u16(data, 18)),
                i32::from(read_u16(data, 20)),
                read_u16(data, 24),
            )
        } else {
            let needed = FILE_HEADER_LEN + 16;
            if data.len() < needed {
                return Err(BitmapError::Truncated {
                    needed,
                    got: data.len(),
                });
            }
            (read_i32(data, 18), read_i32(data, 22), read_u16(data, 28))
        };

        if bpp != 1 {
            return Err(BitmapError::UnsupportedDepth(bpp));
        }
        if width <= 0 || height == 0 || width > 1024 || height.unsigned_abs() > 1024 {
            return Err(BitmapError::BadDimensions { width, height });
        }

        let bottom_up = height > 0;
        let width = width as u32;
        let height = height.unsigned_abs();
        // bfOffBits comes from the peer; an overflowing size counts as truncated
        let needed = stride(width)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_add(offset))
            .unwrap_or(usize::MAX);
        let rows = match data.get(offset..) {
            Some(rows) if data.len() >= needed => rows,
            _ => {
                return Err(BitmapError::Truncated {
                    needed,
                    got: data.len(),
                })
            }
        };

        Ok(Self::from_rows(rows, width, height, bottom_up))
    }

    fn from_rows(rows: &[u8], width: u32, height: u32, bottom_up: bool) -> Self {
        let stride = stride(width);
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            let src_row = (if bottom_up { height - 1 - y } else { y }) as usize;
            let row = &rows[src_row * stride..];
            for x in 0..width as usize {
                pixels.push(row[x / 8] & (0x80 >> (x % 8)) != 0);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns true if the pixel at (`x`, `y`), counted from the top-left, is lit.
    pub fn is_on(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.pixels[(y * self.width + x) as usize]
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }
}

/// Row length in bytes, padded to a 4-byte boundary.
fn stride(width: u32) -> usize {
    (width as usize).div_ceil(32) * 4
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_i32(data: &[u8], at: usize) -> i32 {
    read_u32(data, at) as i32
}
