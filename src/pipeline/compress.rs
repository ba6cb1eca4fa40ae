use crate::algorithm::Compression;
use crate::error::{GitPdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::{Decompress, FlushDecompress, Status};
use std::io::{Read, Write};

/// Compress data using the specified algorithm
pub fn compress(data: &[u8], algorithm: Compression) -> Result<Vec<u8>> {
    match algorithm {
        Compression::Zlib => compress_zlib(data),
        Compression::Zstd => compress_zstd(data),
        Compression::Lz4 => compress_lz4(data),
        Compression::Brotli => compress_brotli(data),
        Compression::None => Ok(data.to_vec()),
    }
}

/// Decompress data using the specified algorithm
/// Truncated or corrupt streams fail with `MalformedInput`
pub fn decompress(data: &[u8], algorithm: Compression) -> Result<Vec<u8>> {
    match algorithm {
        Compression::Zlib => decompress_zlib(data),
        Compression::Zstd => decompress_zstd(data),
        Compression::Lz4 => decompress_lz4(data),
        Compression::Brotli => decompress_brotli(data),
        Compression::None => Ok(data.to_vec()),
    }
}

fn malformed(algorithm: &str, e: impl std::fmt::Display) -> GitPdfError {
    GitPdfError::MalformedInput(format!("{}: {}", algorithm, e))
}

fn compress_zlib(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflate until the zlib trailer is reached; running out of input first is an error
fn decompress_zlib(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut output = Vec::with_capacity(data.len().saturating_mul(2).max(64));
    loop {
        if output.len() == output.capacity() {
            output.reserve(output.capacity());
        }
        let consumed = inflater.total_in();
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&data[consumed as usize..], &mut output, FlushDecompress::None)
            .map_err(|e| malformed("zlib", e))?;
        if status == Status::StreamEnd {
            return Ok(output);
        }
        if inflater.total_in() == consumed && inflater.total_out() == produced {
            return Err(malformed("zlib", "truncated stream"));
        }
    }
}

fn compress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    Ok(zstd::encode_all(data, 3)?)
}

fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(|e| malformed("zstd", e))
}

fn compress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data).map_err(|e| malformed("lz4", e))
}

fn compress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut output, 4096, 4, 22);
        writer.write_all(data)?;
    }
    Ok(output)
}

fn decompress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    brotli::Decompressor::new(data, 4096)
        .read_to_end(&mut output)
        .map_err(|e| malformed("brotli", e))?;
    Ok(output)
}
