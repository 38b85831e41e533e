// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Binary input decoding (Non-goal: image decoding)
//!
//! [`StubImageDecoder`] stands in for a real codec (libjpeg-turbo, PNG,
//! etc.). It validates that bytes were supplied and that the resolution
//! implied by a request's first binary item is honored by subsequent ones,
//! then hands back a tensor of the right shape with the raw bytes copied
//! into it verbatim. No pixel format conversion happens.

use inference_engine_domain::repositories::image_decoder::ImageDecoder;
use inference_engine_domain::value_objects::{ElementType, Tensor};
use inference_engine_domain::EngineError;

/// Resolution assumed when a request carries no layout hint at all.
const DEFAULT_HEIGHT: u32 = 224;
const DEFAULT_WIDTH: u32 = 224;
const CHANNELS: u64 = 3;

#[derive(Debug, Default)]
pub struct StubImageDecoder;

impl StubImageDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for StubImageDecoder {
    fn decode(&self, bytes: &[u8], hint_resolution: Option<(u32, u32)>) -> Result<Tensor, EngineError> {
        if bytes.is_empty() {
            return Err(EngineError::InvalidContentSize("binary input is empty".to_string()));
        }

        let (height, width) = hint_resolution.unwrap_or((DEFAULT_HEIGHT, DEFAULT_WIDTH));
        let dims = vec![height as u64, width as u64, CHANNELS];
        let expected_len = (height as u64 * width as u64 * CHANNELS) as usize;

        let mut buf = vec![0u8; expected_len];
        let copy_len = bytes.len().min(expected_len);
        buf[..copy_len].copy_from_slice(&bytes[..copy_len]);

        Tensor::new(ElementType::U8, dims, buf)
    }
}
