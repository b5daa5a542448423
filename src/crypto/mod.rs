// ABOUTME: Cryptography module providing symmetric encryption and token signing
// ABOUTME: Centralizes AES-GCM client-token encryption and JWT access-token signatures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Cryptographic utilities for the Warden service

/// Symmetric cipher for opaque client tokens
pub mod cipher;
/// Access token signing and verification
pub mod signing;

pub use cipher::{AesGcmCipher, SymmetricCipher};
pub use signing::{AccessTokenPayload, JwtTokenSigner, TokenSigner};
