//! Core markup scanning primitives
//!
//! This module contains the building blocks of the markup event source:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: pull tokenizer yielding byte-spanned tokens
//! - Entities: entity decoding with Cow (zero-copy when possible)
//! - Attributes: attribute parsing and extraction

pub mod attributes;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
