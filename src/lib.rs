//! Batch translation client for localization resources
//!
//! `shipi18n` translates nested JSON / i18next resource trees and plain
//! strings into many languages in one call. Output trees keep the source
//! shape and key order; interpolation tokens, excluded keys and plural
//! families come back correct for every target language.
//!
//! See [`mt`] for the pipeline and [`content`] for the tree model.

pub mod content;
pub mod mt;

pub use content::{ContentNode, KeyPath, PathSegment, count_keys, count_translatable_leaves};
pub use mt::{
    ClientConfig, MtError, MtResult, TranslateOptions, TranslationInput, TranslationPipeline,
    TranslationResult,
};
