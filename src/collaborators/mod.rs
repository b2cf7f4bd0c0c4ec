//! Narrow interfaces to the services the parsers consult
//!
//! - [`CodeDictionary`] maps short variable codes to human labels
//! - [`TreatmentMetadata`] maps treatment numbers to descriptive names
//!
//! Both are optional: a failing or empty collaborator only removes
//! enrichment, it never fails a parse.

pub mod code_dictionary;
pub mod treatment_metadata;

pub use code_dictionary::{CdeFileDictionary, CodeDictionary, CodeEntry, EmptyCodeDictionary};
pub use treatment_metadata::{NoTreatmentMetadata, TreatmentMetadata, TreatmentName, XFileTreatments};
