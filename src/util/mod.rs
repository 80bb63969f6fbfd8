//! String utilities shared by the tokenizer, the linker and the tools.

pub mod case;
pub mod title;

pub use case::{
    case_flip, case_flip_first, is_lower, is_title_case, is_upper, lc_alpha, lower_first, norm,
    upper_first,
};
pub use title::{
    is_disambig, starts_with_namespace, strip_namespace, strip_parens, wiki_space_norm,
};
