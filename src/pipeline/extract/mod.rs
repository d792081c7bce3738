pub mod extractor;
pub mod formats;
pub mod language;
pub mod sniff;

pub use extractor::*;
pub use formats::*;
pub use language::*;
pub use sniff::*;
