pub mod records;
pub mod rfm;

pub use records::parse_records;
pub use rfm::{label_segment, score_rfm};
