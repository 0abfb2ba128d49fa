mod readset;
pub use readset::{load_readsets, parse_readsets, Error as ReadsetError, Readset, RunType, Sample};

mod design;
pub use design::{load_design, parse_design, Contrast, Error as DesignError};
