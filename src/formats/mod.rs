//! Concrete transforms
//!
//! Liftover strategies plugged into the run coordinator: plain BED files
//! with line-name suffixed chromosomes, and arbitrary tab-delimited tables.

pub mod bed;
pub mod liftover;
pub mod tabdel;

pub use bed::{clean_input, clean_line, unclean_bed, unclean_line, BedLiftover};
pub use liftover::{LiftOverCommand, DEFAULT_LIFTOVER};
pub use tabdel::{
    bed_map, extract_bed, return_bed, LiftedInterval, TabColumns, TabColumnsError, TabDelLiftover,
};
