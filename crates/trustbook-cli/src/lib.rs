//! Command-line front end for the trust workbook tools.
//!
//! `trustbook run` walks an input directory, randomizes the estimate columns of
//! every workbook and analyses it; `trustbook set` performs one validated cell
//! update.

pub mod cli;
pub mod driver;
