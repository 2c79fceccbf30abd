//! JSON configuration files of the command-line tools.

pub mod block_matching;
