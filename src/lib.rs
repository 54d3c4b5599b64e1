// Library exports for reportgraph

pub mod aggregate;
pub mod analyze;
pub mod chart;
pub mod csv_reader;
pub mod data;
pub mod infer;
