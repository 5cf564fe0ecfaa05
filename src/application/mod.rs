pub mod linkgraph;
pub mod ports;
pub mod search;
pub mod use_cases;
